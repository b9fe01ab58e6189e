use crate::{BlockBundle, BlockRecord, StorageError};
use async_trait::async_trait;

/// Provides access to the persisted chain records.
///
/// The store is the single source of truth for block completeness: a block
/// number is considered ingested only when a record exists for it and its
/// `is_done` flag is set. Implementations must make [`BlockStore::insert_bundle`]
/// and [`BlockStore::purge_incomplete`] atomic across all three collections.
///
/// Implementations are expected to be safe for concurrent use by the worker
/// pool; connection pooling is the driver's responsibility.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Returns the block with the highest number, if any block is stored.
    async fn latest_block(&self) -> Result<Option<BlockRecord>, StorageError>;

    /// Returns the block with the given number, if present.
    async fn block_by_number(&self, number: u64) -> Result<Option<BlockRecord>, StorageError>;

    /// Returns the block with the given hash, if present.
    async fn block_by_hash(&self, hash: &str) -> Result<Option<BlockRecord>, StorageError>;

    /// Returns all blocks with `from <= number <= to`, sorted ascending by
    /// number.
    async fn blocks_in_range(&self, from: u64, to: u64)
    -> Result<Vec<BlockRecord>, StorageError>;

    /// Returns the total number of stored block records.
    async fn count_blocks(&self) -> Result<u64, StorageError>;

    /// Deletes every block record whose `is_done` flag is unset, together
    /// with all of its transactions and events, in one atomic transaction.
    ///
    /// Returns the number of purged blocks.
    async fn purge_incomplete(&self) -> Result<u64, StorageError>;

    /// Inserts a block, its transactions and its events, then flips the
    /// block's `is_done` flag, all within one atomic transaction. If any
    /// step fails the whole write is aborted and no record survives.
    async fn insert_bundle(&self, bundle: &BlockBundle) -> Result<(), StorageError>;
}
