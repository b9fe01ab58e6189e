//! Mocks and fixtures shared across the unit tests.

use alloy_primitives::{Address, B256};
use alloy_rpc_types_eth::{Block, Transaction, TransactionReceipt};
use async_trait::async_trait;
use quill_sources::{ChainSource, HeadSource, SourceError};
use quill_storage::{BlockBundle, BlockRecord, BlockStore, StorageError};
use std::collections::VecDeque;

mockall::mock! {
    pub ChainSource {}

    #[async_trait]
    impl ChainSource for ChainSource {
        async fn block_with_transactions(&self, number: u64) -> Result<Block, SourceError>;
        async fn transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt, SourceError>;
        fn transaction_sender(&self, tx: &Transaction) -> Result<Address, SourceError>;
    }
}

mockall::mock! {
    pub Store {}

    #[async_trait]
    impl BlockStore for Store {
        async fn latest_block(&self) -> Result<Option<BlockRecord>, StorageError>;
        async fn block_by_number(&self, number: u64) -> Result<Option<BlockRecord>, StorageError>;
        async fn block_by_hash(&self, hash: &str) -> Result<Option<BlockRecord>, StorageError>;
        async fn blocks_in_range(
            &self,
            from: u64,
            to: u64,
        ) -> Result<Vec<BlockRecord>, StorageError>;
        async fn count_blocks(&self) -> Result<u64, StorageError>;
        async fn purge_incomplete(&self) -> Result<u64, StorageError>;
        async fn insert_bundle(&self, bundle: &BlockBundle) -> Result<(), StorageError>;
    }
}

/// Head source that replays a fixed sequence and then reports its
/// subscription as closed.
pub struct ScriptedHeads {
    numbers: VecDeque<u64>,
}

impl ScriptedHeads {
    pub fn new(numbers: impl IntoIterator<Item = u64>) -> Self {
        Self { numbers: numbers.into_iter().collect() }
    }
}

#[async_trait]
impl HeadSource for ScriptedHeads {
    async fn next_head(&mut self) -> Result<u64, SourceError> {
        self.numbers
            .pop_front()
            .ok_or_else(|| SourceError::SubscriptionClosed("script exhausted".to_string()))
    }
}

/// A complete, done block record for store mock returns.
pub fn block_record(number: u64) -> BlockRecord {
    BlockRecord {
        hash: format!("0x{number:064x}"),
        number,
        time: 1_700_000_000 + number,
        parent_hash: format!("0x{:064x}", number.wrapping_sub(1)),
        difficulty: "0".to_string(),
        gas_used: 21_000,
        gas_limit: 30_000_000,
        nonce: "0x0000000000000000".to_string(),
        miner: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
        size: 512.0,
        state_root_hash: "0x1".to_string(),
        uncle_hash: "0x2".to_string(),
        transaction_root_hash: "0x3".to_string(),
        receipt_root_hash: "0x4".to_string(),
        extra_data: "0x".to_string(),
        is_done: true,
    }
}
