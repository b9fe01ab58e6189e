//! MongoDB-backed implementation of the [`BlockStore`] trait.

use crate::{BlockBundle, BlockRecord, BlockStore, EventRecord, StorageError, TransactionRecord};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Client, ClientSession, Collection, IndexModel, bson::doc, options::IndexOptions};
use tracing::debug;

const BLOCKS: &str = "blocks";
const TRANSACTIONS: &str = "transactions";
const EVENTS: &str = "events";

/// A block store backed by a MongoDB database.
///
/// Holds one typed collection handle per record kind and runs every
/// multi-record write inside a [`ClientSession`] transaction. The driver's
/// connection pool makes the store safe to share across worker tasks.
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    blocks: Collection<BlockRecord>,
    transactions: Collection<TransactionRecord>,
    events: Collection<EventRecord>,
}

impl MongoStore {
    /// Connects to the database and ensures the unique indexes exist.
    ///
    /// Index setup runs once at construction: unique indexes on block hash
    /// and number, and on transaction hash. The events collection carries no
    /// uniqueness constraint.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, StorageError> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(db_name);
        let store = Self {
            blocks: db.collection(BLOCKS),
            transactions: db.collection(TRANSACTIONS),
            events: db.collection(EVENTS),
            client,
        };
        store.create_indexes().await?;
        Ok(store)
    }

    async fn create_indexes(&self) -> Result<(), StorageError> {
        let unique = IndexOptions::builder().unique(true).build();
        self.blocks
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "hash": -1 })
                    .options(unique.clone())
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "number": -1 })
                    .options(unique.clone())
                    .build(),
            ])
            .await?;
        self.transactions
            .create_index(IndexModel::builder().keys(doc! { "hash": -1 }).options(unique).build())
            .await?;
        Ok(())
    }

    async fn purge_incomplete_in(
        &self,
        session: &mut ClientSession,
    ) -> Result<u64, StorageError> {
        let mut cursor =
            self.blocks.find(doc! { "isDone": false }).session(&mut *session).await?;

        let mut hashes = Vec::new();
        while let Some(block) = cursor.next(&mut *session).await {
            hashes.push(block?.hash);
        }

        if hashes.is_empty() {
            return Ok(0);
        }

        for hash in &hashes {
            self.transactions
                .delete_many(doc! { "blockHash": hash.as_str() })
                .session(&mut *session)
                .await?;
            self.events
                .delete_many(doc! { "blockHash": hash.as_str() })
                .session(&mut *session)
                .await?;
        }

        let deleted =
            self.blocks.delete_many(doc! { "isDone": false }).session(&mut *session).await?;
        Ok(deleted.deleted_count)
    }

    async fn insert_bundle_in(
        &self,
        session: &mut ClientSession,
        bundle: &BlockBundle,
    ) -> Result<(), StorageError> {
        self.blocks.insert_one(&bundle.block).session(&mut *session).await?;

        for tx in &bundle.transactions {
            self.transactions.insert_one(&tx.transaction).session(&mut *session).await?;
            for event in &tx.events {
                self.events.insert_one(event).session(&mut *session).await?;
            }
        }

        // The done flag marks completion, not existence; it is flipped last,
        // inside the same transaction as the inserts.
        self.blocks
            .update_one(
                doc! { "number": bundle.block.number as i64 },
                doc! { "$set": { "isDone": true } },
            )
            .session(&mut *session)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BlockStore for MongoStore {
    async fn latest_block(&self) -> Result<Option<BlockRecord>, StorageError> {
        Ok(self.blocks.find_one(doc! {}).sort(doc! { "number": -1 }).await?)
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<BlockRecord>, StorageError> {
        Ok(self.blocks.find_one(doc! { "number": number as i64 }).await?)
    }

    async fn block_by_hash(&self, hash: &str) -> Result<Option<BlockRecord>, StorageError> {
        Ok(self.blocks.find_one(doc! { "hash": hash }).await?)
    }

    async fn blocks_in_range(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<BlockRecord>, StorageError> {
        let cursor = self
            .blocks
            .find(doc! { "number": { "$gte": from as i64, "$lte": to as i64 } })
            .sort(doc! { "number": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_blocks(&self) -> Result<u64, StorageError> {
        Ok(self.blocks.count_documents(doc! {}).await?)
    }

    async fn purge_incomplete(&self) -> Result<u64, StorageError> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        match self.purge_incomplete_in(&mut session).await {
            Ok(count) => {
                session.commit_transaction().await?;
                if count > 0 {
                    debug!(target: "quill::storage", count, "purged incomplete blocks");
                }
                Ok(count)
            }
            Err(err) => {
                let _ = session.abort_transaction().await;
                Err(err)
            }
        }
    }

    async fn insert_bundle(&self, bundle: &BlockBundle) -> Result<(), StorageError> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        match self.insert_bundle_in(&mut session, bundle).await {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(err) => {
                let _ = session.abort_transaction().await;
                Err(err)
            }
        }
    }
}
