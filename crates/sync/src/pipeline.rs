use crate::convert;
use quill_sources::{ChainSource, SourceError};
use quill_storage::{BlockBundle, BlockStore, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// An error that occurred while fetching or persisting a block.
///
/// Both variants are transient from the scheduler's point of view: the
/// number is returned to pending and retried on a later cycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The node fetch failed; nothing was written.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The store rejected the write; the transaction was aborted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What a pipeline invocation did for its block number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The block, its transactions and its events were committed.
    Inserted {
        /// Number of transactions in the committed block.
        transactions: usize,
    },
    /// A record for this number already exists; nothing was fetched or
    /// written. Duplicate submission is not an error.
    AlreadyStored,
}

/// The per-block fetch-and-persist unit.
///
/// Safe to invoke concurrently for distinct numbers and repeatedly for the
/// same number: the store existence check plus the atomic bundle write make
/// each invocation idempotent and number-scoped.
#[derive(Debug)]
pub struct BlockPipeline<C, S> {
    source: Arc<C>,
    store: Arc<S>,
}

impl<C, S> BlockPipeline<C, S>
where
    C: ChainSource,
    S: BlockStore,
{
    /// Creates a new pipeline over the given node source and store.
    pub const fn new(source: Arc<C>, store: Arc<S>) -> Self {
        Self { source, store }
    }

    /// Fetches block `number` with its transactions, receipts and logs, and
    /// commits everything in one atomic store transaction.
    ///
    /// Any fetch failure aborts the whole unit before the store is touched;
    /// any store failure aborts the transaction so no partial record
    /// survives. Success is reported only after the commit.
    pub async fn ingest(&self, number: u64) -> Result<IngestOutcome, PipelineError> {
        if self.store.block_by_number(number).await?.is_some() {
            debug!(target: "quill::pipeline", block = number, "already stored, skipping");
            return Ok(IngestOutcome::AlreadyStored);
        }

        let block = self.source.block_with_transactions(number).await?;
        let transactions = block.transactions.as_transactions().unwrap_or_default();
        debug!(
            target: "quill::pipeline",
            block = number,
            transactions = transactions.len(),
            "fetched block"
        );

        let mut bundles = Vec::with_capacity(transactions.len());
        for tx in transactions {
            let receipt = self.source.transaction_receipt(*tx.inner.tx_hash()).await?;
            let sender = self.source.transaction_sender(tx)?;
            bundles.push(convert::transaction_to_bundle(tx, sender, &receipt));
        }

        let bundle =
            BlockBundle { block: convert::block_to_record(&block), transactions: bundles };
        self.store.insert_bundle(&bundle).await?;

        info!(
            target: "quill::pipeline",
            block = number,
            transactions = bundle.transactions.len(),
            "block committed"
        );
        Ok(IngestOutcome::Inserted { transactions: bundle.transactions.len() })
    }
}

impl<C, S> Clone for BlockPipeline<C, S> {
    fn clone(&self) -> Self {
        Self { source: Arc::clone(&self.source), store: Arc::clone(&self.store) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::test_fixtures;
    use crate::test_support::{MockChainSource, MockStore, block_record};
    use alloy_primitives::Address;
    use mockall::predicate::eq;

    fn pipeline(
        source: MockChainSource,
        store: MockStore,
    ) -> BlockPipeline<MockChainSource, MockStore> {
        BlockPipeline::new(Arc::new(source), Arc::new(store))
    }

    #[tokio::test]
    async fn already_stored_number_is_a_no_op() {
        let mut store = MockStore::new();
        store
            .expect_block_by_number()
            .with(eq(7u64))
            .return_once(|_| Ok(Some(block_record(7))));
        store.expect_insert_bundle().never();

        let mut source = MockChainSource::new();
        source.expect_block_with_transactions().never();

        let outcome = pipeline(source, store).ingest(7).await.unwrap();
        assert_eq!(outcome, IngestOutcome::AlreadyStored);
    }

    #[tokio::test]
    async fn empty_block_is_fetched_and_committed() {
        let mut store = MockStore::new();
        store.expect_block_by_number().return_once(|_| Ok(None));
        store
            .expect_insert_bundle()
            .withf(|bundle| bundle.block.number == 42 && bundle.transactions.is_empty())
            .return_once(|_| Ok(()));

        let mut source = MockChainSource::new();
        source
            .expect_block_with_transactions()
            .with(eq(42u64))
            .return_once(|n| Ok(test_fixtures::block(n, Vec::new())));

        let outcome = pipeline(source, store).ingest(42).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Inserted { transactions: 0 });
    }

    #[tokio::test]
    async fn fetch_failure_leaves_the_store_untouched() {
        let mut store = MockStore::new();
        store.expect_block_by_number().return_once(|_| Ok(None));
        store.expect_insert_bundle().never();

        let mut source = MockChainSource::new();
        source
            .expect_block_with_transactions()
            .return_once(|n| Err(SourceError::BlockNotFound(n)));

        let err = pipeline(source, store).ingest(9).await.unwrap_err();
        assert!(matches!(err, PipelineError::Source(SourceError::BlockNotFound(9))));
    }

    #[tokio::test]
    async fn receipt_failure_aborts_the_whole_unit() {
        let sender = Address::repeat_byte(0x11);
        let tx = test_fixtures::transaction(0, sender);

        let mut store = MockStore::new();
        store.expect_block_by_number().return_once(|_| Ok(None));
        store.expect_insert_bundle().never();

        let mut source = MockChainSource::new();
        source
            .expect_block_with_transactions()
            .return_once(move |n| Ok(test_fixtures::block(n, vec![tx])));
        source
            .expect_transaction_receipt()
            .return_once(|hash| Err(SourceError::ReceiptNotFound(hash)));

        let err = pipeline(source, store).ingest(3).await.unwrap_err();
        assert!(matches!(err, PipelineError::Source(SourceError::ReceiptNotFound(_))));
    }

    #[tokio::test]
    async fn store_failure_surfaces_without_a_commit() {
        let mut store = MockStore::new();
        store.expect_block_by_number().return_once(|_| Ok(None));
        // The aborted transaction leaves no records behind; the pipeline
        // must report the failure, never `Inserted`.
        store
            .expect_insert_bundle()
            .times(1)
            .return_once(|_| Err(StorageError::NotFound("transaction aborted".to_string())));

        let mut source = MockChainSource::new();
        source
            .expect_block_with_transactions()
            .with(eq(11u64))
            .return_once(|n| Ok(test_fixtures::block(n, Vec::new())));

        let err = pipeline(source, store).ingest(11).await.unwrap_err();
        assert!(matches!(err, PipelineError::Storage(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn block_with_transactions_commits_full_bundle() {
        let sender = Address::repeat_byte(0x11);
        let tx = test_fixtures::transaction(1, sender);
        let tx_hash = *tx.inner.tx_hash();

        let mut store = MockStore::new();
        store.expect_block_by_number().return_once(|_| Ok(None));
        store
            .expect_insert_bundle()
            .withf(|bundle| {
                bundle.transactions.len() == 1 && bundle.transactions[0].events.len() == 1
            })
            .return_once(|_| Ok(()));

        let mut source = MockChainSource::new();
        {
            let tx = tx.clone();
            source
                .expect_block_with_transactions()
                .return_once(move |n| Ok(test_fixtures::block(n, vec![tx])));
        }
        source.expect_transaction_receipt().with(eq(tx_hash)).return_once(move |hash| {
            let tx = test_fixtures::transaction(1, Address::repeat_byte(0x11));
            let block_hash = alloy_primitives::B256::repeat_byte(0x22);
            Ok(test_fixtures::receipt(&tx, block_hash, vec![test_fixtures::log(
                block_hash, hash, 0,
            )]))
        });
        source.expect_transaction_sender().return_once(move |_| Ok(sender));

        let outcome = pipeline(source, store).ingest(5).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Inserted { transactions: 1 });
    }
}
