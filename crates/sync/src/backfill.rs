use crate::{BlockPipeline, ConfirmationQueue, Reconciler, WorkerPool, missing_in_range};
use quill_sources::ChainSource;
use quill_storage::BlockStore;
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Numbers per store range query.
const CHUNK_SIZE: u64 = 1000;

/// Pause between job submissions, bounding burst load on the node.
const SUBMIT_THROTTLE: Duration = Duration::from_millis(100);

/// Walks a historical block range and submits the absent numbers.
///
/// Each chunk is checked against the store first, so a backfill over an
/// already-ingested range is almost free. Submitted jobs funnel into the
/// same worker pool and pipeline as live jobs; the pipeline's existence
/// check keeps the interleaving idempotent.
#[derive(Debug)]
pub struct BackfillScheduler<C, S> {
    pub(crate) pipeline: BlockPipeline<C, S>,
    pub(crate) store: Arc<S>,
    pub(crate) queue: Arc<ConfirmationQueue>,
    pub(crate) pool: WorkerPool,
    pub(crate) job_timeout: Duration,
    pub(crate) cancellation: CancellationToken,
}

impl<C, S> BackfillScheduler<C, S>
where
    C: ChainSource + Send + Sync + 'static,
    S: BlockStore + 'static,
{
    /// Creates a new scheduler sharing the listener's pipeline, queue and
    /// pool.
    pub fn new(
        pipeline: BlockPipeline<C, S>,
        store: Arc<S>,
        queue: Arc<ConfirmationQueue>,
        pool: WorkerPool,
        job_timeout: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        Self { pipeline, store, queue, pool, job_timeout, cancellation }
    }

    /// Walks `[from, to]` in chunks, submitting every number the store does
    /// not hold yet.
    pub async fn run(&self, from: u64, to: u64) {
        if to < from {
            warn!(target: "quill::backfill", from, to, "refusing inverted range");
            return;
        }
        info!(target: "quill::backfill", from, to, "starting backfill");

        let mut start = from;
        while start <= to {
            if self.cancellation.is_cancelled() {
                return;
            }
            let end = to.min(start.saturating_add(CHUNK_SIZE - 1));

            let present = match self.store.blocks_in_range(start, end).await {
                Ok(present) => present,
                Err(err) => {
                    warn!(
                        target: "quill::backfill",
                        from = start,
                        to = end,
                        %err,
                        "range query failed, skipping chunk"
                    );
                    start = end + 1;
                    continue;
                }
            };

            if present.len() as u64 == end - start + 1 {
                // Chunk fully ingested.
                start = end + 1;
                continue;
            }

            if present.is_empty() {
                self.submit_all(start, end).await;
            } else {
                let numbers: Vec<u64> = present.iter().map(|block| block.number).collect();
                for number in missing_in_range(&numbers, start, end) {
                    if self.cancellation.is_cancelled() {
                        return;
                    }
                    self.submit(number);
                    time::sleep(SUBMIT_THROTTLE).await;
                }
            }
            start = end + 1;
        }

        info!(target: "quill::backfill", from, to, "backfill pass finished");
    }

    /// Runs the one-time startup backfill, then hands off to the
    /// reconciliation loop for the rest of the process lifetime.
    pub fn spawn_initial(&self, from: u64, to: u64) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run(from, to).await;
            Reconciler::new(scheduler).run().await;
        })
    }

    async fn submit_all(&self, from: u64, to: u64) {
        for number in from..=to {
            if self.cancellation.is_cancelled() {
                return;
            }
            self.submit(number);
            time::sleep(SUBMIT_THROTTLE).await;
        }
    }

    fn submit(&self, number: u64) {
        let pipeline = self.pipeline.clone();
        let queue = Arc::clone(&self.queue);
        let job_timeout = self.job_timeout;

        self.pool.submit(async move {
            match time::timeout(job_timeout, pipeline.ingest(number)).await {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    warn!(target: "quill::backfill", block = number, %err, "job failed, requeued");
                    queue.put(number);
                }
                Err(_) => {
                    warn!(target: "quill::backfill", block = number, "job timed out, requeued");
                    queue.put(number);
                }
            }
        });
    }
}

impl<C, S> Clone for BackfillScheduler<C, S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            store: Arc::clone(&self.store),
            queue: Arc::clone(&self.queue),
            pool: self.pool.clone(),
            job_timeout: self.job_timeout,
            cancellation: self.cancellation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockChainSource, MockStore, block_record};
    use mockall::predicate::eq;

    fn scheduler(
        source: MockChainSource,
        store: MockStore,
    ) -> BackfillScheduler<MockChainSource, MockStore> {
        let store = Arc::new(store);
        BackfillScheduler::new(
            BlockPipeline::new(Arc::new(source), Arc::clone(&store)),
            store,
            Arc::new(ConfirmationQueue::new()),
            WorkerPool::with_slots(4),
            Duration::from_secs(5),
            CancellationToken::new(),
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fully_present_chunk_submits_nothing() {
        let mut store = MockStore::new();
        store
            .expect_blocks_in_range()
            .with(eq(10u64), eq(14u64))
            .return_once(|from, to| Ok((from..=to).map(block_record).collect()));
        // No per-number existence checks may happen.
        store.expect_block_by_number().never();

        scheduler(MockChainSource::new(), store).run(10, 14).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn only_missing_numbers_are_submitted() {
        let mut store = MockStore::new();
        store
            .expect_blocks_in_range()
            .with(eq(1u64), eq(5u64))
            .return_once(|_, _| Ok(vec![block_record(2), block_record(3), block_record(5)]));
        // The submitted jobs hit the pipeline's existence check; answering
        // "present" makes them no-ops while still recording the calls.
        store
            .expect_block_by_number()
            .with(eq(1u64))
            .times(1)
            .returning(|n| Ok(Some(block_record(n))));
        store
            .expect_block_by_number()
            .with(eq(4u64))
            .times(1)
            .returning(|n| Ok(Some(block_record(n))));

        let scheduler = scheduler(MockChainSource::new(), store);
        scheduler.run(1, 5).await;

        // Jobs run on the pool; give them a moment to drain.
        time::sleep(Duration::from_millis(200)).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_job_requeues_its_number() {
        let mut store = MockStore::new();
        store.expect_blocks_in_range().return_once(|_, _| Ok(vec![block_record(2)]));
        store.expect_block_by_number().with(eq(1u64)).return_once(|_| Ok(None));

        let mut source = MockChainSource::new();
        source
            .expect_block_with_transactions()
            .return_once(|n| Err(quill_sources::SourceError::BlockNotFound(n)));

        let scheduler = scheduler(source, store);
        let queue = Arc::clone(&scheduler.queue);
        scheduler.run(1, 2).await;

        time::sleep(Duration::from_millis(200)).await;
        // The failed number is back in the queue for the next cycle.
        assert!(!queue.put(1));
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let mut store = MockStore::new();
        store.expect_blocks_in_range().never();
        scheduler(MockChainSource::new(), store).run(5, 1).await;
    }
}
