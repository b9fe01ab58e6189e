use crate::{
    BackfillScheduler, BlockPipeline, ConfirmationQueue, HeadState, IndexerConfig, WorkerPool,
};
use quill_sources::{ChainSource, HeadSource, SourceError};
use quill_storage::{BlockStore, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// An error that stops the listener.
///
/// Every variant is fatal: once the head sequence or a startup step is
/// broken, continuing would ingest blocks against a wrong view of the chain.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The first live head is older than what the store already holds, so
    /// the node is behind the store.
    #[error("first observed head {observed} is behind the stored head {stored}")]
    HeadBehindStore {
        /// The first head number the source delivered.
        observed: u64,
        /// The latest block number found in the store.
        stored: u64,
    },

    /// A later head skipped at least one number.
    #[error("observed head {observed} but expected head {expected}")]
    HeadGap {
        /// The head number the source delivered.
        observed: u64,
        /// The number the sequence required next.
        expected: u64,
    },

    /// The head source failed or closed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A startup store operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The live ingestion driver.
///
/// Owns the head source and everything downstream of it: validated heads
/// enter the [`ConfirmationQueue`], confirmed numbers are dispatched to the
/// [`WorkerPool`], and the first head kicks off the startup backfill. Runs
/// until cancelled or until a [`ListenerError`] makes the head view
/// untrustworthy.
#[derive(Debug)]
pub struct HeadListener<H, C, S> {
    heads: H,
    state: HeadState,
    queue: Arc<ConfirmationQueue>,
    pipeline: BlockPipeline<C, S>,
    store: Arc<S>,
    pool: WorkerPool,
    backfill: BackfillScheduler<C, S>,
    config: IndexerConfig,
    cancellation: CancellationToken,
}

impl<H, C, S> HeadListener<H, C, S>
where
    H: HeadSource,
    C: ChainSource + Send + Sync + 'static,
    S: BlockStore + 'static,
{
    /// Wires a listener over the given head source, node source and store.
    pub fn new(
        heads: H,
        source: Arc<C>,
        store: Arc<S>,
        config: IndexerConfig,
        cancellation: CancellationToken,
    ) -> Self {
        let queue = Arc::new(ConfirmationQueue::new());
        let pipeline = BlockPipeline::new(source, Arc::clone(&store));
        let pool = WorkerPool::new(config.concurrency);
        let backfill = BackfillScheduler::new(
            pipeline.clone(),
            Arc::clone(&store),
            Arc::clone(&queue),
            pool.clone(),
            config.job_timeout,
            cancellation.clone(),
        );
        Self {
            heads,
            state: HeadState::new(),
            queue,
            pipeline,
            store,
            pool,
            backfill,
            config,
            cancellation,
        }
    }

    /// Runs the listener until cancellation or a fatal error.
    pub async fn start(mut self) -> Result<(), ListenerError> {
        let purged = self.store.purge_incomplete().await?;
        if purged > 0 {
            info!(target: "quill::listener", purged, "purged incomplete blocks from a previous run");
        }
        if let Some(latest) = self.store.latest_block().await? {
            self.state.set_latest_at_startup(latest.number);
        }
        info!(
            target: "quill::listener",
            stored = self.state.latest_at_startup(),
            "listening for heads"
        );

        self.queue.spawn_sweeper(self.cancellation.clone());

        let mut first = true;
        loop {
            tokio::select! {
                _ = self.cancellation.cancelled() => {
                    info!(target: "quill::listener", "cancellation requested, stopping...");
                    return Ok(());
                }
                head = self.heads.next_head() => {
                    let number = head?;
                    self.on_head(number, &mut first)?;
                    self.dispatch_confirmed();
                }
            }
        }
    }

    /// Validates one head against the sequence, tracks it and, on the first
    /// head, launches the startup backfill.
    fn on_head(&self, number: u64, first: &mut bool) -> Result<(), ListenerError> {
        if *first {
            let stored = self.state.latest_at_startup();
            if number < stored {
                return Err(ListenerError::HeadBehindStore { observed: number, stored });
            }
        } else {
            let expected = self.state.latest_observed() + 1;
            if number > expected {
                return Err(ListenerError::HeadGap { observed: number, expected });
            }
        }

        self.state.set_latest_observed(number);
        if self.queue.put(number) {
            debug!(target: "quill::listener", block = number, "head queued");
        }

        if *first {
            let depth = self.config.confirmation_depth;
            if number > depth {
                self.backfill.spawn_initial(self.state.latest_at_startup(), number - depth);
            }
            *first = false;
        }
        Ok(())
    }

    /// Drains every number the confirmation depth allows to run, handing
    /// each to the worker pool.
    fn dispatch_confirmed(&self) {
        let latest = self.state.latest_observed();
        let depth = self.config.confirmation_depth;

        while let Some(number) = self.queue.confirm_next(latest, depth) {
            let pipeline = self.pipeline.clone();
            let queue = Arc::clone(&self.queue);
            let job_timeout = self.config.job_timeout;

            self.pool.submit(async move {
                match time::timeout(job_timeout, pipeline.ingest(number)).await {
                    Ok(Ok(_)) => {
                        queue.mark_done(number);
                    }
                    Ok(Err(err)) => {
                        warn!(target: "quill::listener", block = number, %err, "job failed, will retry");
                        queue.mark_failed(number);
                    }
                    Err(_) => {
                        warn!(target: "quill::listener", block = number, "job timed out, will retry");
                        queue.mark_failed(number);
                    }
                }
            });
        }
    }
}
