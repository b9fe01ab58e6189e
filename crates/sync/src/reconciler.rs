use crate::BackfillScheduler;
use quill_sources::ChainSource;
use quill_storage::BlockStore;
use std::time::Duration;
use tokio::time;
use tracing::{debug, info, warn};

/// Pause between drift checks.
const RECONCILE_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic store-contiguity check.
///
/// A store that holds every block from genesis through its latest number
/// has exactly `latest + 1` records. When the count falls short, something
/// was dropped or a backfill was interrupted, and a fresh backfill pass over
/// the full range repairs it. The pass is cheap when nothing is missing
/// because fully-present chunks are skipped after a single range query.
#[derive(Debug)]
pub struct Reconciler<C, S> {
    backfill: BackfillScheduler<C, S>,
}

impl<C, S> Reconciler<C, S>
where
    C: ChainSource + Send + Sync + 'static,
    S: BlockStore + 'static,
{
    /// Creates a new reconciler driving the given scheduler.
    pub const fn new(backfill: BackfillScheduler<C, S>) -> Self {
        Self { backfill }
    }

    /// Checks for drift every [`RECONCILE_INTERVAL`] until cancelled.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.backfill.cancellation.cancelled() => return,
                _ = time::sleep(RECONCILE_INTERVAL) => self.run_cycle().await,
            }
        }
    }

    /// Runs one drift check, backfilling the full stored range on a
    /// mismatch.
    pub async fn run_cycle(&self) {
        let latest = match self.backfill.store.latest_block().await {
            Ok(Some(block)) => block.number,
            Ok(None) => return,
            Err(err) => {
                warn!(target: "quill::reconcile", %err, "latest block lookup failed");
                return;
            }
        };
        let count = match self.backfill.store.count_blocks().await {
            Ok(count) => count,
            Err(err) => {
                warn!(target: "quill::reconcile", %err, "block count failed");
                return;
            }
        };

        if count == latest + 1 {
            debug!(target: "quill::reconcile", latest, "store is contiguous");
            return;
        }

        info!(
            target: "quill::reconcile",
            latest,
            stored = count,
            missing = latest + 1 - count,
            "store has gaps, backfilling"
        );
        self.backfill.run(0, latest).await;
    }
}
