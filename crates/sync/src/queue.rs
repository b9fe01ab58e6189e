use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

/// How often the background sweeper evicts done entries.
const SWEEP_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Default, Clone, Copy)]
struct QueueEntry {
    in_progress: bool,
    done: bool,
}

/// Per-block-number lifecycle tracker deciding which pending number may run.
///
/// Entries move absent → pending → in-progress → done → evicted; a done
/// number never returns to pending. The queue is only a scheduling hint —
/// the store remains authoritative for persistence — which is why done
/// entries can simply be swept away.
///
/// Mutated concurrently by the listener, job completions and the sweeper;
/// every read-modify-write runs under one mutex.
#[derive(Debug, Default)]
pub struct ConfirmationQueue {
    entries: Mutex<HashMap<u64, QueueEntry>>,
}

impl ConfirmationQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, QueueEntry>> {
        self.entries.lock().expect("confirmation queue lock poisoned")
    }

    /// Inserts a pending entry for `number`. Returns `false` when the number
    /// is already tracked.
    pub fn put(&self, number: u64) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(&number) {
            return false;
        }
        entries.insert(number, QueueEntry::default());
        true
    }

    /// Returns one pending number that is at least `confirmation_depth`
    /// behind `latest_observed`, marking it in-progress.
    ///
    /// Each eligible number is handed to exactly one caller; it stays
    /// ineligible until [`Self::mark_failed`] or [`Self::mark_done`] is
    /// called for it. Iteration order over pending entries is unspecified.
    pub fn confirm_next(&self, latest_observed: u64, confirmation_depth: u64) -> Option<u64> {
        if latest_observed < confirmation_depth {
            return None;
        }
        let horizon = latest_observed - confirmation_depth;

        let mut entries = self.lock();
        for (&number, entry) in entries.iter_mut() {
            if entry.done || entry.in_progress {
                continue;
            }
            if number <= horizon {
                entry.in_progress = true;
                return Some(number);
            }
        }
        None
    }

    /// Returns a failed number to pending so a later scheduling cycle can
    /// retry it. No backoff is applied.
    pub fn mark_failed(&self, number: u64) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&number) else { return false };
        entry.in_progress = false;
        true
    }

    /// Marks a number done. Done entries are immutable until evicted.
    pub fn mark_done(&self, number: u64) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&number) else { return false };
        entry.in_progress = false;
        entry.done = true;
        true
    }

    /// Evicts every done entry, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.done);
        before - entries.len()
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue tracks no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Spawns the background sweep task; it runs until cancelled.
    pub fn spawn_sweeper(self: &Arc<Self>, cancellation: CancellationToken) -> JoinHandle<()> {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = cancellation.cancelled() => {
                        info!(target: "quill::queue", "sweeper cancellation requested, stopping...");
                        break;
                    }
                    _ = ticker.tick() => {
                        let swept = queue.sweep();
                        if swept > 0 {
                            trace!(target: "quill::queue", swept, "evicted done entries");
                        }
                    }
                }
            }
        })
    }
}
