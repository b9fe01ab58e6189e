use std::sync::Arc;
use tokio::{sync::Semaphore, task::JoinHandle};

/// Bounded executor for fetch-and-persist jobs.
///
/// Sized as `concurrency × available_parallelism`; a submitted job waits for
/// a slot before it starts running, so at most that many jobs touch the node
/// and the store at once. Submission itself never blocks.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
}

impl WorkerPool {
    /// Creates a pool with `concurrency` slots per hardware thread.
    pub fn new(concurrency: usize) -> Self {
        let parallelism = std::thread::available_parallelism().map(usize::from).unwrap_or(1);
        Self::with_slots(concurrency.max(1) * parallelism)
    }

    /// Creates a pool with an exact slot count.
    pub fn with_slots(slots: usize) -> Self {
        Self { slots: Arc::new(Semaphore::new(slots.max(1))) }
    }

    /// Spawns `job` once a slot frees up.
    pub fn submit<F>(&self, job: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        tokio::spawn(async move {
            // The pool is never closed, so acquisition only fails on
            // process teardown.
            let Ok(_slot) = slots.acquire_owned().await else { return };
            job.await;
        })
    }
}
