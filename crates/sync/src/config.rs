use std::time::Duration;

/// Runtime configuration for the ingestion core.
///
/// Constructed once at startup from the CLI surface and passed by value into
/// every component constructor; nothing reads configuration ambiently.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// How many blocks behind the observed head a block must lie before it
    /// is eligible for processing.
    pub confirmation_depth: u64,
    /// Worker pool sizing factor; the pool holds
    /// `concurrency * available_parallelism` slots.
    pub concurrency: usize,
    /// Deadline for a single fetch-and-persist job. On expiry the job
    /// counts as failed and its number returns to pending.
    pub job_timeout: Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            confirmation_depth: 12,
            concurrency: 2,
            job_timeout: Duration::from_secs(5 * 60),
        }
    }
}
