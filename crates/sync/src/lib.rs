//! The quill ingestion core.
//!
//! Live heads flow from a [`quill_sources::HeadSource`] into the
//! [`HeadListener`], which validates ordering, tracks them in [`HeadState`],
//! and feeds the [`ConfirmationQueue`]. Numbers a confirmation depth behind
//! the head are dispatched to the [`WorkerPool`], where the [`BlockPipeline`]
//! fetches and atomically persists each block. The [`BackfillScheduler`]
//! walks historical ranges through the same pipeline, and the [`Reconciler`]
//! periodically re-runs it when the store drifts from contiguity.

mod config;
pub use config::IndexerConfig;

mod state;
pub use state::HeadState;

mod queue;
pub use queue::ConfirmationQueue;

mod finder;
pub use finder::missing_in_range;

mod convert;
pub use convert::{block_to_record, transaction_to_bundle};

mod pipeline;
pub use pipeline::{BlockPipeline, IngestOutcome, PipelineError};

mod pool;
pub use pool::WorkerPool;

mod listener;
pub use listener::{HeadListener, ListenerError};

mod backfill;
pub use backfill::BackfillScheduler;

mod reconciler;
pub use reconciler::Reconciler;

#[cfg(test)]
mod test_support;
