//! Node-facing capabilities for quill.
//!
//! Two capability traits cover everything the ingestion pipeline needs from
//! the chain node: [`ChainSource`] for number-addressed block and receipt
//! fetches, and [`HeadSource`] for new-head delivery. The head capability
//! has two implementations selected once at construction: a WebSocket
//! `newHeads` subscription and a fixed-cadence poller.

mod error;
pub use error::SourceError;

mod chain;
pub use chain::{AlloyChainSource, ChainSource};

mod heads;
pub use heads::{HeadSource, PolledHeads, SubscribedHeads};
