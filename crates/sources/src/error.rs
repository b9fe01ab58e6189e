use alloy_primitives::B256;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the node-facing capabilities.
///
/// Transport and not-found variants are transient: the affected block number
/// is retried on a later scheduling cycle. Subscription loss and poll
/// timeouts are fatal to the process by design.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The RPC transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] alloy_transport::TransportError),

    /// The node does not know the requested block.
    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// The node returned a block without full transaction bodies.
    #[error("block {0} returned without full transaction bodies")]
    MissingTransactions(u64),

    /// The node has no receipt for the given transaction.
    #[error("receipt not found for transaction {0}")]
    ReceiptNotFound(B256),

    /// An established new-head subscription stopped delivering.
    #[error("new-head subscription closed: {0}")]
    SubscriptionClosed(String),

    /// A single head poll attempt did not complete within its deadline.
    #[error("head poll attempt exceeded {0:?}")]
    AttemptTimeout(Duration),
}
