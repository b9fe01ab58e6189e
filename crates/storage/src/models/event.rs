use serde::{Deserialize, Serialize};

/// A single receipt log as stored in the `events` collection.
///
/// Log payloads are stored opaquely; nothing in the store interprets topics
/// or data. There is no uniqueness constraint on this collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Hash of the containing block.
    pub block_hash: String,
    /// Hash of the emitting transaction.
    #[serde(rename = "txHash")]
    pub transaction_hash: String,
    /// Index of the log within the block.
    pub index: u64,
    /// Address of the emitting contract.
    pub origin: String,
    /// Log topics, hex-encoded.
    pub topics: Vec<String>,
    /// Log data, hex-encoded.
    pub data: String,
}
