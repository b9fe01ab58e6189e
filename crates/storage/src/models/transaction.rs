use super::EventRecord;
use serde::{Deserialize, Serialize};

/// A single transaction as stored in the `transactions` collection.
///
/// Keyed by the containing block hash; deleted together with its block.
/// `value`, `gas_price` and `cost` are 256-bit quantities stored as decimal
/// strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Hash of the containing block.
    pub block_hash: String,
    /// Transaction hash.
    pub hash: String,
    /// Sender address, recovered from the signature.
    pub from: String,
    /// Recipient address; empty for contract creations.
    pub to: String,
    /// Address of the created contract, from the receipt.
    pub contract: String,
    /// Transferred value as a decimal string.
    pub value: String,
    /// Call data, hex-encoded.
    pub data: String,
    /// Gas limit of the transaction.
    pub gas: u64,
    /// Gas price as a decimal string.
    pub gas_price: String,
    /// Maximum cost (value + gas * gas price) as a decimal string.
    pub cost: String,
    /// Sender nonce.
    pub nonce: u64,
    /// Receipt status: 1 on success, 0 on revert.
    pub state: u64,
}

/// A transaction together with the events emitted by its receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBundle {
    /// The transaction record.
    pub transaction: TransactionRecord,
    /// Events from the transaction's receipt, in receipt order.
    pub events: Vec<EventRecord>,
}
