use super::TransactionBundle;
use serde::{Deserialize, Serialize};

/// A single block as stored in the `blocks` collection.
///
/// Hashes and addresses are stored as 0x-prefixed hex strings; 256-bit
/// quantities that may not fit an `i64` (difficulty) are stored as decimal
/// strings. `number` and `hash` each carry a unique index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    /// Block hash.
    pub hash: String,
    /// Block number.
    pub number: u64,
    /// Block timestamp, seconds since the epoch.
    pub time: u64,
    /// Hash of the parent block.
    pub parent_hash: String,
    /// Difficulty as a decimal string.
    pub difficulty: String,
    /// Total gas used by the block.
    pub gas_used: u64,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Block nonce, hex-encoded.
    pub nonce: String,
    /// Address of the block producer.
    pub miner: String,
    /// Block size in bytes.
    pub size: f64,
    /// State root hash.
    pub state_root_hash: String,
    /// Ommers hash.
    pub uncle_hash: String,
    /// Transactions trie root hash.
    #[serde(rename = "txRootHash")]
    pub transaction_root_hash: String,
    /// Receipts trie root hash.
    pub receipt_root_hash: String,
    /// Raw extra data, hex-encoded.
    pub extra_data: String,
    /// Set to `true` once the block and all of its dependent records have
    /// been committed. A record left with `false` after a crash is
    /// incomplete and must be purged, never completed in place.
    pub is_done: bool,
}

/// A block together with its transactions and their events, ready to be
/// committed to the store in one atomic transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockBundle {
    /// The block record itself, with `is_done` still unset.
    pub block: BlockRecord,
    /// Every transaction of the block, each bundled with its receipt logs.
    pub transactions: Vec<TransactionBundle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_record_uses_original_field_names() {
        let record = BlockRecord {
            hash: "0xabc".to_string(),
            number: 7,
            time: 1_700_000_000,
            parent_hash: "0xdef".to_string(),
            difficulty: "0".to_string(),
            gas_used: 21_000,
            gas_limit: 30_000_000,
            nonce: "0x0".to_string(),
            miner: "0xfeed".to_string(),
            size: 512.0,
            state_root_hash: "0x1".to_string(),
            uncle_hash: "0x2".to_string(),
            transaction_root_hash: "0x3".to_string(),
            receipt_root_hash: "0x4".to_string(),
            extra_data: "0x".to_string(),
            is_done: false,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["parentHash"], "0xdef");
        assert_eq!(value["txRootHash"], "0x3");
        assert_eq!(value["receiptRootHash"], "0x4");
        assert_eq!(value["isDone"], false);
        assert_eq!(value["number"], 7);
    }
}
