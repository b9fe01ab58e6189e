//! Conversion of RPC responses into store records.
//!
//! Hashes and addresses are rendered as 0x-hex strings and 256-bit
//! quantities as decimal strings, so records stay driver-agnostic and
//! queryable without numeric overflow concerns.

use alloy_consensus::Transaction as _;
use alloy_primitives::{Address, U256};
use alloy_rpc_types_eth::{Block, Transaction, TransactionReceipt};
use quill_storage::{BlockRecord, EventRecord, TransactionBundle, TransactionRecord};

/// Builds the block record for a fetched block.
///
/// The `is_done` flag is left unset; the store flips it as the last step of
/// the atomic bundle write.
pub fn block_to_record(block: &Block) -> BlockRecord {
    let header = &block.header;
    BlockRecord {
        hash: header.hash.to_string(),
        number: header.number,
        time: header.timestamp,
        parent_hash: header.parent_hash.to_string(),
        difficulty: header.difficulty.to_string(),
        gas_used: header.gas_used,
        gas_limit: header.gas_limit,
        nonce: header.nonce.to_string(),
        miner: header.beneficiary.to_string(),
        size: header.size.map(|size| size.to::<u64>() as f64).unwrap_or_default(),
        state_root_hash: header.state_root.to_string(),
        uncle_hash: header.ommers_hash.to_string(),
        transaction_root_hash: header.transactions_root.to_string(),
        receipt_root_hash: header.receipts_root.to_string(),
        extra_data: header.extra_data.to_string(),
        is_done: false,
    }
}

/// Builds the transaction record plus the event records of its receipt.
pub fn transaction_to_bundle(
    tx: &Transaction,
    sender: Address,
    receipt: &TransactionReceipt,
) -> TransactionBundle {
    let gas_price = tx.inner.gas_price().unwrap_or_default();
    // Maximum cost the sender committed to: value + gas limit * gas price.
    let cost = tx.inner.value() + U256::from(tx.inner.gas_limit()) * U256::from(gas_price);

    let transaction = TransactionRecord {
        block_hash: receipt.block_hash.map(|hash| hash.to_string()).unwrap_or_default(),
        hash: tx.inner.tx_hash().to_string(),
        from: sender.to_string(),
        to: tx.inner.to().map(|address| address.to_string()).unwrap_or_default(),
        contract: receipt.contract_address.unwrap_or(Address::ZERO).to_string(),
        value: tx.inner.value().to_string(),
        data: tx.inner.input().to_string(),
        gas: tx.inner.gas_limit(),
        gas_price: gas_price.to_string(),
        cost: cost.to_string(),
        nonce: tx.inner.nonce(),
        state: receipt.status() as u64,
    };

    let events = receipt
        .inner
        .logs()
        .iter()
        .map(|log| EventRecord {
            block_hash: log.block_hash.map(|hash| hash.to_string()).unwrap_or_default(),
            transaction_hash: log
                .transaction_hash
                .map(|hash| hash.to_string())
                .unwrap_or_default(),
            index: log.log_index.unwrap_or_default(),
            origin: log.inner.address.to_string(),
            topics: log.inner.data.topics().iter().map(|topic| topic.to_string()).collect(),
            data: log.inner.data.data.to_string(),
        })
        .collect();

    TransactionBundle { transaction, events }
}


#[cfg(test)]
mod tests {
    use super::{test_fixtures::*, *};
    use alloy_primitives::{Address, B256};

    #[test]
    fn block_record_carries_header_fields() {
        let block = block(42, Vec::new());
        let record = block_to_record(&block);

        assert_eq!(record.number, 42);
        assert_eq!(record.hash, block.header.hash.to_string());
        assert_eq!(record.parent_hash, block.header.parent_hash.to_string());
        assert_eq!(record.time, block.header.timestamp);
        assert_eq!(record.gas_used, 21_000);
        assert_eq!(record.gas_limit, 30_000_000);
        assert_eq!(record.size, 777.0);
        assert!(!record.is_done);
    }

    #[test]
    fn transaction_bundle_carries_receipt_data() {
        let sender = Address::repeat_byte(0x11);
        let block_hash = B256::repeat_byte(0x22);
        let tx = transaction(7, sender);
        let tx_hash = *tx.inner.tx_hash();
        let receipt =
            receipt(&tx, block_hash, vec![log(block_hash, tx_hash, 0), log(block_hash, tx_hash, 1)]);

        let bundle = transaction_to_bundle(&tx, sender, &receipt);

        assert_eq!(bundle.transaction.block_hash, block_hash.to_string());
        assert_eq!(bundle.transaction.from, sender.to_string());
        assert_eq!(bundle.transaction.nonce, 7);
        assert_eq!(bundle.transaction.state, 1);
        assert_eq!(bundle.transaction.value, "1000");
        // cost = value + gas_limit * gas_price = 1000 + 50_000 * 2
        assert_eq!(bundle.transaction.cost, "101000");

        assert_eq!(bundle.events.len(), 2);
        assert_eq!(bundle.events[0].index, 0);
        assert_eq!(bundle.events[1].index, 1);
        assert_eq!(bundle.events[0].topics.len(), 2);
        assert_eq!(bundle.events[0].transaction_hash, tx_hash.to_string());
    }
}
