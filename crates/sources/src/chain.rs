//! Number-addressed block and receipt fetching.

use crate::SourceError;
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, B256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::{Block, Transaction, TransactionReceipt};
use async_trait::async_trait;
use url::Url;

/// Read access to blocks, receipts and transaction senders on the node.
///
/// The main reason this trait exists is for mocking and unit testing; the
/// production implementation is [`AlloyChainSource`].
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Fetches the block at `number` with full transaction bodies.
    async fn block_with_transactions(&self, number: u64) -> Result<Block, SourceError>;

    /// Fetches the receipt for the given transaction hash.
    async fn transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt, SourceError>;

    /// Returns the sender of a fetched transaction.
    fn transaction_sender(&self, tx: &Transaction) -> Result<Address, SourceError>;
}

/// [`ChainSource`] implementation over an alloy [`RootProvider`].
#[derive(Debug, Clone)]
pub struct AlloyChainSource {
    provider: RootProvider,
}

impl AlloyChainSource {
    /// Creates a new source over an existing provider.
    pub const fn new(provider: RootProvider) -> Self {
        Self { provider }
    }

    /// Creates a new source over an HTTP provider for the given endpoint.
    pub fn new_http(url: Url) -> Self {
        Self { provider: RootProvider::new_http(url) }
    }
}

#[async_trait]
impl ChainSource for AlloyChainSource {
    async fn block_with_transactions(&self, number: u64) -> Result<Block, SourceError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .full()
            .await?
            .ok_or(SourceError::BlockNotFound(number))?;

        if !block.transactions.is_empty() && block.transactions.as_transactions().is_none() {
            return Err(SourceError::MissingTransactions(number));
        }
        Ok(block)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<TransactionReceipt, SourceError> {
        self.provider
            .get_transaction_receipt(hash)
            .await?
            .ok_or(SourceError::ReceiptNotFound(hash))
    }

    fn transaction_sender(&self, tx: &Transaction) -> Result<Address, SourceError> {
        // The envelope arrives signature-recovered from the RPC layer.
        Ok(tx.inner.signer())
    }
}
