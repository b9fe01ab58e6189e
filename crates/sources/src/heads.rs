//! New-head delivery: push subscription and fixed-cadence polling.

use crate::SourceError;
use alloy_provider::{Provider, RootProvider};
use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use std::time::Duration;
use tokio::time;
use tracing::warn;
use url::Url;

/// How often the poll-mode source asks the node for its head.
const POLL_CADENCE: Duration = Duration::from_secs(1);

/// Deadline for a single poll attempt. Exceeding it is fatal.
const POLL_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivery of new chain heads, one block number at a time.
///
/// Exactly one implementation is selected when the process starts:
/// [`SubscribedHeads`] (push) or [`PolledHeads`] (poll). Errors from either
/// are irrecoverable; the caller is expected to propagate them to the
/// top-level supervisor rather than retry.
#[async_trait]
pub trait HeadSource: Send {
    /// Waits for the next head and returns its block number.
    async fn next_head(&mut self) -> Result<u64, SourceError>;
}

#[async_trait]
impl HeadSource for Box<dyn HeadSource> {
    async fn next_head(&mut self) -> Result<u64, SourceError> {
        (**self).next_head().await
    }
}

/// Push-mode head source over a WebSocket `newHeads` subscription.
///
/// A subscription that closes after successful establishment is a fatal
/// condition: live ordering can no longer be guaranteed once notifications
/// may have been dropped.
pub struct SubscribedHeads {
    stream: BoxStream<'static, alloy_rpc_types_eth::Header>,
}

impl std::fmt::Debug for SubscribedHeads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscribedHeads").finish_non_exhaustive()
    }
}

impl SubscribedHeads {
    /// Connects to the given WebSocket endpoint and subscribes to new heads.
    pub async fn connect(url: &Url) -> Result<Self, SourceError> {
        let provider: RootProvider = RootProvider::connect(url.as_str()).await?;
        let subscription = provider.subscribe_blocks().await?;
        Ok(Self { stream: subscription.into_stream().boxed() })
    }
}

#[async_trait]
impl HeadSource for SubscribedHeads {
    async fn next_head(&mut self) -> Result<u64, SourceError> {
        match self.stream.next().await {
            Some(header) => Ok(header.number),
            None => Err(SourceError::SubscriptionClosed("stream ended".to_string())),
        }
    }
}

/// Poll-mode head source for nodes without subscription support.
///
/// Asks for the node's head number on a fixed cadence and emits it only when
/// it increases. RPC failures mid-poll are logged and retried on the next
/// tick; an attempt that exceeds its deadline is fatal.
#[derive(Debug)]
pub struct PolledHeads {
    provider: RootProvider,
    last_seen: u64,
}

impl PolledHeads {
    /// Creates a poller over an existing provider.
    pub const fn new(provider: RootProvider) -> Self {
        Self { provider, last_seen: 0 }
    }

    /// Creates a poller over an HTTP provider for the given endpoint.
    pub fn new_http(url: Url) -> Self {
        Self::new(RootProvider::new_http(url))
    }
}

#[async_trait]
impl HeadSource for PolledHeads {
    async fn next_head(&mut self) -> Result<u64, SourceError> {
        loop {
            match time::timeout(POLL_ATTEMPT_TIMEOUT, self.provider.get_block_number()).await {
                Err(_) => return Err(SourceError::AttemptTimeout(POLL_ATTEMPT_TIMEOUT)),
                Ok(Err(err)) => {
                    warn!(target: "quill::heads", %err, "head poll failed, retrying");
                }
                Ok(Ok(number)) => {
                    if number > self.last_seen {
                        self.last_seen = number;
                        return Ok(number);
                    }
                }
            }
            time::sleep(POLL_CADENCE).await;
        }
    }
}
