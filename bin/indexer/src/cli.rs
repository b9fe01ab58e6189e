//! Contains the indexer CLI.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use quill_sources::{AlloyChainSource, HeadSource, PolledHeads, SubscribedHeads};
use quill_storage::MongoStore;
use quill_sync::{HeadListener, IndexerConfig};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

/// The indexer CLI.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (0-2)
    #[arg(long, short, action = ArgAction::Count)]
    pub v: u8,

    /// HTTP JSON-RPC endpoint of the node to index.
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Url,

    /// WebSocket endpoint for new-head subscriptions. When omitted, heads
    /// are polled over the HTTP endpoint instead.
    #[arg(long, env = "WS_URL")]
    pub ws_url: Option<Url>,

    /// MongoDB connection string.
    #[arg(long, env = "MONGO_URI")]
    pub mongo_uri: String,

    /// Database holding the block, transaction and event collections.
    #[arg(long, env = "DB_NAME", default_value = "quill")]
    pub db_name: String,

    /// Worker slots per hardware thread.
    #[arg(long, env = "CONCURRENCY", default_value_t = 2)]
    pub concurrency: usize,

    /// Blocks a head must be buried under before it is ingested.
    #[arg(long, env = "CONFIRMATIONS", default_value_t = 12)]
    pub confirmations: u64,

    /// Deadline for a single fetch-and-persist job, in minutes.
    #[arg(long, env = "JOB_TIMEOUT", default_value_t = 5)]
    pub job_timeout: u64,
}

impl Cli {
    /// Runs the indexer until shutdown or a fatal error.
    pub async fn run(self) -> Result<()> {
        self.init_telemetry();

        let store = MongoStore::connect(&self.mongo_uri, &self.db_name)
            .await
            .context("failed to connect to the document store")?;
        let source = Arc::new(AlloyChainSource::new_http(self.rpc_url.clone()));
        let heads = self.head_source().await;

        let config = IndexerConfig {
            confirmation_depth: self.confirmations,
            concurrency: self.concurrency,
            job_timeout: Duration::from_secs(self.job_timeout * 60),
        };

        let cancellation = CancellationToken::new();
        tokio::spawn({
            let cancellation = cancellation.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!(target: "quill", "shutdown signal received");
                    cancellation.cancel();
                }
            }
        });

        HeadListener::new(heads, source, Arc::new(store), config, cancellation)
            .start()
            .await
            .context("head listener stopped")
    }

    /// Selects the head delivery mode: subscription when a WebSocket
    /// endpoint is configured and reachable, polling otherwise. The
    /// fallback happens once, at startup.
    async fn head_source(&self) -> Box<dyn HeadSource> {
        if let Some(ws_url) = &self.ws_url {
            match SubscribedHeads::connect(ws_url).await {
                Ok(heads) => {
                    info!(target: "quill", %ws_url, "subscribed to new heads");
                    return Box::new(heads);
                }
                Err(err) => {
                    warn!(target: "quill", %ws_url, %err, "subscription failed, polling instead");
                }
            }
        }
        info!(target: "quill", rpc_url = %self.rpc_url, "polling for new heads");
        Box::new(PolledHeads::new_http(self.rpc_url.clone()))
    }

    fn init_telemetry(&self) {
        let default = match self.v {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
