//! The quill binary: follows an Ethereum node and mirrors every confirmed
//! block, transaction and event log into a document store.

use clap::Parser;

pub mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run().await
}
