#![cfg(not(tarpaulin_include))]

use clap::Parser;
use datavis::app;
use datavis::config::ServerConfig;

/// Main entry point for the web application
///
/// Reads settings from the command line and environment, sets up logging
/// (`RUST_LOG`, `info` by default) and serves until the process is stopped.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    app::run(config).await
}
