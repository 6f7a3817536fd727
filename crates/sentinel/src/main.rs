//! Sentinel entry point
//!
//! Loads settings and credentials, connects to the game server's companion
//! endpoint and runs the polling loop until interrupted.

mod cli;
mod config;
mod logging;
mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use companion_client::{ClientConfig, CompanionClient};
use tracing::info;
use watch_core::Watcher;

use crate::cli::Args;
use crate::config::{AppConfig, Credentials};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load_from_file(&args.config)
        .await
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?;
    config.validate().context("Configuration validation failed")?;

    let level = if args.debug { "debug" } else { config.logging.level.as_str() };
    logging::setup_logging(level, args.json_logs || config.logging.json_format)?;

    match &args.env_file {
        Some(path) => {
            dotenvy::from_path(path).with_context(|| format!("Failed to read env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    let credentials = Credentials::from_env().context("Missing companion credentials")?;

    let client_config = ClientConfig::new(
        credentials.server_ip,
        credentials.server_port,
        credentials.player_id,
        credentials.player_token,
    )
    .with_request_timeout(config.connection.request_timeout());

    info!("🚀 Sentinel v{} starting", env!("CARGO_PKG_VERSION"));
    info!("📂 Config: {} | Server: {}", args.config.display(), client_config.url());

    let watcher = Watcher::start(CompanionClient::new(client_config), config.watch.to_settings())
        .await
        .context("Failed to start watching the server")?;

    info!("✅ Sentinel is running, press Ctrl+C to stop");
    watcher.run(signals::shutdown_signal()).await;

    info!("👋 Sentinel shut down");
    Ok(())
}
