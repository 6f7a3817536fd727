//! Command-line argument parsing for the sentinel binary.

use clap::Parser;
use std::path::PathBuf;

/// Watches a game server on behalf of one player and reports to team chat.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file path
    ///
    /// If the file doesn't exist, a default one is written there.
    #[arg(short, long, default_value = "sentinel.toml")]
    pub config: PathBuf,

    /// Enable debug logging, overriding the configured level
    #[arg(short, long)]
    pub debug: bool,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    /// Load credentials from this file instead of `./.env`
    #[arg(long, value_name = "FILE")]
    pub env_file: Option<PathBuf>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: PathBuf::from("sentinel.toml"),
            debug: false,
            json_logs: false,
            env_file: None,
        }
    }
}
