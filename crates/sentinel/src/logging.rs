//! Logging system setup
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` always wins over the
//! configured level.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn setup_logging(level: &str, json_format: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json_format {
        registry
            .with(fmt::layer().json().with_target(false))
            .try_init()?;
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()?;
    }

    Ok(())
}
