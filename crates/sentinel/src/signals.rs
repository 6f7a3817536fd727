//! Signal handling for graceful shutdown.
//!
//! The polling loop races every cycle and every sleep against the future
//! returned by [`shutdown_signal`], so an interrupt stops the sentinel between
//! transport calls without waiting for the next poll.

use tokio::signal;
use tracing::{error, info};

/// Resolves once the process is asked to stop.
///
/// Intended as the shutdown future handed to `Watcher::run`.
///
/// # Platform Support
///
/// * **Unix platforms**: SIGINT and SIGTERM
/// * **Windows**: Ctrl+C
///
/// # Failure
///
/// If the handlers cannot be installed the error is logged and the future
/// never resolves; the process then has to be stopped externally.
pub async fn shutdown_signal() {
    if let Err(e) = wait_for_signal().await {
        error!("❌ Failed to install signal handlers: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Waits for the first termination signal.
///
/// # Returns
///
/// `Ok(())` when a signal arrives, or the I/O error from registering the
/// handlers.
async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        info!("📡 Received {}, stopping sentinel", name);
    }

    #[cfg(windows)]
    {
        signal::ctrl_c().await?;
        info!("📡 Received Ctrl+C, stopping sentinel");
    }

    Ok(())
}
