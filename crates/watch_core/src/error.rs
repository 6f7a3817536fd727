//! Error types for the sentinel core

use std::time::Duration;
use thiserror::Error;

/// Failures reported by a [`crate::Transport`] implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The local session lacks the privilege for this operation
    /// (e.g. it is not team leader).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Rate limited by the server")]
    RateLimited,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Not connected to the server")]
    NotConnected,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server returned an error: {0}")]
    Server(String),
}

impl TransportError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, TransportError::PermissionDenied(_))
    }
}

/// Cycle-level failures of the watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid map size {0}, expected a positive width")]
    InvalidMap(f64),
}

pub type TransportResult<T> = Result<T, TransportError>;
pub type WatchResult<T> = Result<T, WatchError>;
