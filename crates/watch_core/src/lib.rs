//! # Watch Core - Team Sentinel Event Detection
//!
//! The state-reconciliation core of the team sentinel. It turns repeatedly
//! polled snapshots of a game server (team roster, map markers, team chat)
//! into a de-duplicated stream of human-readable team notices.
//!
//! ## Components
//!
//! * [`grid`] - converts world coordinates into map grid labels like `K12`
//! * [`duration`] - renders second counts as `3m 12s` / `1h 4m`
//! * [`commands`] - chat command parsing and handlers (`.heli`, `.team`, ...)
//! * [`reconciler`] - the per-cycle state machine producing [`Notice`]s
//! * [`watcher`] - the polling loop that drives everything over a [`Transport`]
//!
//! ## Ownership
//!
//! All tracking data lives in a single [`TrackedState`] owned by the
//! [`Watcher`]. The reconciler receives it by `&mut`, command handlers by `&`,
//! so cycles can never overlap and no locking is needed.
//!
//! ## Error Handling
//!
//! Transport failures are reported as [`TransportError`]. Permission-style
//! failures on the roster query and leader promotion are recovered locally and
//! turned into chat notices; everything else aborts the current cycle as a
//! [`WatchError`] and the loop retries after a short backoff.

pub use commands::{Command, CommandContext};
pub use error::{TransportError, TransportResult, WatchError, WatchResult};
pub use notice::Notice;
pub use reconciler::{MapContext, Reconciler};
pub use state::{PresenceFlag, SeenIds, TrackedMember, TrackedState};
pub use transport::Transport;
pub use types::*;
pub use watcher::{CycleReport, WatchSettings, Watcher};

pub mod commands;
pub mod duration;
pub mod error;
pub mod grid;
pub mod notice;
pub mod reconciler;
pub mod state;
pub mod transport;
pub mod types;
pub mod watcher;

/// Current wall-clock time in whole Unix seconds.
pub fn current_timestamp() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
