//! # Companion Client
//!
//! A [`watch_core::Transport`] implementation that talks to the game server's
//! companion endpoint over a WebSocket, one JSON request per call.
//!
//! Requests carry a sequence number and the player's credentials; responses
//! are matched back by sequence number and anything else on the socket
//! (server broadcasts, late replies to timed-out calls) is skipped.

pub mod client;
pub mod config;
pub mod protocol;

pub use client::CompanionClient;
pub use config::ClientConfig;
