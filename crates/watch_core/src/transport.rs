//! Transport abstraction over the game server companion API.
//!
//! The core never talks to the network directly. Everything it needs from the
//! server goes through this trait so the polling loop can be driven by the
//! real WebSocket client or by an in-memory double in tests.

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::types::{ChatMessage, MapInfo, MapMarker, MemberId, ServerInfo, ServerTime, TeamInfo};

/// Connection to a single game server on behalf of one player session.
///
/// Implementations own their timeouts; the core treats every error as
/// recoverable at cycle granularity except where noted.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes the session. Failure at startup is fatal.
    async fn connect(&self) -> TransportResult<()>;

    /// Map size and monuments. Called once at startup.
    async fn get_map_info(&self) -> TransportResult<MapInfo>;

    async fn get_server_info(&self) -> TransportResult<ServerInfo>;

    /// Recent team chat. Consecutive calls may return overlapping windows.
    async fn get_team_chat(&self) -> TransportResult<Vec<ChatMessage>>;

    /// Team roster. May fail with [`crate::TransportError::PermissionDenied`].
    async fn get_team_info(&self) -> TransportResult<TeamInfo>;

    async fn get_markers(&self) -> TransportResult<Vec<MapMarker>>;

    async fn get_server_time(&self) -> TransportResult<ServerTime>;

    /// Broadcasts to the team channel. Failures are logged by the caller and
    /// never retried.
    async fn send_team_message(&self, text: &str) -> TransportResult<()>;

    /// May fail with [`crate::TransportError::PermissionDenied`].
    async fn promote_to_leader(&self, member: MemberId) -> TransportResult<()>;
}
