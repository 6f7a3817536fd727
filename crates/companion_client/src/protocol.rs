//! Wire format of the companion endpoint.
//!
//! Requests:
//!
//! ```json
//! { "seq": 4, "playerId": 76561198000000000, "playerToken": -1234, "getTeamInfo": {} }
//! ```
//!
//! Responses arrive wrapped in an envelope and carry exactly one payload or an
//! `error`:
//!
//! ```json
//! { "response": { "seq": 4, "error": { "error": "not_leader" } } }
//! ```

use serde::{Deserialize, Serialize};
use watch_core::{
    ChatMessage, MapInfo, MapMarker, MarkerKind, Monument, Position, ServerInfo, ServerTime, TeamInfo,
    TeamMember, TransportError, TransportResult,
};

use crate::config::ClientConfig;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRequest {
    pub seq: u32,
    pub player_id: u64,
    pub player_token: i64,
    #[serde(flatten)]
    pub body: RequestBody,
}

impl AppRequest {
    pub fn new(seq: u32, config: &ClientConfig, body: RequestBody) -> Self {
        Self {
            seq,
            player_id: config.player_id,
            player_token: config.player_token,
            body,
        }
    }
}

/// The single operation carried by a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestBody {
    GetInfo {},
    GetTime {},
    GetMap {},
    GetTeamInfo {},
    GetTeamChat {},
    GetMapMarkers {},
    SendTeamMessage {
        message: String,
    },
    PromoteToLeader {
        #[serde(rename = "steamId")]
        steam_id: u64,
    },
}

impl RequestBody {
    pub fn name(&self) -> &'static str {
        match self {
            RequestBody::GetInfo {} => "getInfo",
            RequestBody::GetTime {} => "getTime",
            RequestBody::GetMap {} => "getMap",
            RequestBody::GetTeamInfo {} => "getTeamInfo",
            RequestBody::GetTeamChat {} => "getTeamChat",
            RequestBody::GetMapMarkers {} => "getMapMarkers",
            RequestBody::SendTeamMessage { .. } => "sendTeamMessage",
            RequestBody::PromoteToLeader { .. } => "promoteToLeader",
        }
    }
}

/// Every frame the server sends. Broadcasts have no `response`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppMessage {
    #[serde(default)]
    pub response: Option<AppResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppResponse {
    pub seq: u32,
    #[serde(default)]
    pub error: Option<AppError>,
    #[serde(default)]
    pub info: Option<WireInfo>,
    #[serde(default)]
    pub time: Option<WireTime>,
    #[serde(default)]
    pub map: Option<WireMap>,
    #[serde(default)]
    pub team_info: Option<WireTeamInfo>,
    #[serde(default)]
    pub team_chat: Option<WireTeamChat>,
    #[serde(default)]
    pub map_markers: Option<WireMarkers>,
}

impl AppResponse {
    /// Turns an `error` payload into the matching [`TransportError`].
    pub fn into_result(self) -> TransportResult<Self> {
        match self.error {
            Some(AppError { error }) => Err(map_error(&error)),
            None => Ok(self),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppError {
    pub error: String,
}

pub fn map_error(code: &str) -> TransportError {
    match code {
        "access_denied" | "not_leader" | "no_team" | "no_player" => {
            TransportError::PermissionDenied(code.to_string())
        }
        "rate_limit" => TransportError::RateLimited,
        other => TransportError::Server(other.to_string()),
    }
}

/// Reports a response that lacks the payload its request asked for.
pub fn missing(field: &str) -> TransportError {
    TransportError::Protocol(format!("response is missing `{}`", field))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireInfo {
    pub players: u32,
    pub max_players: u32,
    #[serde(default)]
    pub queued_players: u32,
}

impl From<WireInfo> for ServerInfo {
    fn from(info: WireInfo) -> Self {
        ServerInfo {
            players: info.players,
            max_players: info.max_players,
            queued_players: info.queued_players,
        }
    }
}

/// In-game clock as fractional hours (`13.5` is half past one).
#[derive(Debug, Clone, Deserialize)]
pub struct WireTime {
    pub time: f64,
    pub sunrise: f64,
    pub sunset: f64,
}

impl From<WireTime> for ServerTime {
    fn from(time: WireTime) -> Self {
        ServerTime {
            current: clock_string(time.time),
            sunrise: clock_string(time.sunrise),
            sunset: clock_string(time.sunset),
        }
    }
}

/// Renders fractional hours as `HH:MM`, wrapping at midnight.
pub fn clock_string(hours: f64) -> String {
    let minutes = (hours.max(0.0) * 60.0).round() as u64 % (24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMap {
    pub width: f64,
    #[serde(default)]
    pub monuments: Vec<WireMonument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMonument {
    pub token: String,
    pub x: f64,
    pub y: f64,
}

impl From<WireMap> for MapInfo {
    fn from(map: WireMap) -> Self {
        MapInfo {
            width: map.width,
            monuments: map
                .monuments
                .into_iter()
                .map(|m| Monument { token: m.token, position: Position::new(m.x, m.y) })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTeamInfo {
    pub leader_steam_id: u64,
    #[serde(default)]
    pub members: Vec<WireMember>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMember {
    pub steam_id: u64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub is_online: bool,
    pub is_alive: bool,
}

impl From<WireTeamInfo> for TeamInfo {
    fn from(team: WireTeamInfo) -> Self {
        TeamInfo {
            leader_id: team.leader_steam_id,
            members: team
                .members
                .into_iter()
                .map(|m| TeamMember {
                    id: m.steam_id,
                    name: m.name,
                    position: Position::new(m.x, m.y),
                    is_online: m.is_online,
                    is_alive: m.is_alive,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireTeamChat {
    #[serde(default)]
    pub messages: Vec<WireChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireChatMessage {
    pub steam_id: u64,
    pub name: String,
    pub message: String,
    pub time: u64,
}

impl From<WireChatMessage> for ChatMessage {
    fn from(m: WireChatMessage) -> Self {
        ChatMessage {
            timestamp: m.time,
            sender_id: m.steam_id,
            sender_name: m.name,
            text: m.message,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMarkers {
    #[serde(default)]
    pub markers: Vec<WireMarker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMarker {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: i32,
    pub x: f64,
    pub y: f64,
}

/// Numeric marker types used by the companion API.
pub fn marker_kind(code: i32) -> MarkerKind {
    match code {
        2 => MarkerKind::Explosion,
        4 => MarkerKind::CargoPlane,
        5 => MarkerKind::CargoShip,
        8 => MarkerKind::PatrolHelicopter,
        _ => MarkerKind::Other,
    }
}

impl From<WireMarker> for MapMarker {
    fn from(m: WireMarker) -> Self {
        MapMarker {
            kind: marker_kind(m.kind),
            id: m.id,
            position: Position::new(m.x, m.y),
        }
    }
}
