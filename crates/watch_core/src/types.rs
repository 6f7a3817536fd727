//! Snapshot types returned by the transport.
//!
//! These are plain data carriers owned by the upstream snapshot. The core only
//! keeps derived copies of them inside [`crate::TrackedState`].

use serde::{Deserialize, Serialize};

/// Stable identity of a team member (the platform account id).
pub type MemberId = u64;

/// Whole seconds since the Unix epoch.
pub type Timestamp = u64;

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other` after scaling both points by `map_size`,
    /// so that 1.0 spans the whole map.
    pub fn normalized_distance(&self, other: Position, map_size: f64) -> f64 {
        let dx = (self.x - other.x) / map_size;
        let dy = (self.y - other.y) / map_size;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One member of the local team as reported by the roster query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: MemberId,
    pub name: String,
    pub position: Position,
    pub is_online: bool,
    pub is_alive: bool,
}

/// Result of the roster query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub leader_id: MemberId,
    pub members: Vec<TeamMember>,
}

/// Kinds of map markers the sentinel cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    PatrolHelicopter,
    Explosion,
    /// CH47 cargo plane dropping a locked crate.
    CargoPlane,
    CargoShip,
    Other,
}

/// A transient entity visible on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub kind: MarkerKind,
    /// Unique per spawn instance when the server provides it.
    pub id: Option<u64>,
    pub position: Position,
}

impl MapMarker {
    /// Identity used for de-duplication.
    ///
    /// Markers without a server id fall back to their rounded position, which
    /// is stable for stationary events such as explosions.
    pub fn dedup_key(&self) -> u64 {
        match self.id {
            Some(id) => id,
            None => {
                let x = self.position.x.round() as i64 as u64;
                let y = self.position.y.round() as i64 as u64;
                (x << 32) ^ (y & 0xFFFF_FFFF)
            }
        }
    }
}

/// A named landmark on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monument {
    pub token: String,
    pub position: Position,
}

const OIL_RIG_TOKENS: [&str; 4] = ["large oil rig", "small oil rig", "large_oil_rig", "oil_rig_small"];
const LAUNCH_SITE_TOKENS: [&str; 2] = ["launch site", "launchsite"];

impl Monument {
    pub fn is_oil_rig(&self) -> bool {
        let token = self.token.to_lowercase();
        OIL_RIG_TOKENS.contains(&token.as_str())
    }

    pub fn is_launch_site(&self) -> bool {
        let token = self.token.to_lowercase();
        LAUNCH_SITE_TOKENS.contains(&token.as_str())
    }
}

/// Static map description, fetched once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    /// Side length of the square map in world units.
    pub width: f64,
    pub monuments: Vec<Monument>,
}

/// Server population figures used by the periodic broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub players: u32,
    pub max_players: u32,
    pub queued_players: u32,
}

/// In-game clock, all values as `HH:MM[:SS]` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerTime {
    pub current: String,
    pub sunrise: String,
    pub sunset: String,
}

/// One line of team chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Send time; doubles as the de-duplication key.
    pub timestamp: Timestamp,
    pub sender_id: MemberId,
    pub sender_name: String,
    pub text: String,
}
