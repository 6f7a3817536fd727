//! Tracked state owned by the watcher.
//!
//! Everything the sentinel remembers between cycles lives in [`TrackedState`].
//! Nothing here is persisted; a restart rebuilds it from the first snapshot.

use std::collections::{HashMap, HashSet};

use crate::types::{MemberId, Position, TeamMember, Timestamp};

/// Seconds a member must stay in place before being reported as AFK.
pub const AFK_THRESHOLD_SECS: u64 = 300;

/// Minimum per-axis displacement that counts as movement.
pub const MOVEMENT_EPSILON: f64 = 0.001;

/// Slack for `f64` subtraction at world-coordinate magnitudes, where
/// `2000.001 - 2000.0` comes out just below [`MOVEMENT_EPSILON`].
const MOVEMENT_TOLERANCE: f64 = 1e-9;

/// Presence-based de-duplication, for marker kinds the server reports without
/// a per-spawn identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceFlag(bool);

impl PresenceFlag {
    /// Records whether the marker is present this cycle and returns `true`
    /// only on the absent -> present edge.
    pub fn observe(&mut self, present: bool) -> bool {
        let rising = present && !self.0;
        self.0 = present;
        rising
    }

    pub fn is_set(&self) -> bool {
        self.0
    }
}

/// Identity-based de-duplication. Ids accumulate for the life of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenIds(HashSet<u64>);

impl SeenIds {
    /// Returns `true` the first time `id` is offered.
    pub fn first_sighting(&mut self, id: u64) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Cargo ship tracking. The ship id is compared when available; the presence
/// flag covers feeds that only report that a ship exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipTracking {
    pub last_id: Option<u64>,
    pub presence: PresenceFlag,
}

/// Derived, previous-value copy of one team member.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedMember {
    pub is_online: bool,
    pub last_position: Position,
    pub last_moved_at: Timestamp,
    pub afk_announced: bool,
    /// Set while the member is offline.
    pub offline_since: Option<Timestamp>,
    pub death_reported: bool,
}

impl TrackedMember {
    /// Baseline for a member seen for the first time. Nothing about the first
    /// sighting is announced, including a member who is already dead.
    pub fn first_sighting(member: &TeamMember, now: Timestamp) -> Self {
        Self {
            is_online: member.is_online,
            last_position: member.position,
            last_moved_at: now,
            afk_announced: false,
            offline_since: (!member.is_online).then_some(now),
            death_reported: !member.is_alive,
        }
    }

    /// Seconds since the last detected movement.
    pub fn stationary_for(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.last_moved_at)
    }

    pub fn is_afk(&self, now: Timestamp) -> bool {
        self.is_online && self.stationary_for(now) >= AFK_THRESHOLD_SECS
    }

    /// Whether `position` differs from the last recorded one by at least
    /// [`MOVEMENT_EPSILON`] on either axis.
    pub fn has_moved(&self, position: Position) -> bool {
        let threshold = MOVEMENT_EPSILON - MOVEMENT_TOLERANCE;
        (self.last_position.x - position.x).abs() >= threshold
            || (self.last_position.y - position.y).abs() >= threshold
    }

    /// Restarts the stationary clock at `position` and ends any AFK episode.
    pub fn record_movement(&mut self, position: Position, now: Timestamp) {
        self.last_position = position;
        self.last_moved_at = now;
        self.afk_announced = false;
    }
}

/// All state the sentinel carries between cycles.
#[derive(Debug, Clone, Default)]
pub struct TrackedState {
    pub(crate) members: HashMap<MemberId, TrackedMember>,
    pub patrol_heli: PresenceFlag,
    pub last_heli_spawn: Option<Timestamp>,
    pub cargo_ship: ShipTracking,
    pub last_cargo_sailing: Option<Timestamp>,
    pub seen_landings: SeenIds,
    pub seen_explosions: SeenIds,
    pub last_bradley_kill: Option<Timestamp>,
    /// Absolute expiry of the oil rig crate window.
    pub oil_rig_expires_at: Option<Timestamp>,
    seen_chat: HashSet<Timestamp>,
}

impl TrackedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member(&self, id: MemberId) -> Option<&TrackedMember> {
        self.members.get(&id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Marks a chat message as handled. Returns `false` if it was already
    /// processed in an earlier, overlapping chat window.
    pub fn mark_chat_seen(&mut self, timestamp: Timestamp) -> bool {
        self.seen_chat.insert(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(online: bool, alive: bool) -> TeamMember {
        TeamMember {
            id: 1,
            name: "rook".to_string(),
            position: Position::new(10.0, 10.0),
            is_online: online,
            is_alive: alive,
        }
    }

    #[test]
    fn test_presence_flag_edges() {
        let mut flag = PresenceFlag::default();
        assert!(flag.observe(true));
        assert!(!flag.observe(true));
        assert!(!flag.observe(false));
        assert!(!flag.is_set());
        assert!(flag.observe(true));
    }

    #[test]
    fn test_seen_ids() {
        let mut seen = SeenIds::default();
        assert!(seen.first_sighting(5));
        assert!(!seen.first_sighting(5));
        assert!(seen.first_sighting(6));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_first_sighting_baseline() {
        let offline = TrackedMember::first_sighting(&member(false, true), 100);
        assert_eq!(offline.offline_since, Some(100));
        assert!(!offline.death_reported);

        let dead = TrackedMember::first_sighting(&member(true, false), 100);
        assert_eq!(dead.offline_since, None);
        assert!(dead.death_reported);
    }

    #[test]
    fn test_movement_epsilon() {
        let mut tracked = TrackedMember::first_sighting(&member(true, true), 0);
        assert!(!tracked.has_moved(Position::new(10.0005, 10.0)));
        assert!(tracked.has_moved(Position::new(10.0, 10.01)));

        tracked.afk_announced = true;
        tracked.record_movement(Position::new(10.0, 10.01), 50);
        assert!(!tracked.afk_announced);
        assert_eq!(tracked.stationary_for(349), 299);
        assert!(!tracked.is_afk(349));
        assert!(tracked.is_afk(350));
    }

    #[test]
    fn test_movement_of_exactly_epsilon_at_map_scale() {
        let mut online = member(true, true);
        online.position = Position::new(2000.0, 3500.0);
        let tracked = TrackedMember::first_sighting(&online, 0);

        assert!(tracked.has_moved(Position::new(2000.001, 3500.0)));
        assert!(tracked.has_moved(Position::new(2000.0, 3499.999)));
        assert!(!tracked.has_moved(Position::new(2000.0009, 3500.0)));
    }

    #[test]
    fn test_chat_dedup() {
        let mut state = TrackedState::new();
        assert!(state.mark_chat_seen(1));
        assert!(!state.mark_chat_seen(1));
    }
}
