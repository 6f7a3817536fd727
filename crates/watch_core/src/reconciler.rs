//! # Event Reconciler
//!
//! Compares each new snapshot of map markers and team roster against the
//! [`TrackedState`] and produces the notices worth posting to team chat.
//!
//! ## Evaluation Order
//!
//! Rules run in a fixed order every cycle, which is also the order notices
//! are posted in:
//!
//! 1. Patrol helicopter presence (presence flag)
//! 2. Cargo plane landings (identity set, oil rig proximity)
//! 3. Cargo ship sailing (last identity)
//! 4. Explosions (identity set, Bradley classification at the Launch Site)
//! 5. Roster: online/offline, AFK, deaths
//! 6. Oil rig crate timer expiry
//!
//! Feeding the same snapshot twice yields no notices the second time.

use tracing::{debug, info};

use crate::grid::grid_label;
use crate::notice::Notice;
use crate::state::{TrackedMember, TrackedState};
use crate::types::{MapInfo, MapMarker, MarkerKind, Position, TeamMember, Timestamp};

/// Normalized distance under which a cargo plane counts as landing on a rig.
pub const OIL_RIG_RADIUS: f64 = 0.03;

/// Normalized distance under which an explosion counts as a Bradley kill.
pub const LAUNCH_SITE_RADIUS: f64 = 0.08;

/// Length of the oil rig locked crate window.
pub const OIL_RIG_WINDOW_SECS: u64 = 900;

/// Static map facts resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct MapContext {
    pub size: f64,
    pub oil_rigs: Vec<Position>,
    pub launch_site: Option<Position>,
}

impl MapContext {
    /// Picks the oil rigs and the Launch Site out of the monument list.
    pub fn from_map_info(info: &MapInfo) -> Self {
        Self {
            size: info.width,
            oil_rigs: info
                .monuments
                .iter()
                .filter(|m| m.is_oil_rig())
                .map(|m| m.position)
                .collect(),
            launch_site: info.monuments.iter().find(|m| m.is_launch_site()).map(|m| m.position),
        }
    }

    pub fn grid(&self, position: Position) -> String {
        grid_label(position.x, position.y, self.size)
    }

    pub fn near_oil_rig(&self, position: Position) -> bool {
        self.oil_rigs
            .iter()
            .any(|rig| position.normalized_distance(*rig, self.size) < OIL_RIG_RADIUS)
    }

    pub fn near_launch_site(&self, position: Position) -> bool {
        self.launch_site
            .is_some_and(|site| position.normalized_distance(site, self.size) < LAUNCH_SITE_RADIUS)
    }
}

/// The per-cycle state machine.
#[derive(Debug, Clone)]
pub struct Reconciler {
    map: MapContext,
}

impl Reconciler {
    pub fn new(map: MapContext) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &MapContext {
        &self.map
    }

    /// Runs every detection rule against one snapshot.
    ///
    /// # Arguments
    ///
    /// * `state` - Tracked state carried between cycles, updated in place
    /// * `markers` - Map markers from this cycle's snapshot
    /// * `roster` - Team members, or `None` when the roster query failed
    /// * `now` - Unix seconds of the snapshot
    ///
    /// # Returns
    ///
    /// Notices in posting order. Without a roster a single
    /// [`Notice::RosterUnavailable`] takes the roster step's place and
    /// per-member state is left untouched; all other rules still run.
    pub fn reconcile(
        &self,
        state: &mut TrackedState,
        markers: &[MapMarker],
        roster: Option<&[TeamMember]>,
        now: Timestamp,
    ) -> Vec<Notice> {
        let mut notices = Vec::new();

        self.track_patrol_heli(state, markers, now, &mut notices);
        self.track_cargo_planes(state, markers, now, &mut notices);
        self.track_cargo_ship(state, markers, now, &mut notices);
        self.track_explosions(state, markers, now, &mut notices);

        match roster {
            Some(members) => self.reconcile_roster(state, members, now, &mut notices),
            None => notices.push(Notice::RosterUnavailable),
        }

        self.check_oil_rig_timer(state, now, &mut notices);

        if !notices.is_empty() {
            debug!("Reconciled snapshot into {} notices", notices.len());
        }
        notices
    }

    fn track_patrol_heli(
        &self,
        state: &mut TrackedState,
        markers: &[MapMarker],
        now: Timestamp,
        notices: &mut Vec<Notice>,
    ) {
        let heli = markers.iter().find(|m| m.kind == MarkerKind::PatrolHelicopter);
        if state.patrol_heli.observe(heli.is_some()) {
            if let Some(heli) = heli {
                let grid = self.map.grid(heli.position);
                info!("🚁 Patrol helicopter spawned at {}", grid);
                state.last_heli_spawn = Some(now);
                notices.push(Notice::HeliSpawned { grid });
            }
        }
    }

    fn track_cargo_planes(
        &self,
        state: &mut TrackedState,
        markers: &[MapMarker],
        now: Timestamp,
        notices: &mut Vec<Notice>,
    ) {
        for plane in markers.iter().filter(|m| m.kind == MarkerKind::CargoPlane) {
            if !state.seen_landings.first_sighting(plane.dedup_key()) {
                continue;
            }
            let grid = self.map.grid(plane.position);
            if self.map.near_oil_rig(plane.position) {
                info!("🛢️ CH47 landing at oil rig near {}", grid);
                state.oil_rig_expires_at = Some(now + OIL_RIG_WINDOW_SECS);
                notices.push(Notice::CargoPlaneAtOilRig { grid });
            } else {
                notices.push(Notice::CargoPlaneDrop { grid });
            }
        }
    }

    fn track_cargo_ship(
        &self,
        state: &mut TrackedState,
        markers: &[MapMarker],
        now: Timestamp,
        notices: &mut Vec<Notice>,
    ) {
        let ship = markers.iter().find(|m| m.kind == MarkerKind::CargoShip);
        let appeared = state.cargo_ship.presence.observe(ship.is_some());
        let Some(ship) = ship else {
            return;
        };

        // No recorded id also announces, so a ship already at sea on startup
        // is reported on the first poll.
        let is_new = match ship.id {
            Some(id) => state.cargo_ship.last_id != Some(id),
            None => appeared,
        };
        if is_new {
            let grid = self.map.grid(ship.position);
            info!("🚢 Cargo ship sailing at {}", grid);
            if ship.id.is_some() {
                state.cargo_ship.last_id = ship.id;
            }
            state.last_cargo_sailing = Some(now);
            notices.push(Notice::CargoShipSailing { grid });
        }
    }

    fn track_explosions(
        &self,
        state: &mut TrackedState,
        markers: &[MapMarker],
        now: Timestamp,
        notices: &mut Vec<Notice>,
    ) {
        for explosion in markers.iter().filter(|m| m.kind == MarkerKind::Explosion) {
            if !state.seen_explosions.first_sighting(explosion.dedup_key()) {
                continue;
            }
            let grid = self.map.grid(explosion.position);
            if self.map.near_launch_site(explosion.position) {
                info!("💥 Bradley APC destroyed at {}", grid);
                state.last_bradley_kill = Some(now);
                notices.push(Notice::BradleyDestroyed { grid });
            } else {
                notices.push(Notice::Explosion { grid });
            }
        }
    }

    fn reconcile_roster(
        &self,
        state: &mut TrackedState,
        members: &[TeamMember],
        now: Timestamp,
        notices: &mut Vec<Notice>,
    ) {
        for member in members {
            let Some(tracked) = state.members.get_mut(&member.id) else {
                debug!("First sighting of team member {} ({})", member.name, member.id);
                state
                    .members
                    .insert(member.id, TrackedMember::first_sighting(member, now));
                continue;
            };

            if tracked.is_online != member.is_online {
                tracked.is_online = member.is_online;
                if member.is_online {
                    info!("👋 {} came online", member.name);
                    tracked.offline_since = None;
                    tracked.record_movement(member.position, now);
                    notices.push(Notice::MemberOnline { name: member.name.clone() });
                } else {
                    info!("👋 {} went offline", member.name);
                    tracked.offline_since = Some(now);
                    notices.push(Notice::MemberOffline { name: member.name.clone() });
                }
            }

            if member.is_online {
                if tracked.has_moved(member.position) {
                    tracked.record_movement(member.position, now);
                } else if tracked.is_afk(now) && !tracked.afk_announced {
                    info!("💤 {} is AFK", member.name);
                    tracked.afk_announced = true;
                    notices.push(Notice::MemberAfk { name: member.name.clone() });
                }
            }

            if !member.is_alive {
                if !tracked.death_reported {
                    tracked.death_reported = true;
                    notices.push(Notice::MemberDied {
                        name: member.name.clone(),
                        grid: self.map.grid(member.position),
                    });
                }
            } else {
                tracked.death_reported = false;
            }
        }
    }

    fn check_oil_rig_timer(&self, state: &mut TrackedState, now: Timestamp, notices: &mut Vec<Notice>) {
        if let Some(expires_at) = state.oil_rig_expires_at {
            if now >= expires_at {
                state.oil_rig_expires_at = None;
                notices.push(Notice::OilRigTimerEnded);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Monument;

    const MAP_SIZE: f64 = 4000.0;

    fn reconciler() -> Reconciler {
        Reconciler::new(MapContext::from_map_info(&MapInfo {
            width: MAP_SIZE,
            monuments: vec![
                Monument { token: "large oil rig".to_string(), position: Position::new(3800.0, 200.0) },
                Monument { token: "launchsite".to_string(), position: Position::new(1000.0, 1000.0) },
            ],
        }))
    }

    fn marker(kind: MarkerKind, id: Option<u64>, x: f64, y: f64) -> MapMarker {
        MapMarker { kind, id, position: Position::new(x, y) }
    }

    fn member(id: u64, x: f64, y: f64, online: bool, alive: bool) -> TeamMember {
        TeamMember {
            id,
            name: format!("member{}", id),
            position: Position::new(x, y),
            is_online: online,
            is_alive: alive,
        }
    }

    #[test]
    fn test_heli_announced_once_per_presence() {
        let r = reconciler();
        let mut state = TrackedState::new();
        let heli = vec![marker(MarkerKind::PatrolHelicopter, None, 500.0, 500.0)];
        let moved = vec![marker(MarkerKind::PatrolHelicopter, None, 900.0, 700.0)];

        let first = r.reconcile(&mut state, &heli, Some(&[]), 10);
        assert!(matches!(first.as_slice(), [Notice::HeliSpawned { .. }]));
        assert_eq!(state.last_heli_spawn, Some(10));

        assert!(r.reconcile(&mut state, &moved, Some(&[]), 20).is_empty());
        assert!(r.reconcile(&mut state, &[], Some(&[]), 30).is_empty());

        let again = r.reconcile(&mut state, &heli, Some(&[]), 40);
        assert_eq!(again.len(), 1);
        assert_eq!(state.last_heli_spawn, Some(40));
    }

    #[test]
    fn test_cargo_plane_oil_rig_window() {
        let r = reconciler();
        let mut state = TrackedState::new();
        let at_rig = vec![marker(MarkerKind::CargoPlane, Some(1), 3810.0, 210.0)];
        let elsewhere = vec![marker(MarkerKind::CargoPlane, Some(2), 2000.0, 2000.0)];

        let notices = r.reconcile(&mut state, &at_rig, Some(&[]), 100);
        assert!(matches!(notices.as_slice(), [Notice::CargoPlaneAtOilRig { .. }]));
        assert_eq!(state.oil_rig_expires_at, Some(100 + OIL_RIG_WINDOW_SECS));

        assert!(r.reconcile(&mut state, &at_rig, Some(&[]), 110).is_empty());

        let notices = r.reconcile(&mut state, &elsewhere, Some(&[]), 120);
        assert!(matches!(notices.as_slice(), [Notice::CargoPlaneDrop { .. }]));

        assert!(r.reconcile(&mut state, &[], Some(&[]), 999).is_empty());
        let expired = r.reconcile(&mut state, &[], Some(&[]), 1000);
        assert_eq!(expired, vec![Notice::OilRigTimerEnded]);
        assert_eq!(state.oil_rig_expires_at, None);
    }

    #[test]
    fn test_cargo_ship_identity() {
        let r = reconciler();
        let mut state = TrackedState::new();
        let ship = vec![marker(MarkerKind::CargoShip, Some(77), 100.0, 100.0)];
        let next_ship = vec![marker(MarkerKind::CargoShip, Some(78), 100.0, 100.0)];

        // First poll reports the ship already at sea.
        assert_eq!(r.reconcile(&mut state, &ship, Some(&[]), 5).len(), 1);
        assert_eq!(state.last_cargo_sailing, Some(5));
        assert!(r.reconcile(&mut state, &ship, Some(&[]), 15).is_empty());
        assert_eq!(r.reconcile(&mut state, &next_ship, Some(&[]), 25).len(), 1);
        assert_eq!(state.cargo_ship.last_id, Some(78));
    }

    #[test]
    fn test_cargo_ship_without_identity_uses_presence() {
        let r = reconciler();
        let mut state = TrackedState::new();
        let ship = vec![marker(MarkerKind::CargoShip, None, 100.0, 100.0)];

        assert_eq!(r.reconcile(&mut state, &ship, Some(&[]), 5).len(), 1);
        assert!(r.reconcile(&mut state, &ship, Some(&[]), 15).is_empty());
        assert!(r.reconcile(&mut state, &[], Some(&[]), 25).is_empty());
        assert_eq!(r.reconcile(&mut state, &ship, Some(&[]), 35).len(), 1);
    }

    #[test]
    fn test_explosions_and_bradley() {
        let r = reconciler();
        let mut state = TrackedState::new();
        let markers = vec![
            marker(MarkerKind::Explosion, Some(10), 2500.0, 2500.0),
            marker(MarkerKind::Explosion, Some(11), 1050.0, 980.0),
        ];

        let notices = r.reconcile(&mut state, &markers, Some(&[]), 60);
        assert!(matches!(
            notices.as_slice(),
            [Notice::Explosion { .. }, Notice::BradleyDestroyed { .. }]
        ));
        assert_eq!(state.last_bradley_kill, Some(60));
        assert!(r.reconcile(&mut state, &markers, Some(&[]), 70).is_empty());
        assert_eq!(state.seen_explosions.len(), 2);
    }

    #[test]
    fn test_first_sighting_is_silent() {
        let r = reconciler();
        let mut state = TrackedState::new();
        let roster = vec![member(1, 0.0, 0.0, true, true), member(2, 0.0, 0.0, false, false)];

        assert!(r.reconcile(&mut state, &[], Some(&roster), 0).is_empty());
        assert_eq!(state.member_count(), 2);
        assert_eq!(state.member(2).and_then(|m| m.offline_since), Some(0));
    }

    #[test]
    fn test_online_offline_transitions() {
        let r = reconciler();
        let mut state = TrackedState::new();
        r.reconcile(&mut state, &[], Some(&[member(1, 0.0, 0.0, true, true)]), 0);

        let notices = r.reconcile(&mut state, &[], Some(&[member(1, 0.0, 0.0, false, true)]), 10);
        assert_eq!(notices, vec![Notice::MemberOffline { name: "member1".to_string() }]);
        assert_eq!(state.member(1).and_then(|m| m.offline_since), Some(10));

        let notices = r.reconcile(&mut state, &[], Some(&[member(1, 0.0, 0.0, true, true)]), 20);
        assert_eq!(notices, vec![Notice::MemberOnline { name: "member1".to_string() }]);
        assert_eq!(state.member(1).and_then(|m| m.offline_since), None);
    }

    #[test]
    fn test_afk_lifecycle() {
        let r = reconciler();
        let mut state = TrackedState::new();
        let still = [member(1, 100.0, 100.0, true, true)];
        let moved = [member(1, 100.5, 100.0, true, true)];

        r.reconcile(&mut state, &[], Some(&still), 1000);
        assert!(r.reconcile(&mut state, &[], Some(&still), 1299).is_empty());

        let notices = r.reconcile(&mut state, &[], Some(&still), 1300);
        assert_eq!(notices, vec![Notice::MemberAfk { name: "member1".to_string() }]);
        assert!(r.reconcile(&mut state, &[], Some(&still), 1600).is_empty());

        // Movement ends the episode; a fresh one needs another full window.
        assert!(r.reconcile(&mut state, &[], Some(&moved), 1700).is_empty());
        assert!(!state.member(1).map(|m| m.afk_announced).unwrap_or(true));
        assert!(r.reconcile(&mut state, &[], Some(&moved), 1999).is_empty());
        assert_eq!(r.reconcile(&mut state, &[], Some(&moved), 2000).len(), 1);
    }

    #[test]
    fn test_minimal_move_restarts_stationary_clock() {
        let r = reconciler();
        let mut state = TrackedState::new();

        r.reconcile(&mut state, &[], Some(&[member(1, 2000.0, 2000.0, true, true)]), 0);
        let nudged = [member(1, 2000.001, 2000.0, true, true)];
        assert!(r.reconcile(&mut state, &[], Some(&nudged), 200).is_empty());
        assert!(r.reconcile(&mut state, &[], Some(&nudged), 300).is_empty());
        assert_eq!(r.reconcile(&mut state, &[], Some(&nudged), 500).len(), 1);
    }

    #[test]
    fn test_offline_members_never_go_afk() {
        let r = reconciler();
        let mut state = TrackedState::new();
        let offline = [member(1, 100.0, 100.0, false, true)];

        r.reconcile(&mut state, &[], Some(&offline), 0);
        assert!(r.reconcile(&mut state, &[], Some(&offline), 10_000).is_empty());
    }

    #[test]
    fn test_death_lifecycle() {
        let r = reconciler();
        let mut state = TrackedState::new();
        let alive = [member(1, 0.0, 0.0, true, true)];
        let dead = [member(1, 0.0, 0.0, true, false)];

        r.reconcile(&mut state, &[], Some(&alive), 0);
        let notices = r.reconcile(&mut state, &[], Some(&dead), 10);
        assert!(matches!(notices.as_slice(), [Notice::MemberDied { .. }]));
        assert!(r.reconcile(&mut state, &[], Some(&dead), 20).is_empty());

        assert!(r.reconcile(&mut state, &[], Some(&alive), 30).is_empty());
        assert_eq!(r.reconcile(&mut state, &[], Some(&dead), 40).len(), 1);
    }

    #[test]
    fn test_roster_unavailable_keeps_member_state() {
        let r = reconciler();
        let mut state = TrackedState::new();
        r.reconcile(&mut state, &[], Some(&[member(1, 0.0, 0.0, true, true)]), 0);
        let before = state.member(1).cloned();

        let heli = vec![marker(MarkerKind::PatrolHelicopter, None, 10.0, 10.0)];
        let notices = r.reconcile(&mut state, &heli, None, 400);

        assert_eq!(notices.len(), 2);
        assert!(matches!(notices[0], Notice::HeliSpawned { .. }));
        assert_eq!(notices[1], Notice::RosterUnavailable);
        assert_eq!(state.member(1).cloned(), before);
    }

    #[test]
    fn test_identical_snapshot_is_idempotent() {
        let r = reconciler();
        let mut state = TrackedState::new();
        let markers = vec![
            marker(MarkerKind::PatrolHelicopter, None, 10.0, 10.0),
            marker(MarkerKind::CargoPlane, Some(3), 3800.0, 200.0),
            marker(MarkerKind::CargoShip, Some(4), 50.0, 50.0),
            marker(MarkerKind::Explosion, Some(5), 2000.0, 2000.0),
        ];
        r.reconcile(&mut state, &[], Some(&[member(1, 0.0, 0.0, true, true)]), 0);
        let roster = [member(1, 0.0, 0.0, true, false)];

        let first = r.reconcile(&mut state, &markers, Some(&roster), 400);
        assert_eq!(first.len(), 6);
        assert!(r.reconcile(&mut state, &markers, Some(&roster), 400).is_empty());
    }
}
