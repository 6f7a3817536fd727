//! Team notices produced by the reconciler and the polling loop.
//!
//! Each variant renders to the exact line posted in team chat. Keeping them
//! typed lets tests assert on what was detected instead of on message text.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    HeliSpawned { grid: String },
    CargoPlaneAtOilRig { grid: String },
    CargoPlaneDrop { grid: String },
    CargoShipSailing { grid: String },
    Explosion { grid: String },
    BradleyDestroyed { grid: String },
    MemberOnline { name: String },
    MemberOffline { name: String },
    MemberAfk { name: String },
    MemberDied { name: String, grid: String },
    OilRigTimerEnded,
    /// The roster query failed this cycle, usually because the session is
    /// not team leader.
    RosterUnavailable,
    ServerPopulation { players: u32, max_players: u32, queued: u32 },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::HeliSpawned { grid } => write!(f, ":lmg.m249: Patrol Helicopter is out at {}", grid),
            Notice::CargoPlaneAtOilRig { grid } => {
                write!(f, ":scientist: CH47 landed at an Oil Rig, someone is running it! ({})", grid)
            }
            Notice::CargoPlaneDrop { grid } => write!(f, ":scientist: CH47 dropping a crate at {}", grid),
            Notice::CargoShipSailing { grid } => write!(f, ":water.radioactive: Cargo Ship is sailing at {}", grid),
            Notice::Explosion { grid } => write!(f, ":exclamation: Explosion detected at {}", grid),
            Notice::BradleyDestroyed { grid } => write!(f, ":exclamation: Bradley APC destroyed at {}", grid),
            Notice::MemberOnline { name } => write!(f, "{} is now :wave: ONLINE :heart:", name),
            Notice::MemberOffline { name } => write!(f, "{} is now :wave: OFFLINE", name),
            Notice::MemberAfk { name } => write!(f, ":eyes: {} appears to be AFK.", name),
            Notice::MemberDied { name, grid } => write!(f, ":skull: {} died at {}", name, grid),
            Notice::OilRigTimerEnded => write!(f, "Oil Rig crate timer ended, stay alert!"),
            Notice::RosterUnavailable => write!(f, ":warning: Can't fetch team info, not leader."),
            Notice::ServerPopulation { players, max_players, queued } => {
                write!(f, "Server: {}/{} players, Queued: {}", players, max_players, queued)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_rendering() {
        let died = Notice::MemberDied { name: "rook".to_string(), grid: "K12".to_string() };
        assert_eq!(died.to_string(), ":skull: rook died at K12");

        let population = Notice::ServerPopulation { players: 120, max_players: 200, queued: 3 };
        assert_eq!(population.to_string(), "Server: 120/200 players, Queued: 3");
    }
}
