//! # Chat Commands
//!
//! Team members can query the sentinel from team chat with dot-prefixed
//! commands. Each message is resolved once into a [`Command`] and dispatched
//! to exactly one handler, which produces at most one reply line.
//!
//! Handlers read the [`TrackedState`] but never mutate it. Commands that need
//! live data (`.team`, `.time`, `.offline`, `.leader`) query the transport
//! directly and recover permission-style failures into friendly replies.

use tracing::{debug, warn};

use crate::duration::format_duration;
use crate::error::{TransportError, WatchResult};
use crate::state::TrackedState;
use crate::transport::Transport;
use crate::types::{ChatMessage, ServerTime, Timestamp};

/// Bradley APC respawn window after a kill.
pub const BRADLEY_RESPAWN_SECS: u64 = 3600;

const TEAM_QUERY_FAILED: &str = "⚠️ Could not get team info. Possibly rate limited.";

/// Every command the sentinel understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Heli,
    Bradley,
    Team,
    Cargo,
    Time,
    Offline,
    Leader,
    Help,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Heli,
        Command::Bradley,
        Command::Team,
        Command::Cargo,
        Command::Time,
        Command::Offline,
        Command::Leader,
        Command::Help,
    ];

    /// The chat trigger, including the leading dot.
    pub fn name(self) -> &'static str {
        match self {
            Command::Heli => ".heli",
            Command::Bradley => ".bradley",
            Command::Team => ".team",
            Command::Cargo => ".cargo",
            Command::Time => ".time",
            Command::Offline => ".offline",
            Command::Leader => ".leader",
            Command::Help => ".help",
        }
    }

    /// Case-insensitive prefix match against the trimmed message text.
    ///
    /// # Examples
    ///
    /// ```
    /// use watch_core::Command;
    ///
    /// assert_eq!(Command::parse("  .Heli now?"), Some(Command::Heli));
    /// assert_eq!(Command::parse("heli"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        Self::ALL.into_iter().find(|command| text.starts_with(command.name()))
    }

    /// Runs the handler for this command and returns the reply, if any.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Transport, tracked state and current time
    /// * `message` - The chat line that triggered the command; `.leader`
    ///   promotes its sender
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the command has nothing to report yet (e.g. `.heli`
    /// before any sighting). Query failures become friendly replies, except a
    /// non-permission failure of `.leader`, which is returned as an error.
    pub async fn execute<T>(self, ctx: &CommandContext<'_, T>, message: &ChatMessage) -> WatchResult<Option<String>>
    where
        T: Transport + ?Sized,
    {
        debug!("Handling {} from {}", self.name(), message.sender_name);
        match self {
            Command::Heli => Ok(heli_reply(ctx.state, ctx.now)),
            Command::Bradley => Ok(bradley_reply(ctx.state, ctx.now)),
            Command::Team => Ok(Some(team_reply(ctx).await)),
            Command::Cargo => Ok(cargo_reply(ctx.state, ctx.now)),
            Command::Time => Ok(Some(time_reply(ctx).await)),
            Command::Offline => Ok(Some(offline_reply(ctx).await)),
            Command::Leader => leader_reply(ctx, message).await.map(Some),
            Command::Help => Ok(Some(help_reply())),
        }
    }
}

/// Read access to everything a handler may need.
pub struct CommandContext<'a, T: Transport + ?Sized> {
    pub transport: &'a T,
    pub state: &'a TrackedState,
    pub now: Timestamp,
}

impl<'a, T: Transport + ?Sized> CommandContext<'a, T> {
    pub fn new(transport: &'a T, state: &'a TrackedState, now: Timestamp) -> Self {
        Self { transport, state, now }
    }
}

fn heli_reply(state: &TrackedState, now: Timestamp) -> Option<String> {
    state.last_heli_spawn.map(|spawned| {
        format!(":lmg.m249: Last Patrol Heli: {} ago", format_duration(now.saturating_sub(spawned)))
    })
}

fn bradley_reply(state: &TrackedState, now: Timestamp) -> Option<String> {
    let killed = state.last_bradley_kill?;
    let remaining = BRADLEY_RESPAWN_SECS.saturating_sub(now.saturating_sub(killed));
    if remaining > 0 {
        Some(format!(":lmg.m249: Bradley respawn in: {}", format_duration(remaining)))
    } else {
        Some(":lmg.m249: Bradley is ready to spawn!".to_string())
    }
}

fn cargo_reply(state: &TrackedState, now: Timestamp) -> Option<String> {
    state.last_cargo_sailing.map(|sailed| {
        format!(":water.radioactive: Last Cargo: {} ago", format_duration(now.saturating_sub(sailed)))
    })
}

async fn team_reply<T: Transport + ?Sized>(ctx: &CommandContext<'_, T>) -> String {
    let team = match ctx.transport.get_team_info().await {
        Ok(team) => team,
        Err(e) => {
            warn!("Team query for .team failed: {}", e);
            return TEAM_QUERY_FAILED.to_string();
        }
    };

    let mut online = Vec::new();
    let mut afk = Vec::new();
    for member in team.members.iter().filter(|m| m.is_online) {
        let is_afk = ctx.state.member(member.id).is_some_and(|tracked| tracked.is_afk(ctx.now));
        if is_afk {
            afk.push(member.name.as_str());
        } else {
            online.push(member.name.as_str());
        }
    }

    format!(":coffeecan: Online: {} | AFK: {}", online.join(", "), afk.join(", "))
}

async fn time_reply<T: Transport + ?Sized>(ctx: &CommandContext<'_, T>) -> String {
    match ctx.transport.get_server_time().await {
        Ok(time) => describe_server_time(&time),
        Err(e) => {
            warn!("Server time query failed: {}", e);
            "❌ Could not retrieve server time.".to_string()
        }
    }
}

/// Formats the in-game clock together with the next sunrise or sunset.
/// Unparseable clock strings degrade to the raw current time.
pub fn describe_server_time(time: &ServerTime) -> String {
    let parsed = (
        clock_seconds(&time.current),
        clock_seconds(&time.sunrise),
        clock_seconds(&time.sunset),
    );
    let (Some(now), Some(sunrise), Some(sunset)) = parsed else {
        debug!("Unparseable server time {:?}", time);
        return format!("🕓 Server Time: {}", time.current);
    };

    let next = if now < sunrise {
        format!("Sunrise at {}", time.sunrise)
    } else if now < sunset {
        format!("Sunset at {}", time.sunset)
    } else {
        // Past sunset, the next event is tomorrow's sunrise.
        format!("Sunrise at {}", time.sunrise)
    };
    format!("🕓 Server Time: {} | Next: {}", time.current, next)
}

/// Converts `HH:MM[:SS]` into seconds with positional base-60 weighting.
pub fn clock_seconds(clock: &str) -> Option<u64> {
    clock
        .trim()
        .split(':')
        .rev()
        .enumerate()
        .try_fold(0u64, |total, (position, part)| {
            let value: u64 = part.trim().parse().ok()?;
            let weight = 60u64.checked_pow(position as u32)?;
            total.checked_add(value.checked_mul(weight)?)
        })
}

async fn offline_reply<T: Transport + ?Sized>(ctx: &CommandContext<'_, T>) -> String {
    let team = match ctx.transport.get_team_info().await {
        Ok(team) => team,
        Err(e) => {
            warn!("Team query for .offline failed: {}", e);
            return TEAM_QUERY_FAILED.to_string();
        }
    };

    let offline: Vec<String> = team
        .members
        .iter()
        .filter(|m| !m.is_online)
        .filter_map(|m| {
            let since = ctx.state.member(m.id)?.offline_since?;
            Some(format!("{}: {}", m.name, format_duration(ctx.now.saturating_sub(since))))
        })
        .collect();

    if offline.is_empty() {
        "No offline members tracked.".to_string()
    } else {
        format!("Offline: {}", offline.join(" | "))
    }
}

async fn leader_reply<T: Transport + ?Sized>(ctx: &CommandContext<'_, T>, message: &ChatMessage) -> WatchResult<String> {
    match ctx.transport.promote_to_leader(message.sender_id).await {
        Ok(()) => Ok(format!("👑 {} is now the team leader!", message.sender_name)),
        Err(TransportError::PermissionDenied(reason)) => {
            debug!("Leader promotion refused: {}", reason);
            Ok(":worried: I'm not leader, sorry".to_string())
        }
        Err(e) => Err(e.into()),
    }
}

fn help_reply() -> String {
    let names: Vec<&str> = Command::ALL.iter().map(|c| c.name()).collect();
    format!("Commands: {}", names.join(", "))
}
