//! # Polling Loop
//!
//! Drives the sentinel: every cycle it fetches team chat, map markers and the
//! team roster, answers chat commands, reconciles the snapshot and posts the
//! resulting notices in order.
//!
//! ## Cycle Order
//!
//! 1. Periodic server population broadcast (own timer, default 15 minutes)
//! 2. Chat commands, each message handled once
//! 3. Marker and roster snapshot
//! 4. Reconciliation and notice delivery
//!
//! Cycles never overlap: the watcher owns its [`TrackedState`] and a cycle
//! takes `&mut self`. A failed cycle is logged, followed by a short backoff,
//! and the loop carries on. Only the shutdown future ends [`Watcher::run`].

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::commands::{Command, CommandContext};
use crate::current_timestamp;
use crate::error::{WatchError, WatchResult};
use crate::notice::Notice;
use crate::reconciler::{MapContext, Reconciler};
use crate::state::TrackedState;
use crate::transport::Transport;
use crate::types::Timestamp;

/// Loop timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    /// Delay between successful cycles.
    pub poll_interval: Duration,
    /// Delay after a failed cycle.
    pub error_backoff: Duration,
    /// Spacing of the server population broadcast.
    pub broadcast_interval: Duration,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            error_backoff: Duration::from_secs(5),
            broadcast_interval: Duration::from_secs(900),
        }
    }
}

/// What a single cycle did, mostly for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub commands_handled: usize,
    pub notices: Vec<Notice>,
    pub roster_available: bool,
    pub broadcast_sent: bool,
}

/// The sentinel's polling loop over one transport.
pub struct Watcher<T: Transport> {
    transport: T,
    reconciler: Reconciler,
    state: TrackedState,
    settings: WatchSettings,
    last_broadcast: Timestamp,
}

impl<T: Transport> Watcher<T> {
    /// Connects, loads the map and prepares the loop.
    ///
    /// Any failure here is fatal: the loop never starts.
    ///
    /// # Arguments
    ///
    /// * `transport` - Session to the game server, not yet connected
    /// * `settings` - Poll, backoff and broadcast timing
    ///
    /// # Returns
    ///
    /// A ready watcher whose broadcast timer starts now, or the connect/map
    /// error. A map with a non-positive width yields [`WatchError::InvalidMap`].
    pub async fn start(transport: T, settings: WatchSettings) -> WatchResult<Self> {
        transport.connect().await?;
        info!("🔌 Connected to game server");

        let map_info = transport.get_map_info().await?;
        if map_info.width <= 0.0 {
            return Err(WatchError::InvalidMap(map_info.width));
        }
        let map = MapContext::from_map_info(&map_info);
        info!(
            "🗺️ Map loaded: size {:.0}, {} oil rigs, launch site {}",
            map.size,
            map.oil_rigs.len(),
            if map.launch_site.is_some() { "found" } else { "missing" }
        );

        Ok(Self::with_map(transport, map, settings, current_timestamp()))
    }

    /// Builds a watcher around an already-resolved map. `now` starts the
    /// broadcast timer.
    pub fn with_map(transport: T, map: MapContext, settings: WatchSettings, now: Timestamp) -> Self {
        Self {
            transport,
            reconciler: Reconciler::new(map),
            state: TrackedState::new(),
            settings,
            last_broadcast: now,
        }
    }

    pub fn state(&self) -> &TrackedState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs cycles until `shutdown` resolves. State is dropped on exit.
    ///
    /// A failed cycle is logged at `error` level and the next one starts after
    /// [`WatchSettings::error_backoff`]; successful cycles are spaced by
    /// [`WatchSettings::poll_interval`]. Nothing but `shutdown` ends the loop.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let watcher = Watcher::start(client, WatchSettings::default()).await?;
    /// watcher.run(async { tokio::signal::ctrl_c().await.ok(); }).await;
    /// ```
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("👁️ Monitoring map events every {:?}", self.settings.poll_interval);

        loop {
            let now = current_timestamp();
            let delay = tokio::select! {
                _ = &mut shutdown => break,
                result = self.run_cycle(now) => match result {
                    Ok(report) => {
                        debug!(
                            "Cycle done: {} commands, {} notices",
                            report.commands_handled,
                            report.notices.len()
                        );
                        self.settings.poll_interval
                    }
                    Err(e) => {
                        error!("❌ Cycle failed: {}", e);
                        self.settings.error_backoff
                    }
                },
            };

            tokio::select! {
                _ = &mut shutdown => break,
                _ = sleep(delay) => {}
            }
        }

        info!("🛑 Monitoring stopped");
    }

    /// One full poll-reconcile-notify pass at time `now`.
    ///
    /// # Arguments
    ///
    /// * `now` - Unix seconds used for every timer touched in this cycle
    ///
    /// # Returns
    ///
    /// What the cycle did. A failed chat, marker or server-info query aborts
    /// the cycle with an error; a failed roster query does not, it shows up as
    /// [`Notice::RosterUnavailable`] with `roster_available == false`.
    pub async fn run_cycle(&mut self, now: Timestamp) -> WatchResult<CycleReport> {
        let mut report = CycleReport {
            broadcast_sent: self.broadcast_population(now).await?,
            ..CycleReport::default()
        };

        report.commands_handled = self.process_chat(now).await?;

        let markers = self.transport.get_markers().await?;
        let roster = match self.transport.get_team_info().await {
            Ok(team) => Some(team.members),
            Err(e) => {
                warn!("⚠️ Roster query failed, skipping roster checks: {}", e);
                None
            }
        };
        report.roster_available = roster.is_some();

        report.notices = self
            .reconciler
            .reconcile(&mut self.state, &markers, roster.as_deref(), now);
        for notice in &report.notices {
            self.send(&notice.to_string()).await;
        }

        Ok(report)
    }

    async fn broadcast_population(&mut self, now: Timestamp) -> WatchResult<bool> {
        if now.saturating_sub(self.last_broadcast) < self.settings.broadcast_interval.as_secs() {
            return Ok(false);
        }

        let info = self.transport.get_server_info().await?;
        let notice = Notice::ServerPopulation {
            players: info.players,
            max_players: info.max_players,
            queued: info.queued_players,
        };
        self.send(&notice.to_string()).await;
        self.last_broadcast = now;
        Ok(true)
    }

    async fn process_chat(&mut self, now: Timestamp) -> WatchResult<usize> {
        let messages = self.transport.get_team_chat().await?;
        let mut handled = 0;

        for message in &messages {
            if !self.state.mark_chat_seen(message.timestamp) {
                continue;
            }
            let Some(command) = Command::parse(&message.text) else {
                continue;
            };

            let ctx = CommandContext::new(&self.transport, &self.state, now);
            if let Some(reply) = command.execute(&ctx, message).await? {
                self.send(&reply).await;
            }
            handled += 1;
        }

        Ok(handled)
    }

    async fn send(&self, text: &str) {
        if let Err(e) = self.transport.send_team_message(text).await {
            warn!("Failed to send team message {:?}: {}", text, e);
        }
    }
}
