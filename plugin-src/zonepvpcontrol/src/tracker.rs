//! Zone tracker — periodically samples player positions, classifies them into
//! zones and caches the derived PvP flag per player.
//!
//! Each world is polled in its own task so a slow world never holds up the
//! others. A world is never polled twice concurrently, which keeps a single
//! writer per player record.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::host::GameWorld;
use crate::notify;
use crate::state::PluginState;
use crate::zone::{ZoneClassifier, zone_group};

/// How often player zones are sampled.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What one world pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Players whose zone was resolved and recorded.
    pub tracked: usize,
    /// Players skipped this tick (no position, no zone, generator error,
    /// recently disconnected).
    pub skipped: usize,
    /// PvP status alerts delivered.
    pub notified: usize,
    /// World-PvP advisories delivered.
    pub advisories: usize,
}

pub struct ZoneTracker {
    state: PluginState,
    in_flight: Arc<DashSet<String>>,
}

impl ZoneTracker {
    #[must_use]
    pub fn new(state: PluginState) -> Self {
        Self {
            state,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &PluginState {
        &self.state
    }

    /// Run one pass over a world. Returns `None` when the world is not
    /// tracked (dead, not allowlisted, or without a zone generator).
    pub fn poll(&self, world: &dyn GameWorld) -> Option<PollReport> {
        let policy = self.state.policy();
        if !world.is_alive() || !policy.is_world_enabled(world.key()) {
            return None;
        }
        let resolver = match world.zone_resolver() {
            Ok(resolver) => resolver,
            Err(e) => {
                log::debug!("zone_pvp_control: Not tracking world {}: {e}", world.key());
                return None;
            }
        };

        let seed = world.seed();
        let now = Instant::now().into_std();
        let zones = &self.state.zones;
        let host = &self.state.host;
        let mut report = PollReport::default();

        for player in world.players() {
            let Some(pos) = player.position else {
                report.skipped += 1;
                continue;
            };
            let id = player.id;

            let Some(mut scratch) = zones.take_scratch(id, now) else {
                // Disconnected but still listed.
                report.skipped += 1;
                continue;
            };
            let pvp_enabled =
                match ZoneClassifier::classify(resolver.as_ref(), seed, pos.x, pos.z, &mut scratch) {
                    Ok(Some(zone_name)) => Some(policy.is_pvp_zone(zone_group(zone_name))),
                    Ok(None) => None,
                    Err(e) => {
                        log::trace!("zone_pvp_control: Zone lookup for {id} failed: {e}");
                        None
                    }
                };
            let Some(pvp_enabled) = pvp_enabled else {
                zones.restore_scratch(&id, scratch);
                report.skipped += 1;
                continue;
            };

            let Some(update) = zones.record(&id, pvp_enabled, scratch) else {
                continue;
            };
            report.tracked += 1;

            if update.zone_changed {
                log::trace!("zone_pvp_control: {id} now in {}", zones.describe(&id));
            }

            let Some(was_pvp_enabled) = update.pvp_flipped_from else {
                continue;
            };
            if !self.state.ready.is_ready(&id) {
                continue;
            }

            if notify::send_pvp_notification(host.notifier.as_ref(), id, pvp_enabled) {
                report.notified += 1;
            }
            if was_pvp_enabled
                && !pvp_enabled
                && !world.is_pvp_enabled()
                && notify::is_elevated(host.permissions.as_ref(), id)
                && notify::send_world_pvp_advisory(host.notifier.as_ref(), id)
            {
                report.advisories += 1;
            }
        }

        Some(report)
    }

    /// Fan one pass out over every eligible world. Must run inside a tokio
    /// runtime. Returns the spawned per-world tasks.
    pub fn tick(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let policy = self.state.policy();
        self.state.zones.prune_departures(Instant::now().into_std());
        let mut tasks = Vec::new();

        for world in self.state.host.worlds.worlds() {
            if !world.is_alive() || !policy.is_world_enabled(world.key()) {
                continue;
            }
            let key = world.key().to_owned();
            if !self.in_flight.insert(key.clone()) {
                log::debug!("zone_pvp_control: World {key} still polling, skipping tick");
                continue;
            }

            let guard = InFlight {
                set: Arc::clone(&self.in_flight),
                key,
            };
            let tracker = Arc::clone(self);
            tasks.push(tokio::spawn(async move {
                let _guard = guard;
                tracker.poll(world.as_ref());
            }));
        }
        tasks
    }

    /// Start polling every `period` on `runtime`. The first pass runs one
    /// period from now.
    #[must_use]
    pub fn spawn(self: Arc<Self>, runtime: &Handle, period: Duration) -> ZoneTask {
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                self.tick();
            }
        });
        log::debug!("zone_pvp_control: Zone tracking started ({period:?})");
        ZoneTask { handle }
    }
}

/// Marks a world as being polled until dropped.
struct InFlight {
    set: Arc<DashSet<String>>,
    key: String,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

/// Handle to the running poll loop. Dropping it stops polling.
pub struct ZoneTask {
    handle: JoinHandle<()>,
}

impl ZoneTask {
    pub fn stop(self) {
        self.handle.abort();
        log::debug!("zone_pvp_control: Zone tracking stopped");
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ZoneTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
