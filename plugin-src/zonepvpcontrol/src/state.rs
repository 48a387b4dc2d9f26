//! Shared plugin state for zone_pvp_control.
//!
//! Per-player zone records live in a sharded [`DashMap`]: the tracker writes a
//! player's record while damage and death handlers read it from the engine's
//! dispatch thread. A record's zone name and PvP flag are always read and
//! written under the same shard lock, so readers see a stale pair at worst,
//! never a torn one.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use dashmap::{DashMap, DashSet};

use crate::config::ZonePvpConfig;
use crate::host::{Host, PlayerId};
use crate::policy::PvpPolicy;
use crate::zone::{ZoneQueryBuffer, zone_group};

/// Last observed zone of one player.
#[derive(Debug, Clone, Default)]
pub struct PlayerZoneState {
    pub zone_name: Option<String>,
    pub pvp_enabled: bool,
    /// Reused by every lookup for this player.
    pub scratch: ZoneQueryBuffer,
}

/// Result of recording one poll observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneUpdate {
    pub zone_changed: bool,
    /// `Some(previous)` when the PvP flag flipped.
    pub pvp_flipped_from: Option<bool>,
}

/// How long a disconnected player stays out of tracking unless they rejoin.
/// Covers worlds that keep listing a player for a while after disconnect.
pub const DEPARTURE_GRACE: Duration = Duration::from_secs(30);

/// Player id -> last observed zone.
#[derive(Debug, Default)]
pub struct ZoneStates {
    inner: DashMap<PlayerId, PlayerZoneState>,
    /// Disconnected players and when they left.
    departed: DashMap<PlayerId, Instant>,
}

impl ZoneStates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached PvP flag. Unknown players are never PvP.
    #[must_use]
    pub fn pvp_enabled(&self, player: &PlayerId) -> bool {
        self.inner.get(player).is_some_and(|s| s.pvp_enabled)
    }

    #[must_use]
    pub fn zone_name(&self, player: &PlayerId) -> Option<String> {
        self.inner.get(player)?.zone_name.clone()
    }

    #[must_use]
    pub fn zone_group(&self, player: &PlayerId) -> Option<String> {
        let state = self.inner.get(player)?;
        state.zone_name.as_deref().map(|n| zone_group(n).to_owned())
    }

    /// Zone name and flag read together.
    #[must_use]
    pub fn snapshot(&self, player: &PlayerId) -> Option<(Option<String>, bool)> {
        self.inner
            .get(player)
            .map(|s| (s.zone_name.clone(), s.pvp_enabled))
    }

    /// `"<zone> (pvp=<flag>)"`, or `"unknown"` before the first resolved poll.
    #[must_use]
    pub fn describe(&self, player: &PlayerId) -> String {
        match self.inner.get(player) {
            Some(state) => match &state.zone_name {
                Some(name) => format!("{name} (pvp={})", state.pvp_enabled),
                None => "unknown".to_owned(),
            },
            None => "unknown".to_owned(),
        }
    }

    #[must_use]
    pub fn contains(&self, player: &PlayerId) -> bool {
        self.inner.contains_key(player)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn tracked_players(&self) -> Vec<PlayerId> {
        self.inner.iter().map(|e| *e.key()).collect()
    }

    /// Borrow the player's scratch buffer for a lookup, creating the record on
    /// first sight. The shard lock is released before the caller resolves.
    /// Returns `None` for players that left less than [`DEPARTURE_GRACE`] ago.
    pub(crate) fn take_scratch(&self, player: PlayerId, now: Instant) -> Option<ZoneQueryBuffer> {
        let left_at = self.departed.get(&player).map(|entry| *entry);
        if let Some(left_at) = left_at {
            if now.saturating_duration_since(left_at) < DEPARTURE_GRACE {
                return None;
            }
            self.departed.remove(&player);
        }

        let scratch = {
            let mut state = self.inner.entry(player).or_default();
            std::mem::take(&mut state.scratch)
        };

        // `depart` marks before it removes, so a disconnect racing with
        // the creation above is seen here.
        if self.departed.contains_key(&player) {
            self.inner.remove(&player);
            return None;
        }
        Some(scratch)
    }

    /// Hand the scratch buffer back without recording anything.
    pub(crate) fn restore_scratch(&self, player: &PlayerId, scratch: ZoneQueryBuffer) {
        if let Some(mut state) = self.inner.get_mut(player) {
            state.scratch = scratch;
        }
    }

    /// Record the zone left in `scratch` by a lookup. Returns `None` when the
    /// record vanished while resolving (player disconnected); it is not
    /// recreated.
    pub(crate) fn record(
        &self,
        player: &PlayerId,
        pvp_enabled: bool,
        scratch: ZoneQueryBuffer,
    ) -> Option<ZoneUpdate> {
        let mut state = self.inner.get_mut(player)?;

        let zone_changed = match scratch.zone() {
            Some(name) if state.zone_name.as_deref() != Some(name) => {
                state.zone_name = Some(name.to_owned());
                true
            }
            _ => false,
        };
        state.scratch = scratch;

        let previous = state.pvp_enabled;
        let pvp_flipped_from = (previous != pvp_enabled).then(|| {
            state.pvp_enabled = pvp_enabled;
            previous
        });

        Some(ZoneUpdate {
            zone_changed,
            pvp_flipped_from,
        })
    }

    /// Recompute the cached flag from the cached zone name. Returns the new
    /// flag, or `None` for untracked players.
    pub(crate) fn refresh_flag(&self, player: &PlayerId, policy: &PvpPolicy) -> Option<bool> {
        let mut state = self.inner.get_mut(player)?;
        state.pvp_enabled = policy.is_pvp_zone_name(state.zone_name.as_deref());
        Some(state.pvp_enabled)
    }

    /// Drop the player's record and keep them out of tracking until they
    /// rejoin or [`DEPARTURE_GRACE`] passes.
    pub(crate) fn depart(&self, player: PlayerId, now: Instant) -> Option<PlayerZoneState> {
        self.departed.insert(player, now);
        self.inner.remove(&player).map(|(_, state)| state)
    }

    /// Allow tracking again for a player who rejoined.
    pub(crate) fn readmit(&self, player: &PlayerId) -> bool {
        self.departed.remove(player).is_some()
    }

    /// Forget departures older than [`DEPARTURE_GRACE`].
    pub(crate) fn prune_departures(&self, now: Instant) {
        self.departed
            .retain(|_, left_at| now.saturating_duration_since(*left_at) < DEPARTURE_GRACE);
    }

    pub(crate) fn clear(&self) {
        self.inner.clear();
        self.departed.clear();
    }
}

/// Players whose client finished the initial sync and can render alerts.
#[derive(Debug, Default)]
pub struct ReadyPlayerSet {
    players: DashSet<PlayerId>,
}

impl ReadyPlayerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the player was already ready.
    pub fn mark_ready(&self, player: PlayerId) -> bool {
        self.players.insert(player)
    }

    #[must_use]
    pub fn is_ready(&self, player: &PlayerId) -> bool {
        self.players.contains(player)
    }

    pub fn remove(&self, player: &PlayerId) -> bool {
        self.players.remove(player).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn clear(&self) {
        self.players.clear();
    }
}

/// Shared state passed to the tracker, event handlers and the zone service.
#[derive(Clone)]
pub struct PluginState {
    pub host: Host,
    pub zones: Arc<ZoneStates>,
    pub ready: Arc<ReadyPlayerSet>,
    policy: Arc<RwLock<Arc<PvpPolicy>>>,
}

impl PluginState {
    #[must_use]
    pub fn new(host: Host, policy: PvpPolicy) -> Self {
        Self {
            host,
            zones: Arc::new(ZoneStates::new()),
            ready: Arc::new(ReadyPlayerSet::new()),
            policy: Arc::new(RwLock::new(Arc::new(policy))),
        }
    }

    /// The policy in force right now.
    #[must_use]
    pub fn policy(&self) -> Arc<PvpPolicy> {
        let guard = self.policy.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a new config. Cached flags converge on the next poll.
    pub fn replace_config(&self, config: ZonePvpConfig) {
        let mut guard = self.policy.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(PvpPolicy::new(config));
    }

    /// Forget everything about a player (disconnect).
    pub fn remove_player(&self, player: &PlayerId) -> Option<PlayerZoneState> {
        self.ready.remove(player);
        self.zones.depart(*player, Instant::now())
    }

    pub fn clear(&self) {
        self.zones.clear();
        self.ready.clear();
    }
}
