//! Damage interception — blocks player-vs-player hits unless both players
//! stand in PvP zones.
//!
//! Decisions only read the flags cached by the tracker; no zone lookup happens
//! on the combat path. A flag can be up to one poll interval old.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::host::{EventHandler, PlayerDamageEvent, PlayerId};
use crate::notify;
use crate::state::PluginState;

/// Minimum gap between two diagnostic lines for the same attacker.
pub const LOG_COOLDOWN: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatDecision {
    Allow,
    Block,
}

impl CombatDecision {
    #[must_use]
    pub const fn is_blocked(self) -> bool {
        matches!(self, Self::Block)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Block => "BLOCK",
        }
    }
}

/// Per-attacker cooldown for combat diagnostics. Lives as long as the plugin.
#[derive(Debug, Default)]
pub struct DiagnosticLimiter {
    last_logged: DashMap<PlayerId, Instant>,
}

impl DiagnosticLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a line may be logged for `attacker` at `now`; records it if so.
    pub fn try_acquire(&self, attacker: PlayerId, now: Instant) -> bool {
        match self.last_logged.entry(attacker) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
            Entry::Occupied(mut slot) => {
                if now.saturating_duration_since(*slot.get()) < LOG_COOLDOWN {
                    return false;
                }
                slot.insert(now);
                true
            }
        }
    }
}

pub struct CombatAuthorizer {
    state: PluginState,
    limiter: DiagnosticLimiter,
}

impl CombatAuthorizer {
    #[must_use]
    pub fn new(state: PluginState) -> Self {
        Self {
            state,
            limiter: DiagnosticLimiter::new(),
        }
    }

    /// Allow only if both players are cached as PvP-enabled. Players without a
    /// zone record count as PvP-disabled.
    #[must_use]
    pub fn authorize(&self, attacker: &PlayerId, target: &PlayerId) -> CombatDecision {
        let zones = &self.state.zones;
        if zones.pvp_enabled(attacker) && zones.pvp_enabled(target) {
            CombatDecision::Allow
        } else {
            CombatDecision::Block
        }
    }

    /// Authorize and emit the rate-limited diagnostic line.
    pub fn authorize_logged(&self, attacker: PlayerId, target: PlayerId) -> CombatDecision {
        let decision = self.authorize(&attacker, &target);
        if self.limiter.try_acquire(attacker, Instant::now()) {
            self.log_decision(decision, attacker, target);
        }
        decision
    }

    fn log_decision(&self, decision: CombatDecision, attacker: PlayerId, target: PlayerId) {
        if !log::log_enabled!(log::Level::Info) {
            return;
        }
        let zones = &self.state.zones;
        let permissions = self.state.host.permissions.as_ref();
        log::info!(
            "zone_pvp_control: PvP {} attacker={attacker} target={target} attackerZone={} \
             targetZone={} attackerOp={} targetOp={}",
            decision.label(),
            zones.describe(&attacker),
            zones.describe(&target),
            notify::is_elevated(permissions, attacker),
            notify::is_elevated(permissions, target),
        );
    }
}

// ───────────────────────────── Damage ─────────────────────────────

pub struct ZonePvpHandler {
    pub authorizer: CombatAuthorizer,
}

impl EventHandler<PlayerDamageEvent> for ZonePvpHandler {
    fn handle_blocking(&self, event: &mut PlayerDamageEvent) {
        // Only player-vs-player hits are ours to judge.
        let Some(target) = event.target else {
            return;
        };
        let Some(attacker) = event.source.player() else {
            return;
        };

        if self.authorizer.authorize_logged(attacker, target).is_blocked() {
            event.cancelled = true;
        }
    }
}
