//! Handler for PlayerDeathEvent — sets item loss from the victim's zone group
//! when the death was a PvP kill.

use crate::config::DropMode;
use crate::host::{DeathOutcome, EventHandler, ItemsLossMode, PlayerDeathEvent, PlayerId};
use crate::state::PluginState;

pub struct DropRuleApplier {
    state: PluginState,
}

impl DropRuleApplier {
    #[must_use]
    pub const fn new(state: PluginState) -> Self {
        Self { state }
    }

    /// Apply the victim zone's drop mode to `outcome`. Only kills that would
    /// have passed the combat check (both players PvP-enabled) qualify.
    /// Returns the mode applied, or `None` if the outcome was left alone.
    pub fn apply(
        &self,
        victim: &PlayerId,
        attacker: &PlayerId,
        outcome: &mut DeathOutcome,
    ) -> Option<DropMode> {
        let policy = self.state.policy();
        if policy.config().is_none() {
            return None;
        }

        let zones = &self.state.zones;
        if !zones.pvp_enabled(victim) || !zones.pvp_enabled(attacker) {
            return None;
        }

        let group = zones.zone_group(victim)?;
        match policy.drop_mode(&group) {
            DropMode::Default => None,
            DropMode::Full => {
                outcome.items_loss_mode = ItemsLossMode::All;
                outcome.amount_loss_percent = 100.0;
                Some(DropMode::Full)
            }
            DropMode::Partial => {
                let (amount, durability) = policy.partial_percentages();
                outcome.items_loss_mode = ItemsLossMode::Configured;
                outcome.amount_loss_percent = amount;
                outcome.durability_loss_percent = durability;
                Some(DropMode::Partial)
            }
        }
    }
}

pub struct ZoneDeathHandler {
    pub applier: DropRuleApplier,
}

impl EventHandler<PlayerDeathEvent> for ZoneDeathHandler {
    fn handle_blocking(&self, event: &mut PlayerDeathEvent) {
        let Some(victim) = event.victim else {
            return;
        };
        let Some(attacker) = event.source.player() else {
            return;
        };

        if let Some(mode) = self.applier.apply(&victim, &attacker, &mut event.outcome) {
            log::info!(
                "zone_pvp_control: {victim} killed by {attacker} in {}: drop mode {mode}, \
                 amount {}%, durability {}%",
                self.applier.state.zones.describe(&victim),
                event.outcome.amount_loss_percent,
                event.outcome.durability_loss_percent,
            );
        }
    }
}
