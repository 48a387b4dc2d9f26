//! Zone service — read-only queries for other plugins.
//!
//! Lets other components ask for a player's zone, PvP status or drop mode
//! without depending on zone_pvp_control internals.

use crate::config::DropMode;
use crate::host::PlayerId;
use crate::state::PluginState;

pub struct ZoneService {
    state: PluginState,
}

impl ZoneService {
    #[must_use]
    pub fn new(state: &PluginState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    #[must_use]
    pub fn zone_name(&self, player: &PlayerId) -> Option<String> {
        self.state.zones.zone_name(player)
    }

    #[must_use]
    pub fn zone_group(&self, player: &PlayerId) -> Option<String> {
        self.state.zones.zone_group(player)
    }

    /// Cached PvP flag, as used by the combat check.
    #[must_use]
    pub fn is_pvp_enabled(&self, player: &PlayerId) -> bool {
        self.state.zones.pvp_enabled(player)
    }

    /// Drop mode a PvP death would get in the player's current zone.
    #[must_use]
    pub fn drop_mode_for(&self, player: &PlayerId) -> DropMode {
        self.state
            .zones
            .zone_group(player)
            .map_or(DropMode::Default, |group| {
                self.state.policy().drop_mode(&group)
            })
    }

    #[must_use]
    pub fn is_ready(&self, player: &PlayerId) -> bool {
        self.state.ready.is_ready(player)
    }

    #[must_use]
    pub fn tracked_players(&self) -> Vec<PlayerId> {
        self.state.zones.tracked_players()
    }
}
