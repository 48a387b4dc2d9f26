//! PvP policy: which zone groups allow PvP and how PvP deaths drop items.

use crate::config::{DropMode, ZonePvpConfig};
use crate::zone::zone_group;

/// Groups treated as PvP before any config has been loaded.
pub const BOOTSTRAP_PVP_ZONE_GROUPS: [&str; 3] = ["Zone2", "Zone3", "Zone4"];

/// Immutable view over the current config. Replaced wholesale on reload.
#[derive(Debug, Clone, Default)]
pub struct PvpPolicy {
    config: Option<ZonePvpConfig>,
}

impl PvpPolicy {
    #[must_use]
    pub const fn new(config: ZonePvpConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    /// Policy used while no config object exists at all.
    #[must_use]
    pub const fn bootstrap() -> Self {
        Self { config: None }
    }

    #[must_use]
    pub const fn config(&self) -> Option<&ZonePvpConfig> {
        self.config.as_ref()
    }

    /// With a config, unknown groups are never PvP. Without one, only the
    /// bootstrap groups are (exact match).
    #[must_use]
    pub fn is_pvp_zone(&self, zone_group: &str) -> bool {
        match &self.config {
            Some(config) => config.is_pvp_zone_enabled(zone_group),
            None => BOOTSTRAP_PVP_ZONE_GROUPS.contains(&zone_group),
        }
    }

    /// Like [`Self::is_pvp_zone`] but starting from a full zone name.
    #[must_use]
    pub fn is_pvp_zone_name(&self, zone_name: Option<&str>) -> bool {
        zone_name.is_some_and(|name| self.is_pvp_zone(zone_group(name)))
    }

    /// No config means no drop overrides.
    #[must_use]
    pub fn drop_mode(&self, zone_group: &str) -> DropMode {
        self.config
            .as_ref()
            .map_or(DropMode::Default, |c| c.pvp_drop_mode(zone_group))
    }

    #[must_use]
    pub fn is_world_enabled(&self, world_key: &str) -> bool {
        self.config
            .as_ref()
            .is_none_or(|c| c.is_world_enabled(world_key))
    }

    /// `(amount, durability)` loss percentages for [`DropMode::Partial`],
    /// clamped to `[0, 100]`.
    #[must_use]
    pub fn partial_percentages(&self) -> (f64, f64) {
        self.config.as_ref().map_or((0.0, 0.0), |c| {
            (
                clamp_percent(c.pvp_partial_drop_amount_percent),
                clamp_percent(c.pvp_partial_drop_durability_percent),
            )
        })
    }
}

/// Clamp to `[0, 100]`. NaN maps to 0.
#[must_use]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
