//! Client notifications: PvP status alerts and the world-PvP advisory.
//! Delivery is best-effort; failures are logged and dropped.

use crate::host::{NotificationStyle, Notifier, PermissionService, PlayerId};

pub const PVP_ENABLED_LABEL: &str = "PVP ENABLED";
pub const PVE_ONLY_LABEL: &str = "PVE ONLY";
pub const WORLD_PVP_DISABLED_ADVISORY: &str =
    "Warning: world PvP is disabled in config; PvP will remain off.";

/// Groups that count as staff for advisories and combat diagnostics.
pub const ELEVATED_GROUPS: [&str; 3] = ["op", "admin", "operator"];

#[must_use]
pub const fn pvp_status_label(pvp_enabled: bool) -> &'static str {
    if pvp_enabled {
        PVP_ENABLED_LABEL
    } else {
        PVE_ONLY_LABEL
    }
}

#[must_use]
pub const fn pvp_status_style(pvp_enabled: bool) -> NotificationStyle {
    if pvp_enabled {
        NotificationStyle::Danger
    } else {
        NotificationStyle::Success
    }
}

/// Push the PvP/PvE HUD alert. Returns whether it was delivered.
pub fn send_pvp_notification(notifier: &dyn Notifier, player: PlayerId, pvp_enabled: bool) -> bool {
    let label = pvp_status_label(pvp_enabled);
    match notifier.notify(player, label, pvp_status_style(pvp_enabled)) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("zone_pvp_control: Could not notify {player}: {e}");
            false
        }
    }
}

/// Tell staff that PvP stays off because the world itself disables it.
pub fn send_world_pvp_advisory(notifier: &dyn Notifier, player: PlayerId) -> bool {
    match notifier.send_message(player, WORLD_PVP_DISABLED_ADVISORY) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("zone_pvp_control: Could not send advisory to {player}: {e}");
            false
        }
    }
}

/// Whether the player is in an op/admin/operator group. Lookup failures count
/// as not elevated.
#[must_use]
pub fn is_elevated(permissions: &dyn PermissionService, player: PlayerId) -> bool {
    let Ok(groups) = permissions.groups_for(player) else {
        return false;
    };
    groups.iter().any(|group| {
        let group = group.trim();
        !group.is_empty() && ELEVATED_GROUPS.iter().any(|e| group.eq_ignore_ascii_case(e))
    })
}
