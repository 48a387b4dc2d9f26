//! Event handlers for player readiness and disconnects.

use crate::host::{EventHandler, PlayerDisconnectEvent, PlayerReadyEvent};
use crate::notify;
use crate::state::PluginState;

// ───────────────────────────── Player Ready ─────────────────────────────

pub struct ZoneReadyHandler {
    pub state: PluginState,
}

impl EventHandler<PlayerReadyEvent> for ZoneReadyHandler {
    fn handle(&self, event: &PlayerReadyEvent) {
        let player = event.player;
        self.state.zones.readmit(&player);
        self.state.ready.mark_ready(player);

        // Sync the current status once the client can render it.
        let policy = self.state.policy();
        if let Some(pvp_enabled) = self.state.zones.refresh_flag(&player, &policy) {
            notify::send_pvp_notification(self.state.host.notifier.as_ref(), player, pvp_enabled);
        }
        log::debug!(
            "zone_pvp_control: {player} ready in {}",
            self.state.zones.describe(&player)
        );
    }
}

// ───────────────────────────── Disconnect ─────────────────────────────

pub struct ZoneDisconnectHandler {
    pub state: PluginState,
}

impl EventHandler<PlayerDisconnectEvent> for ZoneDisconnectHandler {
    fn handle(&self, event: &PlayerDisconnectEvent) {
        self.state.remove_player(&event.player);
        log::debug!(
            "zone_pvp_control: {} left, cleaned up zone state",
            event.player
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZonePvpConfig;
    use crate::host::NotificationStyle;
    use crate::policy::PvpPolicy;
    use crate::testing::{FakeServer, FakeWorld, Sent};
    use crate::tracker::ZoneTracker;
    use uuid::Uuid;

    fn setup() -> (FakeServer, PluginState, ZoneTracker) {
        let server = FakeServer::new();
        let state = PluginState::new(server.host(), PvpPolicy::new(ZonePvpConfig::default()));
        let tracker = ZoneTracker::new(state.clone());
        (server, state, tracker)
    }

    #[test]
    fn ready_sends_current_status() {
        let (server, state, tracker) = setup();
        let world = server.worlds.add(FakeWorld::new("default"));
        let id = Uuid::new_v4();
        world.place(id, 150.0);
        tracker.poll(world.as_ref());
        assert!(server.notifier.sent().is_empty());

        ZoneReadyHandler {
            state: state.clone(),
        }
        .handle(&PlayerReadyEvent { player: id });

        assert!(state.ready.is_ready(&id));
        assert_eq!(
            server.notifier.sent(),
            vec![Sent::Alert(id, "PVP ENABLED".to_owned(), NotificationStyle::Danger)]
        );
    }

    #[test]
    fn ready_before_first_poll_sends_nothing() {
        let (server, state, _tracker) = setup();
        let id = Uuid::new_v4();

        ZoneReadyHandler {
            state: state.clone(),
        }
        .handle(&PlayerReadyEvent { player: id });

        assert!(state.ready.is_ready(&id));
        assert!(server.notifier.sent().is_empty());
    }

    #[test]
    fn ready_recomputes_flag_under_current_config() {
        let (server, state, tracker) = setup();
        let world = server.worlds.add(FakeWorld::new("default"));
        let id = Uuid::new_v4();
        world.place(id, 150.0);
        tracker.poll(world.as_ref());

        let mut config = ZonePvpConfig::default();
        config.pvp_zone_enabled.insert("Zone2".to_owned(), false);
        state.replace_config(config);

        ZoneReadyHandler {
            state: state.clone(),
        }
        .handle(&PlayerReadyEvent { player: id });

        assert!(!state.zones.pvp_enabled(&id));
        assert_eq!(
            server.notifier.sent(),
            vec![Sent::Alert(id, "PVE ONLY".to_owned(), NotificationStyle::Success)]
        );
    }

    #[test]
    fn disconnect_forgets_player() {
        let (server, state, tracker) = setup();
        let world = server.worlds.add(FakeWorld::new("default"));
        let id = Uuid::new_v4();
        world.place(id, 150.0);
        tracker.poll(world.as_ref());
        state.ready.mark_ready(id);

        ZoneDisconnectHandler {
            state: state.clone(),
        }
        .handle(&PlayerDisconnectEvent { player: id });

        assert!(!state.ready.is_ready(&id));
        assert!(!state.zones.contains(&id));
        assert!(!state.zones.pvp_enabled(&id));
    }
}
