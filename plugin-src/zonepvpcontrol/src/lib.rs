//! Zone PvP Control
//!
//! Tracks which named zone every player stands in and uses it to gate
//! player-vs-player damage and to pick item loss on PvP deaths.

mod config;
mod error;
mod events;
mod events_death;
mod events_pvp;
mod host;
mod notify;
mod policy;
mod service;
mod state;
mod tracker;
mod zone;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tokio::runtime::Runtime;

pub use config::{CONFIG_FILE_NAME, DropMode, ZonePvpConfig, resolve_data_path};
pub use error::{ConfigError, HostError, ZoneResolveError};
pub use events::{ZoneDisconnectHandler, ZoneReadyHandler};
pub use events_death::{DropRuleApplier, ZoneDeathHandler};
pub use events_pvp::{CombatAuthorizer, CombatDecision, ZonePvpHandler};
pub use host::*;
pub use policy::PvpPolicy;
pub use service::ZoneService;
pub use state::{DEPARTURE_GRACE, PluginState, ReadyPlayerSet, ZoneStates};
pub use tracker::{DEFAULT_POLL_INTERVAL, PollReport, ZoneTask, ZoneTracker};
pub use zone::{ZoneClassifier, ZoneQueryBuffer, zone_group};

// ---------------------------------------------------------------------------
// Plugin metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct PluginMetadata<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub authors: &'a str,
    pub description: &'a str,
}

pub static METADATA: PluginMetadata<'static> = PluginMetadata {
    name: "zone_pvp_control",
    version: env!("CARGO_PKG_VERSION"),
    authors: "Austale",
    description: "Zone-based PvP toggling and PvP death drop rules",
};

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct ZonePvpControlPlugin {
    runtime: Arc<Runtime>,
    state: Option<PluginState>,
    tracker: Option<Arc<ZoneTracker>>,
    task: Option<ZoneTask>,
}

impl ZonePvpControlPlugin {
    pub fn new() -> Result<Self, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("zone-pvp-rt")
            .build()
            .map_err(|e| format!("zone_pvp_control: failed to create tokio runtime: {e}"))?;

        Ok(Self {
            runtime: Arc::new(runtime),
            state: None,
            tracker: None,
            task: None,
        })
    }

    pub fn on_load(&mut self, context: &dyn PluginContext, host: Host) -> Result<(), String> {
        let data_path = resolve_data_path(&context.data_folder());
        let config = ZonePvpConfig::load_or_default(&data_path.join(CONFIG_FILE_NAME));
        log::info!(
            "zone_pvp_control: Config loaded from {} ({} zone groups)",
            data_path.display(),
            config.pvp_zone_enabled.len()
        );

        let state = PluginState::new(host, PvpPolicy::new(config));

        let pvp_handler = Arc::new(ZonePvpHandler {
            authorizer: CombatAuthorizer::new(state.clone()),
        });
        context.register_damage_handler(pvp_handler, EventPriority::High);

        let death_handler = Arc::new(ZoneDeathHandler {
            applier: DropRuleApplier::new(state.clone()),
        });
        context.register_death_handler(death_handler, EventPriority::Normal);

        context.register_ready_handler(Arc::new(ZoneReadyHandler {
            state: state.clone(),
        }));
        context.register_disconnect_handler(Arc::new(ZoneDisconnectHandler {
            state: state.clone(),
        }));

        self.tracker = Some(Arc::new(ZoneTracker::new(state.clone())));
        self.state = Some(state);

        log::info!("zone_pvp_control: Loaded successfully");
        Ok(())
    }

    /// Start zone tracking. Does nothing before `on_load` or when already running.
    pub fn start(&mut self) {
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        let Some(tracker) = &self.tracker else {
            log::warn!("zone_pvp_control: start() called before on_load");
            return;
        };
        self.task = Some(
            Arc::clone(tracker).spawn(self.runtime.handle(), DEFAULT_POLL_INTERVAL),
        );
    }

    pub fn on_unload(&mut self) -> Result<(), String> {
        if let Some(task) = self.task.take() {
            task.stop();
        }
        self.tracker = None;
        if let Some(state) = self.state.take() {
            state.clear();
        }
        log::info!("zone_pvp_control: Unloaded");
        Ok(())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    #[must_use]
    pub const fn state(&self) -> Option<&PluginState> {
        self.state.as_ref()
    }

    /// Query handle for other plugins.
    #[must_use]
    pub fn service(&self) -> Option<ZoneService> {
        self.state.as_ref().map(ZoneService::new)
    }
}
