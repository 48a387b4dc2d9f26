//! Boundary with the hosting game server.
//!
//! The plugin never reaches into engine internals: worlds, the zone generator,
//! permissions and client notifications are all consumed through the traits
//! below, and the engine calls back into the plugin through [`EventHandler`]s
//! registered on a [`PluginContext`].

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{HostError, ZoneResolveError};
use crate::zone::ZoneQueryBuffer;

/// Stable player identifier.
pub type PlayerId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A connected player as seen by one poll pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    /// `None` when the player has no transform yet (still loading, mid-teleport).
    pub position: Option<Position>,
}

/// Resolves a world position to the name of the generated zone it lies in.
pub trait ZoneResolver: Send + Sync {
    /// Write the zone at `(x, z)` into `out`. Leaves `out` empty when the
    /// position has no zone.
    fn resolve(
        &self,
        seed: i64,
        x: f64,
        z: f64,
        out: &mut ZoneQueryBuffer,
    ) -> Result<(), ZoneResolveError>;
}

pub trait GameWorld: Send + Sync {
    /// Name used to match `enabled_worlds`.
    fn key(&self) -> &str;
    fn is_alive(&self) -> bool;
    fn seed(&self) -> i64;
    /// The world-level PvP switch from the world's own config.
    fn is_pvp_enabled(&self) -> bool;
    /// The zone generator for this world. An error means the world is untracked.
    fn zone_resolver(&self) -> Result<Arc<dyn ZoneResolver>, ZoneResolveError>;
    fn players(&self) -> Vec<PlayerSnapshot>;
}

pub trait WorldRegistry: Send + Sync {
    fn worlds(&self) -> Vec<Arc<dyn GameWorld>>;
}

pub trait PermissionService: Send + Sync {
    fn groups_for(&self, player: PlayerId) -> Result<Vec<String>, HostError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationStyle {
    Danger,
    Success,
}

pub trait Notifier: Send + Sync {
    /// Client-side HUD alert.
    fn notify(
        &self,
        player: PlayerId,
        message: &str,
        style: NotificationStyle,
    ) -> Result<(), HostError>;

    /// Plain chat message.
    fn send_message(&self, player: PlayerId, message: &str) -> Result<(), HostError>;
}

/// Everything the plugin consumes from the server.
#[derive(Clone)]
pub struct Host {
    pub worlds: Arc<dyn WorldRegistry>,
    pub permissions: Arc<dyn PermissionService>,
    pub notifier: Arc<dyn Notifier>,
}

// ───────────────────────────── Events ─────────────────────────────

/// Where a hit or a killing blow came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    /// Another player.
    Player(PlayerId),
    /// A non-player entity (mob, projectile without a player owner, ...).
    Entity,
    /// Fall damage, drowning, void, ...
    Environment,
}

impl DamageSource {
    #[must_use]
    pub const fn player(self) -> Option<PlayerId> {
        match self {
            Self::Player(id) => Some(id),
            Self::Entity | Self::Environment => None,
        }
    }
}

/// Fired before damage is applied to an entity. Cancelling drops the hit.
#[derive(Debug, Clone)]
pub struct PlayerDamageEvent {
    /// `None` when the target is not a player.
    pub target: Option<PlayerId>,
    pub source: DamageSource,
    pub cancelled: bool,
}

impl PlayerDamageEvent {
    #[must_use]
    pub const fn new(target: Option<PlayerId>, source: DamageSource) -> Self {
        Self {
            target,
            source,
            cancelled: false,
        }
    }
}

/// How the engine takes items from a dead player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemsLossMode {
    None,
    All,
    Configured,
}

/// Item loss parameters of a death, pre-filled by the engine with its defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathOutcome {
    pub items_loss_mode: ItemsLossMode,
    pub amount_loss_percent: f64,
    pub durability_loss_percent: f64,
}

/// Fired when a player dies, before items are dropped.
#[derive(Debug, Clone)]
pub struct PlayerDeathEvent {
    /// `None` when the dead entity is not a player.
    pub victim: Option<PlayerId>,
    pub source: DamageSource,
    pub outcome: DeathOutcome,
}

/// Fired once per player when their client has finished the initial sync.
#[derive(Debug, Clone, Copy)]
pub struct PlayerReadyEvent {
    pub player: PlayerId,
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerDisconnectEvent {
    pub player: PlayerId,
}

// ───────────────────────────── Registration ─────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventPriority {
    Lowest,
    Low,
    Normal,
    High,
    Highest,
}

/// Engine callback. Cancellable events go through `handle_blocking`, which
/// runs synchronously on the dispatching thread.
pub trait EventHandler<E>: Send + Sync {
    fn handle(&self, _event: &E) {}

    fn handle_blocking(&self, _event: &mut E) {}
}

/// Registration point offered by the server to a loading plugin.
pub trait PluginContext: Send + Sync {
    /// Folder the server assigned to this plugin (usually under `mods/`).
    fn data_folder(&self) -> PathBuf;

    fn register_damage_handler(
        &self,
        handler: Arc<dyn EventHandler<PlayerDamageEvent>>,
        priority: EventPriority,
    );

    fn register_death_handler(
        &self,
        handler: Arc<dyn EventHandler<PlayerDeathEvent>>,
        priority: EventPriority,
    );

    fn register_ready_handler(&self, handler: Arc<dyn EventHandler<PlayerReadyEvent>>);

    fn register_disconnect_handler(&self, handler: Arc<dyn EventHandler<PlayerDisconnectEvent>>);
}
