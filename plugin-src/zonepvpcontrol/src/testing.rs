//! In-memory host used by unit tests.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{HostError, ZoneResolveError};
use crate::host::{
    EventHandler, EventPriority, GameWorld, Host, NotificationStyle, Notifier, PermissionService,
    PlayerDamageEvent, PlayerDeathEvent, PlayerDisconnectEvent, PlayerId, PlayerReadyEvent,
    PlayerSnapshot, PluginContext, Position, WorldRegistry, ZoneResolver,
};
use crate::zone::ZoneQueryBuffer;

/// Zones laid out as bands along the x axis.
#[derive(Default)]
pub struct FakeResolver {
    bands: Mutex<Vec<(f64, f64, String)>>,
    failure: Mutex<Option<String>>,
}

impl FakeResolver {
    pub fn set_band(&self, min_x: f64, max_x: f64, zone: &str) {
        self.bands.lock().unwrap().push((min_x, max_x, zone.to_owned()));
    }

    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_owned());
    }
}

impl ZoneResolver for FakeResolver {
    fn resolve(
        &self,
        _seed: i64,
        x: f64,
        _z: f64,
        out: &mut ZoneQueryBuffer,
    ) -> Result<(), ZoneResolveError> {
        if let Some(reason) = self.failure.lock().unwrap().as_ref() {
            return Err(ZoneResolveError::Generator(reason.clone()));
        }
        let bands = self.bands.lock().unwrap();
        if let Some((_, _, zone)) = bands.iter().find(|(lo, hi, _)| x >= *lo && x < *hi) {
            out.set_zone(zone);
        }
        Ok(())
    }
}

pub struct FakeWorld {
    pub key: String,
    pub alive: AtomicBool,
    pub pvp_enabled: AtomicBool,
    pub resolver: Option<Arc<FakeResolver>>,
    players: Mutex<Vec<PlayerSnapshot>>,
}

impl FakeWorld {
    /// A live world with PvP on and zones `Zone1_Spawn` [0,100),
    /// `Zone2_East` [100,200), `Zone3_East` [200,300), `Wilds_Edge` [300,400).
    pub fn new(key: &str) -> Self {
        let resolver = FakeResolver::default();
        resolver.set_band(0.0, 100.0, "Zone1_Spawn");
        resolver.set_band(100.0, 200.0, "Zone2_East");
        resolver.set_band(200.0, 300.0, "Zone3_East");
        resolver.set_band(300.0, 400.0, "Wilds_Edge");
        Self {
            key: key.to_owned(),
            alive: AtomicBool::new(true),
            pvp_enabled: AtomicBool::new(true),
            resolver: Some(Arc::new(resolver)),
            players: Mutex::new(Vec::new()),
        }
    }

    pub fn without_generator(key: &str) -> Self {
        Self {
            resolver: None,
            ..Self::new(key)
        }
    }

    pub fn set_world_pvp(&self, enabled: bool) {
        self.pvp_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Place a player at `x` (z = 0), adding them if needed.
    pub fn place(&self, id: PlayerId, x: f64) {
        self.set_position(id, Some(Position::new(x, 64.0, 0.0)));
    }

    pub fn set_position(&self, id: PlayerId, position: Option<Position>) {
        let mut players = self.players.lock().unwrap();
        match players.iter_mut().find(|p| p.id == id) {
            Some(p) => p.position = position,
            None => players.push(PlayerSnapshot { id, position }),
        }
    }
}

impl GameWorld for FakeWorld {
    fn key(&self) -> &str {
        &self.key
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn seed(&self) -> i64 {
        1337
    }

    fn is_pvp_enabled(&self) -> bool {
        self.pvp_enabled.load(Ordering::SeqCst)
    }

    fn zone_resolver(&self) -> Result<Arc<dyn ZoneResolver>, ZoneResolveError> {
        match &self.resolver {
            Some(r) => Ok(Arc::clone(r) as Arc<dyn ZoneResolver>),
            None => Err(ZoneResolveError::GeneratorUnavailable(self.key.clone())),
        }
    }

    fn players(&self) -> Vec<PlayerSnapshot> {
        self.players.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct FakeWorlds {
    worlds: Mutex<Vec<Arc<FakeWorld>>>,
}

impl FakeWorlds {
    pub fn add(&self, world: FakeWorld) -> Arc<FakeWorld> {
        let world = Arc::new(world);
        self.worlds.lock().unwrap().push(Arc::clone(&world));
        world
    }
}

impl WorldRegistry for FakeWorlds {
    fn worlds(&self) -> Vec<Arc<dyn GameWorld>> {
        self.worlds
            .lock()
            .unwrap()
            .iter()
            .map(|w| Arc::clone(w) as Arc<dyn GameWorld>)
            .collect()
    }
}

#[derive(Default)]
pub struct FakePermissions {
    groups: Mutex<HashMap<PlayerId, Vec<String>>>,
    failing: Mutex<HashSet<PlayerId>>,
}

impl FakePermissions {
    pub fn set_groups(&self, id: PlayerId, groups: &[&str]) {
        self.groups
            .lock()
            .unwrap()
            .insert(id, groups.iter().map(|g| (*g).to_owned()).collect());
    }

    pub fn fail_for(&self, id: PlayerId) {
        self.failing.lock().unwrap().insert(id);
    }
}

impl PermissionService for FakePermissions {
    fn groups_for(&self, player: PlayerId) -> Result<Vec<String>, HostError> {
        if self.failing.lock().unwrap().contains(&player) {
            return Err(HostError::Permissions("backend down".to_owned()));
        }
        Ok(self
            .groups
            .lock()
            .unwrap()
            .get(&player)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Alert(PlayerId, String, NotificationStyle),
    Chat(PlayerId, String),
}

#[derive(Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<Sent>>,
    offline: Mutex<HashSet<PlayerId>>,
}

impl FakeNotifier {
    pub fn go_offline(&self, id: PlayerId) {
        self.offline.lock().unwrap().insert(id);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, id: PlayerId) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| match s {
                Sent::Alert(p, ..) | Sent::Chat(p, _) => *p == id,
            })
            .collect()
    }

    fn deliver(&self, id: PlayerId, sent: Sent) -> Result<(), HostError> {
        if self.offline.lock().unwrap().contains(&id) {
            return Err(HostError::PlayerOffline(id));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

impl Notifier for FakeNotifier {
    fn notify(
        &self,
        player: PlayerId,
        message: &str,
        style: NotificationStyle,
    ) -> Result<(), HostError> {
        self.deliver(player, Sent::Alert(player, message.to_owned(), style))
    }

    fn send_message(&self, player: PlayerId, message: &str) -> Result<(), HostError> {
        self.deliver(player, Sent::Chat(player, message.to_owned()))
    }
}

/// Fake server with handles to every collaborator.
pub struct FakeServer {
    pub worlds: Arc<FakeWorlds>,
    pub permissions: Arc<FakePermissions>,
    pub notifier: Arc<FakeNotifier>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self {
            worlds: Arc::new(FakeWorlds::default()),
            permissions: Arc::new(FakePermissions::default()),
            notifier: Arc::new(FakeNotifier::default()),
        }
    }

    pub fn host(&self) -> Host {
        Host {
            worlds: Arc::clone(&self.worlds) as Arc<dyn WorldRegistry>,
            permissions: Arc::clone(&self.permissions) as Arc<dyn PermissionService>,
            notifier: Arc::clone(&self.notifier) as Arc<dyn Notifier>,
        }
    }
}

/// Plugin context that just keeps what was registered.
pub struct FakeContext {
    pub data_folder: PathBuf,
    pub damage: Mutex<Vec<(Arc<dyn EventHandler<PlayerDamageEvent>>, EventPriority)>>,
    pub death: Mutex<Vec<(Arc<dyn EventHandler<PlayerDeathEvent>>, EventPriority)>>,
    pub ready: Mutex<Vec<Arc<dyn EventHandler<PlayerReadyEvent>>>>,
    pub disconnect: Mutex<Vec<Arc<dyn EventHandler<PlayerDisconnectEvent>>>>,
}

impl FakeContext {
    pub fn new(data_folder: PathBuf) -> Self {
        Self {
            data_folder,
            damage: Mutex::new(Vec::new()),
            death: Mutex::new(Vec::new()),
            ready: Mutex::new(Vec::new()),
            disconnect: Mutex::new(Vec::new()),
        }
    }

    pub fn dispatch_damage(&self, event: &mut PlayerDamageEvent) {
        for (handler, _) in self.damage.lock().unwrap().iter() {
            handler.handle_blocking(event);
        }
    }

    pub fn dispatch_death(&self, event: &mut PlayerDeathEvent) {
        for (handler, _) in self.death.lock().unwrap().iter() {
            handler.handle_blocking(event);
        }
    }

    pub fn dispatch_ready(&self, player: PlayerId) {
        let event = PlayerReadyEvent { player };
        for handler in self.ready.lock().unwrap().iter() {
            handler.handle(&event);
        }
    }

    pub fn dispatch_disconnect(&self, player: PlayerId) {
        let event = PlayerDisconnectEvent { player };
        for handler in self.disconnect.lock().unwrap().iter() {
            handler.handle(&event);
        }
    }
}

impl PluginContext for FakeContext {
    fn data_folder(&self) -> PathBuf {
        self.data_folder.clone()
    }

    fn register_damage_handler(
        &self,
        handler: Arc<dyn EventHandler<PlayerDamageEvent>>,
        priority: EventPriority,
    ) {
        self.damage.lock().unwrap().push((handler, priority));
    }

    fn register_death_handler(
        &self,
        handler: Arc<dyn EventHandler<PlayerDeathEvent>>,
        priority: EventPriority,
    ) {
        self.death.lock().unwrap().push((handler, priority));
    }

    fn register_ready_handler(&self, handler: Arc<dyn EventHandler<PlayerReadyEvent>>) {
        self.ready.lock().unwrap().push(handler);
    }

    fn register_disconnect_handler(&self, handler: Arc<dyn EventHandler<PlayerDisconnectEvent>>) {
        self.disconnect.lock().unwrap().push(handler);
    }
}
