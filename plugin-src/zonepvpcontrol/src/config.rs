//! Plugin configuration, persisted as `config/ZonePVPControl/config.json`
//! under the server root.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_DIR: &str = "config";
const PLUGIN_DIR: &str = "ZonePVPControl";
const MODS_DIR: &str = "mods";

/// Item loss policy for PvP deaths in a zone group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DropMode {
    /// No override; the engine's own death handling applies.
    #[default]
    Default,
    /// Lose everything.
    Full,
    /// Lose the configured percentages.
    Partial,
}

impl DropMode {
    /// Lenient parse: surrounding whitespace and case are ignored, anything
    /// unrecognised means no override.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case("full") {
            Self::Full
        } else if s.eq_ignore_ascii_case("partial") {
            Self::Partial
        } else {
            Self::Default
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Full => "FULL",
            Self::Partial => "PARTIAL",
        }
    }
}

impl From<String> for DropMode {
    fn from(value: String) -> Self {
        Self::from_str_loose(&value)
    }
}

impl From<DropMode> for String {
    fn from(value: DropMode) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for DropMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level config file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonePvpConfig {
    #[serde(alias = "restrictToWorlds")]
    pub restrict_to_worlds: bool,

    #[serde(alias = "enabledWorlds", deserialize_with = "null_as_default")]
    pub enabled_worlds: Vec<String>,

    /// Zone group -> PvP allowed. Keys match case-insensitively; an exact
    /// match wins over keys differing only by case.
    #[serde(alias = "pvpZoneEnabled", deserialize_with = "null_as_default")]
    pub pvp_zone_enabled: BTreeMap<String, bool>,

    /// Zone group -> drop mode for PvP deaths. Missing groups get no override.
    #[serde(alias = "pvpZoneDropModes", deserialize_with = "null_as_default")]
    pub pvp_zone_drop_modes: BTreeMap<String, DropMode>,

    /// Share of items lost under [`DropMode::Partial`]. Clamped when applied.
    #[serde(alias = "pvpPartialDropAmountPercent")]
    pub pvp_partial_drop_amount_percent: f64,

    /// Durability lost under [`DropMode::Partial`]. Clamped when applied.
    #[serde(alias = "pvpPartialDropDurabilityPercent")]
    pub pvp_partial_drop_durability_percent: f64,
}

impl Default for ZonePvpConfig {
    fn default() -> Self {
        let groups = ["Zone1", "Zone2", "Zone3", "Zone4"];
        Self {
            restrict_to_worlds: false,
            enabled_worlds: Vec::new(),
            pvp_zone_enabled: groups
                .iter()
                .map(|g| ((*g).to_owned(), *g != "Zone1"))
                .collect(),
            pvp_zone_drop_modes: groups
                .iter()
                .map(|g| ((*g).to_owned(), DropMode::Full))
                .collect(),
            pvp_partial_drop_amount_percent: 50.0,
            pvp_partial_drop_durability_percent: 0.0,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Case-insensitive string comparison with an allocation-free ASCII path.
#[must_use]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Exact key first, then the first case-insensitive match in key order.
fn lookup_ignore_case<'m, V>(map: &'m BTreeMap<String, V>, key: &str) -> Option<&'m V> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| eq_ignore_case(k, key))
            .map(|(_, v)| v)
    })
}

/// Pairs of keys that only differ by case.
fn case_collisions<V>(map: &BTreeMap<String, V>) -> Vec<(&str, &str)> {
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    let mut collisions = Vec::new();
    for (i, a) in keys.iter().enumerate() {
        for b in &keys[i + 1..] {
            if eq_ignore_case(a, b) {
                collisions.push((*a, *b));
            }
        }
    }
    collisions
}

impl ZonePvpConfig {
    /// Whether zone tracking runs in the world with this key.
    #[must_use]
    pub fn is_world_enabled(&self, world_key: &str) -> bool {
        if !self.restrict_to_worlds {
            return true;
        }
        self.enabled_worlds
            .iter()
            .any(|allowed| eq_ignore_case(allowed, world_key))
    }

    /// Unknown groups are never PvP.
    #[must_use]
    pub fn is_pvp_zone_enabled(&self, zone_group: &str) -> bool {
        lookup_ignore_case(&self.pvp_zone_enabled, zone_group).is_some_and(|enabled| *enabled)
    }

    #[must_use]
    pub fn pvp_drop_mode(&self, zone_group: &str) -> DropMode {
        lookup_ignore_case(&self.pvp_zone_drop_modes, zone_group)
            .copied()
            .unwrap_or_default()
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.warn_case_collisions();
        Ok(config)
    }

    /// Zone group keys that collide when case is ignored.
    #[must_use]
    pub fn ambiguous_zone_groups(&self) -> Vec<(&str, &str)> {
        let mut collisions = case_collisions(&self.pvp_zone_enabled);
        collisions.extend(case_collisions(&self.pvp_zone_drop_modes));
        collisions
    }

    fn warn_case_collisions(&self) {
        for (a, b) in self.ambiguous_zone_groups() {
            log::warn!(
                "zone_pvp_control: Zone groups \"{a}\" and \"{b}\" differ only by case; \
                 lookups for other spellings use \"{a}\""
            );
        }
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config, or fall back to defaults and write them back when the
    /// file is missing or broken. Never fails.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match Self::load(path) {
                Ok(config) => return config,
                Err(e) => {
                    log::warn!("zone_pvp_control: {e}. Using defaults.");
                }
            }
        }

        let defaults = Self::default();
        match defaults.save(path) {
            Ok(()) => log::info!("zone_pvp_control: Wrote default config to {path:?}"),
            Err(e) => log::warn!("zone_pvp_control: Failed to save default config: {e}"),
        }
        defaults
    }
}

/// Directory holding `config.json`.
///
/// Plugins are installed under `<server>/mods/...`; the config lives in
/// `<server>/config/ZonePVPControl` so it survives plugin reinstalls. Without a
/// `mods` ancestor the data folder itself is taken as the server root.
#[must_use]
pub fn resolve_data_path(data_folder: &Path) -> PathBuf {
    let server_root = resolve_server_root(data_folder);
    let config_dir = server_root.join(CONFIG_DIR).join(PLUGIN_DIR);
    if let Err(e) = std::fs::create_dir_all(&config_dir) {
        log::debug!("zone_pvp_control: Could not create {config_dir:?}: {e}");
    }
    config_dir
}

fn resolve_server_root(data_folder: &Path) -> PathBuf {
    let absolute = std::path::absolute(data_folder).unwrap_or_else(|_| data_folder.to_path_buf());
    for dir in absolute.ancestors() {
        let is_mods = dir
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| eq_ignore_case(n, MODS_DIR));
        if is_mods {
            return dir.parent().unwrap_or(dir).to_path_buf();
        }
    }
    absolute
}
