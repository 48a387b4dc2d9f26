//! Error types. None of these ever reach the game engine: handlers degrade to
//! a no-op or a fail-closed decision instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::host::PlayerId;

/// Failures while loading or persisting `config.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("write config {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("create config dir {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Zone lookup failures. Always transient: the player is skipped for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneResolveError {
    #[error("zone generator unavailable: {0}")]
    GeneratorUnavailable(String),
    #[error("zone generator failed: {0}")]
    Generator(String),
}

/// Failures reported by the host's permission or notification services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("player {0} is not online")]
    PlayerOffline(PlayerId),
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("permission lookup failed: {0}")]
    Permissions(String),
}
