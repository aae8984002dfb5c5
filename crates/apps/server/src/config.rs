use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use catalog::{ConnectorKind, UnknownConnector, open_store, resolve_source};
use layers::{Layer, LayerSet};
use serde::Deserialize;
use streaming::{SessionLocks, SessionStore};

/// Contents of the layer configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    pub layers: Vec<LayerConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    /// `flat` or `xml`.
    pub connector: String,
    /// Relative paths resolve against the config file's directory.
    pub source: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse(serde_json::Error),
    Connector { layer: String, source: UnknownConnector },
    DuplicateLayer(String),
    NoLayers,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "cannot read {path:?}: {source}"),
            ConfigError::Parse(err) => write!(f, "invalid layer config: {err}"),
            ConfigError::Connector { layer, source } => write!(f, "layer {layer}: {source}"),
            ConfigError::DuplicateLayer(name) => write!(f, "layer {name} is configured twice"),
            ConfigError::NoLayers => write!(f, "no layers configured"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Connector { source, .. } => Some(source),
            ConfigError::DuplicateLayer(_) | ConfigError::NoLayers => None,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        if config.layers.is_empty() {
            return Err(ConfigError::NoLayers);
        }
        Ok(config)
    }

    /// Opens every configured store. All layers share one session cache.
    pub fn build_layers(
        &self,
        base: &Path,
        sessions: Arc<dyn SessionStore>,
        locks: Arc<SessionLocks>,
    ) -> Result<LayerSet, ConfigError> {
        let mut set = LayerSet::new();
        for entry in &self.layers {
            if set.get(&entry.name).is_ok() {
                return Err(ConfigError::DuplicateLayer(entry.name.clone()));
            }
            let kind: ConnectorKind =
                entry
                    .connector
                    .parse()
                    .map_err(|source| ConfigError::Connector {
                        layer: entry.name.clone(),
                        source,
                    })?;
            let store = open_store(kind, resolve_source(base, &entry.source));
            set.insert(Layer::new(
                entry.name.clone(),
                store,
                sessions.clone(),
                locks.clone(),
            ));
        }
        Ok(set)
    }
}
