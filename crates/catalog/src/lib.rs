//! File-backed POI stores.
//!
//! Both backends keep the whole layer in one file and rewrite it atomically on every
//! change. Writers are serialized per store; readers never take the write lock.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use layers::PoiStore;
use serde::{Deserialize, Serialize};

pub mod file;
pub mod flat;
pub mod xml;

pub use flat::FlatFileStore;
pub use xml::XmlStore;

/// Backend named in the layer configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Flat,
    Xml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownConnector(pub String);

impl fmt::Display for UnknownConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown connector: {}", self.0)
    }
}

impl std::error::Error for UnknownConnector {}

impl FromStr for ConnectorKind {
    type Err = UnknownConnector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(ConnectorKind::Flat),
            "xml" => Ok(ConnectorKind::Xml),
            other => Err(UnknownConnector(other.to_string())),
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorKind::Flat => write!(f, "flat"),
            ConnectorKind::Xml => write!(f, "xml"),
        }
    }
}

/// Opens the store for `kind` at `path`. Nothing is read until the first request.
pub fn open_store(kind: ConnectorKind, path: impl Into<PathBuf>) -> Arc<dyn PoiStore> {
    match kind {
        ConnectorKind::Flat => Arc::new(FlatFileStore::new(path)),
        ConnectorKind::Xml => Arc::new(XmlStore::new(path)),
    }
}

/// Resolves `source` against `base` unless it is already absolute.
pub fn resolve_source(base: &Path, source: &Path) -> PathBuf {
    if source.is_absolute() {
        source.to_path_buf()
    } else {
        base.join(source)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectorKind, UnknownConnector, resolve_source};
    use std::path::Path;

    #[test]
    fn connector_names() {
        assert_eq!("flat".parse(), Ok(ConnectorKind::Flat));
        assert_eq!(" XML ".parse(), Ok(ConnectorKind::Xml));
        assert_eq!(
            "sql".parse::<ConnectorKind>(),
            Err(UnknownConnector("sql".to_string()))
        );
        assert_eq!(ConnectorKind::Xml.to_string(), "xml");
    }

    #[test]
    fn relative_sources_follow_the_base() {
        let base = Path::new("/srv/poi");
        assert_eq!(
            resolve_source(base, Path::new("museum.txt")),
            Path::new("/srv/poi/museum.txt")
        );
        assert_eq!(
            resolve_source(base, Path::new("/data/park.xml")),
            Path::new("/data/park.xml")
        );
    }
}
