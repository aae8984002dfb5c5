use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use streaming::{CachedResult, ResultPage, SessionKey, SessionLocks, SessionStore};
use tracing::debug;

use crate::connector::{PoiStore, StoreError};
use crate::query::{Query, QueryError};

#[derive(Debug)]
pub enum LayerError {
    Store(StoreError),
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayerError::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for LayerError {
    fn from(err: StoreError) -> Self {
        LayerError::Store(err)
    }
}

/// A named POI collection served page by page.
///
/// The full result of a query that spans several pages is kept in the session
/// store under (session, layer) until its last page has been served. Requests for
/// the same key are serialized.
pub struct Layer {
    name: String,
    store: Arc<dyn PoiStore>,
    sessions: Arc<dyn SessionStore>,
    locks: Arc<SessionLocks>,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer").field("name", &self.name).finish()
    }
}

impl Layer {
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn PoiStore>,
        sessions: Arc<dyn SessionStore>,
        locks: Arc<SessionLocks>,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            sessions,
            locks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &dyn PoiStore {
        self.store.as_ref()
    }

    /// Serves page `query.page_key` (default 0) of the query's result.
    pub fn page(&self, query: &Query) -> Result<ResultPage, LayerError> {
        let key = SessionKey::new(query.session_id.as_str(), self.name.as_str());
        let _guard = self.locks.lock(&key);

        let page_key = query.page_key.unwrap_or(0);
        let generation = self.store.generation();

        let full = if page_key == 0 {
            self.compute(query)?
        } else {
            match self.sessions.get(&key) {
                Some(cached) if cached.generation == generation => {
                    debug!(layer = %self.name, page_key, "session cache hit");
                    cached.result
                }
                Some(_) => {
                    debug!(layer = %self.name, page_key, "session cache stale; recomputing");
                    self.sessions.delete(&key);
                    self.compute(query)?
                }
                None => {
                    debug!(layer = %self.name, page_key, "session cache miss; recomputing");
                    self.compute(query)?
                }
            }
        };

        let page = full.slice(page_key);
        if page.more_pages {
            self.sessions.put(
                key,
                CachedResult {
                    result: full,
                    generation,
                },
            );
        } else {
            self.sessions.delete(&key);
        }
        Ok(page)
    }

    fn compute(&self, query: &Query) -> Result<ResultPage, StoreError> {
        let (properties, hotspots) = self.store.fetch(query)?;
        let mut full = ResultPage::new(properties, hotspots);
        full.radius = ResultPage::observed_radius(&full.hotspots, full.radius);
        debug!(layer = %self.name, total = full.total, "filtered layer");
        Ok(full)
    }
}

/// Layers by name.
#[derive(Debug, Default)]
pub struct LayerSet {
    layers: BTreeMap<String, Layer>,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, layer: Layer) {
        self.layers.insert(layer.name().to_string(), layer);
    }

    pub fn get(&self, name: &str) -> Result<&Layer, QueryError> {
        self.layers
            .get(name)
            .ok_or_else(|| QueryError::UnknownLayer(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
