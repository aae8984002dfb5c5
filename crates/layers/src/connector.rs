use std::fmt;

use formats::FormatError;
use foundation::PoiId;
use poi::{LayerProperties, Poi};

use crate::query::Query;

#[derive(Debug)]
pub enum StoreError {
    NotFound { id: PoiId },
    Storage(FormatError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { id } => {
                write!(f, "Could not delete POI: no POI found with ID {id}")
            }
            StoreError::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::NotFound { .. } => None,
            StoreError::Storage(err) => Some(err),
        }
    }
}

impl From<FormatError> for StoreError {
    fn from(err: FormatError) -> Self {
        StoreError::Storage(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(FormatError::Io(err))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreMode {
    /// Merge with the stored set: incoming POIs win by id, the rest are kept.
    Update,
    /// Discard the stored set.
    Replace,
}

/// Durable set of POIs behind one layer.
pub trait PoiStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<Poi>, StoreError>;

    /// POIs matching `query`, ranked by distance with the pinned POI first.
    /// Without a query every POI is returned in stored order.
    fn filter(&self, query: Option<&Query>) -> Result<Vec<Poi>, StoreError>;

    /// Writes `pois` and assigns `max(id) + 1` onwards to those without an id.
    fn store(&self, pois: Vec<Poi>, mode: StoreMode) -> Result<(), StoreError>;

    fn delete(&self, id: PoiId) -> Result<(), StoreError>;

    fn properties(&self) -> Result<LayerProperties, StoreError> {
        Ok(LayerProperties::default())
    }

    /// Layer properties together with the filtered POIs.
    fn fetch(&self, query: &Query) -> Result<(LayerProperties, Vec<Poi>), StoreError> {
        Ok((self.properties()?, self.filter(Some(query))?))
    }

    /// Counter bumped by every successful write.
    fn generation(&self) -> u64;
}

/// Highest numeric id in `pois`, or 0.
pub fn max_id<'a>(pois: impl IntoIterator<Item = &'a Poi>) -> u64 {
    pois.into_iter()
        .filter_map(|p| p.id)
        .map(PoiId::get)
        .max()
        .unwrap_or(0)
}

/// Gives every POI without an id the next free one, in order.
pub fn assign_ids(pois: &mut [Poi], mut max: u64) {
    for poi in pois.iter_mut().filter(|p| p.id.is_none()) {
        max += 1;
        poi.id = Some(PoiId::new(max));
    }
}

/// Merges `incoming` into `existing` for [`StoreMode::Update`]: incoming POIs first,
/// followed by stored POIs whose id is not among them.
pub fn merge_update(incoming: Vec<Poi>, existing: Vec<Poi>) -> Vec<Poi> {
    let mut merged = incoming;
    let kept: Vec<Poi> = existing
        .into_iter()
        .filter(|old| old.id.is_none() || !merged.iter().any(|new| new.id == old.id))
        .collect();
    merged.extend(kept);
    merged
}
