use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use formats::{decode_flat, encode_flat};
use foundation::PoiId;
use layers::{
    PoiStore, Query, StoreError, StoreMode, assign_ids, max_id, merge_update, rank, within_reach,
};
use parking_lot::Mutex;
use poi::Poi;
use tracing::info;

use crate::file::{read_existing, read_source, write_atomic};

/// Tab-separated table, one POI per row, first row naming the columns.
///
/// Layer properties cannot be stored in this format; the layer always reports the
/// defaults.
#[derive(Debug)]
pub struct FlatFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    generation: AtomicU64,
}

impl FlatFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_unlocked(&self, mut pois: Vec<Poi>) -> Result<(), StoreError> {
        let max = max_id(&pois);
        assign_ids(&mut pois, max);
        write_atomic(&self.path, &encode_flat(&pois))?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        info!("flat store rewritten: {:?} ({} POIs)", self.path, pois.len());
        Ok(())
    }
}

impl PoiStore for FlatFileStore {
    fn load_all(&self) -> Result<Vec<Poi>, StoreError> {
        Ok(decode_flat(&read_source(&self.path)?)?)
    }

    fn filter(&self, query: Option<&Query>) -> Result<Vec<Poi>, StoreError> {
        let pois = self.load_all()?;
        Ok(match query {
            Some(query) => rank(pois, query, |poi| within_reach(query, poi)),
            None => pois,
        })
    }

    fn store(&self, pois: Vec<Poi>, mode: StoreMode) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let pois = match mode {
            StoreMode::Update => {
                let existing = match read_existing(&self.path)? {
                    Some(text) => decode_flat(&text)?,
                    None => Vec::new(),
                };
                merge_update(pois, existing)
            }
            StoreMode::Replace => pois,
        };
        self.write_unlocked(pois)
    }

    fn delete(&self, id: PoiId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut pois = self.load_all()?;
        let before = pois.len();
        pois.retain(|poi| poi.id != Some(id));
        if pois.len() == before {
            return Err(StoreError::NotFound { id });
        }
        self.write_unlocked(pois)
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
