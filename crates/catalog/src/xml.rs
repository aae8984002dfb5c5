use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use formats::{LayerDocument, decode_layer, encode_layer};
use foundation::{GeoBox, PoiId};
use layers::{
    PoiStore, Query, StoreError, StoreMode, assign_ids, distance_from, max_id, rank, within_reach,
};
use parking_lot::Mutex;
use poi::{LayerProperties, Poi};
use tracing::info;

use crate::file::{read_existing, read_source, write_atomic};

/// Multiplier applied to the search distance when sizing the prefilter box.
pub const BOX_MARGIN: f64 = 1.25;

/// XML layer document: layer properties followed by a `<pois>` list.
#[derive(Debug)]
pub struct XmlStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    generation: AtomicU64,
}

impl XmlStore {
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

    pub fn load_document(&self) -> Result<LayerDocument, StoreError> {
        Ok(decode_layer(&read_source(&self.path)?)?)
    }

    /// Rewrites the layer properties and keeps the POIs.
    pub fn store_properties(&self, properties: LayerProperties) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut doc = self.existing_document()?;
        doc.properties = properties;
        self.write_unlocked(doc)
    }

    fn existing_document(&self) -> Result<LayerDocument, StoreError> {
        match read_existing(&self.path)? {
            Some(text) => Ok(decode_layer(&text)?),
            None => Ok(LayerDocument::default()),
        }
    }

    fn write_unlocked(&self, mut doc: LayerDocument) -> Result<(), StoreError> {
        let max = max_id(&doc.pois);
        assign_ids(&mut doc.pois, max);
        write_atomic(&self.path, &encode_layer(&doc)?)?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        info!("xml store rewritten: {:?} ({} POIs)", self.path, doc.pois.len());
        Ok(())
    }
}

/// Ranks `pois` for `query` with the bounding-box prefilter.
pub fn filter_document(pois: Vec<Poi>, query: &Query) -> Vec<Poi> {
    match query.reach() {
        None => rank(pois, query, |poi| within_reach(query, poi)),
        Some(reach) => {
            let bounds = GeoBox::around(query.lat, query.lon, BOX_MARGIN * reach);
            rank(pois, query, |poi| admit(query, &bounds, reach, poi))
        }
    }
}

/// Inside the box a POI matches within `reach` or within its own visibility range.
/// Outside, only a visibility range covering both `reach` and the real distance
/// lets it through.
fn admit(query: &Query, bounds: &GeoBox, reach: f64, poi: &mut Poi) -> bool {
    let visibility = poi.visibility_range as f64;
    if bounds.contains(poi.lat, poi.lon) {
        let distance = distance_from(query, poi);
        poi.distance = Some(distance);
        distance < reach || (visibility > 0.0 && visibility >= distance)
    } else if visibility > 0.0 && visibility >= reach {
        let distance = distance_from(query, poi);
        poi.distance = Some(distance);
        visibility >= distance
    } else {
        false
    }
}

impl PoiStore for XmlStore {
    fn load_all(&self) -> Result<Vec<Poi>, StoreError> {
        Ok(self.load_document()?.pois)
    }

    fn filter(&self, query: Option<&Query>) -> Result<Vec<Poi>, StoreError> {
        let pois = self.load_all()?;
        Ok(match query {
            Some(query) => filter_document(pois, query),
            None => pois,
        })
    }

    /// Update replaces POIs in place by id and appends the rest; layer properties are
    /// kept in both modes.
    fn store(&self, pois: Vec<Poi>, mode: StoreMode) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut doc = self.existing_document()?;
        match mode {
            StoreMode::Update => {
                for poi in pois {
                    let slot = poi
                        .id
                        .and_then(|id| doc.pois.iter().position(|old| old.id == Some(id)));
                    match slot {
                        Some(index) => doc.pois[index] = poi,
                        None => doc.pois.push(poi),
                    }
                }
            }
            StoreMode::Replace => doc.pois = pois,
        }
        self.write_unlocked(doc)
    }

    fn delete(&self, id: PoiId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut doc = self.load_document()?;
        let Some(index) = doc.pois.iter().position(|poi| poi.id == Some(id)) else {
            return Err(StoreError::NotFound { id });
        };
        doc.pois.remove(index);
        self.write_unlocked(doc)
    }

    fn properties(&self) -> Result<LayerProperties, StoreError> {
        Ok(self.load_document()?.properties)
    }

    fn fetch(&self, query: &Query) -> Result<(LayerProperties, Vec<Poi>), StoreError> {
        let doc = self.load_document()?;
        Ok((doc.properties, filter_document(doc.pois, query)))
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::{XmlStore, filter_document};
    use foundation::PoiId;
    use layers::{PoiStore, Query, StoreError, StoreMode};
    use poi::{LayerProperties, Poi};
    use pretty_assertions::assert_eq;

    const LAYER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<layer>
  <refreshInterval>60</refreshInterval>
  <layerTitle>Museums</layerTitle>
  <pois>
    <poi>
      <id>1</id>
      <lat>48.158</lat>
      <lon>11.5787</lon>
      <title>Marienplatz</title>
      <visibilityRange>1500</visibilityRange>
    </poi>
    <poi>
      <id>2</id>
      <lat>0</lat>
      <lon>0</lon>
      <visibilityRange>0</visibilityRange>
    </poi>
  </pois>
</layer>
"#;

    fn ids(pois: &[Poi]) -> Vec<u64> {
        pois.iter().filter_map(|p| p.id).map(PoiId::get).collect()
    }

    fn store_with(text: &str) -> (tempfile::TempDir, XmlStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("layer.xml");
        std::fs::write(&path, text).expect("write");
        (dir, XmlStore::new(path))
    }

    fn at(id: u64, lat: f64, lon: f64, visibility_range: i64) -> Poi {
        let mut poi = Poi::point(id, lat, lon);
        poi.visibility_range = visibility_range;
        poi
    }

    #[test]
    fn fetch_returns_properties_and_matches() {
        let (_dir, store) = store_with(LAYER);
        let query = Query::new("s", "museum", 48.158, 11.5787)
            .with_radius(100.0)
            .with_accuracy(10.0);
        let (properties, pois) = store.fetch(&query).expect("fetch");
        assert_eq!(properties.refresh_interval, 60);
        assert_eq!(properties.layer_title.as_deref(), Some("Museums"));
        assert_eq!(ids(&pois), vec![1]);
        assert!(pois[0].distance.is_some_and(|d| d < 1e-6));
    }

    #[test]
    fn visibility_range_reaches_past_the_radius() {
        let query = Query::new("s", "l", 0.0, 0.0).with_radius(100.0);
        // The box reaches ~125 m; 0.0011 deg is ~122 m and 0.005 deg is ~556 m.
        let pois = vec![
            at(1, 0.0005, 0.0, 0),
            at(2, 0.0011, 0.0, 200),
            at(3, 0.005, 0.0, 1000),
            at(4, 0.005, 0.0, 100),
            at(5, 0.005, 0.0, 0),
        ];
        let ranked = filter_document(pois, &query);
        assert_eq!(ids(&ranked), vec![1, 2, 3]);
    }

    #[test]
    fn empty_visibility_range_does_not_widen_the_search() {
        let (_dir, store) = store_with(
            "<layer><pois>\
             <poi><id>1</id><lat>0.005</lat><lon>0</lon><visibilityRange></visibilityRange></poi>\
             <poi><id>2</id><lat>0.005</lat><lon>0</lon></poi>\
             </pois></layer>",
        );
        let pois = store.load_all().expect("load");
        assert_eq!(pois[0].visibility_range, 0);
        assert_eq!(pois[1].visibility_range, 1500);

        let query = Query::new("s", "l", 0.0, 0.0).with_radius(100.0);
        let ranked = store.filter(Some(&query)).expect("filter");
        assert_eq!(ids(&ranked), vec![2]);
    }

    #[test]
    fn no_radius_keeps_everything() {
        let pois = vec![at(1, 40.0, 40.0, 0), at(2, 0.0, 0.0, 0)];
        let ranked = filter_document(pois, &Query::new("s", "l", 0.0, 0.0));
        assert_eq!(ids(&ranked), vec![2, 1]);
        assert!(ranked.iter().all(|p| p.distance.is_some()));
    }

    #[test]
    fn pinned_poi_bypasses_the_prefilter() {
        let query = Query::new("s", "l", 0.0, 0.0)
            .with_radius(100.0)
            .with_pinned(PoiId::new(9));
        let pois = vec![at(1, 0.0, 0.0, 0), at(9, 60.0, 60.0, 0)];
        assert_eq!(ids(&filter_document(pois, &query)), vec![9, 1]);
    }

    #[test]
    fn update_replaces_in_place_and_appends() {
        let (_dir, store) = store_with(LAYER);
        let mut renamed = at(1, 48.158, 11.5787, 1500);
        renamed.title = Some("Rathaus".to_string());
        store
            .store(vec![renamed, Poi::default()], StoreMode::Update)
            .expect("update");

        let doc = store.load_document().expect("load");
        assert_eq!(ids(&doc.pois), vec![1, 2, 3]);
        assert_eq!(doc.pois[0].title.as_deref(), Some("Rathaus"));
        assert_eq!(doc.properties.layer_title.as_deref(), Some("Museums"));
    }

    #[test]
    fn replace_keeps_layer_properties() {
        let (_dir, store) = store_with(LAYER);
        store
            .store(vec![at(7, 1.0, 1.0, 0)], StoreMode::Replace)
            .expect("replace");
        let doc = store.load_document().expect("load");
        assert_eq!(ids(&doc.pois), vec![7]);
        assert_eq!(doc.properties.refresh_interval, 60);
    }

    #[test]
    fn store_properties_keeps_pois() {
        let (_dir, store) = store_with(LAYER);
        let mut properties = LayerProperties::default();
        properties.no_pois_message = Some("Nothing here".to_string());
        store.store_properties(properties.clone()).expect("properties");

        let doc = store.load_document().expect("load");
        assert_eq!(doc.properties, properties);
        assert_eq!(ids(&doc.pois), vec![1, 2]);
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn delete_missing_id_is_not_found() {
        let (_dir, store) = store_with(LAYER);
        let err = store.delete(PoiId::new(999)).expect_err("absent");
        assert!(matches!(err, StoreError::NotFound { .. }));
        store.delete(PoiId::new(2)).expect("delete");
        assert_eq!(ids(&store.load_all().expect("load")), vec![1]);
    }

    #[test]
    fn foreign_root_is_a_storage_error() {
        let (_dir, store) = store_with("<catalog><item/></catalog>");
        assert!(matches!(store.load_all(), Err(StoreError::Storage(_))));
    }
}
