use std::cmp::Ordering;

use foundation::math::great_circle_distance;
use poi::Poi;

use crate::query::Query;

/// Ancillary predicate every candidate must pass besides the distance test.
pub fn passes_filter(poi: &Poi, _query: &Query) -> bool {
    poi.is_visible
}

/// Distance from the requester to `poi`, meters.
pub fn distance_from(query: &Query, poi: &Poi) -> f64 {
    great_circle_distance(query.lat, query.lon, poi.lat, poi.lon)
}

/// Ranks candidates for `query`.
///
/// The pinned POI is set aside, with its distance filled in, and skips every test.
/// If several POIs share the pinned id, the last one wins and the others are
/// dropped. Other POIs must pass [`passes_filter`] and `admit`, which decides
/// inclusion and records the distance on the POI. Survivors are stably sorted by
/// distance and the pinned POI goes first.
pub fn rank<F>(candidates: Vec<Poi>, query: &Query, mut admit: F) -> Vec<Poi>
where
    F: FnMut(&mut Poi) -> bool,
{
    let mut pinned: Option<Poi> = None;
    let mut kept = Vec::new();
    for mut poi in candidates {
        if query.is_pinned(poi.id) {
            poi.distance = Some(distance_from(query, &poi));
            pinned = Some(poi);
        } else if passes_filter(&poi, query) && admit(&mut poi) {
            kept.push(poi);
        }
    }
    sort_by_distance(&mut kept);
    if let Some(poi) = pinned {
        kept.insert(0, poi);
    }
    kept
}

/// Stable ascending sort; POIs without a distance sort as zero.
pub fn sort_by_distance(pois: &mut [Poi]) {
    pois.sort_by(|a, b| {
        let a = a.distance.unwrap_or(0.0);
        let b = b.distance.unwrap_or(0.0);
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    });
}

/// Plain radius test: every POI gets its exact distance and is kept when the
/// radius is unset or the distance is below radius plus accuracy.
pub fn within_reach(query: &Query, poi: &mut Poi) -> bool {
    let distance = distance_from(query, poi);
    poi.distance = Some(distance);
    query.reach().is_none_or(|reach| distance < reach)
}
