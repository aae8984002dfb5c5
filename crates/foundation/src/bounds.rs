use crate::math::{lat_delta, lon_delta};

/// Latitude/longitude box centred on a point, in degrees.
///
/// Used as a cheap prefilter before exact great-circle distance. Longitude
/// containment wraps across the antimeridian.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBox {
    pub center_lat: f64,
    pub center_lon: f64,
    pub lat_delta: f64,
    pub lon_delta: f64,
}

impl GeoBox {
    pub fn new(center_lat: f64, center_lon: f64, lat_delta: f64, lon_delta: f64) -> Self {
        Self {
            center_lat,
            center_lon,
            lat_delta,
            lon_delta,
        }
    }

    /// Box reaching `distance_m` meters from the centre in each cardinal direction.
    pub fn around(center_lat: f64, center_lon: f64, distance_m: f64) -> Self {
        Self::new(
            center_lat,
            center_lon,
            lat_delta(distance_m, center_lat),
            lon_delta(distance_m, center_lat),
        )
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.center_lat - self.lat_delta || lat > self.center_lat + self.lat_delta {
            return false;
        }
        wrapped_lon_diff(lon, self.center_lon).abs() <= self.lon_delta
    }
}

/// Signed longitude difference `a - b` normalised into [-180, 180].
fn wrapped_lon_diff(a: f64, b: f64) -> f64 {
    let mut d = (a - b) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d < -180.0 {
        d += 360.0;
    }
    d
}
