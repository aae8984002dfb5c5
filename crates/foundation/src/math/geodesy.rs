/// Mean earth radius used for all distance math (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_010.0;

/// Largest longitude half-span a prefilter box can usefully have (degrees).
pub const MAX_LON_DELTA_DEG: f64 = 180.0;

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        great_circle_distance(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Great-circle distance in meters between two points given in degrees.
///
/// Uses the haversine form of the spherical law of cosines. Precision degrades for
/// antipodal points, which never occur at the query radii this is used for.
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let delta_lat = lat1 - lat2;
    let delta_lon = lon1 - lon2;
    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1.0.
    let delta_sigma = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * delta_sigma
}

/// Latitude difference (degrees) covered by moving `distance_m` north or south.
///
/// Independent of latitude on a sphere; the parameter is kept for symmetry with
/// [`lon_delta`].
pub fn lat_delta(distance_m: f64, _lat_deg: f64) -> f64 {
    distance_m / (std::f64::consts::PI / 180.0 * EARTH_RADIUS_M)
}

/// Longitude difference (degrees) covered by moving `distance_m` east or west at
/// `lat_deg`.
///
/// Near the poles the exact value diverges; the result is clamped to
/// [`MAX_LON_DELTA_DEG`] so a box built from it spans every longitude.
pub fn lon_delta(distance_m: f64, lat_deg: f64) -> f64 {
    let delta =
        distance_m / (std::f64::consts::PI / 180.0 * lat_deg.to_radians().cos() * EARTH_RADIUS_M);
    if !delta.is_finite() || delta < 0.0 || delta > MAX_LON_DELTA_DEG {
        return MAX_LON_DELTA_DEG;
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::{
        EARTH_RADIUS_M, GeoPoint, MAX_LON_DELTA_DEG, great_circle_distance, lat_delta, lon_delta,
    };

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(great_circle_distance(48.158, 11.5787, 48.158, 11.5787), 0.0);
        assert_eq!(great_circle_distance(-89.0, 179.0, -89.0, 179.0), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let samples = [
            (48.158, 11.5787, 52.3702, 4.8952),
            (0.0, 0.0, -33.8688, 151.2093),
            (89.5, -170.0, -12.0, 45.0),
            (10.0, 179.9, 10.0, -179.9),
        ];
        for (lat1, lon1, lat2, lon2) in samples {
            let ab = great_circle_distance(lat1, lon1, lat2, lon2);
            let ba = great_circle_distance(lat2, lon2, lat1, lon1);
            assert_close(ab, ba, 1e-6);
        }
    }

    #[test]
    fn one_degree_of_latitude() {
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert_close(great_circle_distance(0.0, 0.0, 1.0, 0.0), expected, 1e-6);
    }

    #[test]
    fn quarter_meridian() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(90.0, 0.0);
        assert_close(a.distance_to(&b), EARTH_RADIUS_M * std::f64::consts::FRAC_PI_2, 1e-6);
    }

    #[test]
    fn deltas_invert_distance() {
        let d = 1250.0;
        let dlat = lat_delta(d, 48.0);
        assert_close(great_circle_distance(48.0, 11.0, 48.0 + dlat, 11.0), d, 1e-3);

        let dlon = lon_delta(d, 48.0);
        // Along a parallel the great circle is slightly shorter than the parallel arc.
        let along = great_circle_distance(48.0, 11.0, 48.0, 11.0 + dlon);
        assert!(along <= d + 1e-6);
        assert_close(along, d, 0.01);
    }

    #[test]
    fn lon_delta_is_clamped_at_the_poles() {
        assert_eq!(lon_delta(1000.0, 90.0), MAX_LON_DELTA_DEG);
        assert_eq!(lon_delta(1000.0, -90.0), MAX_LON_DELTA_DEG);
        assert!(lon_delta(1000.0, 89.0) < MAX_LON_DELTA_DEG);
    }
}
