//! Offshore point projection.
//!
//! The Chilean coastline faces west, so "offshore" is a pure westward shift
//! along the parallel. One nautical mile is 1/60 of a degree of latitude; the
//! longitude shift is stretched by `1 / cos(latitude)` so the offset keeps its
//! true length as meridians converge.

use crate::GeoPoint;

/// Degrees of latitude per nautical mile
pub const DEGREES_PER_NM: f64 = 1.0 / 60.0;

/// Latitude band edge used for the longitude stretch; closer to the poles
/// `1 / cos(latitude)` diverges.
pub const MAX_STRETCH_LATITUDE: f64 = 89.9;

/// Wrap a longitude into [-180, 180).
pub fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Shift `coast` westward by `distance_nm`, holding latitude fixed.
///
/// The result always lies in [-180, 180) longitude, wrapping across the
/// antimeridian when needed.
pub fn offshore_point(coast: GeoPoint, distance_nm: f64) -> GeoPoint {
    let lat_rad = coast
        .latitude
        .clamp(-MAX_STRETCH_LATITUDE, MAX_STRETCH_LATITUDE)
        .to_radians();
    let delta_lon = distance_nm * DEGREES_PER_NM / lat_rad.cos();

    GeoPoint {
        latitude: coast.latitude,
        longitude: wrap_longitude(coast.longitude - delta_lon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equator_shift_is_one_sixtieth_per_mile() {
        let p = offshore_point(GeoPoint::new(0.0, -70.0), 6.0);
        assert_eq!(p.latitude, 0.0);
        assert!((p.longitude - (-70.1)).abs() < 1e-9);
    }

    #[test]
    fn test_longitude_shift_widens_with_latitude() {
        let coast = GeoPoint::new(-60.0, -70.0);
        let p = offshore_point(coast, 1.0);

        // cos(60°) = 0.5, so one mile spans twice the longitude
        let expected = -70.0 - 2.0 / 60.0;
        assert!((p.longitude - expected).abs() < 1e-9);
        assert_eq!(p.latitude, coast.latitude);
    }

    #[test]
    fn test_zero_distance_is_identity() {
        let coast = GeoPoint::new(-33.03, -71.63);
        assert_eq!(offshore_point(coast, 0.0), coast);
    }

    #[test]
    fn test_projection_moves_west() {
        let coast = GeoPoint::new(-36.8, -73.05);
        let near = offshore_point(coast, 1.0);
        let far = offshore_point(coast, 5.0);
        assert!(near.longitude < coast.longitude);
        assert!(far.longitude < near.longitude);
    }

    #[test]
    fn test_pole_stays_finite_and_in_range() {
        for latitude in [90.0, -90.0] {
            let p = offshore_point(GeoPoint::new(latitude, -70.0), 1.0);
            assert!(p.longitude.is_finite());
            assert!((-180.0..180.0).contains(&p.longitude), "{}", p.longitude);
            assert_eq!(p.latitude, latitude);
        }

        // Stretch is capped at the 89.9° band edge
        let capped = offshore_point(GeoPoint::new(90.0, -70.0), 1.0);
        let edge = offshore_point(GeoPoint::new(89.9, -70.0), 1.0);
        assert!((capped.longitude - edge.longitude).abs() < 1e-9);
    }

    #[test]
    fn test_antimeridian_wraps() {
        let p = offshore_point(GeoPoint::new(-80.0, -179.95), 5.0);
        // 5 nm at 80°S is about 0.48° of longitude
        assert!(p.longitude > 179.0 && p.longitude < 180.0, "{}", p.longitude);
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(-71.63), -71.63);
        assert_eq!(wrap_longitude(180.0), -180.0);
        assert!((wrap_longitude(-180.5) - 179.5).abs() < 1e-9);
        assert!((wrap_longitude(190.0) - (-170.0)).abs() < 1e-9);
    }
}
