use super::Coordinate;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lng = (b.lng() - a.lng()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat().to_radians().cos() * b.lat().to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn identity_is_zero() {
        for p in [c(0.0, 0.0), c(13.7563, 100.5018), c(-89.9, 179.9), c(90.0, -180.0)] {
            assert_eq!(haversine_km(p, p), 0.0);
        }
    }

    #[test]
    fn symmetric() {
        let pairs = [
            (c(13.7563, 100.5018), c(13.80, 100.55)),
            (c(51.5074, -0.1278), c(40.7128, -74.0060)),
            (c(-33.8688, 151.2093), c(35.6762, 139.6503)),
            (c(0.0, 179.9), c(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < TOLERANCE);
        }
    }

    #[test]
    fn triangle_inequality() {
        let points = [
            c(13.7563, 100.5018),
            c(18.7883, 98.9853),
            c(7.8804, 98.3923),
            c(-33.8688, 151.2093),
            c(64.1466, -21.9426),
            c(0.0, -179.5),
        ];
        for &a in &points {
            for &b in &points {
                for &m in &points {
                    let direct = haversine_km(a, b);
                    let via = haversine_km(a, m) + haversine_km(m, b);
                    assert!(direct <= via + 1e-6, "{a} -> {b} via {m}");
                }
            }
        }
    }

    #[test]
    fn bangkok_neighbourhood() {
        let d = haversine_km(c(13.7563, 100.5018), c(13.80, 100.55));
        assert!(d > 7.0 && d < 7.3, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_km(c(0.0, 0.0), c(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = haversine_km(c(0.0, 0.0), c(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);

        let d = haversine_km(c(90.0, 0.0), c(-90.0, 0.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn crossing_the_antimeridian_is_short() {
        let d = haversine_km(c(0.0, 179.9), c(0.0, -179.9));
        assert!(d < 23.0, "got {d}");
    }
}
