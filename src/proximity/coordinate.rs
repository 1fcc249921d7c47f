use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// A validated latitude/longitude pair in degrees.
///
/// Only constructible through [`Coordinate::new`], so a value of this type is
/// always finite and within `lat ∈ [-90, 90]`, `lng ∈ [-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::from(*self)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

const KEY_SCALE: f64 = 1_000_000.0;

/// Coordinate rounded to 6 decimal places (~0.1 m), usable as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    lat_e6: i64,
    lng_e6: i64,
}

impl From<Coordinate> for CoordinateKey {
    fn from(c: Coordinate) -> Self {
        Self {
            lat_e6: (c.lat * KEY_SCALE).round() as i64,
            lng_e6: (c.lng * KEY_SCALE).round() as i64,
        }
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}_{:.6}",
            self.lat_e6 as f64 / KEY_SCALE,
            self.lng_e6 as f64 / KEY_SCALE
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_range_edges() {
        assert!(Coordinate::new(90.0, 180.0).is_some());
        assert!(Coordinate::new(-90.0, -180.0).is_some());
        assert!(Coordinate::new(0.0, 0.0).is_some());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Coordinate::new(90.0001, 0.0).is_none());
        assert!(Coordinate::new(0.0, -180.5).is_none());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_none());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_none());
    }

    #[test]
    fn key_rounds_to_six_places() {
        let a = Coordinate::new(13.756_300_4, 100.501_800_4).unwrap();
        let b = Coordinate::new(13.756_299_6, 100.501_799_6).unwrap();
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().to_string(), "13.756300_100.501800");

        let c = Coordinate::new(13.756_302, 100.5018).unwrap();
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn serializes_lat_lng() {
        let c = Coordinate::new(13.75, 100.5).unwrap();
        let json = serde_json::to_value(c).unwrap();
        assert_eq!(json, serde_json::json!({ "lat": 13.75, "lng": 100.5 }));
    }
}
