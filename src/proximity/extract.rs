//! Coordinate extraction from GeoJSON geometries and loosely-typed records.
//!
//! This is the only place where GeoJSON `[lng, lat]` positions are turned into
//! [`Coordinate`] values. Every failure mode (missing fields, malformed
//! nesting, non-numeric values, out-of-range numbers) collapses to `None` so
//! callers can exclude the record instead of handling an error.

use serde_json::Value;

use super::Coordinate;

/// A raw GeoJSON position: `[lng, lat, (alt)]`.
pub type Position = Vec<f64>;

/// The geometry shapes that carry a usable anchor point.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Position),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// Parses a GeoJSON geometry object (`{"type": ..., "coordinates": ...}`).
    pub fn from_json(value: &Value) -> Option<Self> {
        let coordinates = value.get("coordinates")?.clone();
        match value.get("type")?.as_str()? {
            "Point" => serde_json::from_value(coordinates).ok().map(Self::Point),
            "Polygon" => serde_json::from_value(coordinates).ok().map(Self::Polygon),
            "MultiPolygon" => serde_json::from_value(coordinates)
                .ok()
                .map(Self::MultiPolygon),
            _ => None,
        }
    }

    pub fn from_geojson(value: &geojson::Value) -> Option<Self> {
        match value {
            geojson::Value::Point(p) => Some(Self::Point(p.clone())),
            geojson::Value::Polygon(rings) => Some(Self::Polygon(rings.clone())),
            geojson::Value::MultiPolygon(polygons) => Some(Self::MultiPolygon(polygons.clone())),
            _ => None,
        }
    }

    /// Representative point used for proximity.
    ///
    /// Polygons use the first vertex of the outer ring, not a centroid.
    pub fn anchor(&self) -> Option<Coordinate> {
        let position = match self {
            Self::Point(p) => p,
            Self::Polygon(rings) => rings.first()?.first()?,
            Self::MultiPolygon(polygons) => polygons.first()?.first()?.first()?,
        };
        position_to_coordinate(position)
    }
}

/// Flips a GeoJSON `[lng, lat]` position into a [`Coordinate`].
pub fn position_to_coordinate(position: &[f64]) -> Option<Coordinate> {
    match position {
        [lng, lat, ..] => Coordinate::new(*lat, *lng),
        _ => None,
    }
}

/// Extracts the anchor of either a bare geometry or a `Feature` wrapping one.
pub fn locate_geojson(value: &Value) -> Option<Coordinate> {
    let geometry = match value.get("type")?.as_str()? {
        "Feature" => value.get("geometry")?,
        _ => value,
    };
    Geometry::from_json(geometry)?.anchor()
}

/// A latitude/longitude field-name pair. Names may be dotted paths into
/// nested objects (`"location.lat"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPair {
    pub lat: &'static str,
    pub lng: &'static str,
}

impl FieldPair {
    pub const fn new(lat: &'static str, lng: &'static str) -> Self {
        Self { lat, lng }
    }
}

/// Field-name pairs tried, in order, when a record has no explicit schema.
pub const DEFAULT_RECORD_FIELDS: &[FieldPair] = &[
    FieldPair::new("post_latitude", "post_longitude"),
    FieldPair::new("latitude", "longitude"),
    FieldPair::new("lat", "lng"),
    FieldPair::new("lat", "lon"),
    FieldPair::new("location.lat", "location.lng"),
    FieldPair::new("properties.latitude", "properties.longitude"),
];

/// Returns the coordinate from the first field pair whose values both coerce
/// to finite numbers forming an in-range coordinate.
pub fn locate_record(record: &Value, fields: &[FieldPair]) -> Option<Coordinate> {
    fields.iter().find_map(|pair| {
        let lat = lookup(record, pair.lat).and_then(coerce_number)?;
        let lng = lookup(record, pair.lng).and_then(coerce_number)?;
        Coordinate::new(lat, lng)
    })
}

fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |value, key| value.get(key))
}

/// Numeric coercion for JSON values: numbers as-is, strings parsed after
/// trimming. Non-finite results are rejected.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
