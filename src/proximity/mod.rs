//! Radius search shared by citizen reports, impact reports and mines.

mod coordinate;
mod distance;
pub mod extract;
mod filter;

pub use coordinate::{Coordinate, CoordinateKey};
pub use distance::haversine_km;
pub use extract::{locate_geojson, locate_record, Geometry, DEFAULT_RECORD_FIELDS};
pub use filter::{within_radius, BoundingBox, Nearby};
