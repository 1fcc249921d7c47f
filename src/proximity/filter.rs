use serde::Serialize;

use super::{haversine_km, Coordinate};

const KM_PER_DEG: f64 = 111.32;

/// A candidate retained by [`within_radius`], annotated with its distance.
#[derive(Debug, Clone, Serialize)]
pub struct Nearby<T> {
    #[serde(flatten)]
    pub item: T,
    /// Kilometers from the reference point, rounded to two decimals.
    pub distance: f64,
}

impl<T> Nearby<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Nearby<U> {
        Nearby {
            item: f(self.item),
            distance: self.distance,
        }
    }
}

/// Keeps the candidates within `radius_km` of `reference`, nearest first.
///
/// Candidates for which `locate` returns `None` are dropped. The radius
/// boundary is inclusive and compared at full precision; rounding is applied
/// to the annotated distance only after sorting. Ties keep input order.
pub fn within_radius<T, I, F>(
    reference: Coordinate,
    candidates: I,
    radius_km: f64,
    locate: F,
) -> Vec<Nearby<T>>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Option<Coordinate>,
{
    let mut retained: Vec<(T, f64)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let position = locate(&candidate)?;
            let distance = haversine_km(reference, position);
            (distance <= radius_km).then_some((candidate, distance))
        })
        .collect();

    retained.sort_by(|a, b| a.1.total_cmp(&b.1));

    retained
        .into_iter()
        .map(|(item, distance)| Nearby {
            item,
            distance: round2(distance),
        })
        .collect()
}

#[inline]
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Conservative lat/lng box enclosing a search circle, for cheap index
/// prefiltering before [`within_radius`] runs on the survivors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn around(center: Coordinate, radius_km: f64) -> Self {
        // pad so the box never clips what the haversine filter would keep
        let padded = radius_km * 1.01 + 0.01;
        let dlat = padded / KM_PER_DEG;
        let min_lat = (center.lat() - dlat).max(-90.0);
        let max_lat = (center.lat() + dlat).min(90.0);

        let touches_pole = min_lat <= -89.0 || max_lat >= 89.0;
        let widest_cos = min_lat.to_radians().cos().min(max_lat.to_radians().cos());
        let dlng = padded / (KM_PER_DEG * widest_cos.max(0.01));
        let min_lng = center.lng() - dlng;
        let max_lng = center.lng() + dlng;

        if touches_pole || min_lng < -180.0 || max_lng > 180.0 {
            return Self {
                min_lat,
                max_lat,
                min_lng: -180.0,
                max_lng: 180.0,
            };
        }

        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    #[cfg(test)]
    pub fn contains(&self, c: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&c.lat())
            && (self.min_lng..=self.max_lng).contains(&c.lng())
    }
}
