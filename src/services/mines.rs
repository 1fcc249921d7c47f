//! Mining concessions loaded from GeoJSON files at startup.

use geojson::{feature, Feature, GeoJson};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

use crate::proximity::{within_radius, Coordinate, Geometry, Nearby};

const ID_KEYS: &[&str] = &[
    "dpimgisdb.gisdpim.vw_b_concession.REQ_CONCESSION_ID",
    "ROW_ID",
    "o_id",
];

const NAME_KEYS: &[&str] = &[
    "dpimgisdb.gisdpim.vw_b_concession.ADVS_FIELD1",
    "o_nmME",
    "name",
];

const UNNAMED: &str = "ไม่ระบุชื่อ";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Mine {
    pub id: String,
    pub name: String,
    pub dataset: String,
    pub location: Option<Coordinate>,
    #[schema(value_type = Object)]
    pub properties: Map<String, Value>,
}

#[derive(Debug)]
pub enum CatalogError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: geojson::Error },
    Unsupported { path: PathBuf },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "invalid GeoJSON in {}: {source}", path.display())
            }
            Self::Unsupported { path } => write!(
                f,
                "{} must contain a Feature or FeatureCollection",
                path.display()
            ),
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Default)]
pub struct MineCatalog {
    mines: Vec<Mine>,
}

impl MineCatalog {
    pub fn load(paths: &[PathBuf]) -> Result<Self, CatalogError> {
        let mut mines = Vec::new();
        for path in paths {
            let loaded = Self::load_file(path)?;
            log::info!("Loaded {} mines from {}", loaded.len(), path.display());
            mines.extend(loaded);
        }
        let unlocated = mines.iter().filter(|m| m.location.is_none()).count();
        if unlocated > 0 {
            log::warn!("{unlocated} mines have no usable geometry and will never match a search");
        }
        Ok(Self { mines })
    }

    fn load_file(path: &Path) -> Result<Vec<Mine>, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let geojson = raw.parse::<GeoJson>().map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let features = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(_) => {
                return Err(CatalogError::Unsupported {
                    path: path.to_path_buf(),
                })
            }
        };
        Ok(from_features(&dataset_name(path), features))
    }

    #[cfg(test)]
    pub fn from_mines(mines: Vec<Mine>) -> Self {
        Self { mines }
    }

    pub fn len(&self) -> usize {
        self.mines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mines.is_empty()
    }

    pub fn nearby(&self, center: Coordinate, radius_km: f64) -> Vec<Nearby<Mine>> {
        within_radius(center, self.mines.iter(), radius_km, |m| m.location)
            .into_iter()
            .map(|n| n.map(Mine::clone))
            .collect()
    }
}

fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mines".to_string())
}

pub fn from_features(dataset: &str, features: Vec<Feature>) -> Vec<Mine> {
    features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| to_mine(dataset, index, feature))
        .collect()
}

fn to_mine(dataset: &str, index: usize, feature: Feature) -> Mine {
    let properties = feature.properties.unwrap_or_default();
    let location = feature
        .geometry
        .as_ref()
        .and_then(|g| Geometry::from_geojson(&g.value))
        .and_then(|g| g.anchor());

    let id = first_text(&properties, ID_KEYS)
        .or_else(|| feature.id.map(feature_id_text))
        .unwrap_or_else(|| format!("{dataset}-{index}"));
    let name = first_text(&properties, NAME_KEYS).unwrap_or_else(|| UNNAMED.to_string());

    Mine {
        id,
        name,
        dataset: dataset.to_string(),
        location,
        properties,
    }
}

fn first_text(properties: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match properties.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn feature_id_text(id: feature::Id) -> String {
    match id {
        feature::Id::String(s) => s,
        feature::Id::Number(n) => n.to_string(),
    }
}
