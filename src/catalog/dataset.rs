//! Route dataset files.
//!
//! A dataset holds a stop list and route definitions. Stops are either a plain
//! JSON list or a GeoJSON `FeatureCollection` of bus-stop points, the shape
//! stop-export services hand out.

use super::{CatalogError, RouteCatalog, RouteDefinition, Stop};
use crate::geo::LonLat;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDataset {
    pub stops: StopSource,
    pub routes: Vec<RouteDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StopSource {
    List(Vec<Stop>),
    GeoJson(FeatureCollection),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: StopProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: LonLat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopProperties {
    #[serde(default)]
    pub name: Option<String>,
    // OSM exports are inconsistent about string vs numeric ids
    #[serde(default)]
    pub osm_id: Option<serde_json::Value>,
}

impl StopSource {
    pub fn into_stops(self) -> Result<Vec<Stop>, CatalogError> {
        match self {
            StopSource::List(stops) => Ok(stops),
            StopSource::GeoJson(collection) => collection.into_stops(),
        }
    }
}

impl FeatureCollection {
    fn into_stops(self) -> Result<Vec<Stop>, CatalogError> {
        if self.kind != "FeatureCollection" {
            return Err(CatalogError::InvalidDataset(format!(
                "expected FeatureCollection, found {}",
                self.kind
            )));
        }

        self.features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| feature.into_stop(index))
            .collect()
    }
}

impl Feature {
    fn into_stop(self, index: usize) -> Result<Stop, CatalogError> {
        if self.geometry.kind != "Point" {
            return Err(CatalogError::InvalidDataset(format!(
                "feature {} has {} geometry, expected Point",
                index, self.geometry.kind
            )));
        }

        let id = match self.properties.osm_id {
            Some(serde_json::Value::String(id)) if !id.is_empty() => id,
            Some(serde_json::Value::Number(id)) => id.to_string(),
            _ => {
                return Err(CatalogError::InvalidDataset(format!(
                    "feature {} has no osm_id",
                    index
                )))
            }
        };

        let name = match self.properties.name {
            Some(name) if !name.is_empty() => name,
            _ => format!("Bus Stop {}", id),
        };

        Ok(Stop {
            id,
            name,
            location: self.geometry.coordinates,
        })
    }
}

impl CatalogDataset {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|e| CatalogError::InvalidDataset(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&contents)
    }

    pub fn into_catalog(self) -> Result<RouteCatalog, CatalogError> {
        let stops = self.stops.into_stops()?;
        RouteCatalog::build(&stops, &self.routes)
    }
}
