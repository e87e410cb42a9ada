//! Route catalog: the fixed set of closed-loop routes buses can be simulated on.
//!
//! Routes are assembled from a flat stop list plus route definitions that
//! reference stops by id. Every reference is resolved when the catalog is
//! built, so a catalog that exists is always internally consistent.

pub mod bhopal;
pub mod dataset;

pub use dataset::{CatalogDataset, StopSource};

use crate::geo::LonLat;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub location: LonLat,
}

impl Stop {
    pub fn new(id: &str, name: &str, location: LonLat) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub stops: Vec<Stop>,
    pub path: Vec<LonLat>,
}

impl Route {
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn stop(&self, index: usize) -> Option<&Stop> {
        self.stops.get(index)
    }
}

/// A route as written in a dataset: an ordered list of stop ids forming a loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub id: String,
    pub name: String,
    pub stop_ids: Vec<String>,
}

impl RouteDefinition {
    pub fn new(id: &str, name: &str, stop_ids: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            stop_ids: stop_ids.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("route {route_id} references unknown stop {stop_id}")]
    UnknownStop { route_id: String, stop_id: String },
    #[error("route {0} has no stops")]
    EmptyRoute(String),
    #[error("duplicate route id {0}")]
    DuplicateRoute(String),
    #[error("duplicate stop id {0}")]
    DuplicateStop(String),
    #[error("failed to read route dataset {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("invalid route dataset: {0}")]
    InvalidDataset(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteCatalog {
    routes: Vec<Route>,
}

impl RouteCatalog {
    /// Resolves every definition against `stops`. Fails on the first
    /// unknown stop id, empty route, or duplicate id.
    pub fn build(stops: &[Stop], definitions: &[RouteDefinition]) -> Result<Self, CatalogError> {
        let mut by_id: HashMap<&str, &Stop> = HashMap::with_capacity(stops.len());
        for stop in stops {
            if by_id.insert(stop.id.as_str(), stop).is_some() {
                return Err(CatalogError::DuplicateStop(stop.id.clone()));
            }
        }

        let mut routes = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let route_stops = definition
                .stop_ids
                .iter()
                .map(|stop_id| {
                    by_id.get(stop_id.as_str()).map(|stop| (*stop).clone()).ok_or_else(|| {
                        CatalogError::UnknownStop {
                            route_id: definition.id.clone(),
                            stop_id: stop_id.clone(),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let path = route_stops.iter().map(|stop| stop.location).collect();
            routes.push(Route {
                id: definition.id.clone(),
                name: definition.name.clone(),
                stops: route_stops,
                path,
            });
        }

        Self::from_routes(routes)
    }

    /// Wraps already-assembled routes after checking they are usable.
    pub fn from_routes(routes: Vec<Route>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(routes.len());
        for route in &routes {
            if route.stops.is_empty() || route.path.is_empty() {
                return Err(CatalogError::EmptyRoute(route.id.clone()));
            }
            if !seen.insert(route.id.as_str()) {
                return Err(CatalogError::DuplicateRoute(route.id.clone()));
            }
        }
        Ok(Self { routes })
    }

    /// Built-in demo routes around Bhopal.
    pub fn bhopal() -> Result<Self, CatalogError> {
        bhopal::catalog()
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        CatalogDataset::load(path)?.into_catalog()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.id == id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
