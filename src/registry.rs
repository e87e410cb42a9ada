use crate::advancer::{PositionAdvancer, StepOutcome};
use crate::bus::{CrowdLevel, LiveBus};
use crate::catalog::{Route, RouteCatalog};
use heapless::Vec as BoundedVec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub const MAX_ARRIVAL_HISTORY: usize = 64;
pub const DEFAULT_SPEED_KMH: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("route not found: {0}")]
    RouteNotFound(String),
    #[error("route {route_id} has {stop_count} stops, no stop at index {index}")]
    StopIndexOutOfRange {
        route_id: String,
        index: usize,
        stop_count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalRecord {
    pub tick: u64,
    pub bus_id: String,
    pub route_id: String,
    pub stop_index: usize,
    pub stop_id: String,
}

/// What a single tick did to the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub tick: u64,
    pub moved: usize,
    pub arrivals: Vec<ArrivalRecord>,
    pub resets: usize,
    pub evicted: Vec<String>,
}

/// Authoritative mapping from bus id to live state.
///
/// Entries are kept ordered by bus id, so snapshots of an unchanged registry
/// always come back in the same order.
#[derive(Debug)]
pub struct BusRegistry {
    catalog: Arc<RouteCatalog>,
    buses: BTreeMap<String, LiveBus>,
    default_speed_kmh: f64,
    tick_count: u64,
    arrival_history: BoundedVec<ArrivalRecord, MAX_ARRIVAL_HISTORY>,
}

impl BusRegistry {
    pub fn new(catalog: Arc<RouteCatalog>) -> Self {
        Self::with_default_speed(catalog, DEFAULT_SPEED_KMH)
    }

    pub fn with_default_speed(catalog: Arc<RouteCatalog>, default_speed_kmh: f64) -> Self {
        Self {
            catalog,
            buses: BTreeMap::new(),
            default_speed_kmh,
            tick_count: 0,
            arrival_history: BoundedVec::new(),
        }
    }

    /// Places `bus_id` at the first stop of `route_id`, targeting the second.
    /// An existing entry for the same id is replaced.
    pub fn start_simulating_bus(
        &mut self,
        bus_id: &str,
        route_id: &str,
    ) -> Result<(), SimulationError> {
        let route = self
            .catalog
            .route(route_id)
            .ok_or_else(|| SimulationError::RouteNotFound(route_id.to_string()))?;
        let first_stop = route
            .stop(0)
            .ok_or_else(|| SimulationError::RouteNotFound(route_id.to_string()))?;

        let bus = LiveBus {
            id: bus_id.to_string(),
            route_id: route.id.clone(),
            location: first_stop.location,
            speed: self.default_speed_kmh,
            next_stop_index: 1 % route.stop_count(),
            crowd_level: CrowdLevel::Low,
        };
        self.buses.insert(bus_id.to_string(), bus);
        Ok(())
    }

    /// Inserts a bus at an arbitrary point of its route. The route must exist
    /// and the target index must name one of its stops.
    pub fn place_bus(&mut self, bus: LiveBus) -> Result<(), SimulationError> {
        let route = self
            .catalog
            .route(&bus.route_id)
            .ok_or_else(|| SimulationError::RouteNotFound(bus.route_id.clone()))?;
        if bus.next_stop_index >= route.stop_count() {
            return Err(SimulationError::StopIndexOutOfRange {
                route_id: route.id.clone(),
                index: bus.next_stop_index,
                stop_count: route.stop_count(),
            });
        }

        self.buses.insert(bus.id.clone(), bus);
        Ok(())
    }

    pub fn stop_simulating_bus(&mut self, bus_id: &str) {
        self.buses.remove(bus_id);
    }

    pub fn set_crowd_level(&mut self, bus_id: &str, level: CrowdLevel) {
        if let Some(bus) = self.buses.get_mut(bus_id) {
            bus.crowd_level = level;
        }
    }

    pub fn snapshot(&self) -> Vec<LiveBus> {
        self.buses.values().cloned().collect()
    }

    pub fn get(&self, bus_id: &str) -> Option<LiveBus> {
        self.buses.get(bus_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }

    pub fn catalog(&self) -> &Arc<RouteCatalog> {
        &self.catalog
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn recent_arrivals(&self) -> &[ArrivalRecord] {
        &self.arrival_history
    }

    /// Advances every registered bus by one step.
    ///
    /// Location and stop index of an entry are written together. A bus whose
    /// route can no longer be resolved is evicted without touching the others.
    pub fn tick(&mut self, advancer: &PositionAdvancer) -> TickReport {
        self.tick_count = self.tick_count.wrapping_add(1);
        let mut report = TickReport {
            tick: self.tick_count,
            ..TickReport::default()
        };

        let catalog = Arc::clone(&self.catalog);
        for bus in self.buses.values_mut() {
            let Some(route) = catalog.route(&bus.route_id) else {
                report.evicted.push(bus.id.clone());
                continue;
            };

            let step = advancer.advance(bus, route);
            bus.location = step.location;
            bus.next_stop_index = step.next_stop_index;

            match step.outcome {
                StepOutcome::Moved => report.moved += 1,
                StepOutcome::Arrived { stop_index } => {
                    report.arrivals.push(arrival(report.tick, bus, route, stop_index));
                }
                StepOutcome::Reset => {
                    warn!("Bus {} had no stop at its target index, reset to 0", bus.id);
                    report.resets += 1;
                }
            }
        }

        for bus_id in &report.evicted {
            warn!("Evicting bus {}: route no longer in catalog", bus_id);
            self.buses.remove(bus_id);
        }

        for record in &report.arrivals {
            self.record_arrival(record.clone());
        }

        report
    }

    fn record_arrival(&mut self, record: ArrivalRecord) {
        if self.arrival_history.is_full() {
            self.arrival_history.remove(0);
        }
        let _ = self.arrival_history.push(record);
    }
}

fn arrival(tick: u64, bus: &LiveBus, route: &Route, stop_index: usize) -> ArrivalRecord {
    ArrivalRecord {
        tick,
        bus_id: bus.id.clone(),
        route_id: route.id.clone(),
        stop_index,
        stop_id: route
            .stop(stop_index)
            .map_or_else(String::new, |stop| stop.id.clone()),
    }
}
