use crate::bus::{CrowdLevel, LiveBus};
use crate::catalog::{Route, RouteCatalog};
use crate::clock::SharedRegistry;
use crate::registry::{ArrivalRecord, BusRegistry, SimulationError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Entry points UI collaborators use to drive and observe the simulation.
///
/// Cheap to clone; every clone shares the same registry. Each call holds the
/// registry lock only for the duration of the forwarded operation.
#[derive(Debug, Clone)]
pub struct ControlApi {
    catalog: Arc<RouteCatalog>,
    registry: SharedRegistry,
}

impl ControlApi {
    pub fn new(registry: BusRegistry) -> Self {
        Self {
            catalog: Arc::clone(registry.catalog()),
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    pub fn get_available_routes(&self) -> Vec<Route> {
        self.catalog.routes().to_vec()
    }

    pub async fn start_bus_simulation(
        &self,
        driver_id: &str,
        route_id: &str,
    ) -> Result<(), SimulationError> {
        self.registry.lock().await.start_simulating_bus(driver_id, route_id)
    }

    pub async fn stop_bus_simulation(&self, driver_id: &str) {
        self.registry.lock().await.stop_simulating_bus(driver_id);
    }

    pub async fn update_crowd_level(&self, driver_id: &str, level: CrowdLevel) {
        self.registry.lock().await.set_crowd_level(driver_id, level);
    }

    pub async fn get_live_buses(&self) -> Vec<LiveBus> {
        self.registry.lock().await.snapshot()
    }

    pub async fn get_bus(&self, driver_id: &str) -> Option<LiveBus> {
        self.registry.lock().await.get(driver_id)
    }

    pub async fn tick_count(&self) -> u64 {
        self.registry.lock().await.tick_count()
    }

    pub async fn recent_arrivals(&self) -> Vec<ArrivalRecord> {
        self.registry.lock().await.recent_arrivals().to_vec()
    }
}
