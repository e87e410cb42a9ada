use crate::bus::LiveBus;
use crate::catalog::bhopal::DEMO_BUSES;
use crate::catalog::{CatalogError, RouteCatalog};
use crate::clock::ClockHandle;
use crate::config::{ConfigError, SimulatorConfig};
use crate::control::ControlApi;
use crate::protocol::{Command, CommandResponse, CommandType, ProtocolHandler, ResponseStatus};
use crate::registry::{ArrivalRecord, BusRegistry, SimulationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("route catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to seed demo bus: {0}")]
    Seed(#[from] SimulationError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatorState {
    pub running: bool,
    pub command_count: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorStatus {
    pub running: bool,
    pub uptime_seconds: u64,
    pub command_count: u32,
    pub tick_count: u64,
    pub tick_period_ms: u64,
    pub bus_count: usize,
    pub route_count: usize,
    pub last_error: Option<String>,
    pub recent_arrivals: Vec<ArrivalRecord>,
}

/// Owns the simulation: route catalog, bus registry (behind the Control API)
/// and the clock that advances it. Also the dispatcher for protocol commands.
pub struct BusSimulator {
    config: SimulatorConfig,
    control: ControlApi,
    protocol_handler: ProtocolHandler,
    clock: Option<ClockHandle>,
    state: SimulatorState,
    started_at: Option<Instant>,
}

impl BusSimulator {
    /// Loads the catalog and seeds demo buses. Any inconsistency in route
    /// data or demo buses fails here rather than at tick time.
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        config.validate()?;

        let catalog = match &config.routes_file {
            Some(path) => RouteCatalog::load(path)?,
            None => RouteCatalog::bhopal()?,
        };
        info!("🗺️  Loaded {} routes", catalog.len());

        let mut registry =
            BusRegistry::with_default_speed(Arc::new(catalog), config.default_speed_kmh);
        if config.seed_demo_buses {
            for demo in &DEMO_BUSES {
                registry.place_bus(demo.to_live_bus())?;
            }
            info!("🚌 Seeded {} demo buses", DEMO_BUSES.len());
        }

        Ok(Self {
            config,
            control: ControlApi::new(registry),
            protocol_handler: ProtocolHandler::new(),
            clock: None,
            state: SimulatorState::default(),
            started_at: None,
        })
    }

    /// Starts the simulation clock. Calling it on a running simulator is a no-op.
    pub async fn start(&mut self) {
        if self.clock.is_some() {
            return;
        }

        let clock = self.config.clock();
        self.clock = Some(clock.spawn(self.control.registry()).await);
        self.state.running = true;
        self.started_at = Some(Instant::now());
        info!("🚀 Bus simulator started ({} ms tick)", self.config.tick_period_ms);
    }

    pub async fn stop(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.stop().await;
        }
        self.state.running = false;
        info!("🛑 Bus simulator stopped");
    }

    pub fn control(&self) -> ControlApi {
        self.control.clone()
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulatorState {
        &self.state
    }

    /// Live fleet snapshots, available while the clock is running. The
    /// receiver holds the fleet as of `start` until the first tick lands.
    pub fn subscribe(&self) -> Option<watch::Receiver<Vec<LiveBus>>> {
        self.clock.as_ref().map(ClockHandle::subscribe)
    }

    pub async fn status(&self) -> SimulatorStatus {
        let (tick_count, bus_count, recent_arrivals) = {
            let registry = self.control.registry();
            let registry_guard = registry.lock().await;
            (
                registry_guard.tick_count(),
                registry_guard.len(),
                registry_guard.recent_arrivals().to_vec(),
            )
        };

        SimulatorStatus {
            running: self.state.running,
            uptime_seconds: self.started_at.map_or(0, |t| t.elapsed().as_secs()),
            command_count: self.state.command_count,
            tick_count,
            tick_period_ms: self.config.tick_period_ms,
            bus_count,
            route_count: self.control.get_available_routes().len(),
            last_error: self.state.last_error.clone(),
            recent_arrivals,
        }
    }

    pub async fn execute_command(&mut self, command: Command) -> CommandResponse {
        self.state.command_count = self.state.command_count.saturating_add(1);

        if let Err(e) = self.protocol_handler.validate_command(&command) {
            return self.protocol_handler.create_response(
                command.id,
                ResponseStatus::InvalidCommand,
                Some(&format!("Command validation failed: {}", e)),
            );
        }

        match command.command_type {
            CommandType::Ping => self
                .protocol_handler
                .create_response(command.id, ResponseStatus::Success, Some("pong")),

            CommandType::SimulatorStatus => {
                let status = self.status().await;
                self.data_response(command.id, &status)
            }

            CommandType::GetAvailableRoutes => {
                let routes = self.control.get_available_routes();
                self.data_response(command.id, &routes)
            }

            CommandType::GetLiveBuses => {
                let buses = self.control.get_live_buses().await;
                self.data_response(command.id, &buses)
            }

            CommandType::GetBus { driver_id } => match self.control.get_bus(&driver_id).await {
                Some(bus) => self.data_response(command.id, &bus),
                None => self.protocol_handler.create_response(
                    command.id,
                    ResponseStatus::Error,
                    Some(&format!("No live bus for driver {}", driver_id)),
                ),
            },

            CommandType::StartBusSimulation { driver_id, route_id } => {
                match self.control.start_bus_simulation(&driver_id, &route_id).await {
                    Ok(()) => {
                        info!("▶️  {} started sharing on {}", driver_id, route_id);
                        self.protocol_handler.create_response(
                            command.id,
                            ResponseStatus::Success,
                            Some(&format!("{} is now simulating on {}", driver_id, route_id)),
                        )
                    }
                    Err(e) => {
                        warn!("Start for {} rejected: {}", driver_id, e);
                        let message = e.to_string();
                        let response = self.protocol_handler.create_response(
                            command.id,
                            ResponseStatus::Error,
                            Some(&message),
                        );
                        self.state.last_error = Some(message);
                        response
                    }
                }
            }

            CommandType::StopBusSimulation { driver_id } => {
                self.control.stop_bus_simulation(&driver_id).await;
                info!("⏸️  {} stopped sharing", driver_id);
                self.protocol_handler.create_response(command.id, ResponseStatus::Success, None)
            }

            CommandType::UpdateCrowdLevel { driver_id, level } => {
                self.control.update_crowd_level(&driver_id, level).await;
                self.protocol_handler.create_response(command.id, ResponseStatus::Success, None)
            }
        }
    }

    fn data_response<T: Serialize>(&mut self, command_id: u32, value: &T) -> CommandResponse {
        match serde_json::to_value(value) {
            Ok(data) => self.protocol_handler.create_data_response(command_id, data),
            Err(e) => {
                self.state.last_error = Some(format!("Serialization error: {}", e));
                self.protocol_handler.create_response(
                    command_id,
                    ResponseStatus::Error,
                    Some(&format!("Serialization error: {}", e)),
                )
            }
        }
    }
}
