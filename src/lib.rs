//! # Live Bus Position Simulator
//!
//! A process-wide simulation of buses driving closed-loop routes, built for
//! map, driver, rider and admin views that poll for live positions.
//!
//! ## Features
//!
//! - **Route catalog**: routes assembled from stop lists, with a built-in demo
//!   network and JSON / GeoJSON dataset loading
//! - **Bus registry**: live state per driver session, with stable snapshots
//! - **Position advancer**: exponential approach toward the next stop, looping
//!   back to the first stop after the last
//! - **Simulation clock**: non-overlapping ticks on a tokio task with an
//!   explicit stop handle
//! - **Command server**: JSON-lines protocol over TCP for out-of-process views
//!
//! ## Quick Start
//!
//! ```rust
//! use bustrack::{BusRegistry, CrowdLevel, PositionAdvancer, RouteCatalog};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(RouteCatalog::bhopal().unwrap());
//! let mut registry = BusRegistry::new(catalog);
//!
//! registry.start_simulating_bus("driver-1", "route_1").unwrap();
//! registry.set_crowd_level("driver-1", CrowdLevel::High);
//! registry.tick(&PositionAdvancer::default());
//!
//! for bus in registry.snapshot() {
//!     println!("{} at {} heading to stop {}", bus.id, bus.location, bus.next_stop_index);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`catalog`] - Stops, routes and dataset loading
//! - [`registry`] - Live bus state and the per-tick update
//! - [`advancer`] - Single-bus step function
//! - [`clock`] - Periodic tick task
//! - [`control`] - Control API handle shared with collaborators
//! - [`simulator`] - Orchestrator and command dispatch
//! - [`protocol`] / [`server`] - Wire format and TCP server

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]

pub mod advancer;
pub mod bus;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod control;
pub mod geo;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod simulator;

// Re-export main public types for convenience
pub use advancer::PositionAdvancer;
pub use bus::{CrowdLevel, LiveBus};
pub use catalog::{Route, RouteCatalog, Stop};
pub use clock::{ClockHandle, SimulationClock};
pub use config::SimulatorConfig;
pub use control::ControlApi;
pub use geo::LonLat;
pub use protocol::{Command, CommandResponse, CommandType};
pub use registry::{BusRegistry, SimulationError};
pub use simulator::BusSimulator;
