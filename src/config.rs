use crate::advancer::{PositionAdvancer, DEFAULT_ARRIVAL_TOLERANCE_DEG, DEFAULT_MOVE_FACTOR};
use crate::clock::{SimulationClock, DEFAULT_TICK_PERIOD_MS};
use crate::registry::DEFAULT_SPEED_KMH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("invalid config file: {0}")]
    Parse(String),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Simulator settings. Every field has a default, so a config file only needs
/// the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub host: String,
    pub port: u16,
    pub tick_period_ms: u64,
    pub move_factor: f64,
    pub arrival_tolerance_deg: f64,
    pub default_speed_kmh: f64,
    pub seed_demo_buses: bool,
    /// Route dataset to load instead of the built-in demo routes.
    pub routes_file: Option<PathBuf>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            move_factor: DEFAULT_MOVE_FACTOR,
            arrival_tolerance_deg: DEFAULT_ARRIVAL_TOLERANCE_DEG,
            default_speed_kmh: DEFAULT_SPEED_KMH,
            seed_demo_buses: true,
            routes_file: None,
        }
    }
}

impl SimulatorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_period_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(self.move_factor > 0.0 && self.move_factor <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "move_factor",
                reason: format!("{} is outside (0, 1]", self.move_factor),
            });
        }
        if !(self.arrival_tolerance_deg > 0.0 && self.arrival_tolerance_deg.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "arrival_tolerance_deg",
                reason: format!("{} is not a positive tolerance", self.arrival_tolerance_deg),
            });
        }
        if !(self.default_speed_kmh >= 0.0 && self.default_speed_kmh.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "default_speed_kmh",
                reason: format!("{} is negative or not finite", self.default_speed_kmh),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn advancer(&self) -> PositionAdvancer {
        PositionAdvancer::new(self.move_factor, self.arrival_tolerance_deg)
    }

    pub fn clock(&self) -> SimulationClock {
        SimulationClock::new(self.tick_period(), self.advancer())
    }
}
