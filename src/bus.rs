use crate::geo::LonLat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrowdLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl CrowdLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CrowdLevel::Low => "low",
            CrowdLevel::Medium => "medium",
            CrowdLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown crowd level {0:?} (expected low, medium or high)")]
pub struct ParseCrowdLevelError(pub String);

impl core::str::FromStr for CrowdLevel {
    type Err = ParseCrowdLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(CrowdLevel::Low),
            "medium" => Ok(CrowdLevel::Medium),
            "high" => Ok(CrowdLevel::High),
            _ => Err(ParseCrowdLevelError(s.to_string())),
        }
    }
}

impl core::fmt::Display for CrowdLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current simulated state of one bus/driver session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBus {
    pub id: String,
    pub route_id: String,
    pub location: LonLat,
    /// Reported speed in km/h. Display-only: movement is interpolation based.
    pub speed: f64,
    pub next_stop_index: usize,
    pub crowd_level: CrowdLevel,
}
