use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees. Serialized as a `[lon, lat]` pair, the
/// order map widgets and GeoJSON expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// True when both axes are within `tolerance_deg` of `other`.
    pub fn within(&self, other: &LonLat, tolerance_deg: f64) -> bool {
        (other.lon - self.lon).abs() <= tolerance_deg
            && (other.lat - self.lat).abs() <= tolerance_deg
    }

    /// Straight-line distance in degree space. Only meaningful for comparing
    /// nearby points; this is not a geodesic distance.
    pub fn distance_to(&self, other: &LonLat) -> f64 {
        (other.lon - self.lon).hypot(other.lat - self.lat)
    }

    /// Moves `factor` of the remaining vector toward `target`.
    pub fn lerp_toward(&self, target: &LonLat, factor: f64) -> LonLat {
        LonLat {
            lon: self.lon + (target.lon - self.lon) * factor,
            lat: self.lat + (target.lat - self.lat) * factor,
        }
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(point: LonLat) -> Self {
        [point.lon, point.lat]
    }
}

impl core::fmt::Display for LonLat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}
