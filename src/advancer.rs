use crate::bus::LiveBus;
use crate::catalog::Route;
use crate::geo::LonLat;

pub const DEFAULT_MOVE_FACTOR: f64 = 0.1;
// Roughly 10 m at Bhopal's latitude
pub const DEFAULT_ARRIVAL_TOLERANCE_DEG: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    /// The bus reached the stop at `stop_index` and now targets the next one.
    Arrived { stop_index: usize },
    /// The target index was out of range for the route and was reset to 0.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub location: LonLat,
    pub next_stop_index: usize,
    pub outcome: StepOutcome,
}

/// Computes one simulation step for a single bus.
///
/// Each step moves a fixed fraction of the remaining vector toward the target
/// stop, so buses approach stops exponentially rather than at constant speed.
/// The bus's `speed` field does not take part in the calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionAdvancer {
    move_factor: f64,
    arrival_tolerance_deg: f64,
}

impl PositionAdvancer {
    pub fn new(move_factor: f64, arrival_tolerance_deg: f64) -> Self {
        Self {
            move_factor,
            arrival_tolerance_deg,
        }
    }

    pub fn move_factor(&self) -> f64 {
        self.move_factor
    }

    pub fn arrival_tolerance_deg(&self) -> f64 {
        self.arrival_tolerance_deg
    }

    pub fn advance(&self, bus: &LiveBus, route: &Route) -> Step {
        let Some(target) = route.stop(bus.next_stop_index) else {
            return Step {
                location: bus.location,
                next_stop_index: 0,
                outcome: StepOutcome::Reset,
            };
        };

        if bus.location.within(&target.location, self.arrival_tolerance_deg) {
            return Step {
                location: bus.location,
                next_stop_index: (bus.next_stop_index + 1) % route.stop_count(),
                outcome: StepOutcome::Arrived {
                    stop_index: bus.next_stop_index,
                },
            };
        }

        Step {
            location: bus.location.lerp_toward(&target.location, self.move_factor),
            next_stop_index: bus.next_stop_index,
            outcome: StepOutcome::Moved,
        }
    }
}

impl Default for PositionAdvancer {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_FACTOR, DEFAULT_ARRIVAL_TOLERANCE_DEG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::CrowdLevel;
    use crate::catalog::Stop;

    fn route(points: &[(f64, f64)]) -> Route {
        let stops: Vec<Stop> = points
            .iter()
            .enumerate()
            .map(|(i, &(lon, lat))| {
                Stop::new(&format!("s{}", i), &format!("Stop {}", i), LonLat::new(lon, lat))
            })
            .collect();
        let path = stops.iter().map(|s| s.location).collect();
        Route {
            id: "R1".to_string(),
            name: "Test".to_string(),
            stops,
            path,
        }
    }

    fn bus_at(location: LonLat, next_stop_index: usize) -> LiveBus {
        LiveBus {
            id: "b1".to_string(),
            route_id: "R1".to_string(),
            location,
            speed: 25.0,
            next_stop_index,
            crowd_level: CrowdLevel::Low,
        }
    }

    #[test]
    fn test_first_step_moves_ten_percent() {
        let route = route(&[(0.0, 0.0), (0.0, 10.0)]);
        let step = PositionAdvancer::default().advance(&bus_at(LonLat::new(0.0, 0.0), 1), &route);

        assert_eq!(step.outcome, StepOutcome::Moved);
        assert_eq!(step.next_stop_index, 1);
        assert!((step.location.lat - 1.0).abs() < 1e-12);
        assert_eq!(step.location.lon, 0.0);
    }

    #[test]
    fn test_converges_then_arrives_once() {
        let advancer = PositionAdvancer::default();
        let route = route(&[(0.0, 0.0), (0.0, 10.0)]);
        let target = LonLat::new(0.0, 10.0);
        let mut bus = bus_at(LonLat::new(0.0, 0.0), 1);

        let mut moves = 0;
        loop {
            let before = bus.location.distance_to(&target);
            let step = advancer.advance(&bus, &route);
            bus.location = step.location;
            bus.next_stop_index = step.next_stop_index;

            match step.outcome {
                StepOutcome::Moved => {
                    assert!(bus.location.distance_to(&target) < before);
                    moves += 1;
                    assert!(moves < 1000, "bus never reached its stop");
                }
                StepOutcome::Arrived { stop_index } => {
                    assert_eq!(stop_index, 1);
                    break;
                }
                StepOutcome::Reset => panic!("unexpected reset"),
            }
        }

        assert_eq!(bus.next_stop_index, 0);
        assert!(moves > 100);
    }

    #[test]
    fn test_arrival_leaves_location_unchanged() {
        let route = route(&[(0.0, 0.0), (0.0, 10.0)]);
        let at_stop = LonLat::new(0.00005, 9.99995);
        let step = PositionAdvancer::default().advance(&bus_at(at_stop, 1), &route);

        assert_eq!(step.outcome, StepOutcome::Arrived { stop_index: 1 });
        assert_eq!(step.location, at_stop);
        assert_eq!(step.next_stop_index, 0);
    }

    #[test]
    fn test_out_of_range_index_resets() {
        let route = route(&[(0.0, 0.0), (0.0, 10.0)]);
        let location = LonLat::new(3.0, 3.0);
        let step = PositionAdvancer::default().advance(&bus_at(location, 7), &route);

        assert_eq!(step.outcome, StepOutcome::Reset);
        assert_eq!(step.next_stop_index, 0);
        assert_eq!(step.location, location);
    }

    #[test]
    fn test_empty_route_resets_without_panicking() {
        let empty = Route {
            id: "R0".to_string(),
            name: "Empty".to_string(),
            stops: vec![],
            path: vec![],
        };
        let step = PositionAdvancer::default().advance(&bus_at(LonLat::new(1.0, 1.0), 0), &empty);
        assert_eq!(step.outcome, StepOutcome::Reset);
        assert_eq!(step.next_stop_index, 0);
    }

    #[test]
    fn test_single_stop_route_wraps_to_itself() {
        let route = route(&[(5.0, 5.0)]);
        let advancer = PositionAdvancer::default();
        let mut bus = bus_at(LonLat::new(5.0, 5.0), 0);

        for _ in 0..3 {
            let step = advancer.advance(&bus, &route);
            assert_eq!(step.outcome, StepOutcome::Arrived { stop_index: 0 });
            assert_eq!(step.next_stop_index, 0);
            bus.next_stop_index = step.next_stop_index;
        }
    }
}
