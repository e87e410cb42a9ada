use super::{CatalogError, RouteCatalog, RouteDefinition, Stop};
use crate::bus::{CrowdLevel, LiveBus};
use crate::geo::LonLat;

/// A bus seeded into the registry at bootstrap, already partway along its
/// route so the demo fleet starts spread out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoBus {
    pub id: &'static str,
    pub route_id: &'static str,
    pub location: LonLat,
    pub next_stop_index: usize,
    pub speed: f64,
    pub crowd_level: CrowdLevel,
}

impl DemoBus {
    pub fn to_live_bus(self) -> LiveBus {
        LiveBus {
            id: self.id.to_string(),
            route_id: self.route_id.to_string(),
            location: self.location,
            speed: self.speed,
            next_stop_index: self.next_stop_index,
            crowd_level: self.crowd_level,
        }
    }
}

pub const DEMO_BUSES: [DemoBus; 3] = [
    DemoBus {
        id: "BUS_001",
        route_id: "route_1",
        location: LonLat::new(77.4126, 23.2599),
        next_stop_index: 1,
        speed: 25.0,
        crowd_level: CrowdLevel::Medium,
    },
    DemoBus {
        id: "BUS_002",
        route_id: "route_1",
        location: LonLat::new(77.4050, 23.2500),
        next_stop_index: 2,
        speed: 20.0,
        crowd_level: CrowdLevel::High,
    },
    DemoBus {
        id: "BUS_003",
        route_id: "route_2",
        location: LonLat::new(77.4000, 23.2156),
        next_stop_index: 1,
        speed: 30.0,
        crowd_level: CrowdLevel::Low,
    },
];

pub fn stops() -> Vec<Stop> {
    vec![
        Stop::new("stop_1", "New Market Bus Stand", LonLat::new(77.4126, 23.2599)),
        Stop::new("stop_2", "Bhopal Junction", LonLat::new(77.4014, 23.2470)),
        Stop::new("stop_3", "MP Nagar Bus Stop", LonLat::new(77.4285, 23.2728)),
        Stop::new("stop_4", "Habibganj Railway Station", LonLat::new(77.3910, 23.2156)),
        Stop::new("stop_5", "ISBT Bhopal", LonLat::new(77.4367, 23.2156)),
    ]
}

pub fn route_definitions() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new(
            "route_1",
            "New Market - MP Nagar",
            &["stop_1", "stop_2", "stop_3"],
        ),
        RouteDefinition::new("route_2", "Habibganj - ISBT", &["stop_4", "stop_5"]),
    ]
}

pub fn catalog() -> Result<RouteCatalog, CatalogError> {
    RouteCatalog::build(&stops(), &route_definitions())
}
