use bustrack::advancer::PositionAdvancer;
use bustrack::catalog::{RouteCatalog, RouteDefinition, Stop};
use bustrack::clock::SimulationClock;
use bustrack::control::ControlApi;
use bustrack::registry::BusRegistry;
use bustrack::{CrowdLevel, LonLat};
use std::sync::Arc;
use std::time::Duration;

fn control_api() -> ControlApi {
    let stops = vec![
        Stop::new("origin", "Origin", LonLat::new(0.0, 0.0)),
        Stop::new("north", "North", LonLat::new(0.0, 10.0)),
    ];
    let routes = [RouteDefinition::new("R1", "Origin - North", &["origin", "north"])];
    let catalog = RouteCatalog::build(&stops, &routes).unwrap();
    ControlApi::new(BusRegistry::new(Arc::new(catalog)))
}

fn clock() -> SimulationClock {
    SimulationClock::new(Duration::from_secs(2), PositionAdvancer::default())
}

#[tokio::test(start_paused = true)]
async fn test_clock_advances_buses_on_its_own() {
    let control = control_api();
    control.start_bus_simulation("b1", "R1").await.unwrap();

    let handle = clock().spawn(control.registry()).await;

    // No tick before the first period elapses
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(control.tick_count().await, 0);
    assert_eq!(control.get_bus("b1").await.unwrap().location, LonLat::new(0.0, 0.0));

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(control.tick_count().await, 1);
    let bus = control.get_bus("b1").await.unwrap();
    assert!((bus.location.lat - 1.0).abs() < 1e-9);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_ticks() {
    let control = control_api();
    control.start_bus_simulation("b1", "R1").await.unwrap();

    let handle = clock().spawn(control.registry()).await;
    tokio::time::sleep(Duration::from_millis(4500)).await;
    assert!(handle.is_running());

    handle.stop().await;
    let ticks_at_stop = control.tick_count().await;
    let location_at_stop = control.get_bus("b1").await.unwrap().location;
    assert_eq!(ticks_at_stop, 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(control.tick_count().await, ticks_at_stop);
    assert_eq!(control.get_bus("b1").await.unwrap().location, location_at_stop);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_post_tick_snapshot() {
    let control = control_api();
    control.start_bus_simulation("b1", "R1").await.unwrap();
    control.update_crowd_level("b1", CrowdLevel::Medium).await;

    let handle = clock().spawn(control.registry()).await;
    let mut snapshots = handle.subscribe();
    {
        let before_first_tick = snapshots.borrow();
        assert_eq!(before_first_tick.len(), 1);
        assert_eq!(before_first_tick[0].location, LonLat::new(0.0, 0.0));
    }

    snapshots.changed().await.unwrap();
    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].crowd_level, CrowdLevel::Medium);
    assert!(snapshot[0].location.lat > 0.0);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_between_ticks_takes_effect_before_next_tick() {
    let control = control_api();
    control.start_bus_simulation("b1", "R1").await.unwrap();
    control.start_bus_simulation("b2", "R1").await.unwrap();

    let handle = clock().spawn(control.registry()).await;
    tokio::time::sleep(Duration::from_millis(2500)).await;

    control.stop_bus_simulation("b1").await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    let buses = control.get_live_buses().await;
    assert_eq!(buses.len(), 1);
    assert_eq!(buses[0].id, "b2");
    assert_eq!(control.tick_count().await, 2);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_subscriber_sees_current_fleet_before_first_tick() {
    let control = control_api();
    control.start_bus_simulation("b1", "R1").await.unwrap();
    control.start_bus_simulation("b2", "R1").await.unwrap();

    let handle = clock().spawn(control.registry()).await;
    let snapshots = handle.subscribe();

    let ids: Vec<String> = snapshots.borrow().iter().map(|bus| bus.id.clone()).collect();
    assert_eq!(ids, vec!["b1", "b2"]);
    assert_eq!(control.tick_count().await, 0);

    handle.stop().await;
}
