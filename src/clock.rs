use crate::advancer::PositionAdvancer;
use crate::bus::LiveBus;
use crate::registry::{BusRegistry, TickReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

pub type SharedRegistry = Arc<Mutex<BusRegistry>>;

pub const DEFAULT_TICK_PERIOD_MS: u64 = 2000;

/// Drives every registered bus forward on a fixed period.
///
/// Ticks run one after another on a single task, each holding the registry
/// lock for the whole update, so a Control API call always lands entirely
/// before or after a tick. Ticks that fall behind are skipped, not queued.
#[derive(Debug, Clone, Copy)]
pub struct SimulationClock {
    period: Duration,
    advancer: PositionAdvancer,
}

impl SimulationClock {
    pub fn new(period: Duration, advancer: PositionAdvancer) -> Self {
        Self { period, advancer }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts the clock task. The first tick fires one period from now;
    /// until then subscribers see the fleet as it was at spawn time.
    pub async fn spawn(self, registry: SharedRegistry) -> ClockHandle {
        let initial = registry.lock().await.snapshot();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("⏱️  Simulation clock started ({} ms period)", self.period.as_millis());

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        let snapshot = {
                            let mut registry_guard = registry.lock().await;
                            let report = registry_guard.tick(&self.advancer);
                            log_tick(&report);
                            registry_guard.snapshot()
                        };
                        snapshot_tx.send_replace(snapshot);
                    }
                }
            }

            info!("⏹️  Simulation clock stopped");
        });

        ClockHandle {
            task,
            shutdown: shutdown_tx,
            snapshots: snapshot_rx,
        }
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TICK_PERIOD_MS), PositionAdvancer::default())
    }
}

fn log_tick(report: &TickReport) {
    debug!(
        "Tick {}: {} moved, {} arrived, {} reset, {} evicted",
        report.tick,
        report.moved,
        report.arrivals.len(),
        report.resets,
        report.evicted.len()
    );
    for arrival in &report.arrivals {
        debug!("🚏 {} reached {} on {}", arrival.bus_id, arrival.stop_id, arrival.route_id);
    }
}

/// Cancellation handle for a running clock. Dropping the handle also stops
/// the clock at its next scheduling point.
#[derive(Debug)]
pub struct ClockHandle {
    task: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
    snapshots: watch::Receiver<Vec<LiveBus>>,
}

impl ClockHandle {
    /// Latest fleet snapshot: the spawn-time fleet, then each post-tick state.
    pub fn subscribe(&self) -> watch::Receiver<Vec<LiveBus>> {
        self.snapshots.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the clock and waits for the in-flight tick, if any, to finish.
    pub async fn stop(self) {
        let ClockHandle { task, shutdown, .. } = self;
        let _ = shutdown.send(());
        if let Err(e) = task.await {
            warn!("Simulation clock task ended abnormally: {}", e);
        }
    }
}
