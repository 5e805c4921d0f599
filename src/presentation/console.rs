// Operator console facade - what the UI layer reads and commands
use crate::application::mission_manager::{
    DispatchAck, MISSIONS_PATH, MissionManager, Notification,
};
use crate::application::store_gateway::{RecordBatch, StoreGateway, decode_or_default};
use crate::application::telemetry_reducer::{ConnectivityState, TelemetryReducer};
use crate::application::trail_tracker::TrailTracker;
use crate::domain::mission::{DispatchStatus, Mission, MissionLogEntry};
use crate::domain::position::VehiclePosition;
use crate::domain::quality::QualityClass;
use crate::domain::reading::{ChartPoint, Reading, SensorSnapshot};
use crate::infrastructure::config::device_telemetry_path;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

/// Keyed collection of sensor readings, limited to the last 20 records.
pub const READINGS_PATH: &str = "readings";
pub const READINGS_WINDOW: usize = 20;

/// Store-level session connectivity probe, distinct from the
/// reading-derived `is_online` flag.
pub const SESSION_PROBE_PATH: &str = ".info/connected";

pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Derived console state. Each component is mutated only by its owning
/// subscription task or command method; the UI only ever reads copies.
struct ConsoleShared {
    telemetry: Mutex<TelemetryReducer>,
    nav: Mutex<TrailTracker>,
    mission: Mutex<MissionManager>,
    session_online: Mutex<bool>,
}

/// The operator console: folds the store's subscription streams into
/// bounded derived state and forwards mission commands back out.
pub struct Console {
    shared: Arc<ConsoleShared>,
    tasks: Vec<JoinHandle<()>>,
}

impl Console {
    /// Complete the session handshake, then wire every subscription to
    /// its reducer. Returns the console and the channel carrying
    /// transient mission notifications.
    pub async fn connect(
        store: Arc<dyn StoreGateway>,
        device_id: &str,
    ) -> anyhow::Result<(Self, NotificationReceiver)> {
        store.ready().await?;

        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(ConsoleShared {
            telemetry: Mutex::new(TelemetryReducer::new()),
            nav: Mutex::new(TrailTracker::new()),
            mission: Mutex::new(MissionManager::new(store.clone(), notify_tx)),
            session_online: Mutex::new(false),
        });

        let mut tasks = Vec::new();

        let mut readings = store.subscribe(READINGS_PATH, Some(READINGS_WINDOW));
        let state = shared.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(batch) = readings.next().await {
                let decoded = decode_readings(batch);
                lock(&state.telemetry).apply_batch(&decoded);
            }
        }));

        let mut positions = store.subscribe_single(&device_telemetry_path(device_id));
        let state = shared.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(value) = positions.next().await {
                if value.is_null() {
                    continue;
                }
                let position: VehiclePosition = decode_or_default(value);
                lock(&state.nav).apply(position);
            }
        }));

        let mut probe = store.subscribe_single(SESSION_PROBE_PATH);
        let state = shared.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(value) = probe.next().await {
                let online = value.as_bool().unwrap_or(false);
                *lock(&state.session_online) = online;
            }
        }));

        // Vehicle-side acknowledgements: watch the latest mission record
        // and surface its reported status.
        let mut acks = store.subscribe(MISSIONS_PATH, Some(1));
        let state = shared.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(batch) = acks.next().await {
                if let Some(ack) = decode_ack(&batch) {
                    lock(&state.mission).apply_dispatch_ack(ack);
                }
            }
        }));

        Ok((Self { shared, tasks }, notify_rx))
    }

    /// Cancel every subscription task. Derived state stays readable.
    pub fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }

    // Read accessors

    pub fn sensor_snapshot(&self) -> SensorSnapshot {
        lock(&self.shared.telemetry).snapshot()
    }

    pub fn quality(&self) -> QualityClass {
        lock(&self.shared.telemetry).quality()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        lock(&self.shared.telemetry).connectivity()
    }

    pub fn chart_series(&self) -> Vec<ChartPoint> {
        lock(&self.shared.telemetry).chart_series().to_vec()
    }

    pub fn vehicle_position(&self) -> VehiclePosition {
        lock(&self.shared.nav).current()
    }

    pub fn trail(&self) -> Vec<(f64, f64)> {
        lock(&self.shared.nav).trail().to_vec()
    }

    pub fn mission(&self) -> Mission {
        lock(&self.shared.mission).mission().clone()
    }

    pub fn mission_log(&self) -> Vec<MissionLogEntry> {
        lock(&self.shared.mission).log().to_vec()
    }

    pub fn session_online(&self) -> bool {
        *lock(&self.shared.session_online)
    }

    pub fn last_dispatch_ack(&self) -> Option<DispatchAck> {
        lock(&self.shared.mission).last_ack().cloned()
    }

    // Mission commands

    pub fn add_waypoint(&self, x: f64, y: f64) {
        lock(&self.shared.mission).add_waypoint(x, y);
    }

    pub fn clear_waypoints(&self) {
        lock(&self.shared.mission).clear_waypoints();
    }

    pub fn send_mission(&self) {
        lock(&self.shared.mission).send_mission();
    }

    pub fn apply_dispatch_ack(&self, ack: DispatchAck) {
        lock(&self.shared.mission).apply_dispatch_ack(ack);
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A poisoned lock still holds consistent reducer state; keep serving.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keys are opaque; only the batch's iteration order matters.
fn decode_readings(batch: RecordBatch) -> Vec<Reading> {
    batch
        .into_iter()
        .map(|(_, value)| decode_or_default(value))
        .collect()
}

fn decode_ack(batch: &RecordBatch) -> Option<DispatchAck> {
    let (key, value) = batch.last()?;
    let status = DispatchStatus::parse(value.get("status")?.as_str()?)?;
    Some(DispatchAck {
        key: key.clone(),
        status,
        at: Utc::now(),
    })
}
