// Mission lifecycle manager - add/clear/send transitions and dispatch log
use crate::application::store_gateway::StoreGateway;
use crate::domain::mission::{DispatchStatus, Mission, MissionLogEntry, MissionRecord};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Store collection receiving serialized missions.
pub const MISSIONS_PATH: &str = "missions";

/// Transient operator-facing notice emitted on successful mission
/// mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
}

/// Vehicle-reported status of the most recent dispatch, delivered via
/// the mission-status subscription.
#[derive(Debug, Clone)]
pub struct DispatchAck {
    pub key: String,
    pub status: DispatchStatus,
    pub at: DateTime<Utc>,
}

/// Owns the editable mission and the dispatch log; the only writer for
/// both. The store write issued by `send_mission` is fire-and-forget.
pub struct MissionManager {
    store: Arc<dyn StoreGateway>,
    notifications: mpsc::UnboundedSender<Notification>,
    mission: Mission,
    log: Vec<MissionLogEntry>,
    next_log_id: u64,
    last_ack: Option<DispatchAck>,
}

impl MissionManager {
    pub fn new(
        store: Arc<dyn StoreGateway>,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        Self {
            store,
            notifications,
            mission: Mission::default(),
            log: Vec::new(),
            next_log_id: 0,
            last_ack: None,
        }
    }

    pub fn add_waypoint(&mut self, x: f64, y: f64) {
        let displayed = self.mission.add_waypoint(x, y);
        self.notify(format!("Waypoint {} added", displayed));
    }

    pub fn clear_waypoints(&mut self) {
        self.mission.clear();
        self.notify("Waypoints cleared".to_string());
    }

    /// Dispatch the mission to the store. A no-op on an empty mission.
    ///
    /// The serialized copy is written on a spawned task whose outcome is
    /// only logged; the log entry and status transition happen before
    /// the write resolves.
    pub fn send_mission(&mut self) {
        if !self.mission.is_sendable() {
            return;
        }

        let created_at = Utc::now();
        let record = MissionRecord::from_mission(&self.mission, created_at);
        let value = match serde_json::to_value(&record) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize mission: {}", e);
                return;
            }
        };

        let store = self.store.clone();
        tokio::spawn(async move {
            match store.create(MISSIONS_PATH, &value).await {
                Ok(key) => tracing::debug!("Mission stored under key {}", key),
                Err(e) => tracing::error!("Mission dispatch write failed: {}", e),
            }
        });

        let count = self.mission.waypoint_count();
        self.next_log_id += 1;
        self.log.insert(
            0,
            MissionLogEntry {
                id: self.next_log_id,
                created_at,
                waypoints: self.mission.waypoints.clone(),
                waypoint_count: count,
                status: DispatchStatus::Pending,
                message: format!("Mission sent with {} waypoint(s)", count),
            },
        );
        self.mission.mark_sent();
        self.notify(format!("Mission sent ({} waypoints)", count));
    }

    /// Record a vehicle-reported dispatch status. Existing log entries
    /// are immutable, so the ack is surfaced as a separate field.
    pub fn apply_dispatch_ack(&mut self, ack: DispatchAck) {
        tracing::debug!("Dispatch {} reported {}", ack.key, ack.status);
        self.last_ack = Some(ack);
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn log(&self) -> &[MissionLogEntry] {
        &self.log
    }

    pub fn last_ack(&self) -> Option<&DispatchAck> {
        self.last_ack.as_ref()
    }

    fn notify(&self, message: String) {
        let _ = self.notifications.send(Notification { message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store_gateway::testing::MockStore;
    use crate::domain::mission::MissionStatus;
    use std::time::Duration;

    fn manager() -> (
        MissionManager,
        Arc<MockStore>,
        mpsc::UnboundedReceiver<Notification>,
    ) {
        let store = Arc::new(MockStore::new());
        let (tx, rx) = mpsc::unbounded_channel();
        (MissionManager::new(store.clone(), tx), store, rx)
    }

    #[tokio::test]
    async fn test_add_waypoint_notifies_with_pre_append_count() {
        let (mut mgr, _store, mut rx) = manager();
        mgr.add_waypoint(1.0, 2.0);
        mgr.add_waypoint(3.0, 4.0);

        assert_eq!(rx.recv().await.unwrap().message, "Waypoint 1 added");
        assert_eq!(rx.recv().await.unwrap().message, "Waypoint 2 added");
        assert_eq!(mgr.mission().status, MissionStatus::Draft);
    }

    #[tokio::test]
    async fn test_send_empty_mission_is_a_silent_no_op() {
        let (mut mgr, store, mut rx) = manager();
        mgr.send_mission();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.writes().is_empty());
        assert!(mgr.log().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_mission_writes_once_and_logs_once() {
        let (mut mgr, store, _rx) = manager();
        mgr.add_waypoint(12.97, 77.59);
        mgr.add_waypoint(12.98, 77.60);
        mgr.send_mission();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        let (path, value) = &writes[0];
        assert_eq!(path, MISSIONS_PATH);
        assert_eq!(value["status"], "pending");
        assert_eq!(value["waypoints"].as_array().unwrap().len(), 2);
        assert_eq!(value["waypoints"][0]["lat"], 12.97);
        assert_eq!(value["waypoints"][1]["seq"], 1);
        assert!(value["created_at"].is_string());

        assert_eq!(mgr.log().len(), 1);
        assert_eq!(mgr.log()[0].waypoint_count, 2);
        assert_eq!(mgr.log()[0].status, DispatchStatus::Pending);
        assert_eq!(mgr.mission().status, MissionStatus::Sent);
    }

    #[tokio::test]
    async fn test_log_is_newest_first() {
        let (mut mgr, _store, _rx) = manager();
        mgr.add_waypoint(1.0, 1.0);
        mgr.send_mission();
        mgr.clear_waypoints();
        mgr.add_waypoint(2.0, 2.0);
        mgr.add_waypoint(3.0, 3.0);
        mgr.send_mission();

        assert_eq!(mgr.log().len(), 2);
        assert_eq!(mgr.log()[0].waypoint_count, 2);
        assert_eq!(mgr.log()[1].waypoint_count, 1);
        assert!(mgr.log()[0].id > mgr.log()[1].id);
    }

    #[tokio::test]
    async fn test_dispatch_ack_does_not_touch_log_entries() {
        let (mut mgr, _store, _rx) = manager();
        mgr.add_waypoint(1.0, 1.0);
        mgr.send_mission();

        mgr.apply_dispatch_ack(DispatchAck {
            key: "-Nabc".to_string(),
            status: DispatchStatus::Acknowledged,
            at: Utc::now(),
        });

        assert_eq!(mgr.log()[0].status, DispatchStatus::Pending);
        assert_eq!(mgr.last_ack().unwrap().status, DispatchStatus::Acknowledged);
        assert_eq!(mgr.mission().status, MissionStatus::Sent);
    }
}
