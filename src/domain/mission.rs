// Mission planning domain models
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A single coordinate target with its sequence index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub seq: u32,
}

/// Lifecycle state of the locally edited mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissionStatus {
    #[default]
    Empty,
    Draft,
    Sent,
}

/// Operator-authored ordered set of waypoints awaiting dispatch.
///
/// Owned exclusively by the mission manager; the store only ever
/// receives a serialized copy.
#[derive(Debug, Clone, Default)]
pub struct Mission {
    pub waypoints: Vec<Waypoint>,
    pub status: MissionStatus,
}

impl Mission {
    /// Append a waypoint, assigning `seq` from the current count.
    ///
    /// Returns the waypoint number to display, computed from the count
    /// captured before the append commits.
    pub fn add_waypoint(&mut self, x: f64, y: f64) -> u32 {
        let displayed = self.waypoints.len() as u32 + 1;
        let seq = self.waypoints.len() as u32;
        self.waypoints.push(Waypoint { x, y, seq });
        self.status = MissionStatus::Draft;
        displayed
    }

    /// Discard all waypoints. The next assigned `seq` restarts at 0.
    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.status = MissionStatus::Empty;
    }

    pub fn is_sendable(&self) -> bool {
        !self.waypoints.is_empty()
    }

    pub fn mark_sent(&mut self) {
        self.status = MissionStatus::Sent;
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }
}

/// Vehicle-reported status of a dispatched mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Pending,
    Acknowledged,
    Failed,
}

impl DispatchStatus {
    /// Parse the status string a mission record carries in the store.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pending" => Some(DispatchStatus::Pending),
            "acknowledged" | "ack" => Some(DispatchStatus::Acknowledged),
            "failed" | "rejected" => Some(DispatchStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchStatus::Pending => write!(f, "Pending"),
            DispatchStatus::Acknowledged => write!(f, "Acknowledged"),
            DispatchStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Immutable record of one dispatch attempt. Never mutated after
/// creation; the log is kept newest-first.
#[derive(Debug, Clone)]
pub struct MissionLogEntry {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub waypoints: Vec<Waypoint>,
    pub waypoint_count: usize,
    pub status: DispatchStatus,
    pub message: String,
}

/// Serialized mission shape written to the store's `missions` collection.
#[derive(Debug, Serialize)]
pub struct MissionRecord {
    pub waypoints: Vec<WaypointRecord>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct WaypointRecord {
    pub lat: f64,
    pub lon: f64,
    pub seq: u32,
}

impl MissionRecord {
    pub fn from_mission(mission: &Mission, created_at: DateTime<Utc>) -> Self {
        Self {
            waypoints: mission
                .waypoints
                .iter()
                .map(|wp| WaypointRecord {
                    lat: wp.x,
                    lon: wp.y,
                    seq: wp.seq,
                })
                .collect(),
            status: "pending".to_string(),
            created_at: created_at.to_rfc3339(),
        }
    }
}
