// Position trail tracker - Folds position updates into the track history
use crate::domain::position::{Trail, VehiclePosition};
use chrono::Utc;

/// Owns the current vehicle position and the bounded trail; the only
/// writer for both.
#[derive(Debug, Default)]
pub struct TrailTracker {
    current: VehiclePosition,
    trail: Trail,
}

impl TrailTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current position and append it to the trail.
    /// Repeated identical positions still grow (and evict) the trail.
    pub fn apply(&mut self, mut position: VehiclePosition) {
        if position.timestamp.is_none() {
            position.timestamp = Some(Utc::now().timestamp_millis());
        }
        self.current = position;
        self.trail.push(position.lat, position.lon);
    }

    pub fn current(&self) -> VehiclePosition {
        self.current
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }
}
