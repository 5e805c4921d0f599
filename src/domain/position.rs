// Vehicle position and track history domain models
use serde::Deserialize;
use std::collections::VecDeque;

/// Maximum number of points retained in the track history.
pub const TRAIL_CAPACITY: usize = 300;

/// Latest vehicle position as published under `telemetry/{device}/current`.
///
/// Always replaced wholesale on update; optional fields default to 0.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct VehiclePosition {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub alt: f64,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub groundspeed: f64,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Bounded history of (lat, lon) pairs for path visualization.
///
/// Append-only except for FIFO eviction of the oldest points once the
/// capacity is exceeded.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<(f64, f64)>,
    capacity: usize,
}

impl Default for Trail {
    fn default() -> Self {
        Self::new(TRAIL_CAPACITY)
    }
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, lat: f64, lon: f64) {
        self.points.push_back((lat, lon));
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<(f64, f64)> {
        self.points.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_never_exceeds_capacity() {
        let mut trail = Trail::default();
        for i in 0..500 {
            trail.push(i as f64, -(i as f64));
        }
        assert_eq!(trail.len(), TRAIL_CAPACITY);
    }

    #[test]
    fn test_trail_evicts_oldest_first() {
        let mut trail = Trail::default();
        for i in 0..=TRAIL_CAPACITY {
            trail.push(i as f64, 0.0);
        }
        // 301 pushes: the first point was evicted, the second leads.
        assert_eq!(trail.len(), TRAIL_CAPACITY);
        assert_eq!(trail.to_vec()[0], (1.0, 0.0));
        assert_eq!(trail.to_vec()[TRAIL_CAPACITY - 1], (TRAIL_CAPACITY as f64, 0.0));
    }

    #[test]
    fn test_trail_keeps_duplicates() {
        let mut trail = Trail::new(3);
        trail.push(1.0, 1.0);
        trail.push(1.0, 1.0);
        trail.push(1.0, 1.0);
        trail.push(1.0, 1.0);
        assert_eq!(trail.len(), 3);
    }

    #[test]
    fn test_position_optional_fields_default() {
        let position: VehiclePosition =
            serde_json::from_value(serde_json::json!({"lat": 12.9, "lon": 77.6})).unwrap();
        assert_eq!(position.alt, 0.0);
        assert_eq!(position.heading, 0.0);
        assert_eq!(position.groundspeed, 0.0);
        assert!(position.timestamp.is_none());
    }
}
