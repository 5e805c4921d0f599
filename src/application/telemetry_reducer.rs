// Telemetry reducer - Folds reading batches into derived console state
use crate::domain::quality::{self, QualityClass};
use crate::domain::reading::{ChartPoint, Reading, SensorSnapshot};
use chrono::{DateTime, TimeZone, Utc};

/// Connectivity as derived from the reading stream itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectivityState {
    /// True once any reading has ever been received.
    pub is_online: bool,
    /// Latches true on the first reading carrying a position fix and
    /// never resets.
    pub has_gps_fix: bool,
    pub last_update: Option<DateTime<Utc>>,
}

/// Owns the sensor snapshot, quality class, connectivity flags and chart
/// series; the only writer for all of them.
#[derive(Debug, Default)]
pub struct TelemetryReducer {
    snapshot: SensorSnapshot,
    quality: QualityClass,
    connectivity: ConnectivityState,
    chart: Vec<ChartPoint>,
}

impl TelemetryReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch of readings, in store iteration order.
    ///
    /// The "current" reading is the last element of the batch's
    /// iteration order, not the maximum-timestamp element; upstream
    /// delivery order is reproduced as observed.
    pub fn apply_batch(&mut self, batch: &[Reading]) {
        let Some(current) = batch.last() else {
            return;
        };

        self.connectivity.is_online = true;
        self.connectivity.last_update = Some(
            batch
                .iter()
                .filter_map(|r| r.timestamp)
                .max()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .unwrap_or_else(Utc::now),
        );

        self.snapshot = SensorSnapshot::from(current);
        self.quality = quality::score(&self.snapshot);

        if current.has_position() {
            self.connectivity.has_gps_fix = true;
        }

        self.chart = batch.iter().map(ChartPoint::from_reading).collect();
        tracing::debug!(
            "Applied batch of {} readings, quality {}",
            batch.len(),
            self.quality
        );
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        self.snapshot
    }

    pub fn quality(&self) -> QualityClass {
        self.quality
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.connectivity
    }

    pub fn chart_series(&self) -> &[ChartPoint] {
        &self.chart
    }
}
