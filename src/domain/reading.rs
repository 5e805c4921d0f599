// Sensor reading domain models
use chrono::{Local, TimeZone, Utc};
use serde::Deserialize;

/// One timestamped water-quality measurement as published by the vehicle.
///
/// Records arrive keyed and unordered; missing numeric fields are
/// defaulted to 0 rather than rejected. The timestamp stays `None` when
/// the record carries none, so consumers can substitute the current time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Reading {
    #[serde(default)]
    pub ph: f64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub tds: f64,
    #[serde(default)]
    pub turbidity: f64,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Reading {
    /// Whether this reading carries a usable position fix.
    pub fn has_position(&self) -> bool {
        self.lat != 0.0 || self.lon != 0.0
    }
}

/// The most recently observed reading's numeric fields, zero before any
/// data arrives. Replaced wholesale on each batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    pub ph: f64,
    pub temperature: f64,
    pub tds: f64,
    pub turbidity: f64,
}

impl From<&Reading> for SensorSnapshot {
    fn from(reading: &Reading) -> Self {
        Self {
            ph: reading.ph,
            temperature: reading.temperature,
            tds: reading.tds,
            turbidity: reading.turbidity,
        }
    }
}

/// One chart entry per reading, in batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub ph: f64,
    pub temperature: f64,
    pub turbidity: f64,
    pub tds: f64,
}

impl ChartPoint {
    pub fn from_reading(reading: &Reading) -> Self {
        let millis = reading
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        Self {
            label: format_time_label(millis),
            ph: reading.ph,
            temperature: reading.temperature,
            turbidity: reading.turbidity,
            tds: reading.tds,
        }
    }
}

/// Format epoch milliseconds as a local hour:minute:second label.
pub fn format_time_label(epoch_millis: i64) -> String {
    match Local.timestamp_millis_opt(epoch_millis).single() {
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => String::from("--:--:--"),
    }
}
