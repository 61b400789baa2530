use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One telemetry sample as stored in the `energy_data` table.
///
/// Readings are immutable once written; the store only ever appends.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Reading {
    /// Volts
    pub voltage: f64,
    /// Amperes
    pub current: f64,
    /// Watts
    pub power: f64,
    /// Cumulative kWh as reported by the meter
    pub energy: f64,
    /// Hertz
    pub frequency: f64,
    pub power_factor: f64,
    pub relay_state: bool,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Optional inclusive time window over `timestamp`.
///
/// The window only applies when both bounds are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl TimeRange {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    /// Both bounds, or `None` when the range is unfiltered.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        self.start.zip(self.end)
    }
}
