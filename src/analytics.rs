use crate::db::models::Reading;

/// Totals over a set of readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySummary {
    pub total_energy: f64,
    pub total_cost: f64,
    pub average_power: f64,
    pub data_points: usize,
}

impl EnergySummary {
    pub fn is_empty(&self) -> bool {
        self.data_points == 0
    }
}

/// Sum energy, average power and price the total at `rate` per unit.
///
/// An empty slice yields an all-zero summary.
pub fn summarize(readings: &[Reading], rate: f64) -> EnergySummary {
    if readings.is_empty() {
        return EnergySummary {
            total_energy: 0.0,
            total_cost: 0.0,
            average_power: 0.0,
            data_points: 0,
        };
    }

    let total_energy: f64 = readings.iter().map(|r| r.energy).sum();
    let total_power: f64 = readings.iter().map(|r| r.power).sum();

    EnergySummary {
        total_energy,
        total_cost: total_energy * rate,
        average_power: total_power / readings.len() as f64,
        data_points: readings.len(),
    }
}
