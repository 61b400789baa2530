use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    analytics::EnergySummary,
    db::models::{Reading, TimeRange},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingDto {
    /// Volts
    pub voltage: f64,
    /// Amperes
    pub current: f64,
    /// Watts
    pub power: f64,
    /// kWh
    pub energy: f64,
    /// Hertz
    pub frequency: f64,
    pub power_factor: f64,
    pub relay_state: bool,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            voltage: r.voltage,
            current: r.current,
            power: r.power,
            energy: r.energy,
            frequency: r.frequency,
            power_factor: r.power_factor,
            relay_state: r.relay_state,
            timestamp: r.timestamp,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoDataDto {
    pub message: String,
}

/// Response for `GET /api/data`: the latest reading, or a "no data" notice.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CurrentReadingDto {
    Reading(ReadingDto),
    NoData(NoDataDto),
}

impl CurrentReadingDto {
    pub fn no_data() -> Self {
        Self::NoData(NoDataDto {
            message: "No data available".to_owned(),
        })
    }
}

/// Request body for `POST /api/control`. Only a JSON boolean is accepted.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ControlRequest {
    pub relay: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ControlResponse {
    pub success: bool,
    /// The requested state, not a state confirmed by the device.
    pub relay: bool,
}

/// `?startDate=<ms>&endDate=<ms>`; the filter applies only when both are given.
/// An empty value (`?startDate=`) counts as absent.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RangeParams {
    /// Inclusive lower bound, epoch milliseconds
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<i64>,
    /// Inclusive upper bound, epoch milliseconds
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<i64>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected epoch milliseconds, got {s:?}"))),
    }
}

impl From<RangeParams> for TimeRange {
    fn from(p: RangeParams) -> Self {
        TimeRange::new(p.start_date, p.end_date)
    }
}

/// A figure in the analytics response: `0` when there is no data,
/// otherwise a string with exactly two decimals (e.g. `"3.00"`).
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum Figure {
    Zero(u8),
    Fixed(String),
}

impl Figure {
    /// Two decimals, with exact ties rounded away from zero (`1.125` → `"1.13"`).
    ///
    /// `{:.2}` rounds the exact binary value correctly except on a tie, where it
    /// picks the even digit. The only ties an `f64` can hold exactly are odd
    /// multiples of 1/8.
    fn fixed(v: f64) -> Self {
        let eighths = v * 8.0;
        if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
            return Self::Fixed(format!("{:.2}", (v * 100.0).round() / 100.0));
        }
        Self::Fixed(format!("{v:.2}"))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsDto {
    pub total_energy: Figure,
    pub total_cost: Figure,
    pub average_power: Figure,
    pub data_points: usize,
}

impl From<EnergySummary> for AnalyticsDto {
    fn from(s: EnergySummary) -> Self {
        if s.is_empty() {
            return Self {
                total_energy: Figure::Zero(0),
                total_cost: Figure::Zero(0),
                average_power: Figure::Zero(0),
                data_points: 0,
            };
        }
        Self {
            total_energy: Figure::fixed(s.total_energy),
            total_cost: Figure::fixed(s.total_cost),
            average_power: Figure::fixed(s.average_power),
            data_points: s.data_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(v: f64) -> String {
        match Figure::fixed(v) {
            Figure::Fixed(s) => s,
            Figure::Zero(_) => unreachable!(),
        }
    }

    #[test]
    fn fixed_pads_to_two_decimals() {
        assert_eq!(fixed(3.0), "3.00");
        assert_eq!(fixed(15.0), "15.00");
        assert_eq!(fixed(3.0 * 0.12), "0.36");
    }

    #[test]
    fn fixed_rounds_exact_ties_away_from_zero() {
        assert_eq!(fixed(1.125), "1.13");
        assert_eq!(fixed(10.125), "10.13");
        assert_eq!(fixed(0.375), "0.38");
        assert_eq!(fixed(2.625), "2.63");
        assert_eq!(fixed(-1.125), "-1.13");
    }

    #[test]
    fn fixed_keeps_values_just_below_a_tie() {
        // 1.005 and 1.255 are stored slightly below the tie.
        assert_eq!(fixed(1.005), "1.00");
        assert_eq!(fixed(1.255), "1.25");
    }

    fn parse(query: &str) -> Option<RangeParams> {
        let uri: axum::http::Uri = format!("/api/history?{query}").parse().ok()?;
        axum::extract::Query::<RangeParams>::try_from_uri(&uri)
            .ok()
            .map(|q| q.0)
    }

    #[test]
    fn empty_bounds_are_absent() {
        let p = parse("startDate=&endDate=").expect("empty values parse");
        assert_eq!((p.start_date, p.end_date), (None, None));
        let p = parse("startDate=100&endDate=").expect("half-empty parses");
        assert_eq!((p.start_date, p.end_date), (Some(100), None));
    }

    #[test]
    fn numeric_bounds_parse() {
        let p = parse("startDate=100&endDate=200").expect("numbers parse");
        assert_eq!((p.start_date, p.end_date), (Some(100), Some(200)));
        let p = parse("unrelated=1").expect("no bounds parse");
        assert_eq!((p.start_date, p.end_date), (None, None));
    }

    #[test]
    fn non_numeric_bound_is_rejected() {
        assert!(parse("startDate=yesterday&endDate=200").is_none());
    }
}
