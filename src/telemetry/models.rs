use serde::Deserialize;

use crate::db::models::Reading;

/// A telemetry payload could not be turned into a `Reading`.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed telemetry payload: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Wire shape published by the meter on `smartenergy/data`
//
//   { "voltage": 229.8, "current": 2.01, "power": 438.7, "energy": 1.234,
//     "frequency": 50.0, "powerFactor": 0.95, "relayState": true,
//     "timestamp": 1718000000000 }
//
// `relayState` and `timestamp` may be omitted by older firmware.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TelemetryPayload {
    voltage: f64,
    current: f64,
    power: f64,
    energy: f64,
    frequency: f64,
    power_factor: f64,
    #[serde(default)]
    relay_state: bool,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Decode a telemetry payload, stamping it with `received_at_ms` when the
/// device did not supply a timestamp (absent, `null` or `0`).
pub fn decode_reading(payload: &[u8], received_at_ms: i64) -> Result<Reading, DecodeError> {
    let p: TelemetryPayload = serde_json::from_slice(payload)?;

    Ok(Reading {
        voltage: p.voltage,
        current: p.current,
        power: p.power,
        energy: p.energy,
        frequency: p.frequency,
        power_factor: p.power_factor,
        relay_state: p.relay_state,
        timestamp: p.timestamp.filter(|ts| *ts != 0).unwrap_or(received_at_ms),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_718_000_000_000;

    #[test]
    fn decodes_full_payload() {
        let json = br#"{"voltage":229.8,"current":2.01,"power":438.7,"energy":1.234,
            "frequency":50.0,"powerFactor":0.95,"relayState":true,"timestamp":1700000000000}"#;
        let r = decode_reading(json, NOW).unwrap();
        assert_eq!(r.voltage, 229.8);
        assert_eq!(r.power_factor, 0.95);
        assert!(r.relay_state);
        assert_eq!(r.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn missing_timestamp_uses_ingestion_time() {
        let json = br#"{"voltage":230,"current":2,"power":460,"energy":1,
            "frequency":50,"powerFactor":1,"relayState":false}"#;
        assert_eq!(decode_reading(json, NOW).unwrap().timestamp, NOW);
    }

    #[test]
    fn null_or_zero_timestamp_uses_ingestion_time() {
        let null_ts = br#"{"voltage":230,"current":2,"power":460,"energy":1,
            "frequency":50,"powerFactor":1,"timestamp":null}"#;
        let zero_ts = br#"{"voltage":230,"current":2,"power":460,"energy":1,
            "frequency":50,"powerFactor":1,"timestamp":0}"#;
        assert_eq!(decode_reading(null_ts, NOW).unwrap().timestamp, NOW);
        assert_eq!(decode_reading(zero_ts, NOW).unwrap().timestamp, NOW);
    }

    #[test]
    fn missing_relay_state_is_off() {
        let json = br#"{"voltage":230,"current":2,"power":460,"energy":1,
            "frequency":50,"powerFactor":1}"#;
        assert!(!decode_reading(json, NOW).unwrap().relay_state);
    }

    #[test]
    fn out_of_range_values_are_kept() {
        let json = br#"{"voltage":-5,"current":1e9,"power":0,"energy":-1,
            "frequency":0,"powerFactor":7}"#;
        let r = decode_reading(json, NOW).unwrap();
        assert_eq!(r.voltage, -5.0);
        assert_eq!(r.power_factor, 7.0);
    }

    #[test]
    fn rejects_non_json() {
        assert!(decode_reading(b"voltage=230", NOW).is_err());
    }

    #[test]
    fn rejects_missing_or_null_numeric_field() {
        let missing = br#"{"voltage":230,"current":2,"power":460,"energy":1,"frequency":50}"#;
        let null = br#"{"voltage":null,"current":2,"power":460,"energy":1,
            "frequency":50,"powerFactor":1}"#;
        assert!(decode_reading(missing, NOW).is_err());
        assert!(decode_reading(null, NOW).is_err());
    }
}
