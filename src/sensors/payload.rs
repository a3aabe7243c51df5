// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! Telemetry records published per topic

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Differential-pressure channel identifier
pub type ChannelId = u32;

/// RFC 3339, UTC, microseconds, literal `Z`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

mod ts_format {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// BME688 environmental reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalReading {
    #[serde(rename = "t_c")]
    pub temperature: f64,
    #[serde(rename = "rh_pct")]
    pub humidity: f64,
    #[serde(rename = "p_pa")]
    pub pressure: f64,
    #[serde(rename = "gas_ohm")]
    pub gas_resistance: f64,
    pub iaq: f64,
    pub voc_index: f64,
    #[serde(rename = "co2_eq")]
    pub co2_equivalent: f64,
    #[serde(rename = "ts", with = "ts_format")]
    pub timestamp: DateTime<Utc>,
}

/// SPS30 particulate reading, µg/m³
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticulateReading {
    pub pm1_0: f64,
    pub pm2_5: f64,
    pub pm4_0: f64,
    pub pm10: f64,
    #[serde(rename = "ts", with = "ts_format")]
    pub timestamp: DateTime<Utc>,
}

/// Differential pressure across one filtration stage, Pa
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureDropReading {
    pub dp_pa: f64,
    #[serde(rename = "ts", with = "ts_format")]
    pub timestamp: DateTime<Utc>,
}

/// Online/offline announcement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub online: bool,
    #[serde(rename = "fw")]
    pub firmware_version: String,
    #[serde(rename = "rssi_dbm")]
    pub signal_strength_dbm: i32,
    #[serde(rename = "ts", with = "ts_format")]
    pub timestamp: DateTime<Utc>,
}

/// One payload, tagged by the topic family it belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Environmental(EnvironmentalReading),
    Particulate(ParticulateReading),
    PressureDrop {
        channel: ChannelId,
        reading: PressureDropReading,
    },
    Status(StatusReport),
}

impl Payload {
    /// Status payloads are retained by the broker, telemetry is not.
    pub fn retained(&self) -> bool {
        matches!(self, Payload::Status(_))
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Payload::Environmental(r) => r.timestamp,
            Payload::Particulate(r) => r.timestamp,
            Payload::PressureDrop { reading, .. } => reading.timestamp,
            Payload::Status(r) => r.timestamp,
        }
    }

    /// UTF-8 JSON body
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            Payload::Environmental(r) => serde_json::to_vec(r),
            Payload::Particulate(r) => serde_json::to_vec(r),
            Payload::PressureDrop { reading, .. } => serde_json::to_vec(reading),
            Payload::Status(r) => serde_json::to_vec(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap()
            + chrono::Duration::microseconds(123_456)
    }

    #[test]
    fn test_timestamp_uses_z_suffix() {
        let s = format_timestamp(&fixed_ts());
        assert_eq!(s, "2026-10-17T08:30:00.123456Z");
        assert!(!s.contains("+00:00"));
    }

    #[test]
    fn test_environmental_wire_keys() {
        let payload = Payload::Environmental(EnvironmentalReading {
            temperature: 21.4,
            humidity: 44.2,
            pressure: 101_330.0,
            gas_resistance: 50_500.0,
            iaq: 37.5,
            voc_index: 16.1,
            co2_equivalent: 612.0,
            timestamp: fixed_ts(),
        });

        let json: serde_json::Value = serde_json::from_slice(&payload.encode().unwrap()).unwrap();
        assert_eq!(json["t_c"], 21.4);
        assert_eq!(json["rh_pct"], 44.2);
        assert_eq!(json["p_pa"], 101_330.0);
        assert_eq!(json["gas_ohm"], 50_500.0);
        assert_eq!(json["iaq"], 37.5);
        assert_eq!(json["voc_index"], 16.1);
        assert_eq!(json["co2_eq"], 612.0);
        assert_eq!(json["ts"], "2026-10-17T08:30:00.123456Z");
        assert!(!payload.retained());
    }

    #[test]
    fn test_status_wire_keys_and_retention() {
        let payload = Payload::Status(StatusReport {
            online: false,
            firmware_version: "emu-1.1.0".to_string(),
            signal_strength_dbm: -52,
            timestamp: fixed_ts(),
        });

        let json: serde_json::Value = serde_json::from_slice(&payload.encode().unwrap()).unwrap();
        assert_eq!(json["online"], false);
        assert_eq!(json["fw"], "emu-1.1.0");
        assert_eq!(json["rssi_dbm"], -52);
        assert!(payload.retained());
    }

    #[test]
    fn test_pressure_drop_body_omits_channel() {
        let payload = Payload::PressureDrop {
            channel: 2,
            reading: PressureDropReading { dp_pa: -94.7, timestamp: fixed_ts() },
        };

        let json: serde_json::Value = serde_json::from_slice(&payload.encode().unwrap()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(json["dp_pa"], -94.7);
        assert_eq!(payload.timestamp(), fixed_ts());
    }

    #[test]
    fn test_particulate_parses_back() {
        let body = br#"{"pm1_0":3.1,"pm2_5":6.4,"pm4_0":8.0,"pm10":10.9,"ts":"2026-10-17T08:30:00.123456Z"}"#;
        let reading: ParticulateReading = serde_json::from_slice(body).unwrap();
        assert_eq!(reading.pm2_5, 6.4);
        assert_eq!(reading.timestamp, fixed_ts());
    }
}
