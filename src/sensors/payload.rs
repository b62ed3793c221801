use serde::Deserialize;

use crate::{db::models::Reading, error::Result};

/// Telemetry message as published by a device.
///
/// ```json
/// { "id": 7, "timestamp": 1709251200, "temperature": 21.4,
///   "humidity": 40.2, "luminosity": 512.0, "lightOn": false }
/// ```
///
/// Unknown fields are ignored. `lightOn` is optional for devices that do not
/// report actuator state.
#[derive(Debug, Deserialize)]
pub struct TelemetryPayload {
    #[serde(alias = "device_id")]
    pub id: i32,
    pub timestamp: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub luminosity: f64,
    #[serde(default, rename = "lightOn", alias = "light_on")]
    pub light_on: bool,
}

impl From<TelemetryPayload> for Reading {
    fn from(p: TelemetryPayload) -> Self {
        Self {
            device_id: p.id,
            timestamp: p.timestamp,
            temperature: p.temperature,
            humidity: p.humidity,
            luminosity: p.luminosity,
            light_on: p.light_on,
        }
    }
}

/// Decode a raw message body into a `Reading`.
pub fn parse_reading(payload: &[u8]) -> Result<Reading> {
    let payload: TelemetryPayload = serde_json::from_slice(payload)?;
    Ok(payload.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn parses_full_payload() {
        let r = parse_reading(
            br#"{"id":7,"timestamp":1709251200,"temperature":21.4,"humidity":40.2,"luminosity":512.0,"lightOn":true}"#,
        )
        .unwrap();
        assert_eq!(
            r,
            Reading {
                device_id: 7,
                timestamp: 1709251200,
                temperature: 21.4,
                humidity: 40.2,
                luminosity: 512.0,
                light_on: true,
            }
        );
    }

    #[test]
    fn light_on_defaults_to_false() {
        let r = parse_reading(
            br#"{"id":1,"timestamp":10,"temperature":1,"humidity":2,"luminosity":3}"#,
        )
        .unwrap();
        assert!(!r.light_on);
        assert_eq!(r.temperature, 1.0);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let r = parse_reading(
            br#"{"id":1,"timestamp":10,"temperature":1.5,"humidity":2,"luminosity":3,"battery":88,"fw":"1.2.0"}"#,
        )
        .unwrap();
        assert_eq!(r.device_id, 1);
    }

    #[test]
    fn snake_case_aliases_accepted() {
        let r = parse_reading(
            br#"{"device_id":4,"timestamp":10,"temperature":1,"humidity":2,"luminosity":3,"light_on":true}"#,
        )
        .unwrap();
        assert_eq!(r.device_id, 4);
        assert!(r.light_on);
    }

    #[test]
    fn missing_required_field_rejected() {
        let bodies: [&[u8]; 5] = [
            br#"{"timestamp":10,"temperature":1,"humidity":2,"luminosity":3}"#,
            br#"{"id":1,"temperature":1,"humidity":2,"luminosity":3}"#,
            br#"{"id":1,"timestamp":10,"humidity":2,"luminosity":3}"#,
            br#"{"id":1,"timestamp":10,"temperature":1,"luminosity":3}"#,
            br#"{"id":1,"timestamp":10,"temperature":1,"humidity":2}"#,
        ];
        for body in bodies {
            assert!(matches!(parse_reading(body), Err(Error::MalformedPayload(_))));
        }
    }

    #[test]
    fn wrong_types_rejected() {
        assert!(parse_reading(
            br#"{"id":"abc","timestamp":10,"temperature":1,"humidity":2,"luminosity":3}"#
        )
        .is_err());
        assert!(parse_reading(
            br#"{"id":1,"timestamp":10.5,"temperature":1,"humidity":2,"luminosity":3}"#
        )
        .is_err());
        assert!(parse_reading(
            br#"{"id":1,"timestamp":10,"temperature":null,"humidity":2,"luminosity":3}"#
        )
        .is_err());
    }

    #[test]
    fn non_json_rejected() {
        assert!(matches!(
            parse_reading(b"Hello, this is a test message from the publisher!"),
            Err(Error::MalformedPayload(_))
        ));
        assert!(parse_reading(b"").is_err());
        assert!(parse_reading(b"[1,2,3]").is_err());
    }
}
