use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::Reading;

/// A reading as returned by the HTTP API. Same field names as the
/// telemetry devices publish.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingDto {
    /// Device id.
    pub id: i32,
    /// Sampling time, Unix epoch seconds.
    pub timestamp: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub luminosity: f64,
    pub light_on: bool,
}

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            id: r.device_id,
            timestamp: r.timestamp,
            temperature: r.temperature,
            humidity: r.humidity,
            luminosity: r.luminosity,
            light_on: r.light_on,
        }
    }
}
