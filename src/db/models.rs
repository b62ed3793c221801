use sqlx::FromRow;

/// One row of `sensor_data`: a single sample from a single device.
///
/// `(device_id, timestamp)` is the primary key, so a device can have at most
/// one reading per sampling instant. Rows are never updated or deleted here.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct Reading {
    pub device_id: i32,
    /// Device sampling time, Unix epoch seconds.
    pub timestamp: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub luminosity: f64,
    /// Light actuator state at sampling time.
    pub light_on: bool,
}
