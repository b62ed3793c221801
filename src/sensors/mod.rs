pub mod payload;
pub mod service;
pub mod worker;

pub use service::SensorService;
pub use worker::{IngestWorker, TelemetryMessage};
