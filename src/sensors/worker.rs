use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::info;

use super::service::SensorService;

/// A telemetry message handed over by the MQTT event loop.
#[derive(Debug, Clone)]
pub struct TelemetryMessage {
    pub topic: String,
    pub payload: Bytes,
}

/// Consumes delivered telemetry strictly one message at a time, so per-device
/// upserts happen in delivery order.
pub struct IngestWorker {
    service: SensorService,
    rx: mpsc::Receiver<TelemetryMessage>,
}

impl IngestWorker {
    pub fn new(service: SensorService, rx: mpsc::Receiver<TelemetryMessage>) -> Self {
        Self { service, rx }
    }

    /// Runs until every sender has been dropped.
    /// Spawn this via `tokio::spawn`.
    pub async fn run(mut self) {
        info!("Ingestion worker started");
        while let Some(msg) = self.rx.recv().await {
            self.service.ingest(&msg.topic, &msg.payload).await;
        }
        info!("Ingestion worker stopped: telemetry channel closed");
    }
}
