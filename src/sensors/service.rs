use tracing::{debug, error, warn};

use crate::{
    db::{ReadingStore, UpsertOutcome},
    sensors::payload::parse_reading,
};

/// What happened to a single delivered telemetry message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored,
    Duplicate,
    /// Payload could not be parsed; message dropped.
    Malformed,
    /// Store write failed; message dropped.
    StoreFailed,
}

#[derive(Debug, Clone)]
pub struct SensorService {
    store: ReadingStore,
}

impl SensorService {
    pub fn new(store: ReadingStore) -> Self {
        Self { store }
    }

    /// Parses one telemetry message and persists it.
    ///
    /// Never returns an error: bad payloads and failed writes are logged and
    /// dropped so one poisoned message cannot stall the subscription. Retries
    /// come from broker redelivery, if at all.
    pub async fn ingest(&self, topic: &str, payload: &[u8]) -> IngestOutcome {
        let reading = match parse_reading(payload) {
            Ok(reading) => reading,
            Err(e) => {
                warn!(
                    topic = %topic,
                    error = %e,
                    payload = %String::from_utf8_lossy(payload),
                    "Dropping malformed telemetry message"
                );
                return IngestOutcome::Malformed;
            }
        };

        match self.store.upsert(&reading).await {
            Ok(UpsertOutcome::Inserted) => {
                debug!(
                    device_id = reading.device_id,
                    timestamp = reading.timestamp,
                    "Reading stored"
                );
                IngestOutcome::Stored
            }
            Ok(UpsertOutcome::Duplicate) => {
                debug!(
                    device_id = reading.device_id,
                    timestamp = reading.timestamp,
                    "Duplicate reading ignored"
                );
                IngestOutcome::Duplicate
            }
            Err(e) => {
                error!(
                    device_id = reading.device_id,
                    timestamp = reading.timestamp,
                    error = %e,
                    "Failed to store reading; message dropped"
                );
                IngestOutcome::StoreFailed
            }
        }
    }
}
