use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Inbound telemetry that could not be decoded into a `Reading`.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    /// Bad date parameter or command body supplied by an HTTP caller.
    #[error("{0}")]
    InvalidRequest(String),

    /// The local MQTT request queue refused the publish (closed or full).
    #[error("transport unavailable: {0}")]
    TransportUnavailable(#[from] rumqttc::ClientError),
}

impl Error {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}
