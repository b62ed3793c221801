use rumqttc::{AsyncClient, QoS};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::error::Result;

/// Light actuator command, sent to a device and accepted from HTTP callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LightCommand {
    #[serde(rename = "lightOn")]
    pub light_on: bool,
}

impl LightCommand {
    /// Wire body, `{"lightOn":true}` or `{"lightOn":false}`.
    pub fn payload(&self) -> Vec<u8> {
        format!(r#"{{"lightOn":{}}}"#, self.light_on).into_bytes()
    }
}

/// Publishes actuator commands on `{prefix}/{device_id}`.
///
/// Fire-and-forget: a successful return only means the command was queued on
/// the local MQTT client. Nothing reports whether the device got it.
#[derive(Clone)]
pub struct CommandPublisher {
    client: AsyncClient,
    prefix: String,
}

impl CommandPublisher {
    pub fn new(client: AsyncClient, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    pub fn topic_for(&self, device_id: i32) -> String {
        format!("{}/{}", self.prefix, device_id)
    }

    pub fn send(&self, device_id: i32, command: LightCommand) -> Result<()> {
        let topic = self.topic_for(device_id);

        // try_publish so a dead broker connection can't park the HTTP request
        self.client
            .try_publish(topic.as_str(), QoS::AtMostOnce, false, command.payload())?;

        info!(topic = %topic, light_on = command.light_on, "Command published");
        Ok(())
    }
}
