use std::time::Duration;

use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, SubAck,
    SubscribeReasonCode, Transport,
};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    time,
};
use tracing::{debug, error, info, warn};

use crate::{config::Config, sensors::TelemetryMessage};

/// Capacity of the client's outgoing request queue.
const REQUEST_QUEUE_CAPACITY: usize = 64;

/// Pause after a transport error before the next poll, which reconnects.
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

pub fn mqtt_options(config: &Config) -> MqttOptions {
    let broker = &config.mqtt_broker;
    let mut options = MqttOptions::new(&config.mqtt_client_id, &broker.host, broker.port);
    options.set_keep_alive(Duration::from_secs(config.mqtt_keep_alive_secs));

    if let Some(username) = &config.mqtt_username {
        options.set_credentials(username, config.mqtt_password.as_deref().unwrap_or_default());
    }

    if broker.tls {
        options.set_transport(Transport::tls_with_default_config());
    }

    options
}

/// Builds the shared broker client. The returned `EventLoop` must be driven
/// by a [`TelemetrySubscription`] for anything to reach the broker.
pub fn connect(config: &Config) -> (AsyncClient, EventLoop) {
    AsyncClient::new(mqtt_options(config), REQUEST_QUEUE_CAPACITY)
}

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// Polling for a session, or connected and waiting for the SubAck.
    Connecting,
    Subscribed,
}

impl ConnectionState {
    /// State after the event loop yields `event`.
    pub fn on_event(self, event: &Event) -> Self {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => Self::Connecting,
            Event::Incoming(Packet::SubAck(ack)) if subscription_granted(ack) => Self::Subscribed,
            Event::Incoming(Packet::SubAck(_)) => Self::Connecting,
            Event::Incoming(Packet::Disconnect) => Self::Disconnected,
            _ => self,
        }
    }
}

fn subscription_granted(ack: &SubAck) -> bool {
    !ack.return_codes.is_empty()
        && ack
            .return_codes
            .iter()
            .all(|code| matches!(code, SubscribeReasonCode::Success(_)))
}

// ---------------------------------------------------------------------------
// Telemetry session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Reacts to one event loop event at a time. Nothing in here awaits, so the
/// event loop keeps polling (pings, command publishes) whatever the ingestion
/// worker is doing.
struct TelemetrySession {
    client: AsyncClient,
    topic: String,
    tx: mpsc::Sender<TelemetryMessage>,
    state: ConnectionState,
    /// Set on ConnAck, cleared once the SUBSCRIBE is on the request queue.
    subscribe_pending: bool,
    dropped: u64,
}

impl TelemetrySession {
    fn new(client: AsyncClient, topic: String, tx: mpsc::Sender<TelemetryMessage>) -> Self {
        Self {
            client,
            topic,
            tx,
            state: ConnectionState::Disconnected,
            subscribe_pending: false,
            dropped: 0,
        }
    }

    fn handle(&mut self, event: Event) -> Flow {
        let next = self.state.on_event(&event);

        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                info!(session_present = ack.session_present, "Connected to MQTT broker");
                // Clean sessions drop subscriptions, so subscribe on every ConnAck.
                self.subscribe_pending = true;
            }
            Event::Incoming(Packet::SubAck(ack)) => {
                if next == ConnectionState::Subscribed {
                    info!(topic = %self.topic, "Subscribed to telemetry topic");
                } else {
                    error!(
                        topic = %self.topic,
                        return_codes = ?ack.return_codes,
                        "Broker rejected telemetry subscription"
                    );
                }
            }
            Event::Incoming(Packet::Publish(publish)) => {
                debug!(topic = %publish.topic, bytes = publish.payload.len(), "Telemetry received");
                let msg = TelemetryMessage {
                    topic: publish.topic,
                    payload: publish.payload,
                };
                if self.forward(msg) == Flow::Stop {
                    return Flow::Stop;
                }
            }
            Event::Incoming(Packet::Disconnect) => {
                warn!("Broker closed the MQTT session");
                self.subscribe_pending = false;
            }
            Event::Outgoing(Outgoing::Disconnect) => {
                info!("MQTT client disconnected");
                return Flow::Stop;
            }
            _ => {}
        }

        self.state = next;
        if self.subscribe_pending {
            self.queue_subscribe();
        }
        Flow::Continue
    }

    /// A poll error: rumqttc reconnects on the next poll, and the ConnAck
    /// that follows asks for a fresh subscription.
    fn connection_lost(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.subscribe_pending = false;
    }

    fn queue_subscribe(&mut self) {
        match self.client.try_subscribe(&self.topic, QoS::AtLeastOnce) {
            Ok(()) => self.subscribe_pending = false,
            Err(e) => warn!(
                topic = %self.topic,
                error = %e,
                "Failed to queue subscription; retrying on next event"
            ),
        }
    }

    /// Hands `msg` to the worker without waiting. A full backlog means the
    /// store is not keeping up; the message is dropped like any other failed
    /// ingest.
    fn forward(&mut self, msg: TelemetryMessage) -> Flow {
        match self.tx.try_send(msg) {
            Ok(()) => Flow::Continue,
            Err(TrySendError::Full(msg)) => {
                self.dropped += 1;
                warn!(
                    topic = %msg.topic,
                    dropped = self.dropped,
                    "Ingestion backlog full; dropping telemetry message"
                );
                Flow::Continue
            }
            Err(TrySendError::Closed(_)) => {
                info!("Ingestion worker gone; stopping MQTT event loop");
                Flow::Stop
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Telemetry subscription
// ---------------------------------------------------------------------------

/// Drives the MQTT event loop: subscribes on every (re)connect and hands each
/// delivered publish to the ingestion worker. Never touches the store.
pub struct TelemetrySubscription {
    event_loop: EventLoop,
    session: TelemetrySession,
}

impl TelemetrySubscription {
    pub fn new(
        client: AsyncClient,
        event_loop: EventLoop,
        topic: impl Into<String>,
        tx: mpsc::Sender<TelemetryMessage>,
    ) -> Self {
        Self {
            event_loop,
            session: TelemetrySession::new(client, topic.into(), tx),
        }
    }

    /// Polls the broker until the client disconnects or the ingestion worker
    /// goes away.
    /// Spawn this via `tokio::spawn`.
    pub async fn run(mut self) {
        loop {
            if self.session.state == ConnectionState::Disconnected {
                self.session.state = ConnectionState::Connecting;
                info!(topic = %self.session.topic, "Connecting to MQTT broker");
            }

            match self.event_loop.poll().await {
                Ok(event) => {
                    if self.session.handle(event) == Flow::Stop {
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "MQTT connection error; retrying");
                    self.session.connection_lost();
                    time::sleep(RECONNECT_PAUSE).await;
                }
            }
        }
    }
}
