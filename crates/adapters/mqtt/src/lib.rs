//! # switchbridge-adapter-mqtt
//!
//! Mirrors accessory state to an MQTT broker.
//!
//! ## How it works
//!
//! [`StateMirror`] listens on the in-process event bus and publishes every
//! `state_updated` snapshot as JSON. Each device goes to its configured
//! `mqtt_topic`, or `<base_topic>/<device_id>` when it has none. A second
//! task drives the rumqttc event loop and reconnects after failures.
//!
//! ## Dependency rule
//!
//! Depends on `switchbridge-domain` only: it consumes events, it implements
//! no port.

mod config;
mod error;

pub use config::MqttConfig;
pub use error::MqttError;

use std::collections::HashMap;
use std::time::Duration;

use rumqttc::{AsyncClient, ConnectionError, EventLoop, Incoming, QoS};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use switchbridge_domain::device::Device;
use switchbridge_domain::event::{Event, EventKind};
use switchbridge_domain::id::DeviceId;

const CHANNEL_CAPACITY: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Topic a device's state is published to.
#[must_use]
pub fn state_topic(base_topic: &str, device_id: &DeviceId, override_topic: Option<&str>) -> String {
    match override_topic {
        Some(topic) if !topic.trim().is_empty() => topic.trim().to_string(),
        _ => format!("{}/{device_id}", base_topic.trim_end_matches('/')),
    }
}

/// Publishes accessory snapshots to MQTT.
pub struct StateMirror {
    client: AsyncClient,
    base_topic: String,
    retain: bool,
    topics: HashMap<DeviceId, String>,
}

impl StateMirror {
    /// Build a mirror around an existing client.
    #[must_use]
    pub fn new(client: AsyncClient, config: &MqttConfig, devices: &[Device]) -> Self {
        let topics = devices
            .iter()
            .map(|device| {
                let topic =
                    state_topic(&config.base_topic, &device.id, device.mqtt_topic.as_deref());
                (device.id.clone(), topic)
            })
            .collect();
        Self {
            client,
            base_topic: config.base_topic.clone(),
            retain: config.retain,
            topics,
        }
    }

    /// Connect to the broker and mirror events until the bus closes.
    ///
    /// Returns the forwarding task; the connection task stops on its own
    /// once the forwarder drops the client.
    #[must_use]
    pub fn start(
        config: &MqttConfig,
        devices: &[Device],
        events: broadcast::Receiver<Event>,
    ) -> JoinHandle<()> {
        let (client, eventloop) = AsyncClient::new(config.mqtt_options(), CHANNEL_CAPACITY);
        tokio::spawn(drive_connection(eventloop));

        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            "MQTT state mirror started"
        );
        let mirror = Self::new(client, config, devices);
        tokio::spawn(mirror.run(events))
    }

    fn topic(&self, device_id: &DeviceId) -> String {
        self.topics
            .get(device_id)
            .cloned()
            .unwrap_or_else(|| state_topic(&self.base_topic, device_id, None))
    }

    /// Publish `event` when it carries a state snapshot.
    ///
    /// Returns whether anything was published.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError`] when the payload cannot be encoded or the client
    /// queue is closed.
    pub async fn forward(&self, event: &Event) -> Result<bool, MqttError> {
        if event.kind != EventKind::StateUpdated {
            return Ok(false);
        }
        let payload = serde_json::to_vec(&event.data).map_err(MqttError::Encode)?;
        let topic = self.topic(&event.device_id);
        tracing::debug!(device_id = %event.device_id, %topic, "publishing state");
        self.client
            .publish(topic, QoS::AtLeastOnce, self.retain, payload)
            .await?;
        Ok(true)
    }

    async fn run(self, mut events: broadcast::Receiver<Event>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(err) = self.forward(&event).await {
                        tracing::warn!(%err, device_id = %event.device_id, "failed to mirror state");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "MQTT mirror lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        if let Err(err) = self.client.disconnect().await {
            tracing::debug!(%err, "MQTT disconnect failed");
        }
    }
}

async fn drive_connection(mut eventloop: EventLoop) {
    loop {
        match eventloop.poll().await {
            Ok(rumqttc::Event::Incoming(Incoming::ConnAck(_))) => {
                tracing::info!("connected to MQTT broker");
            }
            Ok(rumqttc::Event::Incoming(Incoming::Disconnect)) => {
                tracing::warn!("disconnected from MQTT broker");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => break,
            Err(err) => {
                tracing::warn!(%err, "MQTT connection error, reconnecting");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
