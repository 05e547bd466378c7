//! MQTT adapter error types.

use switchbridge_domain::error::BridgeError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// Failed to encode a state payload.
    #[error("failed to encode MQTT payload")]
    Encode(#[source] serde_json::Error),
}

impl MqttError {
    /// Convert into a [`BridgeError::Transport`] for propagation across
    /// port boundaries.
    #[must_use]
    pub fn into_domain(self) -> BridgeError {
        BridgeError::transport(self)
    }
}

impl From<MqttError> for BridgeError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
