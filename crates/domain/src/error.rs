//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! via `From` when crossing a port boundary.

use crate::homekit::Characteristic;

/// Base error for every operation exposed by the domain and the app layer.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("unsupported")]
    Unsupported(#[from] UnsupportedError),

    /// The vendor answered, but with a non-success status code.
    #[error("request rejected with status {status_code}: {message}")]
    Rejected { status_code: u16, message: String },

    /// Network, radio, or decoding failure in an adapter.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Invariant violations detected while building or updating domain values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("device name must not be empty")]
    EmptyName,

    #[error("invalid MAC address {0:?}")]
    InvalidMacAddress(String),

    #[error("device type is required")]
    MissingDeviceType,

    #[error("{characteristic} expects a {expected} value")]
    WrongValueType {
        characteristic: Characteristic,
        expected: &'static str,
    },

    #[error("unknown characteristic {0:?}")]
    UnknownCharacteristic(String),

    #[error("{field} must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },
}

/// A lookup for something that does not exist.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A request the target device or transport cannot carry out.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnsupportedError {
    #[error("{characteristic} is read-only")]
    ReadOnly { characteristic: Characteristic },

    #[error("{operation} is not supported by {device_type}")]
    Operation {
        operation: &'static str,
        device_type: String,
    },

    #[error("{operation} cannot be sent to {device_type} over BLE")]
    BleCommand {
        operation: &'static str,
        device_type: String,
    },

    #[error("{device_type} does not expose BLE advertisements")]
    BleAdvertisement { device_type: String },

    #[error("device {device_id} has no usable transport")]
    NoTransport { device_id: String },
}

impl BridgeError {
    /// Wrap any adapter error as a [`BridgeError::Transport`].
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(err))
    }
}
