//! BLE adapter error types.

use switchbridge_domain::error::BridgeError;
use switchbridge_domain::id::MacAddress;

/// Errors specific to the BLE adapter.
#[derive(Debug, thiserror::Error)]
pub enum BleError {
    /// No BLE adapter found on the host.
    #[error("no BLE adapter available")]
    NotAvailable,

    /// BLE scan or adapter operation failed.
    #[error("BLE scan error")]
    Scan(#[from] btleplug::Error),

    /// Failed to connect to the peripheral.
    #[error("GATT connection failed")]
    GattConnect(#[source] btleplug::Error),

    /// A required GATT characteristic is missing.
    #[error("GATT characteristic {uuid} not found")]
    CharacteristicNotFound { uuid: uuid::Uuid },

    /// The device did not advertise within the scan window.
    #[error("device {mac} not seen during scan")]
    NotSeen { mac: MacAddress },

    /// The peripheral closed the notification stream before answering.
    #[error("no response from device")]
    NoResponse,

    /// The device answered a command with a failure code.
    #[error("device answered with status {code:#04x}")]
    CommandFailed { code: u8 },

    /// Connect, write and response did not complete in time.
    #[error("BLE command timed out")]
    Timeout,

    /// The device at the address advertised another model.
    #[error("expected a {expected} advertisement, got {actual}")]
    ModelMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Failed to decode an advertisement payload.
    #[error("failed to parse BLE payload")]
    PayloadParse(#[source] PayloadParseError),

    /// A domain-level error (unsupported command, etc.).
    #[error("domain error")]
    Domain(#[source] BridgeError),
}

/// Details about why an advertisement could not be decoded.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PayloadParseError {
    #[error("empty service data")]
    Empty,

    #[error("unknown model byte {0:#04x}")]
    UnknownModel(u8),

    #[error("{model} advertisements are not decoded")]
    Undecoded { model: &'static str },

    #[error("{source_name} must be at least {expected} bytes, got {actual}")]
    TooShort {
        source_name: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl From<PayloadParseError> for BleError {
    fn from(err: PayloadParseError) -> Self {
        Self::PayloadParse(err)
    }
}

impl BleError {
    /// Convert into a [`BridgeError`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> BridgeError {
        match self {
            Self::Domain(err) => err,
            other => BridgeError::transport(other),
        }
    }
}

impl From<BleError> for BridgeError {
    fn from(err: BleError) -> Self {
        err.into_domain()
    }
}
