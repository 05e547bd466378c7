//! Connection types and the fallback plan between BLE and the cloud API.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a device is reached, as configured per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    #[serde(rename = "BLE")]
    Ble,
    #[serde(rename = "OpenAPI")]
    OpenApi,
    /// BLE first, cloud when BLE fails.
    #[serde(rename = "BLE/OpenAPI")]
    BleOpenApi,
    #[serde(rename = "Disable")]
    Disabled,
}

/// A single transport the dispatcher can try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    #[serde(rename = "BLE")]
    Ble,
    #[serde(rename = "OpenAPI")]
    OpenApi,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ble => f.write_str("BLE"),
            Self::OpenApi => f.write_str("OpenAPI"),
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ble => f.write_str("BLE"),
            Self::OpenApi => f.write_str("OpenAPI"),
            Self::BleOpenApi => f.write_str("BLE/OpenAPI"),
            Self::Disabled => f.write_str("Disable"),
        }
    }
}

impl ConnectionType {
    /// Pick the connection type for a device that did not configure one.
    #[must_use]
    pub fn resolve(configured: Option<Self>, has_credentials: bool) -> Self {
        match configured {
            Some(connection) => connection,
            None if has_credentials => Self::OpenApi,
            None => Self::Ble,
        }
    }

    /// Ordered list of transports to try for one logical operation.
    ///
    /// The cloud transport only appears when credentials are available.
    #[must_use]
    pub fn plan(self, has_credentials: bool) -> Vec<Transport> {
        match self {
            Self::Ble => vec![Transport::Ble],
            Self::OpenApi if has_credentials => vec![Transport::OpenApi],
            Self::BleOpenApi if has_credentials => vec![Transport::Ble, Transport::OpenApi],
            Self::BleOpenApi => vec![Transport::Ble],
            Self::OpenApi | Self::Disabled => Vec::new(),
        }
    }
}

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` is raised to 1 when zero.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Delay to wait before the given 1-based attempt, if any.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        (attempt > 1 && attempt <= self.max_attempts).then_some(self.delay)
    }
}
