//! BLE adapter configuration.

use serde::Deserialize;

/// Configuration for the local Bluetooth transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BleConfig {
    /// Disabled by default: a host without a radio would fail every read.
    pub enabled: bool,
    /// How long to scan for a device's advertisement, in seconds.
    pub scan_duration_secs: u16,
    /// Upper bound for connect, write and response of one GATT command.
    pub command_timeout_secs: u16,
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scan_duration_secs: 10,
            command_timeout_secs: 10,
        }
    }
}
