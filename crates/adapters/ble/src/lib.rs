//! # switchbridge-adapter-ble
//!
//! Local Bluetooth transport implementing the
//! [`BleLink`](switchbridge_app::ports::BleLink) port.
//!
//! ## How it works
//!
//! Reads scan for the device's service-data advertisement (UUID `0xFD3D`)
//! and decode it without connecting. Commands are encoded into `0x57`
//! frames, written over GATT and acknowledged on a notify characteristic.
//! One radio operation runs at a time.
//!
//! Operations with no BLE encoding (locks, ceiling lights) fail with
//! [`BridgeError::Unsupported`] before touching the radio, so the dispatcher
//! can fall back to the cloud.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `switchbridge-app` and `switchbridge-domain`.

pub mod command;
mod config;
mod error;
mod gatt;
pub mod parser;
mod scanner;

pub use config::BleConfig;
pub use error::{BleError, PayloadParseError};

use std::time::Duration;

use tokio::sync::Mutex;

use switchbridge_app::ports::BleLink;
use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::device::DeviceType;
use switchbridge_domain::error::{BridgeError, UnsupportedError};
use switchbridge_domain::id::MacAddress;
use switchbridge_domain::operation::Operation;

use crate::scanner::Wanted;

/// btleplug-backed [`BleLink`].
pub struct BleClient {
    scan_duration: Duration,
    command_timeout: Duration,
    radio: Mutex<()>,
}

impl BleClient {
    #[must_use]
    pub fn new(config: &BleConfig) -> Self {
        Self {
            scan_duration: Duration::from_secs(u64::from(config.scan_duration_secs)),
            command_timeout: Duration::from_secs(u64::from(config.command_timeout_secs)),
            radio: Mutex::new(()),
        }
    }
}

impl BleLink for BleClient {
    #[tracing::instrument(skip(self), fields(%mac))]
    async fn read_advertisement(
        &self,
        mac: MacAddress,
        device_type: DeviceType,
    ) -> Result<Advertisement, BridgeError> {
        if !parser::decodes(device_type) {
            return Err(UnsupportedError::BleAdvertisement {
                device_type: device_type.vendor_name().to_string(),
            }
            .into());
        }

        let _radio = self.radio.lock().await;
        let central = scanner::central().await?;
        let found =
            scanner::scan_for(&central, mac, self.scan_duration, Wanted::Advertisement).await?;
        let Some((advertised, advertisement)) = found.advertisement else {
            return Err(BleError::NotSeen { mac }.into());
        };
        if !advertisement.matches(device_type) {
            return Err(BleError::ModelMismatch {
                expected: device_type.vendor_name(),
                actual: advertised.vendor_name(),
            }
            .into());
        }

        tracing::debug!(kind = advertisement.kind_name(), "advertisement decoded");
        Ok(advertisement)
    }

    #[tracing::instrument(skip(self), fields(%mac, operation = operation.name()))]
    async fn execute(
        &self,
        mac: MacAddress,
        device_type: DeviceType,
        operation: Operation,
    ) -> Result<(), BridgeError> {
        let frame = command::encode(device_type, operation)?;

        let _radio = self.radio.lock().await;
        let central = scanner::central().await?;
        let found = scanner::scan_for(&central, mac, self.scan_duration, Wanted::Peripheral).await?;
        gatt::send_command(&found.peripheral, &frame, self.command_timeout).await?;

        tracing::debug!("BLE command acknowledged");
        Ok(())
    }
}
