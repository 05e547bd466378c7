//! BLE port: local Bluetooth advertisement reads and GATT commands.

use std::future::Future;

use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::device::DeviceType;
use switchbridge_domain::error::BridgeError;
use switchbridge_domain::id::MacAddress;
use switchbridge_domain::operation::Operation;

/// Local Bluetooth access to SwitchBot devices.
pub trait BleLink {
    /// Scan until the device advertises and decode its state.
    fn read_advertisement(
        &self,
        mac: MacAddress,
        device_type: DeviceType,
    ) -> impl Future<Output = Result<Advertisement, BridgeError>> + Send;

    /// Encode `operation` for the device and write it over GATT.
    ///
    /// Operations without a BLE encoding fail with
    /// [`BridgeError::Unsupported`].
    fn execute(
        &self,
        mac: MacAddress,
        device_type: DeviceType,
        operation: Operation,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: BleLink + Send + Sync> BleLink for std::sync::Arc<T> {
    fn read_advertisement(
        &self,
        mac: MacAddress,
        device_type: DeviceType,
    ) -> impl Future<Output = Result<Advertisement, BridgeError>> + Send {
        (**self).read_advertisement(mac, device_type)
    }

    fn execute(
        &self,
        mac: MacAddress,
        device_type: DeviceType,
        operation: Operation,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).execute(mac, device_type, operation)
    }
}
