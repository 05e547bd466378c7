//! Cloud port: the vendor REST API.

use std::future::Future;

use switchbridge_domain::api::{ApiEnvelope, DeviceListing, DeviceStatus};
use switchbridge_domain::command::DeviceCommand;
use switchbridge_domain::error::BridgeError;
use switchbridge_domain::id::DeviceId;

/// Access to the vendor cloud API.
///
/// Implementations return the decoded envelope as-is, including envelopes
/// whose `status_code` reports a failure; interpreting the vendor status
/// code is left to the caller. Network and decoding failures are reported
/// as [`BridgeError::Transport`], non-2xx HTTP answers as
/// [`BridgeError::Rejected`].
pub trait CloudApi {
    /// `GET /v1.1/devices/{id}/status`
    fn device_status(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<ApiEnvelope<DeviceStatus>, BridgeError>> + Send;

    /// `POST /v1.1/devices/{id}/commands`
    fn send_command(
        &self,
        device_id: &DeviceId,
        command: &DeviceCommand,
    ) -> impl Future<Output = Result<ApiEnvelope<serde_json::Value>, BridgeError>> + Send;

    /// `GET /v1.1/devices`
    fn list_devices(
        &self,
    ) -> impl Future<Output = Result<ApiEnvelope<DeviceListing>, BridgeError>> + Send;
}

impl<T: CloudApi + Send + Sync> CloudApi for std::sync::Arc<T> {
    fn device_status(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<ApiEnvelope<DeviceStatus>, BridgeError>> + Send {
        (**self).device_status(device_id)
    }

    fn send_command(
        &self,
        device_id: &DeviceId,
        command: &DeviceCommand,
    ) -> impl Future<Output = Result<ApiEnvelope<serde_json::Value>, BridgeError>> + Send {
        (**self).send_command(device_id, command)
    }

    fn list_devices(
        &self,
    ) -> impl Future<Output = Result<ApiEnvelope<DeviceListing>, BridgeError>> + Send {
        (**self).list_devices()
    }
}
