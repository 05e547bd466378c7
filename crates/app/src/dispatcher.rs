//! Transport dispatch: BLE first, cloud fallback, bounded cloud retry.
//!
//! Each device's [`ConnectionType`](switchbridge_domain::connection::ConnectionType)
//! yields an ordered plan of transports. BLE gets a single attempt; any BLE
//! failure (including operations BLE cannot encode) falls through to the
//! next transport. The cloud is retried with a fixed delay on transport
//! errors only: a vendor status code is final.

use std::future::Future;

use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::api::{
    ApiEnvelope, DeviceListing, DeviceStatus, Severity, StatusOutcome, classify,
};
use switchbridge_domain::connection::{RetryPolicy, Transport};
use switchbridge_domain::device::Device;
use switchbridge_domain::error::{BridgeError, UnsupportedError};
use switchbridge_domain::id::MacAddress;
use switchbridge_domain::operation::Operation;

use crate::ports::{BleLink, CloudApi};

/// State fetched from a device, tagged by the transport that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusReport {
    Ble(Advertisement),
    Cloud(DeviceStatus),
}

impl StatusReport {
    #[must_use]
    pub fn transport(&self) -> Transport {
        match self {
            Self::Ble(_) => Transport::Ble,
            Self::Cloud(_) => Transport::OpenApi,
        }
    }
}

/// Routes operations and status reads to the configured transports.
pub struct Dispatcher<C, B> {
    cloud: Option<C>,
    ble: Option<B>,
    retry: RetryPolicy,
}

impl<C: CloudApi + Sync, B: BleLink + Sync> Dispatcher<C, B> {
    /// `cloud` is `None` when no credentials are configured, `ble` when
    /// Bluetooth is disabled.
    #[must_use]
    pub fn new(cloud: Option<C>, ble: Option<B>, retry: RetryPolicy) -> Self {
        Self { cloud, ble, retry }
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.cloud.is_some()
    }

    /// The cloud client, when configured.
    #[must_use]
    pub fn cloud(&self) -> Option<&C> {
        self.cloud.as_ref()
    }

    /// Push `operation` to the device and return the transport that took it.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedError::NoTransport`] when the plan is empty,
    /// otherwise the error of the last transport tried.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id, operation = operation.name()))]
    pub async fn execute(
        &self,
        device: &Device,
        operation: Operation,
    ) -> Result<Transport, BridgeError> {
        let plan = device.connection.plan(self.has_credentials());
        let mut last_error = None;
        for transport in plan {
            let result = match transport {
                Transport::Ble => self.execute_ble(device, operation).await,
                Transport::OpenApi => self.execute_cloud(device, operation).await,
            };
            match result {
                Ok(()) => {
                    tracing::debug!(%transport, "operation delivered");
                    return Ok(transport);
                }
                Err(err) => {
                    tracing::warn!(%transport, %err, "operation failed");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| no_transport(device)))
    }

    /// Read the device's current state.
    ///
    /// # Errors
    ///
    /// Same as [`Self::execute`].
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub async fn fetch_status(&self, device: &Device) -> Result<StatusReport, BridgeError> {
        let plan = device.connection.plan(self.has_credentials());
        let mut last_error = None;
        for transport in plan {
            let result = match transport {
                Transport::Ble => self.fetch_ble(device).await.map(StatusReport::Ble),
                Transport::OpenApi => self.fetch_cloud(device).await.map(StatusReport::Cloud),
            };
            match result {
                Ok(report) => return Ok(report),
                Err(err) => {
                    tracing::warn!(%transport, %err, "status read failed");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| no_transport(device)))
    }

    /// Every device registered on the vendor account, or `None` without
    /// cloud credentials.
    ///
    /// # Errors
    ///
    /// Returns the cloud error once retries are exhausted.
    pub async fn list_account_devices(&self) -> Result<Option<DeviceListing>, BridgeError> {
        let Some(cloud) = self.cloud.as_ref() else {
            return Ok(None);
        };
        let envelope = self.with_retry(move || cloud.list_devices()).await?;
        Ok(Some(envelope.body.unwrap_or_default()))
    }

    fn ble_target(&self, device: &Device) -> Result<(&B, MacAddress), BridgeError> {
        let ble = self.ble.as_ref().ok_or_else(|| no_transport(device))?;
        let mac = device.mac().ok_or_else(|| no_transport(device))?;
        Ok((ble, mac))
    }

    async fn execute_ble(&self, device: &Device, operation: Operation) -> Result<(), BridgeError> {
        let (ble, mac) = self.ble_target(device)?;
        ble.execute(mac, device.device_type, operation).await
    }

    async fn fetch_ble(&self, device: &Device) -> Result<Advertisement, BridgeError> {
        let (ble, mac) = self.ble_target(device)?;
        ble.read_advertisement(mac, device.device_type).await
    }

    async fn execute_cloud(&self, device: &Device, operation: Operation) -> Result<(), BridgeError> {
        let cloud = self.cloud.as_ref().ok_or_else(|| no_transport(device))?;
        let command = &operation.to_openapi(device.device_type)?;
        let device_id = &device.id;
        self.with_retry(move || cloud.send_command(device_id, command))
            .await
            .map(|_| ())
    }

    async fn fetch_cloud(&self, device: &Device) -> Result<DeviceStatus, BridgeError> {
        let cloud = self.cloud.as_ref().ok_or_else(|| no_transport(device))?;
        let device_id = &device.id;
        let envelope = self
            .with_retry(move || cloud.device_status(device_id))
            .await?;
        Ok(envelope.body.unwrap_or_default())
    }

    /// Run a cloud call, retrying transport errors with the fixed delay.
    async fn with_retry<T, F, Fut>(&self, mut call: F) -> Result<ApiEnvelope<T>, BridgeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ApiEnvelope<T>, BridgeError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(envelope) => return accept(envelope),
                Err(BridgeError::Transport(err)) => {
                    let Some(delay) = self.retry.delay_before(attempt + 1) else {
                        return Err(BridgeError::Transport(err));
                    };
                    tracing::warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts(),
                        error = %err,
                        "cloud request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err @ BridgeError::Rejected { status_code, .. }) => {
                    log_outcome(&classify(status_code));
                    return Err(err);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn no_transport(device: &Device) -> BridgeError {
    UnsupportedError::NoTransport {
        device_id: device.id.to_string(),
    }
    .into()
}

/// Check the vendor status code of a decoded envelope.
fn accept<T>(envelope: ApiEnvelope<T>) -> Result<ApiEnvelope<T>, BridgeError> {
    let outcome = classify(envelope.status_code);
    log_outcome(&outcome);
    if outcome.success {
        return Ok(envelope);
    }
    let message = if envelope.message.is_empty() {
        outcome.message.to_string()
    } else {
        format!("{}: {}", outcome.message, envelope.message)
    };
    Err(BridgeError::Rejected {
        status_code: envelope.status_code,
        message,
    })
}

fn log_outcome(outcome: &StatusOutcome) {
    let code = outcome.code;
    let message = outcome.message;
    match outcome.severity {
        Severity::Debug => tracing::debug!(code, message, "cloud status"),
        Severity::Info => tracing::info!(code, message, "cloud status"),
        Severity::Warn => tracing::warn!(code, message, "cloud status"),
        Severity::Error => tracing::error!(code, message, "cloud status"),
    }
}
