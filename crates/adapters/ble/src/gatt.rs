//! GATT command round trip.
//!
//! [`send_command`] connects, writes one frame, waits for the device's
//! notification and always disconnects, even on error.

use std::time::Duration;

use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use tokio_stream::StreamExt as _;

use crate::command::{self, NOTIFY_CHAR, WRITE_CHAR};
use crate::error::BleError;

/// Find a GATT characteristic by UUID on a peripheral that has already
/// discovered its services.
fn find_characteristic(
    peripheral: &Peripheral,
    uuid: uuid::Uuid,
) -> Result<Characteristic, BleError> {
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == uuid)
        .ok_or(BleError::CharacteristicNotFound { uuid })
}

/// Write `frame` and wait for the device's answer.
///
/// `timeout` bounds the whole exchange, connection included.
///
/// # Errors
///
/// Returns [`BleError::GattConnect`] if the connection fails,
/// [`BleError::Timeout`] when the device does not answer in time, or
/// [`BleError::CommandFailed`] when it rejects the command.
pub(crate) async fn send_command(
    peripheral: &Peripheral,
    frame: &[u8],
    timeout: Duration,
) -> Result<(), BleError> {
    let deadline = tokio::time::Instant::now() + timeout;

    tokio::time::timeout_at(deadline, peripheral.connect())
        .await
        .map_err(|_| BleError::Timeout)?
        .map_err(BleError::GattConnect)?;

    let result = tokio::time::timeout_at(deadline, send_command_inner(peripheral, frame))
        .await
        .unwrap_or(Err(BleError::Timeout));

    if let Err(err) = peripheral.disconnect().await {
        tracing::warn!(%err, "failed to disconnect peripheral");
    }

    result
}

async fn send_command_inner(peripheral: &Peripheral, frame: &[u8]) -> Result<(), BleError> {
    peripheral.discover_services().await?;

    let write_char = find_characteristic(peripheral, WRITE_CHAR)?;
    let notify_char = find_characteristic(peripheral, NOTIFY_CHAR)?;

    peripheral.subscribe(&notify_char).await?;
    let mut notifications = peripheral.notifications().await?;

    peripheral
        .write(&write_char, frame, WriteType::WithoutResponse)
        .await?;

    while let Some(notification) = notifications.next().await {
        if notification.uuid == NOTIFY_CHAR {
            return command::check_response(&notification.value);
        }
    }
    Err(BleError::NoResponse)
}
