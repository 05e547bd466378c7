//! Scanning for one device at a time.
//!
//! The radio is shared, so callers serialise scans; each scan stops as soon
//! as the wanted device shows up or the window elapses.

use std::time::Duration;

use btleplug::api::{BDAddr, Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio_stream::StreamExt as _;

use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::device::DeviceType;
use switchbridge_domain::id::MacAddress;

use crate::error::{BleError, PayloadParseError};
use crate::parser::{self, MANUFACTURER_ID, SERVICE_UUID};

/// What a scan waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wanted {
    /// Any sighting, enough to connect.
    Peripheral,
    /// A decodable advertisement.
    Advertisement,
}

pub(crate) struct Found {
    pub peripheral: Peripheral,
    pub advertisement: Option<(DeviceType, Advertisement)>,
}

/// First Bluetooth adapter on the host.
pub(crate) async fn central() -> Result<Adapter, BleError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(BleError::NotAvailable)
}

pub(crate) fn is_address(address: BDAddr, mac: MacAddress) -> bool {
    address.into_inner() == mac.octets()
}

/// Scan until `mac` is seen, or `duration` elapses.
///
/// # Errors
///
/// Returns [`BleError::NotSeen`] when the device never advertised, the last
/// [`BleError::PayloadParse`] when it did but nothing could be decoded, or
/// [`BleError::Scan`] for adapter failures.
pub(crate) async fn scan_for(
    central: &Adapter,
    mac: MacAddress,
    duration: Duration,
    wanted: Wanted,
) -> Result<Found, BleError> {
    if wanted == Wanted::Peripheral
        && let Some(peripheral) = known_peripheral(central, mac).await
    {
        tracing::trace!(%mac, "peripheral already known to adapter");
        return Ok(Found {
            peripheral,
            advertisement: None,
        });
    }

    let mut events = central.events().await?;
    central
        .start_scan(ScanFilter {
            services: vec![SERVICE_UUID],
        })
        .await?;

    let deadline = tokio::time::Instant::now() + duration;
    let mut last_error: Option<PayloadParseError> = None;
    let mut found = None;

    while tokio::time::Instant::now() < deadline {
        let remaining = deadline - tokio::time::Instant::now();
        let id = match tokio::time::timeout(remaining, events.next()).await {
            Ok(Some(
                CentralEvent::DeviceDiscovered(id)
                | CentralEvent::DeviceUpdated(id)
                | CentralEvent::ServiceDataAdvertisement { id, .. }
                | CentralEvent::ManufacturerDataAdvertisement { id, .. },
            )) => id,
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => break,
        };

        let Ok(peripheral) = central.peripheral(&id).await else {
            continue;
        };
        let Ok(Some(props)) = peripheral.properties().await else {
            continue;
        };
        if !is_address(props.address, mac) {
            continue;
        }

        if wanted == Wanted::Peripheral {
            found = Some(Found {
                peripheral,
                advertisement: None,
            });
            break;
        }

        let Some(service) = props.service_data.get(&SERVICE_UUID) else {
            continue;
        };
        let manufacturer = props.manufacturer_data.get(&MANUFACTURER_ID);
        match parser::parse_advertisement(service, manufacturer.map(Vec::as_slice)) {
            Ok(decoded) => {
                found = Some(Found {
                    peripheral,
                    advertisement: Some(decoded),
                });
                break;
            }
            Err(err) => {
                tracing::trace!(%mac, %err, "advertisement not decodable yet");
                last_error = Some(err);
            }
        }
    }

    if let Err(err) = central.stop_scan().await {
        tracing::warn!(%err, "failed to stop BLE scan");
    }

    found.ok_or_else(|| last_error.map_or(BleError::NotSeen { mac }, BleError::PayloadParse))
}

async fn known_peripheral(central: &Adapter, mac: MacAddress) -> Option<Peripheral> {
    let peripherals = central.peripherals().await.ok()?;
    peripherals
        .into_iter()
        .find(|peripheral| is_address(peripheral.address(), mac))
}
