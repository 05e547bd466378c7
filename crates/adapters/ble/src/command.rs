//! GATT command encoder.
//!
//! Every frame starts with the `0x57` magic byte followed by `0x0F` for
//! extended commands. Devices answer on the notify characteristic; a first
//! response byte of `0x01` means the command was accepted.

use switchbridge_domain::device::DeviceType;
use switchbridge_domain::error::{BridgeError, UnsupportedError};
use switchbridge_domain::operation::Operation;

use crate::error::BleError;

/// Characteristic commands are written to.
pub const WRITE_CHAR: uuid::Uuid = uuid::Uuid::from_u128(0xCBA2_0002_224D_11E6_9FB8_0002_A5D5_C51B);
/// Characteristic responses are notified on.
pub const NOTIFY_CHAR: uuid::Uuid =
    uuid::Uuid::from_u128(0xCBA2_0003_224D_11E6_9FB8_0002_A5D5_C51B);

const MAGIC: u8 = 0x57;
const EXTENDED: u8 = 0x0F;
const RESPONSE_OK: u8 = 0x01;

const HUMIDIFIER_AUTO: u8 = 0x80;

/// Encode `operation` as a GATT frame for a device of `device_type`.
///
/// # Errors
///
/// Returns [`BleError::Domain`] wrapping [`UnsupportedError::BleCommand`]
/// when the operation has no BLE encoding for this device, so the caller can
/// fall back to the cloud.
pub fn encode(device_type: DeviceType, operation: Operation) -> Result<Vec<u8>, BleError> {
    use DeviceType as T;
    use Operation as O;

    let body = match (device_type, operation) {
        (T::PlugMiniUs | T::PlugMiniJp, O::TurnOn) => vec![0x50, 0x01, 0x01, 0x80],
        (T::PlugMiniUs | T::PlugMiniJp, O::TurnOff) => vec![0x50, 0x01, 0x01, 0x00],
        (T::Curtain | T::Curtain3, O::SetCurtainPosition { position }) => {
            vec![0x45, 0x01, 0x05, 0xFF, position.min(100)]
        }
        (T::Curtain | T::Curtain3 | T::BlindTilt, O::Pause) => vec![0x45, 0x01, 0x00, 0x01],
        (T::BlindTilt, O::SetBlindTilt { position, .. }) => {
            vec![0x45, 0x01, 0x01, 0x01, position.min(100)]
        }
        (T::Humidifier, O::TurnOn | O::SetHumidifierAuto) => humidifier(true, HUMIDIFIER_AUTO),
        (T::Humidifier, O::TurnOff) => humidifier(false, HUMIDIFIER_AUTO),
        (T::Humidifier, O::SetHumidity { humidity }) => humidifier(true, humidity.clamp(1, 100)),
        _ => {
            return Err(BleError::Domain(BridgeError::Unsupported(
                UnsupportedError::BleCommand {
                    operation: operation.name(),
                    device_type: device_type.vendor_name().to_string(),
                },
            )));
        }
    };
    Ok(frame(&body))
}

fn humidifier(on: bool, level: u8) -> Vec<u8> {
    vec![0x43, 0x81, 0x01, u8::from(on), level, 0xFF, 0xFF, 0xFF, 0xFF]
}

fn frame(body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(body.len() + 2);
    bytes.push(MAGIC);
    bytes.push(EXTENDED);
    bytes.extend_from_slice(body);
    bytes
}

/// Check a notification received after a write.
///
/// # Errors
///
/// Returns [`BleError::NoResponse`] for an empty notification and
/// [`BleError::CommandFailed`] for any status other than success.
pub fn check_response(response: &[u8]) -> Result<(), BleError> {
    match response.first() {
        Some(&RESPONSE_OK) => Ok(()),
        Some(&code) => Err(BleError::CommandFailed { code }),
        None => Err(BleError::NoResponse),
    }
}
