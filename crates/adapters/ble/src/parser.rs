//! SwitchBot advertisement decoders.
//!
//! Pure functions over raw `&[u8]` slices, no BLE dependency needed. The
//! first service-data byte carries the model in its low 7 bits; some models
//! keep part of their state in the manufacturer data (company id `0x0969`)
//! instead.
//!
//! | Model | Byte | Source of state |
//! |-------|------|-----------------|
//! | Blind Tilt | `x` | battery in service data, position in manufacturer data |
//! | Curtain, Curtain 3 | `c`, `{` | service data |
//! | Plug Mini | `g`, `j` | manufacturer data |
//! | Humidifier | `e` | service data |
//! | Meter | `T` | service data |
//! | Meter Plus, Outdoor Meter | `i`, `w` | manufacturer data, service data fallback |
//! | Hub 2 | `v` | manufacturer data |

use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::device::DeviceType;

use crate::error::PayloadParseError;

/// Service-data UUID every SwitchBot device advertises under.
pub const SERVICE_UUID: uuid::Uuid =
    uuid::Uuid::from_u128(0x0000_FD3D_0000_1000_8000_0080_5F9B_34FB);

/// Bluetooth SIG company identifier of the vendor.
pub const MANUFACTURER_ID: u16 = 0x0969;

const MAX_LIGHT_LEVEL: u8 = 20;

/// Decode an advertisement into the advertising model and its state.
///
/// `manufacturer_data` excludes the company id, as btleplug reports it.
///
/// # Errors
///
/// Returns [`PayloadParseError`] when the model is unknown, carries no
/// decodable state, or either payload is too short for its model.
pub fn parse_advertisement(
    service_data: &[u8],
    manufacturer_data: Option<&[u8]>,
) -> Result<(DeviceType, Advertisement), PayloadParseError> {
    let model = *service_data.first().ok_or(PayloadParseError::Empty)?;
    let device_type =
        DeviceType::from_ble_model(model).ok_or(PayloadParseError::UnknownModel(model & 0x7f))?;
    let mfr = manufacturer_data.unwrap_or_default();

    let advertisement = match device_type {
        DeviceType::BlindTilt => parse_blind_tilt(service_data, mfr)?,
        DeviceType::Curtain | DeviceType::Curtain3 => parse_curtain(service_data)?,
        DeviceType::PlugMiniUs | DeviceType::PlugMiniJp => parse_plug_mini(mfr)?,
        DeviceType::Humidifier => parse_humidifier(service_data)?,
        DeviceType::Meter => parse_meter(service_data)?,
        DeviceType::MeterPlus | DeviceType::OutdoorMeter => parse_meter_plus(service_data, mfr)?,
        DeviceType::Hub2 => parse_hub2(mfr)?,
        other => {
            return Err(PayloadParseError::Undecoded {
                model: other.vendor_name(),
            });
        }
    };
    Ok((device_type, advertisement))
}

/// Whether advertisements of this model carry state [`parse_advertisement`]
/// can decode.
#[must_use]
pub fn decodes(device_type: DeviceType) -> bool {
    use DeviceType as T;

    matches!(
        device_type,
        T::BlindTilt
            | T::Curtain
            | T::Curtain3
            | T::PlugMiniUs
            | T::PlugMiniJp
            | T::Humidifier
            | T::Meter
            | T::MeterPlus
            | T::OutdoorMeter
            | T::Hub2
    )
}

/// Decode the two-byte temperature used by meters and the hub.
///
/// Byte 0 holds tenths in its low nibble, byte 1 the whole degrees in its
/// low 7 bits with bit 7 set for positive values.
#[must_use]
pub fn decode_temperature(bytes: [u8; 2]) -> f64 {
    let tenths = f64::from(bytes[0] & 0x0f) / 10.0;
    let whole = f64::from(bytes[1] & 0x7f);
    let magnitude = whole + tenths;
    if bytes[1] & 0x80 == 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn require(
    source_name: &'static str,
    data: &[u8],
    expected: usize,
) -> Result<(), PayloadParseError> {
    if data.len() < expected {
        return Err(PayloadParseError::TooShort {
            source_name,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn parse_blind_tilt(service: &[u8], mfr: &[u8]) -> Result<Advertisement, PayloadParseError> {
    require("service data", service, 3)?;
    require("manufacturer data", mfr, 9)?;
    Ok(Advertisement::BlindTilt {
        position: (mfr[8] & 0x7f).min(100),
        battery: service[2] & 0x7f,
        in_motion: mfr[8] & 0x80 != 0,
        light_level: (mfr[7] >> 4) & 0x0f,
        calibrated: mfr[7] & 0x01 != 0,
    })
}

fn parse_curtain(service: &[u8]) -> Result<Advertisement, PayloadParseError> {
    require("service data", service, 5)?;
    Ok(Advertisement::Curtain {
        position: (service[3] & 0x7f).min(100),
        battery: service[2] & 0x7f,
        in_motion: service[3] & 0x80 != 0,
        light_level: (service[4] >> 4) & 0x0f,
        calibrated: service[1] & 0x40 != 0,
    })
}

fn parse_plug_mini(mfr: &[u8]) -> Result<Advertisement, PayloadParseError> {
    require("manufacturer data", mfr, 12)?;
    let deciwatts = ((u16::from(mfr[10]) << 8) | u16::from(mfr[11])) & 0x7fff;
    Ok(Advertisement::Plug {
        on: mfr[7] == 0x80,
        watts: Some(f64::from(deciwatts) / 10.0),
    })
}

fn parse_humidifier(service: &[u8]) -> Result<Advertisement, PayloadParseError> {
    require("service data", service, 5)?;
    let auto = service[4] & 0x80 != 0;
    let level = service[4] & 0x7f;
    Ok(Advertisement::Humidifier {
        on: service[1] & 0x80 != 0,
        auto,
        level: (!auto).then_some(level.clamp(1, 100)),
    })
}

fn parse_meter(service: &[u8]) -> Result<Advertisement, PayloadParseError> {
    require("service data", service, 6)?;
    Ok(Advertisement::Climate {
        temperature: decode_temperature([service[3], service[4]]),
        humidity: service[5] & 0x7f,
        battery: Some(service[2] & 0x7f),
        light_level: None,
    })
}

fn parse_meter_plus(service: &[u8], mfr: &[u8]) -> Result<Advertisement, PayloadParseError> {
    let battery = service.get(2).map(|b| b & 0x7f);
    let readings = if mfr.len() >= 11 {
        [mfr[8], mfr[9], mfr[10]]
    } else {
        require("service data", service, 6)?;
        [service[3], service[4], service[5]]
    };
    Ok(Advertisement::Climate {
        temperature: decode_temperature([readings[0], readings[1]]),
        humidity: readings[2] & 0x7f,
        battery,
        light_level: None,
    })
}

fn parse_hub2(mfr: &[u8]) -> Result<Advertisement, PayloadParseError> {
    require("manufacturer data", mfr, 16)?;
    Ok(Advertisement::Climate {
        temperature: decode_temperature([mfr[13], mfr[14]]),
        humidity: mfr[15] & 0x7f,
        battery: None,
        light_level: Some((mfr[12] & 0x1f).min(MAX_LIGHT_LEVEL)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: [u8; 6] = [0xC1, 0xA2, 0xB3, 0xC4, 0xD5, 0xE6];

    fn mfr_with(tail: &[u8]) -> Vec<u8> {
        let mut data = MAC.to_vec();
        data.extend_from_slice(tail);
        data
    }

    #[test]
    fn should_decode_positive_and_negative_temperatures() {
        assert!((decode_temperature([0x05, 0x80 | 21]) - 21.5).abs() < f64::EPSILON);
        assert!((decode_temperature([0x05, 3]) + 3.5).abs() < f64::EPSILON);
        assert!(decode_temperature([0x00, 0x80]).abs() < f64::EPSILON);
    }

    #[test]
    fn should_know_which_models_are_decodable() {
        assert!(decodes(DeviceType::Hub2));
        assert!(!decodes(DeviceType::SmartLockPro));
        assert!(!decodes(DeviceType::CeilingLight));
    }

    #[test]
    fn should_reject_empty_service_data() {
        assert_eq!(parse_advertisement(&[], None), Err(PayloadParseError::Empty));
    }

    #[test]
    fn should_reject_unknown_model() {
        assert_eq!(
            parse_advertisement(&[0x01, 0x00, 0x00], None),
            Err(PayloadParseError::UnknownModel(0x01))
        );
    }

    #[test]
    fn should_not_decode_lock_advertisements() {
        assert_eq!(
            parse_advertisement(&[b'o', 0x00, 0x64], None),
            Err(PayloadParseError::Undecoded { model: "Smart Lock" })
        );
    }

    #[test]
    fn should_decode_blind_tilt_from_both_payloads() {
        let mfr = mfr_with(&[0x00, 0xA1, 0x80 | 35]);
        let (device_type, adv) = parse_advertisement(&[b'x', 0x00, 0x80 | 87], Some(&mfr)).unwrap();
        assert_eq!(device_type, DeviceType::BlindTilt);
        assert_eq!(
            adv,
            Advertisement::BlindTilt {
                position: 35,
                battery: 87,
                in_motion: true,
                light_level: 10,
                calibrated: true,
            }
        );
    }

    #[test]
    fn should_require_manufacturer_data_for_blind_tilt() {
        assert_eq!(
            parse_advertisement(&[b'x', 0x00, 0x57], None),
            Err(PayloadParseError::TooShort {
                source_name: "manufacturer data",
                expected: 9,
                actual: 0,
            })
        );
    }

    #[test]
    fn should_decode_curtain_ignoring_high_model_bit() {
        let (device_type, adv) =
            parse_advertisement(&[b'c' | 0x80, 0x40, 0x64, 0x05, 0x31], None).unwrap();
        assert_eq!(device_type, DeviceType::Curtain);
        assert_eq!(
            adv,
            Advertisement::Curtain {
                position: 5,
                battery: 100,
                in_motion: false,
                light_level: 3,
                calibrated: true,
            }
        );
    }

    #[test]
    fn should_decode_plug_mini_power() {
        let mfr = mfr_with(&[0x00, 0x80, 0x00, 0x00, 0x01, 0x2C]);
        let (device_type, adv) = parse_advertisement(&[b'g'], Some(&mfr)).unwrap();
        assert_eq!(device_type, DeviceType::PlugMiniUs);
        assert_eq!(
            adv,
            Advertisement::Plug {
                on: true,
                watts: Some(30.0),
            }
        );
    }

    #[test]
    fn should_decode_humidifier_manual_level_and_auto_mode() {
        let (_, manual) = parse_advertisement(&[b'e', 0x80, 0x00, 0x00, 45], None).unwrap();
        assert_eq!(
            manual,
            Advertisement::Humidifier {
                on: true,
                auto: false,
                level: Some(45),
            }
        );

        let (_, auto) = parse_advertisement(&[b'e', 0x00, 0x00, 0x00, 0x80], None).unwrap();
        assert_eq!(
            auto,
            Advertisement::Humidifier {
                on: false,
                auto: true,
                level: None,
            }
        );
    }

    #[test]
    fn should_decode_meter_from_service_data() {
        let (device_type, adv) =
            parse_advertisement(&[b'T', 0x00, 0x5A, 0x03, 0x80 | 22, 48], None).unwrap();
        assert_eq!(device_type, DeviceType::Meter);
        assert_eq!(
            adv,
            Advertisement::Climate {
                temperature: 22.3,
                humidity: 48,
                battery: Some(90),
                light_level: None,
            }
        );
    }

    #[test]
    fn should_prefer_manufacturer_data_for_meter_plus() {
        let mfr = mfr_with(&[0x00, 0x00, 0x01, 0x80 | 19, 61]);
        let (device_type, adv) = parse_advertisement(&[b'i', 0x00, 0x50], Some(&mfr)).unwrap();
        assert_eq!(device_type, DeviceType::MeterPlus);
        assert_eq!(
            adv,
            Advertisement::Climate {
                temperature: 19.1,
                humidity: 61,
                battery: Some(80),
                light_level: None,
            }
        );
    }

    #[test]
    fn should_fall_back_to_service_data_for_outdoor_meter() {
        let (device_type, adv) =
            parse_advertisement(&[b'w', 0x00, 0x50, 0x02, 5, 70], None).unwrap();
        assert_eq!(device_type, DeviceType::OutdoorMeter);
        assert_eq!(
            adv,
            Advertisement::Climate {
                temperature: -5.2,
                humidity: 70,
                battery: Some(80),
                light_level: None,
            }
        );
    }

    #[test]
    fn should_decode_hub2_with_light_level() {
        let mfr = mfr_with(&[0, 0, 0, 0, 0, 0, 0x0C, 0x04, 0x80 | 20, 55]);
        let (device_type, adv) = parse_advertisement(&[b'v'], Some(&mfr)).unwrap();
        assert_eq!(device_type, DeviceType::Hub2);
        assert_eq!(
            adv,
            Advertisement::Climate {
                temperature: 20.4,
                humidity: 55,
                battery: None,
                light_level: Some(12),
            }
        );
    }
}
