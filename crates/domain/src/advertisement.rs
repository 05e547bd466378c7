//! Device state decoded from a BLE advertisement.

use serde::{Deserialize, Serialize};

use crate::device::DeviceType;

/// Decoded advertisement payload, one variant per device family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advertisement {
    BlindTilt {
        /// Vendor encoding, see [`crate::mapping`].
        position: u8,
        battery: u8,
        in_motion: bool,
        light_level: u8,
        calibrated: bool,
    },
    Curtain {
        /// Vendor encoding: 0 is fully open.
        position: u8,
        battery: u8,
        in_motion: bool,
        light_level: u8,
        calibrated: bool,
    },
    Plug {
        on: bool,
        /// Instantaneous power draw, when the model reports it.
        watts: Option<f64>,
    },
    Humidifier {
        on: bool,
        auto: bool,
        /// Target humidity in percent.
        level: Option<u8>,
    },
    Climate {
        temperature: f64,
        humidity: u8,
        battery: Option<u8>,
        /// 1–20 scale, reported by the Hub 2 only.
        light_level: Option<u8>,
    },
}

impl Advertisement {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::BlindTilt { .. } => "blind_tilt",
            Self::Curtain { .. } => "curtain",
            Self::Plug { .. } => "plug",
            Self::Humidifier { .. } => "humidifier",
            Self::Climate { .. } => "climate",
        }
    }

    /// Whether a device of the given type can produce this advertisement.
    #[must_use]
    pub fn matches(&self, device_type: DeviceType) -> bool {
        use DeviceType as T;

        match self {
            Self::BlindTilt { .. } => device_type == T::BlindTilt,
            Self::Curtain { .. } => matches!(device_type, T::Curtain | T::Curtain3),
            Self::Plug { .. } => matches!(device_type, T::PlugMiniUs | T::PlugMiniJp),
            Self::Humidifier { .. } => device_type == T::Humidifier,
            Self::Climate { .. } => {
                matches!(device_type, T::Hub2 | T::Meter | T::MeterPlus | T::OutdoorMeter)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_curtain_models() {
        let adv = Advertisement::Curtain {
            position: 10,
            battery: 90,
            in_motion: false,
            light_level: 3,
            calibrated: true,
        };
        assert!(adv.matches(DeviceType::Curtain));
        assert!(adv.matches(DeviceType::Curtain3));
        assert!(!adv.matches(DeviceType::BlindTilt));
    }

    #[test]
    fn should_serialize_with_kind_tag() {
        let adv = Advertisement::Plug {
            on: true,
            watts: None,
        };
        let json = serde_json::to_value(adv).unwrap();
        assert_eq!(json["kind"], "plug");
        assert_eq!(adv.kind_name(), "plug");
    }
}
