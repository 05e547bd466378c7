//! Logical device operations, independent of the transport that carries them.

use serde::{Deserialize, Serialize};

use crate::command::DeviceCommand;
use crate::device::DeviceType;
use crate::error::UnsupportedError;
use crate::mapping::Direction;

/// Colour temperature range accepted by the ceiling lights, in kelvin.
pub const CEILING_LIGHT_KELVIN: std::ops::RangeInclusive<u32> = 2700..=6500;

/// A write requested by HomeKit, translated into device terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    TurnOn,
    TurnOff,
    SetBlindTilt { direction: Direction, position: u8 },
    /// Vendor encoding: 0 is fully open.
    SetCurtainPosition { position: u8 },
    Pause,
    Lock,
    Unlock,
    SetBrightness { brightness: u8 },
    SetColorTemperature { kelvin: u32 },
    SetHumidity { humidity: u8 },
    SetHumidifierAuto,
}

impl Operation {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::TurnOn => "turnOn",
            Self::TurnOff => "turnOff",
            Self::SetBlindTilt { .. } | Self::SetCurtainPosition { .. } => "setPosition",
            Self::Pause => "pause",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::SetBrightness { .. } => "setBrightness",
            Self::SetColorTemperature { .. } => "setColorTemperature",
            Self::SetHumidity { .. } | Self::SetHumidifierAuto => "setMode",
        }
    }

    /// Whether the device type understands this operation at all.
    #[must_use]
    pub fn applies_to(self, device_type: DeviceType) -> bool {
        use DeviceType as T;

        match self {
            Self::TurnOn | Self::TurnOff => matches!(
                device_type,
                T::Plug
                    | T::PlugMiniUs
                    | T::PlugMiniJp
                    | T::Humidifier
                    | T::CeilingLight
                    | T::CeilingLightPro
            ),
            Self::SetBlindTilt { .. } => device_type == T::BlindTilt,
            Self::SetCurtainPosition { .. } => matches!(device_type, T::Curtain | T::Curtain3),
            Self::Pause => matches!(device_type, T::Curtain | T::Curtain3 | T::BlindTilt),
            Self::Lock | Self::Unlock => matches!(device_type, T::SmartLock | T::SmartLockPro),
            Self::SetBrightness { .. } | Self::SetColorTemperature { .. } => {
                matches!(device_type, T::CeilingLight | T::CeilingLightPro)
            }
            Self::SetHumidity { .. } | Self::SetHumidifierAuto => device_type == T::Humidifier,
        }
    }

    /// Build the cloud command for this operation.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedError::Operation`] when the device type cannot
    /// perform the operation.
    pub fn to_openapi(self, device_type: DeviceType) -> Result<DeviceCommand, UnsupportedError> {
        if !self.applies_to(device_type) {
            return Err(UnsupportedError::Operation {
                operation: self.name(),
                device_type: device_type.to_string(),
            });
        }

        let command = match self {
            Self::TurnOn | Self::TurnOff | Self::Pause | Self::Lock | Self::Unlock => {
                DeviceCommand::simple(self.name())
            }
            Self::SetBlindTilt {
                direction,
                position,
            } => DeviceCommand::with_parameter(
                self.name(),
                format!("{direction};{}", position.min(100)),
            ),
            Self::SetCurtainPosition { position } => {
                DeviceCommand::with_parameter(self.name(), format!("0,ff,{}", position.min(100)))
            }
            Self::SetBrightness { brightness } => {
                DeviceCommand::with_parameter(self.name(), brightness.clamp(1, 100).to_string())
            }
            Self::SetColorTemperature { kelvin } => DeviceCommand::with_parameter(
                self.name(),
                kelvin
                    .clamp(*CEILING_LIGHT_KELVIN.start(), *CEILING_LIGHT_KELVIN.end())
                    .to_string(),
            ),
            Self::SetHumidity { humidity } => {
                DeviceCommand::with_parameter(self.name(), humidity.min(100).to_string())
            }
            Self::SetHumidifierAuto => DeviceCommand::with_parameter(self.name(), "auto"),
        };
        Ok(command)
    }
}
