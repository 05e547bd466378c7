//! HomeKit characteristics and their values.
//!
//! Names follow the HAP characteristic definitions so they can be used
//! verbatim on the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Batteries below this percentage raise `StatusLowBattery`.
pub const LOW_BATTERY_THRESHOLD: u8 = 10;

/// Smallest value HomeKit accepts for `CurrentAmbientLightLevel`.
pub const MIN_LUX: f64 = 0.0001;

/// Colour temperature bounds accepted by HomeKit, in mired.
pub const MIN_MIRED: u16 = 140;
pub const MAX_MIRED: u16 = 500;

macro_rules! characteristics {
    ($($name:ident),+ $(,)?) => {
        /// A HomeKit characteristic exposed by at least one accessory.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Characteristic {
            $($name),+
        }

        impl Characteristic {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name)),+
                }
            }
        }

        impl FromStr for Characteristic {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($name) => Ok(Self::$name),)+
                    other => Err(ValidationError::UnknownCharacteristic(other.to_string())),
                }
            }
        }
    };
}

characteristics!(
    On,
    Brightness,
    ColorTemperature,
    CurrentPosition,
    TargetPosition,
    PositionState,
    CurrentHorizontalTiltAngle,
    TargetHorizontalTiltAngle,
    LockCurrentState,
    LockTargetState,
    ContactSensorState,
    Active,
    CurrentRelativeHumidity,
    RelativeHumidityHumidifierThreshold,
    CurrentHumidifierDehumidifierState,
    CurrentTemperature,
    CurrentAmbientLightLevel,
    BatteryLevel,
    StatusLowBattery,
    OutletInUse,
);

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A characteristic value as exchanged with the HomeKit host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl CharacteristicValue {
    /// Booleans, plus the `0`/`1` integers HomeKit uses for them.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::WrongValueType`] for anything else.
    pub fn as_bool(self, characteristic: Characteristic) -> Result<bool, ValidationError> {
        match self {
            Self::Bool(b) => Ok(b),
            Self::Int(0) => Ok(false),
            Self::Int(1) => Ok(true),
            _ => Err(ValidationError::WrongValueType {
                characteristic,
                expected: "boolean",
            }),
        }
    }

    /// Integers, plus floats with no fractional part.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::WrongValueType`] for booleans and
    /// fractional floats.
    pub fn as_int(self, characteristic: Characteristic) -> Result<i64, ValidationError> {
        match self {
            Self::Int(i) => Ok(i),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
            _ => Err(ValidationError::WrongValueType {
                characteristic,
                expected: "integer",
            }),
        }
    }

    /// Integer percentage in `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] when outside the bounds.
    pub fn as_percent(self, characteristic: Characteristic) -> Result<u8, ValidationError> {
        let value = self.as_int(characteristic)?;
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .ok_or(ValidationError::OutOfRange {
                field: characteristic.as_str(),
                min: 0,
                max: 100,
                actual: value,
            })
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u8> for CharacteristicValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i16> for CharacteristicValue {
    fn from(value: i16) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u16> for CharacteristicValue {
    fn from(value: u16) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for CharacteristicValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// `PositionState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Decreasing = 0,
    Increasing = 1,
    Stopped = 2,
}

impl PositionState {
    /// Derive the movement direction from current and target positions.
    #[must_use]
    pub fn from_motion(moving: bool, current: u8, target: u8) -> Self {
        if !moving || current == target {
            Self::Stopped
        } else if target > current {
            Self::Increasing
        } else {
            Self::Decreasing
        }
    }
}

impl From<PositionState> for CharacteristicValue {
    fn from(value: PositionState) -> Self {
        Self::Int(value as i64)
    }
}

/// `LockCurrentState` / `LockTargetState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    Unsecured = 0,
    Secured = 1,
    Jammed = 2,
    Unknown = 3,
}

impl From<LockState> for CharacteristicValue {
    fn from(value: LockState) -> Self {
        Self::Int(value as i64)
    }
}

/// Whether a battery percentage should raise `StatusLowBattery`.
#[must_use]
pub fn is_low_battery(level: u8) -> bool {
    level < LOW_BATTERY_THRESHOLD
}

/// Kelvin to mired, clamped to the HomeKit range.
#[must_use]
pub fn kelvin_to_mired(kelvin: u32) -> u16 {
    let mired = 1_000_000 / kelvin.max(1);
    u16::try_from(mired)
        .unwrap_or(MAX_MIRED)
        .clamp(MIN_MIRED, MAX_MIRED)
}

/// Mired to kelvin after clamping to the HomeKit range.
#[must_use]
pub fn mired_to_kelvin(mired: u16) -> u32 {
    1_000_000 / u32::from(mired.clamp(MIN_MIRED, MAX_MIRED))
}

/// Scale a device light level (`0..=max_level`) onto `0..=max_lux`.
#[must_use]
pub fn light_level_to_lux(level: u8, max_level: u8, max_lux: f64) -> f64 {
    if max_level == 0 {
        return MIN_LUX;
    }
    let ratio = f64::from(level.min(max_level)) / f64::from(max_level);
    (ratio * max_lux).max(MIN_LUX)
}
