//! Blind tilt position mapping between the vendor encoding and HomeKit.
//!
//! A blind tilt reports a single slat position from 0 to 100:
//!
//! | Device position | Slats |
//! |-----------------|-------|
//! | 0 | closed, tilted down |
//! | 50 | fully open (horizontal) |
//! | 100 | closed, tilted up |
//!
//! HomeKit window coverings only know 0 (closed) to 100 (open), so a
//! [`MappingMode`] selects how the two closing directions are folded onto
//! that range. [`MappingMode::UseTiltForDirection`] additionally reports the
//! closing direction through the horizontal tilt angle characteristic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const OPEN: i32 = 50;
const MAX: i32 = 100;

/// Direction label the vendor uses for the closing side of a blind tilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Half of the position range this direction closes into.
    #[must_use]
    pub fn of_position(position: u8) -> Self {
        if i32::from(position) <= OPEN {
            Self::Down
        } else {
            Self::Up
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(format!("unknown direction {other:?}")),
        }
    }
}

/// HomeKit horizontal tilt angle. Only the two end stops are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TiltAngle {
    /// −90°
    Down,
    /// +90°
    Up,
}

impl TiltAngle {
    #[must_use]
    pub fn degrees(self) -> i16 {
        match self {
            Self::Down => -90,
            Self::Up => 90,
        }
    }

    /// Snap an arbitrary HomeKit angle onto one of the end stops.
    #[must_use]
    pub fn from_degrees(degrees: i64) -> Self {
        if degrees < 0 { Self::Down } else { Self::Up }
    }
}

/// Position as seen by HomeKit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomekitPosition {
    pub position: u8,
    /// Only set in [`MappingMode::UseTiltForDirection`].
    pub tilt: Option<TiltAngle>,
}

/// Position as understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePosition {
    pub direction: Direction,
    pub position: u8,
}

/// How a blind tilt's two closing directions map onto HomeKit's 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMode {
    /// Only the upper half (50–100) is used; closing goes up.
    #[default]
    OnlyUp,
    /// Only the lower half (0–50) is used; closing goes down.
    OnlyDown,
    /// HomeKit 0–100 is the raw device range (closed down … closed up).
    DownAndUp,
    /// HomeKit 0–100 is the reversed device range (closed up … closed down).
    UpAndDown,
    /// Openness in HomeKit position, closing side in the tilt angle.
    UseTiltForDirection,
}

impl MappingMode {
    /// Whether accessories in this mode expose the tilt angle characteristics.
    #[must_use]
    pub fn uses_tilt(self) -> bool {
        matches!(self, Self::UseTiltForDirection)
    }

    /// Translate a device position into the HomeKit position (and tilt).
    #[must_use]
    pub fn to_homekit(self, device_position: u8) -> HomekitPosition {
        let p = clamp(i32::from(device_position));
        let (position, tilt) = match self {
            Self::OnlyUp => {
                if p < OPEN {
                    (MAX, None)
                } else {
                    (MAX - (p - OPEN) * 2, None)
                }
            }
            Self::OnlyDown => {
                if p > OPEN {
                    (MAX, None)
                } else {
                    (p * 2, None)
                }
            }
            Self::DownAndUp => (p, None),
            Self::UpAndDown => (MAX - p, None),
            Self::UseTiltForDirection => {
                if p <= OPEN {
                    (p * 2, Some(TiltAngle::Down))
                } else {
                    (MAX - (p - OPEN) * 2, Some(TiltAngle::Up))
                }
            }
        };
        HomekitPosition {
            position: to_u8(position),
            tilt,
        }
    }

    /// Translate a HomeKit target into the direction and position to send.
    ///
    /// `tilt` is only consulted in [`Self::UseTiltForDirection`].
    #[must_use]
    pub fn to_device(self, homekit_position: u8, tilt: TiltAngle) -> DevicePosition {
        let h = clamp(i32::from(homekit_position));
        let (direction, position) = match self {
            Self::OnlyUp => (Direction::Up, OPEN + (MAX - h) / 2),
            Self::OnlyDown => (Direction::Down, h / 2),
            Self::DownAndUp => {
                if h <= OPEN {
                    (Direction::Down, h)
                } else {
                    (Direction::Up, h)
                }
            }
            Self::UpAndDown => {
                if h <= OPEN {
                    (Direction::Up, MAX - h)
                } else {
                    (Direction::Down, MAX - h)
                }
            }
            Self::UseTiltForDirection => match tilt {
                TiltAngle::Down => (Direction::Down, h / 2),
                TiltAngle::Up => (Direction::Up, MAX - h / 2),
            },
        };
        DevicePosition {
            direction,
            position: to_u8(position),
        }
    }

    /// Device positions for which `to_device(to_homekit(p))` gives back `p`.
    #[must_use]
    pub fn lossless_domain(self) -> std::ops::RangeInclusive<u8> {
        match self {
            Self::OnlyUp => 50..=100,
            Self::OnlyDown => 0..=50,
            Self::DownAndUp | Self::UpAndDown | Self::UseTiltForDirection => 0..=100,
        }
    }
}

fn clamp(value: i32) -> i32 {
    value.clamp(0, MAX)
}

fn to_u8(value: i32) -> u8 {
    u8::try_from(clamp(value)).unwrap_or(u8::MAX)
}
