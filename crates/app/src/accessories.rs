//! Accessories: per-family translation between device state and HomeKit.
//!
//! Each accessory owns its state. Status updates from either transport are
//! folded in with `apply_status` / `apply_advertisement`, HomeKit reads come
//! from `characteristics`, and HomeKit writes are turned into an
//! [`Operation`] by `handle_write` after updating the local target.

mod blind_tilt;
mod ceiling_light;
mod climate_sensor;
mod curtain;
mod humidifier;
mod lock;
mod outlet;

pub use blind_tilt::BlindTilt;
pub use ceiling_light::CeilingLight;
pub use climate_sensor::ClimateSensor;
pub use curtain::Curtain;
pub use humidifier::Humidifier;
pub use lock::Lock;
pub use outlet::Outlet;

use switchbridge_domain::accessory::CharacteristicMap;
use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::api::DeviceStatus;
use switchbridge_domain::device::{AccessoryKind, Device};
use switchbridge_domain::error::{BridgeError, NotFoundError, UnsupportedError};
use switchbridge_domain::homekit::{
    Characteristic, CharacteristicValue, is_low_battery, light_level_to_lux,
};
use switchbridge_domain::operation::Operation;

/// Illuminance reported for the brightest light level.
const MAX_LUX: f64 = 10_000.0;

/// Wrapper enum for the concrete accessory types.
#[derive(Debug, Clone)]
pub enum Accessory {
    BlindTilt(BlindTilt),
    Curtain(Curtain),
    Outlet(Outlet),
    Lock(Lock),
    Humidifier(Humidifier),
    Light(CeilingLight),
    Climate(ClimateSensor),
}

impl Accessory {
    /// Build the accessory matching the device's type.
    #[must_use]
    pub fn for_device(device: &Device) -> Self {
        match device.device_type.kind() {
            AccessoryKind::BlindTilt => Self::BlindTilt(BlindTilt::new(device.mapping_mode)),
            AccessoryKind::Curtain => Self::Curtain(Curtain::default()),
            AccessoryKind::Outlet => Self::Outlet(Outlet::default()),
            AccessoryKind::Lock => Self::Lock(Lock::default()),
            AccessoryKind::Humidifier => Self::Humidifier(Humidifier::default()),
            AccessoryKind::Light => Self::Light(CeilingLight::default()),
            AccessoryKind::ClimateSensor => Self::Climate(ClimateSensor::default()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> AccessoryKind {
        match self {
            Self::BlindTilt(_) => AccessoryKind::BlindTilt,
            Self::Curtain(_) => AccessoryKind::Curtain,
            Self::Outlet(_) => AccessoryKind::Outlet,
            Self::Lock(_) => AccessoryKind::Lock,
            Self::Humidifier(_) => AccessoryKind::Humidifier,
            Self::Light(_) => AccessoryKind::Light,
            Self::Climate(_) => AccessoryKind::ClimateSensor,
        }
    }

    /// Fold a cloud status into the accessory state.
    pub fn apply_status(&mut self, status: &DeviceStatus) {
        match self {
            Self::BlindTilt(a) => a.apply_status(status),
            Self::Curtain(a) => a.apply_status(status),
            Self::Outlet(a) => a.apply_status(status),
            Self::Lock(a) => a.apply_status(status),
            Self::Humidifier(a) => a.apply_status(status),
            Self::Light(a) => a.apply_status(status),
            Self::Climate(a) => a.apply_status(status),
        }
    }

    /// Fold a BLE advertisement into the accessory state.
    ///
    /// Advertisements of another device family are ignored.
    pub fn apply_advertisement(&mut self, advertisement: &Advertisement) {
        let applied = match self {
            Self::BlindTilt(a) => a.apply_advertisement(advertisement),
            Self::Curtain(a) => a.apply_advertisement(advertisement),
            Self::Outlet(a) => a.apply_advertisement(advertisement),
            Self::Humidifier(a) => a.apply_advertisement(advertisement),
            Self::Climate(a) => a.apply_advertisement(advertisement),
            Self::Lock(_) | Self::Light(_) => false,
        };
        if !applied {
            tracing::debug!(
                advertisement = advertisement.kind_name(),
                accessory = ?self.kind(),
                "ignoring mismatched advertisement"
            );
        }
    }

    /// Current HomeKit characteristic values.
    #[must_use]
    pub fn characteristics(&self) -> CharacteristicMap {
        match self {
            Self::BlindTilt(a) => a.characteristics(),
            Self::Curtain(a) => a.characteristics(),
            Self::Outlet(a) => a.characteristics(),
            Self::Lock(a) => a.characteristics(),
            Self::Humidifier(a) => a.characteristics(),
            Self::Light(a) => a.characteristics(),
            Self::Climate(a) => a.characteristics(),
        }
    }

    /// Apply a HomeKit write locally and return the operation to push.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] for values of the wrong type or
    /// range, [`BridgeError::Unsupported`] for read-only characteristics and
    /// [`BridgeError::NotFound`] for characteristics the accessory does not
    /// expose.
    pub fn handle_write(
        &mut self,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<Operation, BridgeError> {
        match self {
            Self::BlindTilt(a) => a.handle_write(characteristic, value),
            Self::Curtain(a) => a.handle_write(characteristic, value),
            Self::Outlet(a) => a.handle_write(characteristic, value),
            Self::Lock(a) => a.handle_write(characteristic, value),
            Self::Humidifier(a) => a.handle_write(characteristic, value),
            Self::Light(a) => a.handle_write(characteristic, value),
            Self::Climate(a) => a.handle_write(characteristic, value),
        }
    }
}

/// Error for a write to a characteristic that cannot be written.
fn reject_write(characteristics: &CharacteristicMap, characteristic: Characteristic) -> BridgeError {
    if characteristics.contains_key(&characteristic) {
        UnsupportedError::ReadOnly { characteristic }.into()
    } else {
        NotFoundError {
            entity: "Characteristic",
            id: characteristic.to_string(),
        }
        .into()
    }
}

/// Insert `BatteryLevel` and `StatusLowBattery` when the level is known.
fn insert_battery(characteristics: &mut CharacteristicMap, battery: Option<u8>) {
    if let Some(level) = battery {
        characteristics.insert(Characteristic::BatteryLevel, level.min(100).into());
        characteristics.insert(
            Characteristic::StatusLowBattery,
            u8::from(is_low_battery(level)).into(),
        );
    }
}

/// Insert `CurrentAmbientLightLevel` scaled from a `0..=max_level` reading.
fn insert_light_level(characteristics: &mut CharacteristicMap, level: Option<u8>, max_level: u8) {
    if let Some(level) = level {
        characteristics.insert(
            Characteristic::CurrentAmbientLightLevel,
            light_level_to_lux(level, max_level, MAX_LUX).into(),
        );
    }
}
