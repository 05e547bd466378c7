//! Ceiling light with brightness and colour temperature.

use switchbridge_domain::accessory::CharacteristicMap;
use switchbridge_domain::api::DeviceStatus;
use switchbridge_domain::error::BridgeError;
use switchbridge_domain::homekit::{
    Characteristic, CharacteristicValue, MAX_MIRED, MIN_MIRED, kelvin_to_mired, mired_to_kelvin,
};
use switchbridge_domain::operation::{CEILING_LIGHT_KELVIN, Operation};

use super::reject_write;

#[derive(Debug, Clone)]
pub struct CeilingLight {
    on: bool,
    brightness: u8,
    kelvin: u32,
}

impl Default for CeilingLight {
    fn default() -> Self {
        Self {
            on: false,
            brightness: 100,
            kelvin: *CEILING_LIGHT_KELVIN.start(),
        }
    }
}

impl CeilingLight {
    pub(super) fn apply_status(&mut self, status: &DeviceStatus) {
        if let Some(on) = status.is_on() {
            self.on = on;
        }
        if let Some(brightness) = status.brightness {
            self.brightness = brightness.clamp(1, 100);
        }
        if let Some(kelvin) = status.color_temperature {
            self.kelvin = kelvin;
        }
    }

    pub(super) fn characteristics(&self) -> CharacteristicMap {
        let mut characteristics = CharacteristicMap::new();
        characteristics.insert(Characteristic::On, self.on.into());
        characteristics.insert(Characteristic::Brightness, self.brightness.into());
        characteristics.insert(
            Characteristic::ColorTemperature,
            kelvin_to_mired(self.kelvin).into(),
        );
        characteristics
    }

    pub(super) fn handle_write(
        &mut self,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<Operation, BridgeError> {
        match characteristic {
            Characteristic::On => {
                self.on = value.as_bool(characteristic)?;
                Ok(if self.on {
                    Operation::TurnOn
                } else {
                    Operation::TurnOff
                })
            }
            Characteristic::Brightness => {
                self.brightness = value.as_percent(characteristic)?.max(1);
                Ok(Operation::SetBrightness {
                    brightness: self.brightness,
                })
            }
            Characteristic::ColorTemperature => {
                let mired = value
                    .as_int(characteristic)?
                    .clamp(i64::from(MIN_MIRED), i64::from(MAX_MIRED));
                let mired = u16::try_from(mired).unwrap_or(MAX_MIRED);
                self.kelvin = mired_to_kelvin(mired)
                    .clamp(*CEILING_LIGHT_KELVIN.start(), *CEILING_LIGHT_KELVIN.end());
                Ok(Operation::SetColorTemperature {
                    kelvin: self.kelvin,
                })
            }
            other => Err(reject_write(&self.characteristics(), other)),
        }
    }
}
