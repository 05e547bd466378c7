//! Outlet: plugs and plug minis.

use switchbridge_domain::accessory::CharacteristicMap;
use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::api::DeviceStatus;
use switchbridge_domain::error::BridgeError;
use switchbridge_domain::homekit::{Characteristic, CharacteristicValue};
use switchbridge_domain::operation::Operation;

use super::reject_write;

#[derive(Debug, Clone, Default)]
pub struct Outlet {
    on: bool,
    /// Power draw in watts, when the model reports it.
    watts: Option<f64>,
}

impl Outlet {
    fn in_use(&self) -> bool {
        self.on && self.watts.is_none_or(|w| w > 0.0)
    }

    pub(super) fn apply_status(&mut self, status: &DeviceStatus) {
        if let Some(on) = status.is_on() {
            self.on = on;
        }
        if status.weight.is_some() {
            self.watts = status.weight;
        }
    }

    pub(super) fn apply_advertisement(&mut self, advertisement: &Advertisement) -> bool {
        let Advertisement::Plug { on, watts } = *advertisement else {
            return false;
        };
        self.on = on;
        if watts.is_some() {
            self.watts = watts;
        }
        true
    }

    pub(super) fn characteristics(&self) -> CharacteristicMap {
        let mut characteristics = CharacteristicMap::new();
        characteristics.insert(Characteristic::On, self.on.into());
        characteristics.insert(Characteristic::OutletInUse, self.in_use().into());
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
            other => Err(reject_write(&self.characteristics(), other)),
        }
    }
}
