//! Read-only climate sensor (Hub 2, Meter, Meter Plus, outdoor meter).

use switchbridge_domain::accessory::CharacteristicMap;
use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::api::DeviceStatus;
use switchbridge_domain::error::BridgeError;
use switchbridge_domain::homekit::{Characteristic, CharacteristicValue};
use switchbridge_domain::operation::Operation;

use super::{insert_battery, insert_light_level, reject_write};

const LIGHT_LEVEL_MAX: u8 = 20;

#[derive(Debug, Clone, Default)]
pub struct ClimateSensor {
    temperature: Option<f64>,
    humidity: Option<u8>,
    battery: Option<u8>,
    light_level: Option<u8>,
}

impl ClimateSensor {
    pub(super) fn apply_status(&mut self, status: &DeviceStatus) {
        if status.temperature.is_some() {
            self.temperature = status.temperature;
        }
        if status.humidity.is_some() {
            self.humidity = status.humidity;
        }
        if status.battery.is_some() {
            self.battery = status.battery;
        }
        if let Some(level) = status.light_level_number() {
            self.light_level = Some(level);
        }
    }

    pub(super) fn apply_advertisement(&mut self, advertisement: &Advertisement) -> bool {
        let Advertisement::Climate {
            temperature,
            humidity,
            battery,
            light_level,
        } = *advertisement
        else {
            return false;
        };
        self.temperature = Some(temperature);
        self.humidity = Some(humidity);
        if battery.is_some() {
            self.battery = battery;
        }
        if light_level.is_some() {
            self.light_level = light_level;
        }
        true
    }

    pub(super) fn characteristics(&self) -> CharacteristicMap {
        let mut characteristics = CharacteristicMap::new();
        if let Some(temperature) = self.temperature {
            characteristics.insert(Characteristic::CurrentTemperature, temperature.into());
        }
        if let Some(humidity) = self.humidity {
            characteristics.insert(
                Characteristic::CurrentRelativeHumidity,
                humidity.min(100).into(),
            );
        }
        insert_battery(&mut characteristics, self.battery);
        insert_light_level(&mut characteristics, self.light_level, LIGHT_LEVEL_MAX);
        characteristics
    }

    pub(super) fn handle_write(
        &mut self,
        characteristic: Characteristic,
        _value: CharacteristicValue,
    ) -> Result<Operation, BridgeError> {
        Err(reject_write(&self.characteristics(), characteristic))
    }
}
