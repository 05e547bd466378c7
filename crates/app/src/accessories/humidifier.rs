//! Humidifier.
//!
//! The cloud status carries no target humidity, so the threshold is kept
//! locally and only refreshed from BLE advertisements. Writing a threshold
//! of 0 switches the device to its automatic mode.

use switchbridge_domain::accessory::CharacteristicMap;
use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::api::DeviceStatus;
use switchbridge_domain::error::BridgeError;
use switchbridge_domain::homekit::{Characteristic, CharacteristicValue};
use switchbridge_domain::operation::Operation;

use super::reject_write;

const DEFAULT_THRESHOLD: u8 = 50;

/// `CurrentHumidifierDehumidifierState` values.
const INACTIVE: u8 = 0;
const IDLE: u8 = 1;
const HUMIDIFYING: u8 = 2;

#[derive(Debug, Clone)]
pub struct Humidifier {
    on: bool,
    auto: bool,
    threshold: u8,
    humidity: Option<u8>,
    temperature: Option<f64>,
}

impl Default for Humidifier {
    fn default() -> Self {
        Self {
            on: false,
            auto: false,
            threshold: DEFAULT_THRESHOLD,
            humidity: None,
            temperature: None,
        }
    }
}

impl Humidifier {
    fn state(&self) -> u8 {
        if !self.on {
            INACTIVE
        } else if self.auto || self.humidity.is_none_or(|h| h < self.threshold) {
            HUMIDIFYING
        } else {
            IDLE
        }
    }

    pub(super) fn apply_status(&mut self, status: &DeviceStatus) {
        if let Some(on) = status.is_on() {
            self.on = on;
        }
        if let Some(auto) = status.auto {
            self.auto = auto;
        }
        if status.humidity.is_some() {
            self.humidity = status.humidity;
        }
        if status.temperature.is_some() {
            self.temperature = status.temperature;
        }
    }

    pub(super) fn apply_advertisement(&mut self, advertisement: &Advertisement) -> bool {
        let Advertisement::Humidifier { on, auto, level } = *advertisement else {
            return false;
        };
        self.on = on;
        self.auto = auto;
        if let Some(level) = level {
            self.threshold = level.min(100);
        }
        true
    }

    pub(super) fn characteristics(&self) -> CharacteristicMap {
        let mut characteristics = CharacteristicMap::new();
        characteristics.insert(Characteristic::Active, u8::from(self.on).into());
        characteristics.insert(
            Characteristic::RelativeHumidityHumidifierThreshold,
            self.threshold.into(),
        );
        characteristics.insert(
            Characteristic::CurrentHumidifierDehumidifierState,
            self.state().into(),
        );
        if let Some(humidity) = self.humidity {
            characteristics.insert(Characteristic::CurrentRelativeHumidity, humidity.into());
        }
        if let Some(temperature) = self.temperature {
            characteristics.insert(Characteristic::CurrentTemperature, temperature.into());
        }
        characteristics
    }

    pub(super) fn handle_write(
        &mut self,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<Operation, BridgeError> {
        match characteristic {
            Characteristic::Active => {
                self.on = value.as_bool(characteristic)?;
                Ok(if self.on {
                    Operation::TurnOn
                } else {
                    Operation::TurnOff
                })
            }
            Characteristic::RelativeHumidityHumidifierThreshold => {
                let humidity = value.as_percent(characteristic)?;
                if humidity == 0 {
                    self.auto = true;
                    return Ok(Operation::SetHumidifierAuto);
                }
                self.auto = false;
                self.threshold = humidity;
                Ok(Operation::SetHumidity { humidity })
            }
            other => Err(reject_write(&self.characteristics(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_inactive_when_off() {
        let c = Humidifier::default().characteristics();
        assert_eq!(
            c[&Characteristic::CurrentHumidifierDehumidifierState],
            CharacteristicValue::Int(0)
        );
        assert_eq!(c[&Characteristic::Active], CharacteristicValue::Int(0));
    }

    #[test]
    fn should_humidify_below_threshold_and_idle_above() {
        let mut humidifier = Humidifier::default();
        humidifier.apply_status(&DeviceStatus {
            power: Some("on".to_string()),
            humidity: Some(35),
            temperature: Some(21.5),
            ..DeviceStatus::default()
        });
        assert_eq!(humidifier.state(), HUMIDIFYING);

        humidifier.apply_status(&DeviceStatus {
            humidity: Some(60),
            ..DeviceStatus::default()
        });
        assert_eq!(humidifier.state(), IDLE);
        assert_eq!(
            humidifier.characteristics()[&Characteristic::CurrentTemperature],
            CharacteristicValue::Float(21.5)
        );
    }

    #[test]
    fn should_set_target_humidity() {
        let mut humidifier = Humidifier::default();
        let op = humidifier
            .handle_write(
                Characteristic::RelativeHumidityHumidifierThreshold,
                CharacteristicValue::Int(45),
            )
            .unwrap();
        assert_eq!(op, Operation::SetHumidity { humidity: 45 });
        assert_eq!(
            humidifier.characteristics()[&Characteristic::RelativeHumidityHumidifierThreshold],
            CharacteristicValue::Int(45)
        );
    }

    #[test]
    fn should_switch_to_auto_on_zero_threshold() {
        let mut humidifier = Humidifier::default();
        let op = humidifier
            .handle_write(
                Characteristic::RelativeHumidityHumidifierThreshold,
                CharacteristicValue::Int(0),
            )
            .unwrap();
        assert_eq!(op, Operation::SetHumidifierAuto);
    }

    #[test]
    fn should_toggle_active() {
        let mut humidifier = Humidifier::default();
        let op = humidifier
            .handle_write(Characteristic::Active, CharacteristicValue::Int(1))
            .unwrap();
        assert_eq!(op, Operation::TurnOn);
    }

    #[test]
    fn should_take_threshold_from_advertisement() {
        let mut humidifier = Humidifier::default();
        assert!(humidifier.apply_advertisement(&Advertisement::Humidifier {
            on: true,
            auto: false,
            level: Some(65),
        }));
        assert_eq!(humidifier.threshold, 65);
    }
}
