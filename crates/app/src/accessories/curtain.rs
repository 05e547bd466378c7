//! Curtain: vendor position 0 is fully open, HomeKit 100 is fully open.

use switchbridge_domain::accessory::CharacteristicMap;
use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::api::DeviceStatus;
use switchbridge_domain::error::BridgeError;
use switchbridge_domain::homekit::{Characteristic, CharacteristicValue, PositionState};
use switchbridge_domain::operation::Operation;

use super::{insert_battery, insert_light_level, reject_write};

const LIGHT_LEVEL_MAX: u8 = 10;

#[derive(Debug, Clone, Default)]
pub struct Curtain {
    /// Vendor encoding.
    position: u8,
    moving: bool,
    /// HomeKit encoding.
    target: Option<u8>,
    battery: Option<u8>,
    light_level: Option<u8>,
}

impl Curtain {
    fn current(&self) -> u8 {
        100 - self.position.min(100)
    }

    fn displayed_target(&self) -> u8 {
        match self.target {
            Some(target) if self.moving => target,
            _ => self.current(),
        }
    }

    fn settle(&mut self, moving: Option<bool>) {
        if let Some(moving) = moving {
            self.moving = moving;
        }
        if !self.moving {
            self.target = None;
        }
    }

    pub(super) fn apply_status(&mut self, status: &DeviceStatus) {
        if let Some(position) = status.slide_position {
            self.position = position.min(100);
        }
        if status.battery.is_some() {
            self.battery = status.battery;
        }
        if let Some(level) = status.light_level_number() {
            self.light_level = Some(level);
        }
        self.settle(status.moving);
    }

    pub(super) fn apply_advertisement(&mut self, advertisement: &Advertisement) -> bool {
        let Advertisement::Curtain {
            position,
            battery,
            in_motion,
            light_level,
            ..
        } = *advertisement
        else {
            return false;
        };
        self.position = position.min(100);
        self.battery = Some(battery);
        self.light_level = Some(light_level);
        self.settle(Some(in_motion));
        true
    }

    pub(super) fn characteristics(&self) -> CharacteristicMap {
        let current = self.current();
        let target = self.displayed_target();

        let mut characteristics = CharacteristicMap::new();
        characteristics.insert(Characteristic::CurrentPosition, current.into());
        characteristics.insert(Characteristic::TargetPosition, target.into());
        characteristics.insert(
            Characteristic::PositionState,
            PositionState::from_motion(self.moving, current, target).into(),
        );
        insert_battery(&mut characteristics, self.battery);
        insert_light_level(&mut characteristics, self.light_level, LIGHT_LEVEL_MAX);
        characteristics
    }

    pub(super) fn handle_write(
        &mut self,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<Operation, BridgeError> {
        match characteristic {
            Characteristic::TargetPosition => {
                let target = value.as_percent(characteristic)?;
                self.target = Some(target);
                self.moving = true;
                Ok(Operation::SetCurtainPosition {
                    position: 100 - target,
                })
            }
            other => Err(reject_write(&self.characteristics(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(characteristics: &CharacteristicMap, c: Characteristic) -> i64 {
        match characteristics.get(&c) {
            Some(CharacteristicValue::Int(v)) => *v,
            other => panic!("{c} is {other:?}"),
        }
    }

    #[test]
    fn should_start_fully_open() {
        let c = Curtain::default().characteristics();
        assert_eq!(int(&c, Characteristic::CurrentPosition), 100);
    }

    #[test]
    fn should_invert_vendor_position() {
        let mut curtain = Curtain::default();
        curtain.apply_status(&DeviceStatus {
            slide_position: Some(30),
            moving: Some(false),
            ..DeviceStatus::default()
        });
        let c = curtain.characteristics();
        assert_eq!(int(&c, Characteristic::CurrentPosition), 70);
        assert_eq!(int(&c, Characteristic::TargetPosition), 70);
    }

    #[test]
    fn should_send_inverted_target() {
        let mut curtain = Curtain::default();
        let op = curtain
            .handle_write(Characteristic::TargetPosition, CharacteristicValue::Int(25))
            .unwrap();
        assert_eq!(op, Operation::SetCurtainPosition { position: 75 });
        let c = curtain.characteristics();
        assert_eq!(int(&c, Characteristic::TargetPosition), 25);
        assert_eq!(int(&c, Characteristic::PositionState), 0);
    }

    #[test]
    fn should_apply_curtain_advertisement() {
        let mut curtain = Curtain::default();
        assert!(curtain.apply_advertisement(&Advertisement::Curtain {
            position: 100,
            battery: 55,
            in_motion: false,
            light_level: 2,
            calibrated: true,
        }));
        let c = curtain.characteristics();
        assert_eq!(int(&c, Characteristic::CurrentPosition), 0);
        assert_eq!(int(&c, Characteristic::BatteryLevel), 55);
    }

    #[test]
    fn should_reject_plug_advertisement() {
        let mut curtain = Curtain::default();
        assert!(!curtain.apply_advertisement(&Advertisement::Plug {
            on: true,
            watts: None,
        }));
    }
}
