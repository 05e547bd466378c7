//! Blind tilt: a window covering whose slats close in two directions.

use switchbridge_domain::accessory::CharacteristicMap;
use switchbridge_domain::advertisement::Advertisement;
use switchbridge_domain::api::DeviceStatus;
use switchbridge_domain::error::{BridgeError, ValidationError};
use switchbridge_domain::homekit::{Characteristic, CharacteristicValue, PositionState};
use switchbridge_domain::mapping::{HomekitPosition, MappingMode, TiltAngle};
use switchbridge_domain::operation::Operation;

use super::{insert_battery, insert_light_level, reject_write};

const LIGHT_LEVEL_MAX: u8 = 10;

#[derive(Debug, Clone)]
pub struct BlindTilt {
    mode: MappingMode,
    /// Vendor encoding, 50 is fully open.
    position: u8,
    moving: bool,
    target: Option<HomekitPosition>,
    battery: Option<u8>,
    light_level: Option<u8>,
}

impl BlindTilt {
    #[must_use]
    pub fn new(mode: MappingMode) -> Self {
        Self {
            mode,
            position: 50,
            moving: false,
            target: None,
            battery: None,
            light_level: None,
        }
    }

    fn current(&self) -> HomekitPosition {
        self.mode.to_homekit(self.position)
    }

    fn displayed_target(&self) -> HomekitPosition {
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
        let Advertisement::BlindTilt {
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
        characteristics.insert(Characteristic::CurrentPosition, current.position.into());
        characteristics.insert(Characteristic::TargetPosition, target.position.into());
        characteristics.insert(
            Characteristic::PositionState,
            PositionState::from_motion(self.moving, current.position, target.position).into(),
        );
        if self.mode.uses_tilt() {
            let current_tilt = current.tilt.unwrap_or(TiltAngle::Up);
            characteristics.insert(
                Characteristic::CurrentHorizontalTiltAngle,
                current_tilt.degrees().into(),
            );
            characteristics.insert(
                Characteristic::TargetHorizontalTiltAngle,
                target.tilt.unwrap_or(current_tilt).degrees().into(),
            );
        }
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
                let position = value.as_percent(characteristic)?;
                let tilt = self.displayed_target().tilt;
                Ok(self.push_target(HomekitPosition { position, tilt }))
            }
            Characteristic::TargetHorizontalTiltAngle if self.mode.uses_tilt() => {
                let degrees = value.as_int(characteristic)?;
                if !(-90..=90).contains(&degrees) {
                    return Err(ValidationError::OutOfRange {
                        field: characteristic.as_str(),
                        min: -90,
                        max: 90,
                        actual: degrees,
                    }
                    .into());
                }
                let position = self.displayed_target().position;
                Ok(self.push_target(HomekitPosition {
                    position,
                    tilt: Some(TiltAngle::from_degrees(degrees)),
                }))
            }
            other => Err(reject_write(&self.characteristics(), other)),
        }
    }

    fn push_target(&mut self, target: HomekitPosition) -> Operation {
        let device = self
            .mode
            .to_device(target.position, target.tilt.unwrap_or(TiltAngle::Up));
        self.target = Some(target);
        self.moving = true;
        Operation::SetBlindTilt {
            direction: device.direction,
            position: device.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchbridge_domain::error::UnsupportedError;
    use switchbridge_domain::mapping::Direction;

    fn status(position: u8, moving: bool) -> DeviceStatus {
        DeviceStatus {
            slide_position: Some(position),
            moving: Some(moving),
            battery: Some(80),
            ..DeviceStatus::default()
        }
    }

    fn int(characteristics: &CharacteristicMap, c: Characteristic) -> i64 {
        match characteristics.get(&c) {
            Some(CharacteristicValue::Int(v)) => *v,
            other => panic!("{c} is {other:?}"),
        }
    }

    #[test]
    fn should_map_status_through_mapping_mode() {
        let mut blind = BlindTilt::new(MappingMode::OnlyUp);
        blind.apply_status(&status(75, false));
        let c = blind.characteristics();
        assert_eq!(int(&c, Characteristic::CurrentPosition), 50);
        assert_eq!(int(&c, Characteristic::TargetPosition), 50);
        assert_eq!(int(&c, Characteristic::PositionState), 2);
        assert_eq!(int(&c, Characteristic::BatteryLevel), 80);
        assert!(!c.contains_key(&Characteristic::CurrentHorizontalTiltAngle));
    }

    #[test]
    fn should_translate_target_position_write() {
        let mut blind = BlindTilt::new(MappingMode::OnlyUp);
        let op = blind
            .handle_write(Characteristic::TargetPosition, CharacteristicValue::Int(40))
            .unwrap();
        assert_eq!(
            op,
            Operation::SetBlindTilt {
                direction: Direction::Up,
                position: 80,
            }
        );
    }

    #[test]
    fn should_report_motion_towards_target_after_write() {
        let mut blind = BlindTilt::new(MappingMode::DownAndUp);
        blind.apply_status(&status(20, false));
        blind
            .handle_write(Characteristic::TargetPosition, CharacteristicValue::Int(60))
            .unwrap();
        let c = blind.characteristics();
        assert_eq!(int(&c, Characteristic::TargetPosition), 60);
        assert_eq!(int(&c, Characteristic::PositionState), 1);
    }

    #[test]
    fn should_snap_target_to_current_when_stopped() {
        let mut blind = BlindTilt::new(MappingMode::DownAndUp);
        blind
            .handle_write(Characteristic::TargetPosition, CharacteristicValue::Int(90))
            .unwrap();
        blind.apply_status(&status(85, false));
        let c = blind.characteristics();
        assert_eq!(int(&c, Characteristic::CurrentPosition), 85);
        assert_eq!(int(&c, Characteristic::TargetPosition), 85);
        assert_eq!(int(&c, Characteristic::PositionState), 2);
    }

    #[test]
    fn should_expose_tilt_in_tilt_mode() {
        let mut blind = BlindTilt::new(MappingMode::UseTiltForDirection);
        blind.apply_status(&status(20, false));
        let c = blind.characteristics();
        assert_eq!(int(&c, Characteristic::CurrentPosition), 40);
        assert_eq!(int(&c, Characteristic::CurrentHorizontalTiltAngle), -90);
        assert_eq!(int(&c, Characteristic::TargetHorizontalTiltAngle), -90);
    }

    #[test]
    fn should_use_written_tilt_for_direction() {
        let mut blind = BlindTilt::new(MappingMode::UseTiltForDirection);
        blind.apply_status(&status(20, false));
        let op = blind
            .handle_write(
                Characteristic::TargetHorizontalTiltAngle,
                CharacteristicValue::Int(90),
            )
            .unwrap();
        assert_eq!(
            op,
            Operation::SetBlindTilt {
                direction: Direction::Up,
                position: 80,
            }
        );
    }

    #[test]
    fn should_reject_tilt_write_outside_tilt_mode() {
        let mut blind = BlindTilt::new(MappingMode::OnlyDown);
        let err = blind
            .handle_write(
                Characteristic::TargetHorizontalTiltAngle,
                CharacteristicValue::Int(90),
            )
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
    }

    #[test]
    fn should_reject_current_position_write() {
        let mut blind = BlindTilt::new(MappingMode::OnlyDown);
        let err = blind
            .handle_write(Characteristic::CurrentPosition, CharacteristicValue::Int(10))
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Unsupported(UnsupportedError::ReadOnly { .. })
        ));
    }

    #[test]
    fn should_reject_out_of_range_target() {
        let mut blind = BlindTilt::new(MappingMode::OnlyDown);
        let err = blind
            .handle_write(Characteristic::TargetPosition, CharacteristicValue::Int(101))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)));
    }

    #[test]
    fn should_apply_blind_tilt_advertisement() {
        let mut blind = BlindTilt::new(MappingMode::DownAndUp);
        let applied = blind.apply_advertisement(&Advertisement::BlindTilt {
            position: 30,
            battery: 9,
            in_motion: false,
            light_level: 5,
            calibrated: true,
        });
        assert!(applied);
        let c = blind.characteristics();
        assert_eq!(int(&c, Characteristic::CurrentPosition), 30);
        assert_eq!(int(&c, Characteristic::StatusLowBattery), 1);
        assert!(c.contains_key(&Characteristic::CurrentAmbientLightLevel));
    }
}
