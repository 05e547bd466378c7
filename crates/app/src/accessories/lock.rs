//! Smart lock, with the door sensor exposed as a contact sensor.

use switchbridge_domain::accessory::CharacteristicMap;
use switchbridge_domain::api::DeviceStatus;
use switchbridge_domain::error::{BridgeError, ValidationError};
use switchbridge_domain::homekit::{Characteristic, CharacteristicValue, LockState};
use switchbridge_domain::operation::Operation;

use super::{insert_battery, reject_write};

#[derive(Debug, Clone)]
pub struct Lock {
    current: LockState,
    target: Option<LockState>,
    door_open: Option<bool>,
    battery: Option<u8>,
}

impl Default for Lock {
    fn default() -> Self {
        Self {
            current: LockState::Unknown,
            target: None,
            door_open: None,
            battery: None,
        }
    }
}

fn parse_lock_state(raw: &str) -> LockState {
    match raw.to_ascii_lowercase().as_str() {
        "locked" => LockState::Secured,
        "unlocked" => LockState::Unsecured,
        "jammed" => LockState::Jammed,
        _ => LockState::Unknown,
    }
}

impl Lock {
    fn displayed_target(&self) -> LockState {
        self.target.unwrap_or(match self.current {
            LockState::Unsecured => LockState::Unsecured,
            _ => LockState::Secured,
        })
    }

    pub(super) fn apply_status(&mut self, status: &DeviceStatus) {
        if let Some(state) = status.lock_state.as_deref() {
            self.current = parse_lock_state(state);
            if self.target == Some(self.current) {
                self.target = None;
            }
        }
        if let Some(door) = status.door_state.as_deref() {
            self.door_open = Some(door.eq_ignore_ascii_case("open"));
        }
        if status.battery.is_some() {
            self.battery = status.battery;
        }
    }

    pub(super) fn characteristics(&self) -> CharacteristicMap {
        let mut characteristics = CharacteristicMap::new();
        characteristics.insert(Characteristic::LockCurrentState, self.current.into());
        characteristics.insert(Characteristic::LockTargetState, self.displayed_target().into());
        if let Some(open) = self.door_open {
            // 0 is "contact detected", i.e. the door is closed
            characteristics.insert(Characteristic::ContactSensorState, u8::from(open).into());
        }
        insert_battery(&mut characteristics, self.battery);
        characteristics
    }

    pub(super) fn handle_write(
        &mut self,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<Operation, BridgeError> {
        match characteristic {
            Characteristic::LockTargetState => {
                let (target, operation) = match value.as_int(characteristic)? {
                    0 => (LockState::Unsecured, Operation::Unlock),
                    1 => (LockState::Secured, Operation::Lock),
                    other => {
                        return Err(ValidationError::OutOfRange {
                            field: characteristic.as_str(),
                            min: 0,
                            max: 1,
                            actual: other,
                        }
                        .into());
                    }
                };
                self.target = Some(target);
                Ok(operation)
            }
            other => Err(reject_write(&self.characteristics(), other)),
        }
    }
}
