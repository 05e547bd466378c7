//! Point-in-time view of an accessory's characteristics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::connection::Transport;
use crate::device::{AccessoryKind, DeviceType};
use crate::homekit::{Characteristic, CharacteristicValue};
use crate::id::DeviceId;
use crate::time::Timestamp;

/// Characteristic values keyed by characteristic, in a stable order.
pub type CharacteristicMap = BTreeMap<Characteristic, CharacteristicValue>;

/// What HomeKit sees of one device at a given moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorySnapshot {
    pub device_id: DeviceId,
    pub name: String,
    pub device_type: DeviceType,
    pub kind: AccessoryKind,
    pub characteristics: CharacteristicMap,
    /// `None` until the first status was received.
    pub last_updated: Option<Timestamp>,
    /// Transport that delivered the last status.
    pub source: Option<Transport>,
}

impl AccessorySnapshot {
    #[must_use]
    pub fn get(&self, characteristic: Characteristic) -> Option<CharacteristicValue> {
        self.characteristics.get(&characteristic).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_characteristics_by_hap_name() {
        let mut characteristics = CharacteristicMap::new();
        characteristics.insert(Characteristic::On, CharacteristicValue::Bool(true));
        let snapshot = AccessorySnapshot {
            device_id: DeviceId::new("AABBCCDDEEFF").unwrap(),
            name: "Desk plug".to_string(),
            device_type: DeviceType::PlugMiniUs,
            kind: AccessoryKind::Outlet,
            characteristics,
            last_updated: None,
            source: Some(Transport::Ble),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["characteristics"]["On"], true);
        assert_eq!(json["device_type"], "Plug Mini (US)");
        assert_eq!(json["source"], "BLE");
        assert_eq!(snapshot.get(Characteristic::On), Some(CharacteristicValue::Bool(true)));
    }
}
