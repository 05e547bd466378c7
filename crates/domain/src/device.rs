//! Configured SwitchBot devices and the catalogue of device types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionType;
use crate::error::ValidationError;
use crate::id::{DeviceId, MacAddress};
use crate::mapping::MappingMode;

/// Device types as named by the vendor cloud API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    #[serde(rename = "Blind Tilt")]
    BlindTilt,
    #[serde(rename = "Curtain")]
    Curtain,
    #[serde(rename = "Curtain3")]
    Curtain3,
    #[serde(rename = "Plug")]
    Plug,
    #[serde(rename = "Plug Mini (US)")]
    PlugMiniUs,
    #[serde(rename = "Plug Mini (JP)")]
    PlugMiniJp,
    #[serde(rename = "Smart Lock")]
    SmartLock,
    #[serde(rename = "Smart Lock Pro")]
    SmartLockPro,
    #[serde(rename = "Humidifier")]
    Humidifier,
    #[serde(rename = "Ceiling Light")]
    CeilingLight,
    #[serde(rename = "Ceiling Light Pro")]
    CeilingLightPro,
    #[serde(rename = "Hub 2")]
    Hub2,
    #[serde(rename = "Meter")]
    Meter,
    #[serde(rename = "MeterPlus")]
    MeterPlus,
    #[serde(rename = "WoIOSensor")]
    OutdoorMeter,
}

/// The HomeKit accessory shape a device type is exposed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryKind {
    BlindTilt,
    Curtain,
    Outlet,
    Lock,
    Humidifier,
    Light,
    ClimateSensor,
}

impl DeviceType {
    pub const ALL: [Self; 15] = [
        Self::BlindTilt,
        Self::Curtain,
        Self::Curtain3,
        Self::Plug,
        Self::PlugMiniUs,
        Self::PlugMiniJp,
        Self::SmartLock,
        Self::SmartLockPro,
        Self::Humidifier,
        Self::CeilingLight,
        Self::CeilingLightPro,
        Self::Hub2,
        Self::Meter,
        Self::MeterPlus,
        Self::OutdoorMeter,
    ];

    /// Vendor display name, identical to the serialized form.
    #[must_use]
    pub fn vendor_name(self) -> &'static str {
        match self {
            Self::BlindTilt => "Blind Tilt",
            Self::Curtain => "Curtain",
            Self::Curtain3 => "Curtain3",
            Self::Plug => "Plug",
            Self::PlugMiniUs => "Plug Mini (US)",
            Self::PlugMiniJp => "Plug Mini (JP)",
            Self::SmartLock => "Smart Lock",
            Self::SmartLockPro => "Smart Lock Pro",
            Self::Humidifier => "Humidifier",
            Self::CeilingLight => "Ceiling Light",
            Self::CeilingLightPro => "Ceiling Light Pro",
            Self::Hub2 => "Hub 2",
            Self::Meter => "Meter",
            Self::MeterPlus => "MeterPlus",
            Self::OutdoorMeter => "WoIOSensor",
        }
    }

    /// Look a type up by its vendor name.
    #[must_use]
    pub fn from_vendor_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.vendor_name() == name)
    }

    #[must_use]
    pub fn kind(self) -> AccessoryKind {
        match self {
            Self::BlindTilt => AccessoryKind::BlindTilt,
            Self::Curtain | Self::Curtain3 => AccessoryKind::Curtain,
            Self::Plug | Self::PlugMiniUs | Self::PlugMiniJp => AccessoryKind::Outlet,
            Self::SmartLock | Self::SmartLockPro => AccessoryKind::Lock,
            Self::Humidifier => AccessoryKind::Humidifier,
            Self::CeilingLight | Self::CeilingLightPro => AccessoryKind::Light,
            Self::Hub2 | Self::Meter | Self::MeterPlus | Self::OutdoorMeter => {
                AccessoryKind::ClimateSensor
            }
        }
    }

    /// Model byte carried in the low 7 bits of the first service-data byte.
    ///
    /// `None` for devices that are cloud-only.
    #[must_use]
    pub fn ble_model(self) -> Option<u8> {
        match self {
            Self::BlindTilt => Some(b'x'),
            Self::Curtain => Some(b'c'),
            Self::Curtain3 => Some(b'{'),
            Self::PlugMiniUs => Some(b'g'),
            Self::PlugMiniJp => Some(b'j'),
            Self::SmartLock => Some(b'o'),
            Self::SmartLockPro => Some(b'$'),
            Self::Humidifier => Some(b'e'),
            Self::Hub2 => Some(b'v'),
            Self::Meter => Some(b'T'),
            Self::MeterPlus => Some(b'i'),
            Self::OutdoorMeter => Some(b'w'),
            Self::Plug | Self::CeilingLight | Self::CeilingLightPro => None,
        }
    }

    /// Reverse lookup of [`Self::ble_model`].
    #[must_use]
    pub fn from_ble_model(model: u8) -> Option<Self> {
        let model = model & 0x7f;
        Self::ALL
            .into_iter()
            .find(|t| t.ble_model() == Some(model))
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vendor_name())
    }
}

/// A configured device the bridge exposes as an accessory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub device_type: DeviceType,
    pub connection: ConnectionType,
    pub mapping_mode: MappingMode,
    /// Overrides the global polling interval.
    pub refresh_rate: Option<Duration>,
    /// Overrides the default MQTT topic for state mirroring.
    pub mqtt_topic: Option<String>,
}

impl Device {
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// BLE address derived from the device id.
    #[must_use]
    pub fn mac(&self) -> Option<MacAddress> {
        self.id.mac()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when the name is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}

/// Builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    device_type: Option<DeviceType>,
    connection: Option<ConnectionType>,
    mapping_mode: MappingMode,
    refresh_rate: Option<Duration>,
    mqtt_topic: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = Some(device_type);
        self
    }

    #[must_use]
    pub fn connection(mut self, connection: ConnectionType) -> Self {
        self.connection = Some(connection);
        self
    }

    #[must_use]
    pub fn mapping_mode(mut self, mode: MappingMode) -> Self {
        self.mapping_mode = mode;
        self
    }

    #[must_use]
    pub fn refresh_rate(mut self, rate: Duration) -> Self {
        self.refresh_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn mqtt_topic(mut self, topic: impl Into<String>) -> Self {
        self.mqtt_topic = Some(topic.into());
        self
    }

    /// Build the device. Connection defaults to [`ConnectionType::OpenApi`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the id, name or type is missing.
    pub fn build(self) -> Result<Device, ValidationError> {
        let device = Device {
            id: self.id.ok_or(ValidationError::EmptyDeviceId)?,
            name: self.name.unwrap_or_default(),
            device_type: self.device_type.ok_or(ValidationError::MissingDeviceType)?,
            connection: self.connection.unwrap_or(ConnectionType::OpenApi),
            mapping_mode: self.mapping_mode,
            refresh_rate: self.refresh_rate,
            mqtt_topic: self.mqtt_topic,
        };
        device.validate()?;
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blind_tilt() -> Device {
        Device::builder()
            .id(DeviceId::new("C1A2B3C4D5E6").unwrap())
            .name("Office blind")
            .device_type(DeviceType::BlindTilt)
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_device_with_defaults() {
        let device = blind_tilt();
        assert_eq!(device.connection, ConnectionType::OpenApi);
        assert_eq!(device.mapping_mode, MappingMode::OnlyUp);
        assert!(device.refresh_rate.is_none());
    }

    #[test]
    fn should_reject_empty_name() {
        let result = Device::builder()
            .id(DeviceId::new("C1A2B3C4D5E6").unwrap())
            .name("  ")
            .device_type(DeviceType::Plug)
            .build();
        assert_eq!(result, Err(ValidationError::EmptyName));
    }

    #[test]
    fn should_reject_missing_type() {
        let result = Device::builder()
            .id(DeviceId::new("C1A2B3C4D5E6").unwrap())
            .name("Plug")
            .build();
        assert_eq!(result, Err(ValidationError::MissingDeviceType));
    }

    #[test]
    fn should_derive_mac_from_id() {
        assert_eq!(blind_tilt().mac().unwrap().to_string(), "C1:A2:B3:C4:D5:E6");
    }

    #[test]
    fn should_roundtrip_vendor_names() {
        for device_type in DeviceType::ALL {
            let json = serde_json::to_string(&device_type).unwrap();
            assert_eq!(json, format!("\"{}\"", device_type.vendor_name()));
            assert_eq!(
                DeviceType::from_vendor_name(device_type.vendor_name()),
                Some(device_type)
            );
        }
    }

    #[test]
    fn should_resolve_ble_model_ignoring_high_bit() {
        assert_eq!(DeviceType::from_ble_model(b'x'), Some(DeviceType::BlindTilt));
        assert_eq!(DeviceType::from_ble_model(b'T' | 0x80), Some(DeviceType::Meter));
        assert_eq!(DeviceType::from_ble_model(0x01), None);
    }

    #[test]
    fn should_group_types_by_accessory_kind() {
        assert_eq!(DeviceType::Curtain3.kind(), AccessoryKind::Curtain);
        assert_eq!(DeviceType::PlugMiniJp.kind(), AccessoryKind::Outlet);
        assert_eq!(DeviceType::Hub2.kind(), AccessoryKind::ClimateSensor);
        assert_eq!(DeviceType::CeilingLightPro.kind(), AccessoryKind::Light);
    }
}
