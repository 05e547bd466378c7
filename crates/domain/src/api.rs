//! Cloud API payloads and the vendor status code table.

use serde::{Deserialize, Serialize};

use crate::device::DeviceType;

/// Wrapper every cloud API response is delivered in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub status_code: u16,
    #[serde(default)]
    pub message: String,
    pub body: Option<T>,
}

/// State reported by `GET /v1.1/devices/{id}/status`.
///
/// Each device type fills in a different subset of fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    pub device_id: Option<String>,
    pub device_type: Option<String>,
    pub hub_device_id: Option<String>,
    /// `"on"` or `"off"`.
    pub power: Option<String>,
    pub slide_position: Option<u8>,
    /// `"up"` or `"down"` for blind tilts.
    pub direction: Option<String>,
    pub moving: Option<bool>,
    pub calibrate: Option<bool>,
    pub battery: Option<u8>,
    /// `"locked"`, `"unlocked"` or `"jammed"`.
    pub lock_state: Option<String>,
    /// `"open"` or `"closed"`.
    pub door_state: Option<String>,
    pub humidity: Option<u8>,
    pub temperature: Option<f64>,
    pub brightness: Option<u8>,
    pub color_temperature: Option<u32>,
    pub auto: Option<bool>,
    pub nebulization_efficiency: Option<u8>,
    /// Either a 1–20 level or `"bright"`/`"dim"` depending on the device.
    pub light_level: Option<serde_json::Value>,
    pub weight: Option<f64>,
    pub electric_current: Option<f64>,
    pub voltage: Option<f64>,
}

impl DeviceStatus {
    /// `power` as a boolean, when reported.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.power.as_deref().map(|p| p.eq_ignore_ascii_case("on"))
    }

    /// Numeric light level on the 1–20 scale, when reported as a number.
    #[must_use]
    pub fn light_level_number(&self) -> Option<u8> {
        self.light_level
            .as_ref()
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u8::try_from(v).ok())
    }
}

/// Body of `GET /v1.1/devices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListing {
    #[serde(default)]
    pub device_list: Vec<ListedDevice>,
    #[serde(default)]
    pub infrared_remote_list: Vec<ListedRemote>,
}

/// A physical device registered on the vendor account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedDevice {
    pub device_id: String,
    #[serde(default)]
    pub device_name: String,
    pub device_type: Option<String>,
    pub hub_device_id: Option<String>,
    #[serde(default)]
    pub enable_cloud_service: bool,
}

impl ListedDevice {
    /// Known device type, when the vendor name is one this bridge handles.
    #[must_use]
    pub fn known_type(&self) -> Option<DeviceType> {
        self.device_type
            .as_deref()
            .and_then(DeviceType::from_vendor_name)
    }
}

/// An infrared remote registered on the vendor account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedRemote {
    pub device_id: String,
    #[serde(default)]
    pub device_name: String,
    pub remote_type: Option<String>,
    pub hub_device_id: Option<String>,
}

/// Log level a status outcome should be reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// The meaning of a vendor or HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOutcome {
    pub code: u16,
    pub success: bool,
    pub severity: Severity,
    pub message: &'static str,
}

/// Classify a vendor `statusCode` or HTTP status.
#[must_use]
pub fn classify(code: u16) -> StatusOutcome {
    let (success, severity, message) = match code {
        100 | 200 => (true, Severity::Debug, "request successful"),
        151 => (false, Severity::Error, "command not supported by this device type"),
        152 => (false, Severity::Error, "device not found"),
        160 => (false, Severity::Error, "command is not supported"),
        161 => (false, Severity::Warn, "device is offline"),
        171 => (false, Severity::Warn, "hub device is offline"),
        190 => (
            false,
            Severity::Error,
            "device internal error due to device states not synchronized with server, or command format is invalid",
        ),
        400 => (false, Severity::Error, "bad request, the request is malformed"),
        401 => (false, Severity::Error, "unauthorized, check the token and secret"),
        403 => (false, Severity::Error, "forbidden, the request is not allowed"),
        404 => (false, Severity::Error, "not found, the requested resource does not exist"),
        406 => (false, Severity::Error, "not acceptable, unsupported content format"),
        415 => (false, Severity::Error, "unsupported media type"),
        422 => (false, Severity::Error, "unprocessable entity, the request is semantically invalid"),
        429 => (false, Severity::Warn, "too many requests, the daily limit was reached"),
        500 => (false, Severity::Error, "internal server error"),
        _ => (false, Severity::Info, "unknown status code"),
    };
    StatusOutcome {
        code,
        success,
        severity,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_classify_success_codes() {
        assert!(classify(100).success);
        assert!(classify(200).success);
    }

    #[test]
    fn should_classify_device_offline_as_warning() {
        let outcome = classify(161);
        assert!(!outcome.success);
        assert_eq!(outcome.severity, Severity::Warn);
        assert_eq!(outcome.message, "device is offline");
    }

    #[test]
    fn should_classify_every_known_failure() {
        for code in [151, 152, 160, 161, 171, 190, 400, 401, 403, 404, 406, 415, 422, 429, 500] {
            let outcome = classify(code);
            assert!(!outcome.success, "{code}");
            assert_ne!(outcome.message, "unknown status code", "{code}");
        }
    }

    #[test]
    fn should_fall_back_to_unknown_status() {
        let outcome = classify(999);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "unknown status code");
    }

    #[test]
    fn should_decode_blind_tilt_status_envelope() {
        let json = r#"{
            "statusCode": 100,
            "message": "success",
            "body": {
                "deviceId": "C1A2B3C4D5E6",
                "deviceType": "Blind Tilt",
                "hubDeviceId": "000000000000",
                "version": "V2.6",
                "calibrate": true,
                "group": false,
                "moving": false,
                "direction": "up",
                "slidePosition": 70,
                "battery": 88,
                "lightLevel": 11
            }
        }"#;
        let envelope: ApiEnvelope<DeviceStatus> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status_code, 100);
        let status = envelope.body.unwrap();
        assert_eq!(status.slide_position, Some(70));
        assert_eq!(status.direction.as_deref(), Some("up"));
        assert_eq!(status.light_level_number(), Some(11));
        assert_eq!(status.moving, Some(false));
    }

    #[test]
    fn should_decode_empty_body_on_failure() {
        let json = r#"{"statusCode": 161, "message": "device offline", "body": {}}"#;
        let envelope: ApiEnvelope<DeviceStatus> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status_code, 161);
        assert_eq!(envelope.body, Some(DeviceStatus::default()));
    }

    #[test]
    fn should_read_power_case_insensitively() {
        let status = DeviceStatus {
            power: Some("ON".to_string()),
            ..DeviceStatus::default()
        };
        assert_eq!(status.is_on(), Some(true));
        assert_eq!(DeviceStatus::default().is_on(), None);
    }

    #[test]
    fn should_decode_device_listing() {
        let json = r#"{
            "deviceList": [
                {"deviceId": "C1A2B3C4D5E6", "deviceName": "Office", "deviceType": "Blind Tilt", "enableCloudService": true, "hubDeviceId": ""},
                {"deviceId": "AABBCCDDEEFF", "deviceName": "Bot", "deviceType": "Bot", "enableCloudService": true}
            ],
            "infraredRemoteList": [
                {"deviceId": "02-202008110034-13", "deviceName": "TV", "remoteType": "TV", "hubDeviceId": "FA7310762361"}
            ]
        }"#;
        let listing: DeviceListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.device_list.len(), 2);
        assert_eq!(listing.device_list[0].known_type(), Some(DeviceType::BlindTilt));
        assert_eq!(listing.device_list[1].known_type(), None);
        assert_eq!(listing.infrared_remote_list[0].device_name, "TV");
    }
}
