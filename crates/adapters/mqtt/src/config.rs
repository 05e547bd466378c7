//! MQTT mirror configuration.

use std::fmt;
use std::time::Duration;

use rumqttc::MqttOptions;
use serde::Deserialize;

/// Broker connection and publishing settings for the state mirror.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub enabled: bool,
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    /// Prefix for devices without their own topic.
    pub base_topic: String,
    pub keep_alive_secs: u16,
    /// Publish snapshots as retained messages so late subscribers see the
    /// last known state.
    pub retain: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "switchbridge".to_string(),
            base_topic: "switchbridge".to_string(),
            keep_alive_secs: 30,
            retain: true,
            username: None,
            password: None,
        }
    }
}

impl MqttConfig {
    /// Client options for this broker. Credentials are only sent when a
    /// username is set.
    #[must_use]
    pub fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.client_id.clone(),
            self.broker_host.clone(),
            self.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(self.keep_alive_secs)));
        if let Some(username) = &self.username {
            options.set_credentials(username.clone(), self.password.clone().unwrap_or_default());
        }
        options
    }
}

impl fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttConfig")
            .field("enabled", &self.enabled)
            .field("broker", &format_args!("{}:{}", self.broker_host, self.broker_port))
            .field("client_id", &self.client_id)
            .field("base_topic", &self.base_topic)
            .field("retain", &self.retain)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_stay_disabled_and_retain_by_default() {
        let config = MqttConfig::default();
        assert!(!config.enabled);
        assert!(config.retain);
        assert_eq!(config.base_topic, "switchbridge");
        assert_eq!(config.username, None);
    }

    #[test]
    fn should_deserialize_partial_table() {
        let config: MqttConfig = toml::from_str(
            r#"
            enabled = true
            broker_host = "mqtt.lan"
            base_topic = "home/switchbot"
            retain = false
            "#,
        )
        .unwrap();
        assert!(config.enabled);
        assert_eq!(config.broker_host, "mqtt.lan");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.base_topic, "home/switchbot");
        assert!(!config.retain);
    }

    #[test]
    fn should_build_client_options() {
        let config = MqttConfig {
            broker_host: "mqtt.lan".to_string(),
            broker_port: 8883,
            keep_alive_secs: 45,
            username: Some("bridge".to_string()),
            password: Some("hunter2".to_string()),
            ..MqttConfig::default()
        };
        let options = config.mqtt_options();
        assert_eq!(options.broker_address(), ("mqtt.lan".to_string(), 8883));
        assert_eq!(options.keep_alive(), Duration::from_secs(45));
    }

    #[test]
    fn should_redact_password_in_debug_output() {
        let config = MqttConfig {
            password: Some("hunter2".to_string()),
            ..MqttConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }
}
