//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `switchbridge.toml` in the working directory, or the file named
//! by `SWITCHBRIDGE_CONFIG`. Every field has a sensible default so the file
//! is optional. Environment variables take precedence over file values.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use switchbridge_adapter_ble::BleConfig;
use switchbridge_adapter_mqtt::MqttConfig;
use switchbridge_adapter_openapi::OpenApiConfig;
use switchbridge_domain::connection::{ConnectionType, RetryPolicy};
use switchbridge_domain::device::{Device, DeviceType};
use switchbridge_domain::error::ValidationError;
use switchbridge_domain::id::DeviceId;
use switchbridge_domain::mapping::MappingMode;

const DEFAULT_PATH: &str = "switchbridge.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Cloud API credentials.
    pub openapi: OpenApiConfig,
    /// Local Bluetooth transport.
    pub ble: BleConfig,
    /// MQTT state mirror.
    pub mqtt: MqttConfig,
    /// Bridge-wide behaviour.
    pub options: OptionsConfig,
    /// Devices exposed as accessories.
    pub devices: Vec<DeviceConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    /// Polling interval for devices without their own.
    pub refresh_rate_secs: u64,
    /// Debounce window before a characteristic write is pushed.
    pub push_rate_ms: u64,
    /// Cloud attempts per operation, first one included.
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    /// Compare configured devices against the cloud account at startup.
    pub discover: bool,
}

/// One `[[devices]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub device_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Resolved from the credentials when absent.
    #[serde(default)]
    pub connection: Option<ConnectionType>,
    #[serde(default)]
    pub mapping_mode: MappingMode,
    #[serde(default)]
    pub refresh_rate_secs: Option<u64>,
    #[serde(default)]
    pub mqtt_topic: Option<String>,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("SWITCHBRIDGE_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SWITCHBRIDGE_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("SWITCHBRIDGE_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("SWITCHBRIDGE_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("SWITCHBRIDGE_TOKEN") {
            self.openapi.token = val;
        }
        if let Some(val) = var("SWITCHBRIDGE_SECRET") {
            self.openapi.secret = val;
        }
        if let Some(val) = var("SWITCHBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.openapi.token.is_empty() != self.openapi.secret.is_empty() {
            return Err(ConfigError::Validation(
                "openapi token and secret must be set together".to_string(),
            ));
        }
        if self.options.max_retries == 0 {
            return Err(ConfigError::Validation(
                "max_retries must be at least 1".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for entry in &self.devices {
            let id = DeviceId::new(&entry.device_id).map_err(|source| ConfigError::Device {
                device_id: entry.device_id.clone(),
                source,
            })?;
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Device {
                    device_id: id.to_string(),
                    source: ValidationError::EmptyName,
                });
            }
            if !seen.insert(id.clone()) {
                return Err(ConfigError::Validation(format!("device {id} is configured twice")));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.options.max_retries,
            Duration::from_secs(self.options.retry_delay_secs),
        )
    }

    #[must_use]
    pub fn push_rate(&self) -> Duration {
        Duration::from_millis(self.options.push_rate_ms)
    }

    #[must_use]
    pub fn refresh_rate(&self) -> Duration {
        Duration::from_secs(self.options.refresh_rate_secs)
    }

    /// Domain devices, with connection types resolved against the
    /// configured credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Device`] when an entry is not a valid device.
    pub fn devices(&self) -> Result<Vec<Device>, ConfigError> {
        let has_credentials = self.openapi.has_credentials();
        self.devices
            .iter()
            .map(|entry| {
                let invalid = |source| ConfigError::Device {
                    device_id: entry.device_id.clone(),
                    source,
                };
                let mut builder = Device::builder()
                    .id(DeviceId::new(&entry.device_id).map_err(invalid)?)
                    .name(entry.name.trim())
                    .device_type(entry.device_type)
                    .connection(ConnectionType::resolve(entry.connection, has_credentials))
                    .mapping_mode(entry.mapping_mode);
                if let Some(secs) = entry.refresh_rate_secs {
                    builder = builder.refresh_rate(Duration::from_secs(secs));
                }
                if let Some(topic) = &entry.mqtt_topic {
                    builder = builder.mqtt_topic(topic.as_str());
                }
                builder.build().map_err(invalid)
            })
            .collect()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8581,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "switchbridged=info,switchbridge=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            refresh_rate_secs: 300,
            push_rate_ms: 100,
            max_retries: 5,
            retry_delay_secs: 1,
            discover: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// A device entry is invalid.
    #[error("invalid device {device_id:?}")]
    Device {
        device_id: String,
        #[source]
        source: ValidationError,
    },
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
