//! Cloud API configuration.

use std::fmt;

use serde::Deserialize;

/// Credentials and endpoint for the vendor cloud API.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct OpenApiConfig {
    /// Token from the vendor app's developer options.
    pub token: String,
    /// Secret key paired with the token.
    pub secret: String,
    pub base_url: String,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u16,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            secret: String::new(),
            base_url: "https://api.switch-bot.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OpenApiConfig {
    /// Both token and secret are set.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.token.is_empty() && !self.secret.is_empty()
    }
}

impl fmt::Debug for OpenApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenApiConfig")
            .field("token", &redact(&self.token))
            .field("secret", &redact(&self.secret))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() { "" } else { "***" }
}
