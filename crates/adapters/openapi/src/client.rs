//! HTTP client for the vendor cloud API.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use switchbridge_app::ports::CloudApi;
use switchbridge_domain::api::{ApiEnvelope, DeviceListing, DeviceStatus};
use switchbridge_domain::command::DeviceCommand;
use switchbridge_domain::error::BridgeError;
use switchbridge_domain::id::DeviceId;
use switchbridge_domain::time::{epoch_millis, now};

use crate::config::OpenApiConfig;
use crate::error::OpenApiError;
use crate::signing::signed_headers;

const JSON_UTF8: &str = "application/json; charset=utf8";

/// Signed client for the v1.1 API.
pub struct OpenApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    secret: String,
}

impl OpenApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiError::Client`] when the TLS backend cannot be
    /// initialised.
    pub fn new(config: &OpenApiConfig) -> Result<Self, OpenApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .build()
            .map_err(OpenApiError::Client)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            secret: config.secret.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let headers = signed_headers(&self.token, &self.secret, epoch_millis(now()));
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header(AUTHORIZATION, &self.token)
            .header("sign", headers.sign)
            .header("nonce", headers.nonce)
            .header("t", headers.t)
            .header(CONTENT_TYPE, JSON_UTF8)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, OpenApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "cloud request rejected");
            return Err(OpenApiError::status(status.as_u16()));
        }
        let body = response.bytes().await?;
        let envelope: ApiEnvelope<T> =
            serde_json::from_slice(&body).map_err(OpenApiError::Decode)?;
        tracing::trace!(status_code = envelope.status_code, "cloud response");
        Ok(envelope)
    }
}

impl CloudApi for OpenApiClient {
    #[tracing::instrument(skip(self))]
    async fn device_status(
        &self,
        device_id: &DeviceId,
    ) -> Result<ApiEnvelope<DeviceStatus>, BridgeError> {
        let path = format!("/v1.1/devices/{device_id}/status");
        Ok(self.send(self.request(Method::GET, &path)).await?)
    }

    #[tracing::instrument(skip(self), fields(command = %command.command))]
    async fn send_command(
        &self,
        device_id: &DeviceId,
        command: &DeviceCommand,
    ) -> Result<ApiEnvelope<serde_json::Value>, BridgeError> {
        let path = format!("/v1.1/devices/{device_id}/commands");
        let request = self.request(Method::POST, &path).json(command);
        Ok(self.send(request).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn list_devices(&self) -> Result<ApiEnvelope<DeviceListing>, BridgeError> {
        Ok(self
            .send(self.request(Method::GET, "/v1.1/devices"))
            .await?)
    }
}
