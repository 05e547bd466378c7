//! Cloud adapter error types.

use switchbridge_domain::api::classify;
use switchbridge_domain::error::BridgeError;

/// Errors specific to the cloud adapter.
#[derive(Debug, thiserror::Error)]
pub enum OpenApiError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent or the response not read.
    #[error("HTTP request failed")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx HTTP status.
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: &'static str },

    /// The response body is not the expected JSON.
    #[error("failed to decode response body")]
    Decode(#[source] serde_json::Error),
}

impl OpenApiError {
    /// Build a [`Self::Status`] with the classified message.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::Status {
            status,
            message: classify(status).message,
        }
    }

    /// Convert into a [`BridgeError`] for propagation across port boundaries.
    ///
    /// HTTP statuses become [`BridgeError::Rejected`]; everything else is a
    /// retryable [`BridgeError::Transport`].
    #[must_use]
    pub fn into_domain(self) -> BridgeError {
        match self {
            Self::Status { status, message } => BridgeError::Rejected {
                status_code: status,
                message: message.to_string(),
            },
            other => BridgeError::transport(other),
        }
    }
}

impl From<OpenApiError> for BridgeError {
    fn from(err: OpenApiError) -> Self {
        err.into_domain()
    }
}
