//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use switchbridge_domain::error::{BridgeError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`BridgeError`] to an HTTP response with appropriate status code.
pub struct ApiError(BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            BridgeError::Validation(_) => StatusCode::BAD_REQUEST,
            BridgeError::NotFound(_) => StatusCode::NOT_FOUND,
            BridgeError::Unsupported(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BridgeError::Rejected { .. } | BridgeError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::BAD_GATEWAY {
            tracing::warn!(error = %self.0, "device unreachable");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchbridge_domain::error::{NotFoundError, UnsupportedError};
    use switchbridge_domain::homekit::Characteristic;

    #[test]
    fn should_map_errors_to_status_codes() {
        let cases = [
            (
                BridgeError::from(ValidationError::EmptyDeviceId),
                StatusCode::BAD_REQUEST,
            ),
            (
                BridgeError::from(NotFoundError {
                    entity: "Accessory",
                    id: "X".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                BridgeError::from(UnsupportedError::ReadOnly {
                    characteristic: Characteristic::CurrentTemperature,
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                BridgeError::Rejected {
                    status_code: 161,
                    message: "device is offline".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
