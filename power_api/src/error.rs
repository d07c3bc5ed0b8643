//! API error type and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use power_shared_types::PowerControlError;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// An error that renders as `{"error": "<message>"}` with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// 400 for malformed or incomplete requests.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<PowerControlError> for ApiError {
    fn from(err: PowerControlError) -> Self {
        let status = match err {
            PowerControlError::ServerNotFound(_) => StatusCode::NOT_FOUND,
            PowerControlError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PowerControlError::Runtime(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
