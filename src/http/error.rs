//! Error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::StatusError;

impl StatusError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StatusError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StatusError::Persistence(_) => StatusCode::BAD_GATEWAY,
            StatusError::Cleanup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StatusError::Authorization => StatusCode::UNAUTHORIZED,
            StatusError::InvalidReport(_) => StatusCode::BAD_REQUEST,
            StatusError::NotFound(_) => StatusCode::NOT_FOUND,
            StatusError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            StatusError::MissingOutcome(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StatusError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
