//! Error response handling.
//!
//! Every failure is rendered as `{"success": false, "error": "<summary>"}`
//! with the status decided by the error's category.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::checkpoint::CheckpointError;
use crate::error::AuthError;

/// Summary returned in place of internal error details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Builds the JSON failure body used by every endpoint.
pub fn failure_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = error_details(&self);

        if status.is_server_error() {
            tracing::error!(category = %self.category(), error = %self, "request failed");
        }

        let mut response = failure_response(status, message);
        if let AuthError::Unauthorized { .. } = self {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("ApiKey"));
        }
        response
    }
}

/// Returns the HTTP status and caller-facing message for an `AuthError`.
fn error_details(error: &AuthError) -> (StatusCode, &str) {
    match error {
        AuthError::InvalidRequest { .. } | AuthError::IdentityMismatch { .. } => {
            (StatusCode::BAD_REQUEST, error.message())
        }
        AuthError::Unauthorized { .. } | AuthError::InvalidToken { .. } => {
            (StatusCode::UNAUTHORIZED, error.message())
        }
        AuthError::Configuration { .. } => (StatusCode::INTERNAL_SERVER_ERROR, error.message()),
        AuthError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE),
    }
}

impl IntoResponse for CheckpointError {
    fn into_response(self) -> Response {
        let status = match &self {
            CheckpointError::InvalidSlug
            | CheckpointError::WindowExpired
            | CheckpointError::InvalidSequence => StatusCode::BAD_REQUEST,
            CheckpointError::SessionNotFound => StatusCode::NOT_FOUND,
            CheckpointError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            CheckpointError::Storage { .. } => {
                tracing::error!(error = %self, "checkpoint storage failed");
                failure_response(status, INTERNAL_ERROR_MESSAGE)
            }
            _ => failure_response(status, &self.to_string()),
        }
    }
}
