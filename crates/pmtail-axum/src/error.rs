//! Web-facing error types and HTTP mappings.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use pmtail_runtime::DirectoryError;

/// Error type for the plain HTTP handlers.
///
/// The WebSocket session never uses this: once upgraded, its failures
/// end the stream rather than producing a status code.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Service unavailable (external collaborator down).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            HttpError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<DirectoryError> for HttpError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Command(e) => {
                HttpError::ServiceUnavailable(format!("could not run pm2 list: {e}"))
            }
            DirectoryError::Failed { status, .. } => {
                HttpError::ServiceUnavailable(format!("pm2 list failed with {status}"))
            }
        }
    }
}
