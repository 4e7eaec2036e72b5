use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failures surfaced by the storage adapter.
///
/// Every variant carries a human-readable message that is forwarded verbatim
/// to the HTTP caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Bad credentials, or the server refused the probe at connect time.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// The storage server could not be reached.
    #[error("storage server unreachable: {0}")]
    Network(String),
    #[error("not connected to a storage server")]
    NotConnected,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    /// Anything else the storage server reported.
    #[error("{0}")]
    Passthrough(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub fn status(&self) -> StatusCode {
        match self {
            StorageError::Auth(_) | StorageError::Validation(_) => StatusCode::BAD_REQUEST,
            StorageError::NotConnected => StatusCode::UNAUTHORIZED,
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::Conflict(_) => StatusCode::CONFLICT,
            StorageError::Network(_) => StatusCode::BAD_GATEWAY,
            StorageError::Passthrough(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::new(err.status(), err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_their_http_category() {
        assert_eq!(StorageError::NotConnected.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            StorageError::Conflict("bucket not empty".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            StorageError::Validation("bad name".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StorageError::Passthrough("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn app_error_keeps_the_underlying_message() {
        let err: AppError = StorageError::NotFound("object `a.txt` not found".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "object `a.txt` not found");
    }
}
