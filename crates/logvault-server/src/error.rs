//! Error types for the log server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use logvault::LogError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the log server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Validation or storage failure from the log service.
    #[error(transparent)]
    Log(#[from] LogError),

    /// Too many connections.
    #[error("too many connections: {0} active, limit is {1}")]
    TooManyConnections(usize, usize),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status and machine-readable kind for this error.
    #[must_use]
    pub const fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Log(LogError::Validation(_)) => (StatusCode::BAD_REQUEST, "validation_failed"),
            Self::Log(LogError::StorageUnavailable { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_unavailable")
            }
            Self::TooManyConnections(_, _) => {
                (StatusCode::SERVICE_UNAVAILABLE, "too_many_connections")
            }
            Self::BindFailed(_, _) | Self::InvalidConfig(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.classify();

        if status.is_server_error() {
            let reason = match &self {
                Self::Log(err) => err.reason().unwrap_or_default().to_string(),
                other => other.to_string(),
            };
            error!(kind = error_type, reason = %reason, "request failed");
        }

        let body = ErrorResponse {
            error: error_type,
            message: self.to_string(),
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"error":"internal_error","message":"failed to serialize error"}"#.to_string()
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}
