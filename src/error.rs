//! Error types for the admin server
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Admin Error Enum ==
/// Unified error type for the admin server.
#[derive(Error, Debug)]
pub enum AdminError {
    /// The listener could not be created
    #[error("failed to bind admin listener on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The router cannot dispatch on this method
    #[error("unsupported route method: {0}")]
    UnsupportedMethod(Method),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A capture of the same kind is already running
    #[error("Busy: {0}")]
    Busy(String),

    /// Feature not available on this build or platform
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// The agent rejected or failed a control operation
    #[error("Agent error: {0}")]
    Agent(String),

    /// In-flight requests outlived the shutdown deadline
    #[error("admin server did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AdminError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AdminError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AdminError::Busy(msg) => (StatusCode::CONFLICT, msg.clone()),
            AdminError::Unsupported(msg) => (StatusCode::NOT_IMPLEMENTED, msg.clone()),
            AdminError::Agent(msg) | AdminError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AdminError::Bind { .. }
            | AdminError::UnsupportedMethod(_)
            | AdminError::ShutdownTimeout(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the admin server.
pub type Result<T> = std::result::Result<T, AdminError>;
