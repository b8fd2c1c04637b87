//! Error types for the helper
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Error Enum ==
/// Unified error type for caches, fetchers and the module system.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested resource or key is not available
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key-value store read/write failure
    #[error("Store error: {0}")]
    Store(String),

    /// Network failure before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response arrived with an unexpected HTTP status
    #[error("Request failed with status {0}")]
    Status(u16),

    /// Remote API answered but reported failure
    #[error("API error: {0}")]
    Api(String),

    /// Payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Module manifest could not be loaded or parsed
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// A single module failed to load or initialize
    #[error("Module {id} failed: {message}")]
    Module { id: String, message: String },

    /// A readiness wait exceeded its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Store(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Transport(_) | Error::Status(_) | Error::Api(_) => StatusCode::BAD_GATEWAY,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Store(_)
            | Error::Decode(_)
            | Error::Manifest(_)
            | Error::Module { .. }
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the helper.
pub type Result<T> = std::result::Result<T, Error>;
