/**
 * Backend Error Types
 *
 * This module defines error types specific to the relay server.
 * These errors are used in HTTP handlers and can be converted to HTTP responses.
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Occur while processing an HTTP request, such as the WebSocket upgrade:
 * - Missing or invalid session token
 *
 * ## Infrastructure Errors
 *
 * Broker, database, and configuration failures. At startup these abort the
 * process; inside a running connection they are logged and the operation is
 * skipped.
 */
use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::realtime::BrokerError;
use crate::shared::{ConfigError, SharedError};

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use teamhub::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::unauthorized("Missing session token");
/// assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Missing or invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },

    /// Broker connection or publish failure
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Database query failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid server configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new authentication error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Unauthorized` - 401 Unauthorized
    /// - `Broker` - 503 Service Unavailable
    /// - `SharedError` - Depends on the shared error type
    /// - everything else - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Broker(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::EnvelopeError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized { message } => message.clone(),
            other => other.to_string(),
        }
    }
}
