//! Shared Error Types
//!
//! This module defines error types that are shared between the relay and the
//! client side. These errors represent failures in decoding or validating the
//! data that travels over the broker and over client connections.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Data validation failures
//! - `EnvelopeError` - Structurally valid JSON that is not a usable envelope
//!
//! # Usage
//!
//! ```rust
//! use teamhub::shared::error::SharedError;
//!
//! let error = SharedError::validation("teamId", "team id cannot be empty");
//! ```
use thiserror::Error;

/// Shared error types that can occur on both sides of the relay
#[derive(Debug, Error, Clone)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Malformed broker envelope
    #[error("Envelope error: {message}")]
    EnvelopeError {
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new envelope error
    pub fn envelope(message: impl Into<String>) -> Self {
        Self::EnvelopeError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
