//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the relay (backend) and the client side. These types describe what travels
//! over the message broker and over client connections.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code: the closed set of event kinds and their
//! channel names, the broker envelope, client frames, payload records, the
//! reconnect backoff policy and the relay configuration.

/// Event kinds, envelopes and frames
pub mod event;

/// Kind-specific payload records
pub mod records;

/// Shared error types
pub mod error;

/// Reconnect backoff policy
pub mod backoff;

/// Relay configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use event::{ClientCommand, Envelope, EventKind, OutboundFrame};
pub use records::{Activity, ActivityType, Document, QaPair, UserRef};
pub use error::SharedError;
pub use backoff::BackoffConfig;
pub use config::{ConfigError, MembershipMode, RelayConfig, RelayConfigBuilder};
