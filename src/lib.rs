//! TeamHub - Team Activity Relay
//!
//! Real-time fan-out of team activity (document changes, membership changes,
//! team deletion, new Q&A pairs) from mutation handlers to every connected
//! client of the affected team.
//!
//! # Overview
//!
//! ```text
//! mutation handler ─► EventPublisher ─► broker channel ─► Relay (every instance)
//!                                                            │
//!                                client ◄─ WebSocket ◄─ team room
//! ```
//!
//! # Module Structure
//!
//! - **`shared`** - Types used on both sides of the relay
//!   - Event kinds and channel names, broker envelope, frames
//!   - Payload records, backoff policy, configuration, errors
//!
//! - **`backend`** - Relay server (only compiled with `ssr` feature)
//!   - Broker abstraction (in-process and NATS), publisher, relay
//!   - Connection-to-team registry and WebSocket handler
//!   - JWT authentication and membership verification
//!
//! - **`client`** - Client side of the protocol
//!   - Typed events, local state and the reconciler
//!   - Reconnecting WebSocket client (`client` feature)
//!
//! # Feature Flags
//!
//! - **`ssr`** - Relay server and its infrastructure crates
//! - **`client`** - WebSocket client built on tokio-tungstenite
//!
//! # Delivery Model
//!
//! Delivery is at-most-once and best-effort. There is no replay; clients
//! apply events idempotently and refetch when their state may be stale.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Client-side reconciliation and connection
pub mod client;
