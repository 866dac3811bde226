//! Real-time Fan-out
//!
//! Carries team-activity events from the mutation handlers of any backend
//! instance to every client connection of the affected team.
//!
//! # Architecture
//!
//! ```text
//! mutation handler ─► EventPublisher ─► Broker channel (one per kind)
//!                                              │
//!                     every instance's Relay ◄─┘
//!                                │
//!                       TeamRegistry room ─► connection tasks ─► clients
//! ```
//!
//! - **`broker`** - Broker trait and the in-process broker
//! - **`nats`** - NATS-backed broker for multi-instance deployments
//! - **`publisher`** - Envelope publishing for mutation handlers
//! - **`registry`** - Connection-to-team rooms
//! - **`relay`** - Broker subscription and room delivery
//! - **`connection`** - WebSocket handler for client connections
//!
//! Delivery is best-effort and at-most-once; clients that miss events catch
//! up by refetching on their next navigation.

pub mod broker;

pub mod nats;

pub mod publisher;

pub mod registry;

pub mod relay;

pub mod connection;

pub use broker::{Broker, BrokerError, BrokerMessage, BrokerStream, InMemoryBroker};
pub use connection::handle_websocket;
pub use nats::NatsBroker;
pub use publisher::EventPublisher;
pub use registry::{ConnectionId, ConnectionState, JoinOutcome, RegistryError, TeamRegistry};
pub use relay::{Relay, RelayHandle};
