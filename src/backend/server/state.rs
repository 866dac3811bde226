/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * relay, holding:
 * - The connection-to-team registry shared with the relay task
 * - The event publisher for in-process mutation handlers
 * - The join-time membership verifier
 * - Connection settings (token secret, outbox size, ping interval)
 *
 * # Thread Safety
 *
 * Every field is cheap to clone and safe to share: the registry and the
 * publisher are handles over `Arc`ed internals.
 */
use axum::extract::FromRef;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::backend::auth::MembershipVerifier;
use crate::backend::realtime::{EventPublisher, TeamRegistry};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Live connections and their team rooms
    pub registry: TeamRegistry,

    /// Publisher for team-activity events
    pub publisher: EventPublisher,

    /// Decides whether a connection may join a team room
    pub membership: Arc<dyn MembershipVerifier>,

    /// HS256 secret for session tokens
    pub jwt_secret: Arc<str>,

    /// Outbound frames buffered per connection
    pub connection_buffer: usize,

    /// Interval between pings on each connection
    pub ping_interval: Duration,

    /// Server start time, reported by the health endpoint
    pub started_at: DateTime<Utc>,

    /// Flips to `true` when the server shuts down; open connections close
    pub shutdown: watch::Receiver<bool>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("registry", &self.registry)
            .field("connection_buffer", &self.connection_buffer)
            .field("ping_interval", &self.ping_interval)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// Lets handlers extract `State<TeamRegistry>` directly
impl FromRef<AppState> for TeamRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

/// Lets handlers extract `State<EventPublisher>` directly
impl FromRef<AppState> for EventPublisher {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.publisher.clone()
    }
}
