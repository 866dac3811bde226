//! Client Module
//!
//! Client-side half of the relay protocol: typed events, the local optimistic
//! state they are applied to, and the reconciler that applies them. With the
//! `client` feature, [`RelayClient`] maintains the WebSocket connection.
//!
//! # Example
//!
//! ```rust,no_run
//! use teamhub::client::{Intent, LocalState, Reconciler, RelayClient, TeamState};
//!
//! # async fn example(token: String) {
//! let state = LocalState::new("u1").with_team(TeamState::new("t1"));
//! let mut reconciler = Reconciler::new(state);
//!
//! let (tx, mut rx) = tokio::sync::mpsc::channel(64);
//! let handle = RelayClient::new("ws://localhost:5000/ws", token)
//!     .with_team("t1")
//!     .spawn(tx);
//!
//! while let Some(event) = rx.recv().await {
//!     if reconciler.apply(event) == Intent::NavigateToJoinTeam {
//!         break;
//!     }
//! }
//! handle.shutdown().await;
//! # }
//! ```

/// Typed relay events
pub mod events;

/// Local optimistic state
pub mod state;

/// Event application
pub mod reconciler;

/// Reconnecting WebSocket client
#[cfg(feature = "client")]
pub mod connection;

pub use events::{ClientEvent, MemberRemoval, QaAnnouncement};
pub use reconciler::{Intent, Reconciler};
pub use state::{LocalState, TeamMember, TeamState, ACTIVITY_RETENTION};

#[cfg(feature = "client")]
pub use connection::{ClientError, ClientHandle, RelayClient};
