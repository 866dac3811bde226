//! Backend Module
//!
//! Server-side half of the team activity relay: the broker, the relay
//! process, the connection registry and the Axum server exposing `/ws`.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Initialization, application state, service loading
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`realtime`** - Broker, publisher, relay, registry, WebSocket handler
//! - **`auth`** - Session tokens and team membership verification
//! - **`middleware`** - Request authentication
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs       - Module exports and documentation
//! ├── main.rs      - Relay binary
//! ├── server/      - Server initialization and state
//! ├── routes/      - Route configuration
//! ├── realtime/    - Event fan-out
//! ├── auth/        - Authentication
//! ├── middleware/  - Request middleware
//! └── error/       - Error types
//! ```
//!
//! # Multi-instance Deployment
//!
//! Every instance runs its own relay subscribed to every broker channel and
//! keeps its own registry. A publish on any instance reaches the connections
//! of the target team on all instances.
//!
//! # Example
//!
//! ```rust,no_run
//! use teamhub::backend::server::create_app;
//! use teamhub::shared::RelayConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RelayConfig::builder().jwt_secret("secret").build()?;
//! let app = create_app(&config).await?;
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//! axum::serve(listener, app.router.clone()).await?;
//! # Ok(())
//! # }
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Real-time fan-out
pub mod realtime;

/// Backend error types
pub mod error;

/// Authentication and membership
pub mod auth;

/// Middleware for request processing
pub mod middleware;

pub use error::BackendError;
pub use realtime::{EventPublisher, Relay, TeamRegistry};
pub use server::create_app;
