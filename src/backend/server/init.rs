/**
 * Server Initialization
 *
 * Builds the relay application from a validated configuration.
 *
 * # Initialization Process
 *
 * 1. Connect the broker
 * 2. Build the membership verifier (and database pool when required)
 * 3. Create the registry and the publisher
 * 4. Start the relay; its first subscription must succeed before the
 *    listener is bound, so an unreachable broker aborts startup
 * 5. Create the router
 */
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::backend::auth::MembershipVerifier;
use crate::backend::error::BackendError;
use crate::backend::realtime::{Broker, EventPublisher, Relay, RelayHandle, TeamRegistry};
use crate::backend::routes::create_router;
use crate::backend::server::config::{load_broker, load_membership};
use crate::backend::server::state::AppState;
use crate::shared::RelayConfig;

/// Assembled relay application
pub struct App {
    /// Router ready for `axum::serve`
    pub router: Router<()>,
    /// Shared state, also usable by in-process mutation handlers
    pub state: AppState,
    /// Running relay loop
    pub relay: RelayHandle,
    /// Broker client, released on shutdown
    pub broker: Arc<dyn Broker>,
    /// Closes every upgraded connection
    connections: watch::Sender<bool>,
}

impl App {
    /// Close client connections, stop the relay and release the broker
    ///
    /// Upgraded WebSocket connections outlive `axum::serve`, so they are
    /// closed here explicitly.
    pub async fn shutdown(self) {
        let _ = self.connections.send(true);
        self.relay.shutdown().await;
        self.broker.disconnect().await;
        tracing::info!("[Server] Shutdown complete");
    }
}

/// Create the relay application from configuration
pub async fn create_app(config: &RelayConfig) -> Result<App, BackendError> {
    tracing::info!("[Server] Initializing team activity relay");

    // Step 1: Broker
    let broker = load_broker(config).await?;

    // Step 2: Membership policy
    let membership = load_membership(config).await?;

    create_app_with(config, broker, membership).await
}

/// Create the relay application around an existing broker and verifier
pub async fn create_app_with(
    config: &RelayConfig,
    broker: Arc<dyn Broker>,
    membership: Arc<dyn MembershipVerifier>,
) -> Result<App, BackendError> {
    // Step 3: Registry and publisher
    let registry = TeamRegistry::new();
    let publisher = EventPublisher::new(broker.clone());

    // Step 4: Relay
    let relay = Relay::new(broker.clone(), registry.clone(), config.reconnect.clone())
        .start()
        .await?;

    let (connections, shutdown) = watch::channel(false);
    let state = AppState {
        registry,
        publisher,
        membership,
        jwt_secret: Arc::from(config.jwt_secret.as_str()),
        connection_buffer: config.connection_buffer,
        ping_interval: Duration::from_secs(config.ping_interval_secs),
        started_at: chrono::Utc::now(),
        shutdown,
    };

    // Step 5: Router
    let router = create_router(state.clone(), config.client_url.as_deref());
    tracing::info!("[Server] Router configured");

    Ok(App {
        router,
        state,
        relay,
        broker,
        connections,
    })
}
