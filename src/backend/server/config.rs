/**
 * Server Configuration
 *
 * Turns a validated [`RelayConfig`] into the runtime services the relay
 * depends on: the broker client, the optional PostgreSQL pool, and the
 * membership verifier.
 *
 * # Error Handling
 *
 * Unlike optional features, these services are required by the selected
 * configuration, so failures are returned and abort startup.
 */
use sqlx::PgPool;
use std::sync::Arc;

use crate::backend::auth::{
    ClaimsTeamVerifier, MembershipVerifier, PgMembershipVerifier, TrustClaimedTeam,
};
use crate::backend::error::BackendError;
use crate::backend::realtime::{Broker, InMemoryBroker, NatsBroker};
use crate::shared::{ConfigError, MembershipMode, RelayConfig};

/// Client name reported to the broker
const BROKER_CLIENT_NAME: &str = "teamhub-relay";

/// Connect the broker named by `broker_url`
pub async fn load_broker(config: &RelayConfig) -> Result<Arc<dyn Broker>, BackendError> {
    if config.uses_memory_broker() {
        tracing::warn!("[Server] Using in-process broker; events will not reach other instances");
        return Ok(Arc::new(InMemoryBroker::new()));
    }

    let broker = NatsBroker::connect(&config.broker_url, BROKER_CLIENT_NAME).await?;
    Ok(Arc::new(broker))
}

/// Create a PostgreSQL connection pool
pub async fn load_database(database_url: &str) -> Result<PgPool, BackendError> {
    tracing::info!("[Server] Connecting to database...");
    let pool = PgPool::connect(database_url).await?;
    tracing::info!("[Server] Database connection established");
    Ok(pool)
}

/// Build the verifier for the configured membership mode
pub async fn load_membership(
    config: &RelayConfig,
) -> Result<Arc<dyn MembershipVerifier>, BackendError> {
    let verifier: Arc<dyn MembershipVerifier> = match config.membership_mode {
        MembershipMode::Trust => Arc::new(TrustClaimedTeam),
        MembershipMode::Claims => Arc::new(ClaimsTeamVerifier),
        MembershipMode::Database => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::MissingValue("database_url"))?;
            Arc::new(PgMembershipVerifier::new(load_database(url).await?))
        }
    };
    tracing::info!("[Server] Membership mode: {:?}", config.membership_mode);
    Ok(verifier)
}
