/**
 * API Route Handlers
 *
 * # Routes
 *
 * - `GET /api/health` - Liveness and relay occupancy
 */
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::backend::server::state::AppState;

/// Health response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    /// RFC3339 time of the response
    pub timestamp: String,
    /// Open relay connections
    pub connections: usize,
    /// Teams with at least one joined connection
    pub teams: usize,
    /// Seconds since the server started
    pub uptime_secs: i64,
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let now = chrono::Utc::now();
    Json(HealthStatus {
        status: "OK".to_string(),
        timestamp: now.to_rfc3339(),
        connections: state.registry.connection_count(),
        teams: state.registry.team_count(),
        uptime_secs: (now - state.started_at).num_seconds(),
    })
}

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/api/health", get(health))
}
