/**
 * Router Configuration
 *
 * Combines all routes into a single Axum router.
 *
 * # Routes
 *
 * - `GET /ws` - Relay WebSocket (session token required)
 * - `GET /api/health` - Health check
 * - anything else - 404
 *
 * # Layers
 *
 * CORS allows the configured client origin (any origin when unset) and
 * requests are traced through `tower-http`.
 */
use axum::{
    http::{HeaderValue, StatusCode},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::realtime::handle_websocket;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, client_url: Option<&str>) -> Router<()> {
    let router = Router::new().route("/ws", get(handle_websocket));

    let router = configure_api_routes(router);

    let router = router.fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") });

    router
        .layer(cors_layer(client_url))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn cors_layer(client_url: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match client_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(e)) => {
            tracing::warn!("[Server] Ignoring invalid CLIENT_URL: {}", e);
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
