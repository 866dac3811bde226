//! WebSocket Connection Handler
//!
//! Serves `GET /ws`. The upgrade request is authenticated before the socket
//! opens; afterwards each connection runs a single task that:
//!
//! - reads `joinTeam` / `leaveTeam` commands from the client
//! - writes frames the relay queued for it in the registry
//! - pings on a fixed interval and drops peers that stay silent for two
//!   intervals
//!
//! The loop also ends when the server shuts down. Whatever ends it, the
//! connection is removed from the registry.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::backend::auth::Claims;
use crate::backend::middleware::AuthenticatedUser;
use crate::backend::realtime::registry::{ConnectionId, JoinOutcome};
use crate::backend::server::state::AppState;
use crate::shared::{ClientCommand, OutboundFrame};

/// Upgrade an authenticated request to a relay connection
///
/// Authentication runs before the upgrade is validated, so a request without
/// a valid token is answered with 401.
pub async fn handle_websocket(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ws: WebSocketUpgrade,
) -> Response {
    tracing::info!("[Connection] Upgrade accepted for user {}", user.user_id());
    ws.on_upgrade(move |socket| serve_connection(socket, state, user.claims))
}

/// Drive one connection until it closes
pub async fn serve_connection(socket: WebSocket, state: AppState, claims: Claims) {
    let (outbox, mut frames) = mpsc::channel::<OutboundFrame>(state.connection_buffer);
    let id = state.registry.register(claims.sub.clone(), outbox);
    let (mut sink, mut incoming) = socket.split();

    let mut ping = interval(state.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ping.tick().await;
    let idle_limit = state.ping_interval.saturating_mul(2);
    let mut last_seen = Instant::now();
    let mut shutdown = state.shutdown.clone();

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            message = incoming.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    last_seen = Instant::now();
                    handle_command(&state, id, &claims, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => last_seen = Instant::now(),
                Some(Err(e)) => {
                    tracing::debug!("[Connection] {} read error: {}", id, e);
                    break;
                }
            },
            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                let text = match frame.to_text() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("[Connection] Failed to encode {} frame: {}", frame.event, e);
                        continue;
                    }
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                if last_seen.elapsed() > idle_limit {
                    tracing::info!("[Connection] {} timed out", id);
                    break;
                }
                if sink.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.registry.disconnect(id);
    tracing::info!("[Connection] {} closed for user {}", id, claims.sub);
}

/// Apply one client command to the registry
async fn handle_command(state: &AppState, id: ConnectionId, claims: &Claims, text: &str) {
    let command = match ClientCommand::parse(text) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!("[Connection] {} sent an unrecognized frame: {}", id, e);
            return;
        }
    };

    match command {
        ClientCommand::JoinTeam(team_id) => {
            match state.membership.may_join(claims, &team_id).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(
                        "[Connection] User {} is not a member of team {}",
                        claims.sub,
                        team_id
                    );
                    return;
                }
                Err(e) => {
                    tracing::error!("[Connection] Membership check failed: {}", e);
                    return;
                }
            }
            match state.registry.join(id, &team_id) {
                Ok(JoinOutcome::AlreadyJoined) => {
                    tracing::debug!("[Connection] {} already in team {}", id, team_id);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("[Connection] {} join rejected: {}", id, e),
            }
        }
        ClientCommand::LeaveTeam => {
            state.registry.leave(id);
        }
    }
}
