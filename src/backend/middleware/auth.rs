/**
 * Connection Authentication
 *
 * Extracts and verifies the session token on the WebSocket upgrade request.
 * Browsers cannot set headers on a WebSocket handshake, so the token is
 * accepted either as `Authorization: Bearer <token>` or as a `token` query
 * parameter. The header wins when both are present.
 */
use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Uri},
};
use serde::Deserialize;

use crate::backend::auth::sessions::{verify_token, Claims};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// User behind an authenticated request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> &str {
        &self.claims.sub
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Token from the `token` query parameter
pub fn query_token(uri: &Uri) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|token| !token.is_empty())
}

/// Verify the request's session token
pub fn authenticate(secret: &str, headers: &HeaderMap, uri: &Uri) -> Result<Claims, BackendError> {
    let token = match bearer_token(headers) {
        Some(token) => token.to_string(),
        None => query_token(uri).ok_or_else(|| {
            tracing::warn!("[Auth] Missing session token");
            BackendError::unauthorized("Missing session token")
        })?,
    };

    verify_token(secret, &token).map_err(|e| {
        tracing::warn!("[Auth] Invalid token: {:?}", e);
        BackendError::unauthorized("Invalid session token")
    })
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = BackendError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = authenticate(&state.jwt_secret, &parts.headers, &parts.uri)?;
        Ok(AuthenticatedUser { claims })
    }
}
