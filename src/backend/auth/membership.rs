/**
 * Join-Time Membership Checks
 *
 * A client asks to join a team room by sending the team id from its session.
 * The verifier selected by `MembershipMode` decides whether the connection's
 * user may receive that team's events.
 */
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};

use crate::backend::auth::sessions::Claims;
use crate::backend::error::BackendError;

/// Decides whether a user may join a team room
#[async_trait]
pub trait MembershipVerifier: Send + Sync + 'static {
    async fn may_join(&self, claims: &Claims, team_id: &str) -> Result<bool, BackendError>;
}

/// Accepts whatever team the client names
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustClaimedTeam;

#[async_trait]
impl MembershipVerifier for TrustClaimedTeam {
    async fn may_join(&self, _claims: &Claims, _team_id: &str) -> Result<bool, BackendError> {
        Ok(true)
    }
}

/// Accepts only the team recorded in the session token
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsTeamVerifier;

#[async_trait]
impl MembershipVerifier for ClaimsTeamVerifier {
    async fn may_join(&self, claims: &Claims, team_id: &str) -> Result<bool, BackendError> {
        Ok(claims.team_id.as_deref() == Some(team_id))
    }
}

/// Looks the pair up in the `team_members` table
#[derive(Debug, Clone)]
pub struct PgMembershipVerifier {
    pool: PgPool,
}

impl PgMembershipVerifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipVerifier for PgMembershipVerifier {
    async fn may_join(&self, claims: &Claims, team_id: &str) -> Result<bool, BackendError> {
        let is_member: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM team_members WHERE team_id = $1 AND user_id = $2)",
        )
        .bind(team_id)
        .bind(&claims.sub)
        .fetch_one(&self.pool)
        .await?;
        Ok(is_member)
    }
}

/// Fixed membership table, for tests and single-team deployments
#[derive(Debug, Clone, Default)]
pub struct StaticMembership {
    teams: HashMap<String, HashSet<String>>,
}

impl StaticMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, team_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.teams
            .entry(team_id.into())
            .or_default()
            .insert(user_id.into());
        self
    }
}

#[async_trait]
impl MembershipVerifier for StaticMembership {
    async fn may_join(&self, claims: &Claims, team_id: &str) -> Result<bool, BackendError> {
        Ok(self
            .teams
            .get(team_id)
            .is_some_and(|members| members.contains(&claims.sub)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(team: Option<&str>) -> Claims {
        Claims {
            sub: "u1".to_string(),
            email: "ana@example.com".to_string(),
            team_id: team.map(str::to_string),
            exp: 0,
            iat: 0,
        }
    }

    #[tokio::test]
    async fn test_trust_accepts_any_team() {
        assert!(TrustClaimedTeam.may_join(&claims(None), "t9").await.unwrap());
    }

    #[tokio::test]
    async fn test_claims_verifier_matches_token_team() {
        let verifier = ClaimsTeamVerifier;
        assert!(verifier.may_join(&claims(Some("t1")), "t1").await.unwrap());
        assert!(!verifier.may_join(&claims(Some("t1")), "t2").await.unwrap());
        assert!(!verifier.may_join(&claims(None), "t1").await.unwrap());
    }

    #[tokio::test]
    async fn test_static_membership() {
        let verifier = StaticMembership::new().with_member("t1", "u1");
        assert!(verifier.may_join(&claims(None), "t1").await.unwrap());
        assert!(!verifier.may_join(&claims(None), "t2").await.unwrap());
    }
}
