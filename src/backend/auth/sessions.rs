/**
 * Session Tokens
 *
 * HS256 JWT tokens identifying the user behind a relay connection. Tokens are
 * issued by the application's login flow; the relay only verifies them. The
 * optional `teamId` claim lets the relay check join requests without a
 * database round-trip.
 */
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Lifetime of tokens issued by [`create_token`]
const TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email
    pub email: String,
    /// Team the user belongs to, when known at login
    #[serde(rename = "teamId", default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// Create a JWT token for a user
///
/// # Arguments
/// * `secret` - HS256 signing secret
/// * `user_id` - User ID
/// * `email` - User email
/// * `team_id` - Team recorded in the token, if any
pub fn create_token(
    secret: &str,
    user_id: &str,
    email: &str,
    team_id: Option<&str>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        team_id: team_id.map(str::to_string),
        exp: (now + TOKEN_TTL_SECS).max(0) as u64,
        iat: now.max(0) as u64,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
}

/// Verify and decode a JWT token
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_verify_token() {
        let token = create_token(SECRET, "u1", "ana@example.com", Some("t1")).unwrap();

        let claims = verify_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.team_id.as_deref(), Some("t1"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_without_team() {
        let token = create_token(SECRET, "u1", "ana@example.com", None).unwrap();
        assert!(verify_token(SECRET, &token).unwrap().team_id.is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(SECRET, "u1", "ana@example.com", None).unwrap();
        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn test_verify_invalid_token() {
        assert!(verify_token(SECRET, "invalid.token.here").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            sub: "u1".to_string(),
            email: "ana@example.com".to_string(),
            team_id: None,
            exp: 1_000,
            iat: 0,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(SECRET, &token).is_err());
    }
}
