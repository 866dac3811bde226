//! Authentication Module
//!
//! Verifies who is behind a relay connection and which team room they may
//! join.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs         - Module exports
//! ├── sessions.rs    - JWT token creation and verification
//! └── membership.rs  - Join-time team membership verifiers
//! ```
//!
//! # Flow
//!
//! 1. The WebSocket upgrade request carries a session token (Authorization
//!    header or `token` query parameter); invalid tokens get 401
//! 2. The upgraded connection is registered under the token's user
//! 3. Each `joinTeam` request is checked by the configured
//!    [`MembershipVerifier`] before the connection enters the room

/// JWT token management
pub mod sessions;

/// Team membership verification
pub mod membership;

pub use membership::{
    ClaimsTeamVerifier, MembershipVerifier, PgMembershipVerifier, StaticMembership,
    TrustClaimedTeam,
};
pub use sessions::{create_token, verify_token, Claims};
