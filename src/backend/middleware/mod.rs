//! Middleware Module
//!
//! Request processing that runs before handlers.
//!
//! - **`auth`** - Session token verification for the WebSocket upgrade

pub mod auth;

pub use auth::{authenticate, AuthenticatedUser};
