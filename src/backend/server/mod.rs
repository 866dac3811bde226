//! Server Module
//!
//! Server initialization, application state and runtime services.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports
//! ├── state.rs  - AppState and FromRef implementations
//! ├── config.rs - Broker, database and membership loading
//! └── init.rs   - Application assembly
//! ```

/// Application state management
pub mod state;

/// Runtime service loading
pub mod config;

/// Server initialization
pub mod init;

pub use init::{create_app, create_app_with, App};
pub use state::AppState;
