//! Session Broker - find-or-create matchmaking in front of a managed
//! game session hosting backend
//!
//! On a "find match" request the broker resolves the configured routing
//! queue, looks for the oldest joinable session and admits the player into
//! it, or requests a new session placement when nothing is joinable.

pub mod backend;
pub mod config;
pub mod error;
pub mod matchmaking;
pub mod metrics;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use backend::{GameLiftHttpClient, InMemorySessionBackend, SessionBackendClient};
pub use matchmaking::{HandlerResponse, MatchRequestHandler};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
