//! Session hosting backend access
//!
//! The `SessionBackendClient` trait plus the hosted (HTTP) and in-memory
//! implementations.

pub mod client;
pub mod http;
pub mod memory;

pub use client::{SessionBackendClient, SessionSearch};
pub use http::GameLiftHttpClient;
pub use memory::{BackendCall, BackendOperation, InMemorySessionBackend};
