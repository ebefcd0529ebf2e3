//! Service layer for the session broker
//!
//! This module contains the application state, the HTTP surface and server
//! lifecycle.

pub mod app;
pub mod http;

pub use app::{AppState, ServiceError};
pub use http::router;
