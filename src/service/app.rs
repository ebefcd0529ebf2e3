//! Main application state and service coordination
//!
//! This module contains the AppState that wires the backend client, metrics
//! and match handler together and runs the HTTP server.

use crate::backend::{GameLiftHttpClient, InMemorySessionBackend, SessionBackendClient};
use crate::config::{AppConfig, BackendKind};
use crate::matchmaking::MatchRequestHandler;
use crate::metrics::{InstrumentedBackend, MetricsCollector};
use crate::service::http;
use crate::types::{DestinationRef, RoutingQueue};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

/// Destination used by the in-memory backend's seeded queue
pub const LOCAL_DESTINATION: &str = "alias-local";

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("HTTP server error: {message}")]
    Server { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Match request handler
    handler: Arc<MatchRequestHandler>,

    /// Metrics collector shared by the handler and the backend decorator
    metrics_collector: Arc<MetricsCollector>,

    /// Human-readable backend description for health output
    backend_description: String,
}

impl AppState {
    /// Initialize the application with the backend selected in config
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing session broker");

        let (backend, description) = Self::initialize_backend(&config)?;
        Self::with_backend(config, backend, description)
    }

    /// Initialize the application around an existing backend client
    pub fn with_backend(
        config: AppConfig,
        backend: Arc<dyn SessionBackendClient>,
        backend_description: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let backend: Arc<dyn SessionBackendClient> =
            Arc::new(InstrumentedBackend::new(backend, metrics_collector.clone()));

        let handler = Arc::new(MatchRequestHandler::with_metrics(
            backend,
            config.matchmaking.clone(),
            metrics_collector.clone(),
        ));

        Ok(Self {
            config,
            handler,
            metrics_collector,
            backend_description: backend_description.into(),
        })
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the match request handler
    pub fn handler(&self) -> Arc<MatchRequestHandler> {
        self.handler.clone()
    }

    /// Get the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    pub fn backend_description(&self) -> &str {
        &self.backend_description
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn serve<F>(self: Arc<Self>, shutdown: F) -> Result<(), ServiceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!(
            "{}:{}",
            self.config.service.http_host, self.config.service.http_port
        )
        .parse()
        .map_err(|e| ServiceError::Configuration {
            message: format!("Invalid listen address: {}", e),
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::Server {
                message: format!("Failed to bind {}: {}", addr, e),
            })?;

        info!("Session broker listening on http://{}", addr);

        axum::serve(listener, http::router(self))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServiceError::Server {
                message: e.to_string(),
            })?;

        info!("HTTP server stopped");
        Ok(())
    }

    fn initialize_backend(
        config: &AppConfig,
    ) -> Result<(Arc<dyn SessionBackendClient>, String), ServiceError> {
        match config.backend.kind {
            BackendKind::Gamelift => {
                let endpoint = config.backend_endpoint();
                info!("Using session backend at {}", endpoint);

                let client =
                    GameLiftHttpClient::new(endpoint.clone(), config.backend_request_timeout())
                        .map_err(|e| ServiceError::Initialization {
                            message: format!("Failed to create backend client: {}", e),
                        })?;
                Ok((Arc::new(client), format!("gamelift ({})", endpoint)))
            }
            BackendKind::Memory => {
                info!(
                    "Using in-memory session backend with queue '{}'",
                    config.matchmaking.target_queue_name
                );

                let backend = InMemorySessionBackend::new();
                backend.add_queue(RoutingQueue {
                    name: config.matchmaking.target_queue_name.clone(),
                    arn: None,
                    timeout_in_seconds: Some(600),
                    destinations: vec![DestinationRef::new(LOCAL_DESTINATION)],
                });
                Ok((Arc::new(backend), "memory".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_state() {
        let mut config = AppConfig::default();
        config.backend.kind = BackendKind::Memory;

        let state = AppState::new(config).await.unwrap();
        assert_eq!(state.backend_description(), "memory");

        let response = state
            .handler()
            .handle(br#"{"opCode":"1","playerId":"p1"}"#)
            .await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body["Status"], "PENDING");
        assert_eq!(response.body["GameSessionQueueName"], "rtgl-queue-2022-1");
    }

    #[tokio::test]
    async fn test_gamelift_backend_description() {
        let mut config = AppConfig::default();
        config.backend.endpoint = Some("http://localhost:9080".to_string());

        let state = AppState::new(config).await.unwrap();
        assert_eq!(state.backend_description(), "gamelift (http://localhost:9080)");
    }
}
