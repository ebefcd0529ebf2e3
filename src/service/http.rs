//! HTTP surface: the match endpoint plus health and Prometheus metrics
//!
//! Built with Axum. The match endpoint takes the raw body so malformed JSON
//! is answered by the handler rather than by an extractor rejection.

use crate::service::app::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

/// Create the Axum router with all endpoints
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(match_handler))
        .route("/match", post(match_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Find-match endpoint handler
async fn match_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let response = state.handler().handle(&body).await;

    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

/// Lightweight health check endpoint handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Health check requested");

    Json(json!({
        "status": "healthy",
        "service": state.config().service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.backend_description(),
    }))
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    debug!("Metrics endpoint requested");

    let registry = state.metrics_collector().registry();
    let metric_families = registry.gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_output) => (
            StatusCode::OK,
            [("content-type", encoder.format_type().to_string())],
            metrics_output,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}
