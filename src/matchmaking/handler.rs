//! Top-level match request handling
//!
//! One request walks `PARSED -> QUEUE_RESOLVED -> SESSION_SEARCHED ->
//! {ADMITTING | PLACING} -> RESPONDED`. Nothing is persisted between
//! requests and nothing is retried; every path ends in a status code plus a
//! JSON body.

use crate::backend::SessionBackendClient;
use crate::config::MatchmakingSettings;
use crate::error::{MatchmakingError, Result};
use crate::matchmaking::admission::AdmissionService;
use crate::matchmaking::placement::PlacementOrchestrator;
use crate::matchmaking::queue_selector::{QueueSelection, QueueSelector};
use crate::matchmaking::session_search::SessionSearchEngine;
use crate::metrics::MetricsCollector;
use crate::types::{JoinedSession, MatchOutcome, MatchRequest, OpCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Status code and JSON body produced for one request
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: Value,
}

impl HandlerResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    pub fn empty() -> Self {
        Self::ok(json!({}))
    }

    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<MatchmakingError>() {
            Some(domain) => Self {
                status_code: domain.status_code(),
                body: json!({
                    "error": domain.kind(),
                    "message": domain.to_string(),
                }),
            },
            None => Self {
                status_code: 500,
                body: json!({
                    "error": "internal_error",
                    "message": err.to_string(),
                }),
            },
        }
    }
}

/// Parse a raw request body.
///
/// Any well-formed JSON without a string `opCode` field (including `null`,
/// scalars and arrays) parses as an unknown op code. Only a string `"1"`
/// selects find-match. Bodies that are not JSON are rejected.
pub fn parse_request(body: &[u8]) -> Result<MatchRequest> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| MatchmakingError::InvalidMatchRequest {
            reason: format!("body is not valid JSON: {}", e),
        })?;

    let fields = match &value {
        Value::Object(fields) => fields,
        _ => {
            return Ok(MatchRequest {
                op_code: OpCode::Unknown(String::new()),
                player_id: String::new(),
            })
        }
    };

    let op_code = match fields.get("opCode") {
        Some(Value::String(raw)) => OpCode::parse(raw),
        Some(other) => OpCode::Unknown(other.to_string()),
        None => OpCode::Unknown(String::new()),
    };

    let player_id = match fields.get("playerId") {
        Some(Value::String(id)) => id.clone(),
        _ => String::new(),
    };

    Ok(MatchRequest { op_code, player_id })
}

/// Entry point for "find match" requests
pub struct MatchRequestHandler {
    queue_selector: QueueSelector,
    search_engine: SessionSearchEngine,
    admission: AdmissionService,
    placement: PlacementOrchestrator,
    settings: MatchmakingSettings,
    metrics_collector: Arc<MetricsCollector>,
}

impl MatchRequestHandler {
    /// Create a handler with its own metrics collector
    pub fn new(backend: Arc<dyn SessionBackendClient>, settings: MatchmakingSettings) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(backend, settings, metrics_collector)
    }

    /// Create a handler that records into a shared metrics collector
    pub fn with_metrics(
        backend: Arc<dyn SessionBackendClient>,
        settings: MatchmakingSettings,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            queue_selector: QueueSelector::new(backend.clone(), settings.queue_page_limit),
            search_engine: SessionSearchEngine::new(backend.clone()),
            admission: AdmissionService::new(backend.clone()),
            placement: PlacementOrchestrator::new(backend, settings.max_player_count),
            settings,
            metrics_collector,
        }
    }

    pub fn settings(&self) -> &MatchmakingSettings {
        &self.settings
    }

    /// Handle a raw request body and produce the response
    pub async fn handle(&self, body: &[u8]) -> HandlerResponse {
        let timer = self.metrics_collector.start_timer();

        let result = match parse_request(body) {
            Ok(request) => self.process(request).await,
            Err(e) => Err(e),
        };

        let response = match result {
            Ok(outcome) => {
                self.metrics_collector
                    .record_match_request(outcome_label(&outcome), timer.stop());
                match outcome_body(&outcome) {
                    Ok(body) => HandlerResponse::ok(body),
                    Err(e) => {
                        error!("Failed to serialize response: {}", e);
                        HandlerResponse::from_error(&e)
                    }
                }
            }
            Err(e) => {
                let response = HandlerResponse::from_error(&e);
                let label = response.body["error"].as_str().unwrap_or("internal_error");
                self.metrics_collector
                    .record_match_request(label, timer.stop());
                warn!("Match request failed ({}): {}", response.status_code, e);
                response
            }
        };

        debug!("Responding with status {}", response.status_code);
        response
    }

    /// Dispatch a parsed request by op code
    pub async fn process(&self, request: MatchRequest) -> Result<MatchOutcome> {
        match request.op_code {
            OpCode::FindMatch => {
                if request.player_id.is_empty() {
                    return Err(MatchmakingError::InvalidMatchRequest {
                        reason: "playerId is required".to_string(),
                    }
                    .into());
                }
                self.find_match(&request.player_id).await
            }
            OpCode::Unknown(raw) => {
                debug!("Ignoring request with unknown op code '{}'", raw);
                Ok(MatchOutcome::NoOp)
            }
        }
    }

    /// Join the oldest joinable session, or request a new one
    #[tracing::instrument(name = "find_match", skip(self))]
    pub async fn find_match(&self, player_id: &str) -> Result<MatchOutcome> {
        let start_time = Instant::now();
        let queue_name = &self.settings.target_queue_name;

        let queue = match self.queue_selector.select_queue(queue_name).await? {
            QueueSelection::Found(queue) => queue,
            QueueSelection::NotFound => {
                error!("Routing queue '{}' could not be resolved", queue_name);
                return Err(MatchmakingError::QueueNotFound {
                    queue_name: queue_name.clone(),
                }
                .into());
            }
        };

        let destination = queue.first_destination().ok_or_else(|| {
            error!("Routing queue '{}' has no destinations", queue.name);
            MatchmakingError::QueueHasNoDestinations {
                queue_name: queue.name.clone(),
            }
        })?;

        let outcome = match self.search_engine.find_joinable_session(destination).await? {
            Some(session) => {
                match self
                    .admission
                    .admit_player(player_id, &session.game_session_id)
                    .await
                {
                    Some(admission) => MatchOutcome::Joined(JoinedSession::new(admission, &session)),
                    None if self.settings.fallback_to_placement => {
                        warn!(
                            "Could not join {}, requesting a placement instead",
                            session.game_session_id
                        );
                        self.metrics_collector.record_admission_fallback();
                        MatchOutcome::Placed(
                            self.placement
                                .request_placement(&queue.name, player_id)
                                .await?,
                        )
                    }
                    None => {
                        return Err(MatchmakingError::AdmissionFailed {
                            player_id: player_id.to_string(),
                            game_session_id: session.game_session_id,
                        }
                        .into())
                    }
                }
            }
            None => MatchOutcome::Placed(
                self.placement
                    .request_placement(&queue.name, player_id)
                    .await?,
            ),
        };

        info!(
            "Find match for '{}' completed as {} in {:.2}ms",
            player_id,
            outcome_label(&outcome),
            start_time.elapsed().as_secs_f64() * 1000.0
        );

        Ok(outcome)
    }
}

fn outcome_label(outcome: &MatchOutcome) -> &'static str {
    match outcome {
        MatchOutcome::NoOp => "noop",
        MatchOutcome::Joined(_) => "joined",
        MatchOutcome::Placed(_) => "placed",
    }
}

fn outcome_body(outcome: &MatchOutcome) -> Result<Value> {
    let body = match outcome {
        MatchOutcome::NoOp => json!({}),
        MatchOutcome::Joined(joined) => serde_json::to_value(joined)?,
        MatchOutcome::Placed(placement) => serde_json::to_value(placement)?,
    };
    Ok(body)
}
