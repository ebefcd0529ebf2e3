//! GameLift-compatible JSON client
//!
//! Speaks the JSON 1.1 protocol: every operation is a `POST /` with the
//! operation named in `X-Amz-Target` and PascalCase request/response bodies.
//! Request signing is left to the deployment (a signing proxy, or an
//! unauthenticated local endpoint).

use crate::backend::client::{SessionBackendClient, SessionSearch, JOINABLE_SESSION_FILTER};
use crate::error::{MatchmakingError, Result};
use crate::types::{GameSession, PlacementRequest, PlacementResult, PlayerAdmission, RoutingQueue};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const TARGET_PREFIX: &str = "GameLift";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

const OP_SEARCH_GAME_SESSIONS: &str = "SearchGameSessions";
const OP_DESCRIBE_QUEUES: &str = "DescribeGameSessionQueues";
const OP_START_PLACEMENT: &str = "StartGameSessionPlacement";
const OP_CREATE_PLAYER_SESSION: &str = "CreatePlayerSession";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SearchGameSessionsInput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    alias_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fleet_id: Option<&'a str>,
    filter_expression: &'a str,
    sort_expression: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchGameSessionsOutput {
    #[serde(default)]
    game_sessions: Vec<GameSession>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeQueuesInput {
    limit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeQueuesOutput {
    #[serde(default)]
    game_session_queues: Vec<RoutingQueue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DesiredPlayerSession<'a> {
    player_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartPlacementInput<'a> {
    game_session_queue_name: &'a str,
    placement_id: String,
    maximum_player_session_count: u32,
    desired_player_sessions: Vec<DesiredPlayerSession<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartPlacementOutput {
    game_session_placement: PlacementResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreatePlayerSessionInput<'a> {
    game_session_id: &'a str,
    player_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreatePlayerSessionOutput {
    player_session: PlayerAdmission,
}

/// Error body returned by the service, e.g. `{"__type": "...", "message": "..."}`
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

impl ServiceErrorBody {
    fn describe(&self, status: StatusCode) -> String {
        match (&self.error_type, &self.message) {
            (Some(kind), Some(message)) => format!("{} {}: {}", status, kind, message),
            (Some(kind), None) => format!("{} {}", status, kind),
            (None, Some(message)) => format!("{}: {}", status, message),
            (None, None) => status.to_string(),
        }
    }
}

/// Thin wrapper around reqwest for session backend calls
#[derive(Clone)]
pub struct GameLiftHttpClient {
    http: Client,
    endpoint: String,
}

impl GameLiftHttpClient {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| MatchmakingError::ConfigurationError {
                message: format!("Failed to build backend HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<I, O>(&self, operation: &str, input: &I) -> Result<O>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        debug!("Backend call {} -> {}", operation, self.endpoint);

        let res = self
            .http
            .post(&self.endpoint)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, operation))
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .json(input)
            .send()
            .await
            .map_err(|e| MatchmakingError::backend(operation, e))?;
        let status = res.status();

        // Keep the service's error type and message for the logs.
        if !status.is_success() {
            let detail = res
                .json::<ServiceErrorBody>()
                .await
                .map(|body| body.describe(status))
                .unwrap_or_else(|_| status.to_string());
            return Err(MatchmakingError::backend(operation, detail).into());
        }

        res.json::<O>()
            .await
            .map_err(|e| MatchmakingError::backend(operation, format!("decode error: {}", e)).into())
    }
}

#[async_trait]
impl SessionBackendClient for GameLiftHttpClient {
    async fn search_sessions(&self, search: SessionSearch) -> Result<Vec<GameSession>> {
        let target = search.destination.destination_arn.as_str();
        let (alias_id, fleet_id) = if search.destination.is_alias() {
            (Some(target), None)
        } else {
            (None, Some(target))
        };

        let input = SearchGameSessionsInput {
            alias_id,
            fleet_id,
            filter_expression: &search.filter_expression,
            sort_expression: &search.sort_expression,
        };

        let output: SearchGameSessionsOutput = self.call(OP_SEARCH_GAME_SESSIONS, &input).await?;

        // The wire shape has no availability attribute. Sessions returned for
        // the joinable filter were matched by the service, anything else is
        // judged from its player counts.
        let joinable_filter = search.filter_expression == JOINABLE_SESSION_FILTER;
        Ok(output
            .game_sessions
            .into_iter()
            .map(|mut session| {
                session.has_available_player_sessions = joinable_filter
                    || session.current_player_session_count
                        < session.maximum_player_session_count;
                session
            })
            .collect())
    }

    async fn describe_routing_queues(&self, limit: u32) -> Result<Vec<RoutingQueue>> {
        let output: DescribeQueuesOutput = self
            .call(OP_DESCRIBE_QUEUES, &DescribeQueuesInput { limit })
            .await?;
        Ok(output.game_session_queues)
    }

    async fn request_placement(&self, request: PlacementRequest) -> Result<PlacementResult> {
        let input = StartPlacementInput {
            game_session_queue_name: &request.queue_name,
            placement_id: request.placement_id.to_string(),
            maximum_player_session_count: request.max_players,
            desired_player_sessions: request
                .desired_players
                .iter()
                .map(|p| DesiredPlayerSession {
                    player_id: &p.player_id,
                })
                .collect(),
        };

        let output: StartPlacementOutput = self.call(OP_START_PLACEMENT, &input).await?;
        Ok(output.game_session_placement)
    }

    async fn admit_player(
        &self,
        game_session_id: &str,
        player_id: &str,
    ) -> Result<PlayerAdmission> {
        let input = CreatePlayerSessionInput {
            game_session_id,
            player_id,
        };

        let output: CreatePlayerSessionOutput =
            self.call(OP_CREATE_PLAYER_SESSION, &input).await?;
        Ok(output.player_session)
    }
}
