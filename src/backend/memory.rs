//! In-process session backend
//!
//! Keeps queues, sessions and placements in memory and records every call.
//! Slot accounting happens at admission time, like the hosted service, so
//! two admissions racing for the last slot resolve to one winner.

use crate::backend::client::{SessionBackendClient, SessionSearch, JOINABLE_SESSION_FILTER};
use crate::error::{MatchmakingError, Result};
use crate::types::{
    DestinationRef, GameSession, PlacementRequest, PlacementResult, PlacementStatus,
    PlayerAdmission, PlayerSessionStatus, RoutingQueue,
};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

/// A call observed by the in-memory backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    SearchSessions(SessionSearch),
    DescribeRoutingQueues { limit: u32 },
    RequestPlacement(PlacementRequest),
    AdmitPlayer {
        game_session_id: String,
        player_id: String,
    },
}

/// Backend operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOperation {
    SearchSessions,
    DescribeRoutingQueues,
    RequestPlacement,
    AdmitPlayer,
}

impl BackendOperation {
    fn name(self) -> &'static str {
        match self {
            BackendOperation::SearchSessions => "SearchGameSessions",
            BackendOperation::DescribeRoutingQueues => "DescribeGameSessionQueues",
            BackendOperation::RequestPlacement => "StartGameSessionPlacement",
            BackendOperation::AdmitPlayer => "CreatePlayerSession",
        }
    }
}

/// Default number of calls and placements kept for inspection
pub const DEFAULT_HISTORY_LIMIT: usize = 1024;

#[derive(Debug, Default)]
struct BackendState {
    queues: Vec<RoutingQueue>,
    /// Sessions keyed by the destination they are reachable through
    sessions: HashMap<String, Vec<GameSession>>,
    placements: VecDeque<PlacementResult>,
    failing: HashSet<BackendOperation>,
    calls: VecDeque<BackendCall>,
    next_player_session: u64,
}

/// Append to a bounded history, dropping the oldest entries past `limit`
fn push_bounded<T>(history: &mut VecDeque<T>, item: T, limit: usize) {
    history.push_back(item);
    while history.len() > limit {
        history.pop_front();
    }
}

/// In-memory session backend for tests and local development
///
/// Call and placement history is bounded so a long-running process serving
/// from this backend does not grow without limit.
#[derive(Debug)]
pub struct InMemorySessionBackend {
    state: RwLock<BackendState>,
    history_limit: usize,
}

impl Default for InMemorySessionBackend {
    fn default() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl InMemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty backend keeping at most `history_limit` calls and placements
    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            state: RwLock::new(BackendState::default()),
            history_limit,
        }
    }

    /// A backend with one queue routing to one destination and no sessions
    pub fn with_queue(queue_name: &str, destination_arn: &str) -> Self {
        let backend = Self::new();
        backend.add_queue(RoutingQueue {
            name: queue_name.to_string(),
            arn: None,
            timeout_in_seconds: Some(600),
            destinations: vec![DestinationRef::new(destination_arn)],
        });
        backend
    }

    pub fn add_queue(&self, queue: RoutingQueue) {
        if let Ok(mut state) = self.state.write() {
            state.queues.push(queue);
        }
    }

    pub fn add_session(&self, destination_arn: &str, session: GameSession) {
        if let Ok(mut state) = self.state.write() {
            state
                .sessions
                .entry(destination_arn.to_string())
                .or_default()
                .push(session);
        }
    }

    /// Make every subsequent call to `operation` fail as unavailable
    pub fn fail(&self, operation: BackendOperation) {
        if let Ok(mut state) = self.state.write() {
            state.failing.insert(operation);
        }
    }

    /// Recorded calls, oldest first, up to the history limit
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state
            .read()
            .map(|state| state.calls.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn placement_requests(&self) -> Vec<PlacementRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::RequestPlacement(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn admission_attempts(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, BackendCall::AdmitPlayer { .. }))
            .count()
    }

    pub fn placements(&self) -> Vec<PlacementResult> {
        self.state
            .read()
            .map(|state| state.placements.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record(&self, call: BackendCall, operation: BackendOperation) -> Result<()> {
        let mut state = self.state.write().map_err(|_| MatchmakingError::InternalError {
            message: "Failed to acquire backend state write lock".to_string(),
        })?;

        push_bounded(&mut state.calls, call, self.history_limit);
        if state.failing.contains(&operation) {
            return Err(MatchmakingError::backend(operation.name(), "injected failure").into());
        }
        Ok(())
    }
}

#[async_trait]
impl SessionBackendClient for InMemorySessionBackend {
    async fn search_sessions(&self, search: SessionSearch) -> Result<Vec<GameSession>> {
        self.record(
            BackendCall::SearchSessions(search.clone()),
            BackendOperation::SearchSessions,
        )?;

        let state = self.state.read().map_err(|_| MatchmakingError::InternalError {
            message: "Failed to acquire backend state read lock".to_string(),
        })?;

        let joinable_only = search.filter_expression == JOINABLE_SESSION_FILTER;
        let mut sessions: Vec<GameSession> = state
            .sessions
            .get(&search.destination.destination_arn)
            .map(|sessions| {
                sessions
                    .iter()
                    .filter(|s| !joinable_only || s.has_available_player_sessions)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        sessions.sort_by_key(|s| s.creation_time);

        Ok(sessions)
    }

    async fn describe_routing_queues(&self, limit: u32) -> Result<Vec<RoutingQueue>> {
        self.record(
            BackendCall::DescribeRoutingQueues { limit },
            BackendOperation::DescribeRoutingQueues,
        )?;

        let state = self.state.read().map_err(|_| MatchmakingError::InternalError {
            message: "Failed to acquire backend state read lock".to_string(),
        })?;

        Ok(state
            .queues
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn request_placement(&self, request: PlacementRequest) -> Result<PlacementResult> {
        self.record(
            BackendCall::RequestPlacement(request.clone()),
            BackendOperation::RequestPlacement,
        )?;

        let mut state = self.state.write().map_err(|_| MatchmakingError::InternalError {
            message: "Failed to acquire backend state write lock".to_string(),
        })?;

        if !state.queues.iter().any(|q| q.name == request.queue_name) {
            return Err(MatchmakingError::backend(
                BackendOperation::RequestPlacement.name(),
                format!("NotFoundException: queue {} does not exist", request.queue_name),
            )
            .into());
        }

        let result = PlacementResult {
            placement_id: request.placement_id,
            game_session_queue_name: request.queue_name,
            status: PlacementStatus::Pending,
            maximum_player_session_count: Some(request.max_players),
            game_session_id: None,
            game_session_arn: None,
            ip_address: None,
            dns_name: None,
            port: None,
            start_time: Some(current_timestamp()),
            end_time: None,
            extra: Default::default(),
        };
        push_bounded(&mut state.placements, result.clone(), self.history_limit);

        Ok(result)
    }

    async fn admit_player(
        &self,
        game_session_id: &str,
        player_id: &str,
    ) -> Result<PlayerAdmission> {
        self.record(
            BackendCall::AdmitPlayer {
                game_session_id: game_session_id.to_string(),
                player_id: player_id.to_string(),
            },
            BackendOperation::AdmitPlayer,
        )?;

        let mut state = self.state.write().map_err(|_| MatchmakingError::InternalError {
            message: "Failed to acquire backend state write lock".to_string(),
        })?;
        let session = state
            .sessions
            .values_mut()
            .flat_map(|sessions| sessions.iter_mut())
            .find(|s| s.game_session_id == game_session_id)
            .ok_or_else(|| {
                MatchmakingError::backend(
                    BackendOperation::AdmitPlayer.name(),
                    format!("NotFoundException: game session {} not found", game_session_id),
                )
            })?;

        if !session.has_available_player_sessions
            || session.current_player_session_count >= session.maximum_player_session_count
        {
            session.has_available_player_sessions = false;
            return Err(MatchmakingError::backend(
                BackendOperation::AdmitPlayer.name(),
                format!("GameSessionFullException: {} is full", game_session_id),
            )
            .into());
        }

        session.current_player_session_count += 1;
        if session.current_player_session_count >= session.maximum_player_session_count {
            session.has_available_player_sessions = false;
        }

        let admission = PlayerAdmission {
            player_session_id: String::new(),
            player_id: player_id.to_string(),
            game_session_id: session.game_session_id.clone(),
            fleet_id: session.fleet_id.clone(),
            status: PlayerSessionStatus::Reserved,
            ip_address: session.ip_address.clone(),
            dns_name: session.dns_name.clone(),
            port: session.port,
            creation_time: Some(current_timestamp()),
            extra: Default::default(),
        };

        // Ids are only handed out for successful admissions
        state.next_player_session += 1;
        Ok(PlayerAdmission {
            player_session_id: format!("psess-{}", state.next_player_session),
            ..admission
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameSessionStatus;
    use crate::utils::{generate_placement_id, timestamp_from_secs};

    fn session(id: &str, max: u32) -> GameSession {
        GameSession {
            game_session_id: id.to_string(),
            name: None,
            fleet_id: Some("fleet-1".to_string()),
            status: GameSessionStatus::Active,
            has_available_player_sessions: true,
            current_player_session_count: 0,
            maximum_player_session_count: max,
            creation_time: timestamp_from_secs(100),
            ip_address: None,
            dns_name: None,
            port: Some(7777),
        }
    }

    #[tokio::test]
    async fn test_last_slot_goes_to_one_player() {
        let backend = InMemorySessionBackend::with_queue("q", "alias-1");
        backend.add_session("alias-1", session("gs-1", 1));

        assert!(backend.admit_player("gs-1", "p1").await.is_ok());
        assert!(backend.admit_player("gs-1", "p2").await.is_err());

        let search = SessionSearch::joinable(DestinationRef::new("alias-1"));
        assert!(backend.search_sessions(search).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_admissions_do_not_consume_ids() {
        let backend = InMemorySessionBackend::with_queue("q", "alias-1");
        backend.add_session("alias-1", session("gs-1", 2));

        assert!(backend.admit_player("gs-missing", "p0").await.is_err());
        let first = backend.admit_player("gs-1", "p1").await.unwrap();
        let second = backend.admit_player("gs-1", "p2").await.unwrap();
        assert!(backend.admit_player("gs-1", "p3").await.is_err());

        assert_eq!(first.player_session_id, "psess-1");
        assert_eq!(second.player_session_id, "psess-2");
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let backend = InMemorySessionBackend::with_history_limit(3);
        backend.add_queue(RoutingQueue {
            name: "q".to_string(),
            arn: None,
            timeout_in_seconds: None,
            destinations: vec![],
        });

        for limit in 1..=5 {
            backend.describe_routing_queues(limit).await.unwrap();
        }
        for _ in 0..5 {
            let request = PlacementRequest {
                placement_id: generate_placement_id(),
                queue_name: "q".to_string(),
                max_players: 2,
                desired_players: vec![],
            };
            backend.request_placement(request).await.unwrap();
        }

        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls
            .iter()
            .all(|call| matches!(call, BackendCall::RequestPlacement(_))));
        assert_eq!(backend.placements().len(), 3);
    }

    #[tokio::test]
    async fn test_queue_limit_and_failure_injection() {
        let backend = InMemorySessionBackend::new();
        for i in 0..7 {
            backend.add_queue(RoutingQueue {
                name: format!("queue-{}", i),
                arn: None,
                timeout_in_seconds: None,
                destinations: vec![],
            });
        }

        assert_eq!(backend.describe_routing_queues(5).await.unwrap().len(), 5);

        backend.fail(BackendOperation::DescribeRoutingQueues);
        assert!(backend.describe_routing_queues(5).await.is_err());
        assert_eq!(backend.calls().len(), 2);
    }

    #[test]
    fn test_placement_into_missing_queue_fails() {
        let backend = InMemorySessionBackend::new();
        let request = PlacementRequest {
            placement_id: generate_placement_id(),
            queue_name: "missing".to_string(),
            max_players: 2,
            desired_players: vec![],
        };

        let err = tokio_test::block_on(backend.request_placement(request)).unwrap_err();
        assert!(err.to_string().contains("NotFoundException"));
        assert!(backend.placements().is_empty());
    }

    #[tokio::test]
    async fn test_placement_is_pending() {
        let backend = InMemorySessionBackend::with_queue("q", "alias-1");
        let request = PlacementRequest {
            placement_id: generate_placement_id(),
            queue_name: "q".to_string(),
            max_players: 2,
            desired_players: vec![],
        };

        let result = backend.request_placement(request.clone()).await.unwrap();
        assert_eq!(result.status, PlacementStatus::Pending);
        assert_eq!(result.placement_id, request.placement_id);
        assert_eq!(backend.placement_requests(), vec![request]);
    }
}
