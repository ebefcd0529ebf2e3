//! Session backend client interface
//!
//! The four operations the broker consumes from the session hosting service.
//! Components receive the client as an explicit `Arc<dyn SessionBackendClient>`
//! so tests can substitute a double.

use crate::error::Result;
use crate::types::{
    DestinationRef, GameSession, PlacementRequest, PlacementResult, PlayerAdmission, RoutingQueue,
};
use async_trait::async_trait;

/// Filter applied when searching for joinable sessions
pub const JOINABLE_SESSION_FILTER: &str = "hasAvailablePlayerSessions=true";

/// Oldest sessions first
pub const OLDEST_FIRST_SORT: &str = "creationTimeMillis ASC";

/// Parameters for a session search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSearch {
    pub destination: DestinationRef,
    pub filter_expression: String,
    pub sort_expression: String,
}

impl SessionSearch {
    /// Joinable sessions at `destination`, oldest first
    pub fn joinable(destination: DestinationRef) -> Self {
        Self {
            destination,
            filter_expression: JOINABLE_SESSION_FILTER.to_string(),
            sort_expression: OLDEST_FIRST_SORT.to_string(),
        }
    }
}

/// Typed operations against the session hosting service
///
/// Every failure is reported as `MatchmakingError::BackendUnavailable`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionBackendClient: Send + Sync {
    /// Search game sessions scoped to one destination
    async fn search_sessions(&self, search: SessionSearch) -> Result<Vec<GameSession>>;

    /// Fetch up to `limit` configured routing queues
    async fn describe_routing_queues(&self, limit: u32) -> Result<Vec<RoutingQueue>>;

    /// Submit a new game session placement
    async fn request_placement(&self, request: PlacementRequest) -> Result<PlacementResult>;

    /// Reserve a slot for a player in an existing game session
    async fn admit_player(&self, game_session_id: &str, player_id: &str)
        -> Result<PlayerAdmission>;
}
