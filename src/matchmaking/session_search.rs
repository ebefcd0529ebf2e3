//! Joinable session search and selection policy

use crate::backend::{SessionBackendClient, SessionSearch};
use crate::error::Result;
use crate::types::{DestinationRef, GameSession};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pick the oldest session that still has open player slots.
///
/// Sessions without available slots are never chosen. Ties on creation time
/// keep the earliest entry in `sessions`.
pub fn select_oldest_joinable(sessions: &[GameSession]) -> Option<&GameSession> {
    sessions
        .iter()
        .filter(|s| s.has_available_player_sessions)
        .min_by_key(|s| s.creation_time)
}

/// Queries joinable sessions for a destination and applies the
/// oldest-first selection policy.
///
/// The result is a snapshot; the slot may be gone by the time the caller
/// tries to admit into it.
pub struct SessionSearchEngine {
    backend: Arc<dyn SessionBackendClient>,
}

impl SessionSearchEngine {
    pub fn new(backend: Arc<dyn SessionBackendClient>) -> Self {
        Self { backend }
    }

    pub async fn find_joinable_session(
        &self,
        destination: &DestinationRef,
    ) -> Result<Option<GameSession>> {
        let sessions = self
            .backend
            .search_sessions(SessionSearch::joinable(destination.clone()))
            .await
            .map_err(|e| {
                warn!(
                    "Session search failed for destination {}: {}",
                    destination.destination_arn, e
                );
                e
            })?;

        debug!(
            "Search at {} returned {} sessions",
            destination.destination_arn,
            sessions.len()
        );

        match select_oldest_joinable(&sessions) {
            Some(session) => {
                info!(
                    "Found joinable game session {} ({}/{} players)",
                    session.game_session_id,
                    session.current_player_session_count,
                    session.maximum_player_session_count
                );
                Ok(Some(session.clone()))
            }
            None => {
                info!(
                    "No joinable game sessions at {}",
                    destination.destination_arn
                );
                Ok(None)
            }
        }
    }
}
