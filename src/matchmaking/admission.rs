//! Player admission into existing sessions

use crate::backend::SessionBackendClient;
use crate::types::PlayerAdmission;
use std::sync::Arc;
use tracing::{info, warn};

/// Creates a player admission against a chosen session.
///
/// Failures never cross this boundary: they are logged and reported as
/// `None`, leaving the caller to decide what happens next.
pub struct AdmissionService {
    backend: Arc<dyn SessionBackendClient>,
}

impl AdmissionService {
    pub fn new(backend: Arc<dyn SessionBackendClient>) -> Self {
        Self { backend }
    }

    pub async fn admit_player(
        &self,
        player_id: &str,
        game_session_id: &str,
    ) -> Option<PlayerAdmission> {
        if player_id.is_empty() || game_session_id.is_empty() {
            warn!(
                "Refusing admission with empty identifier - player: '{}', session: '{}'",
                player_id, game_session_id
            );
            return None;
        }

        match self.backend.admit_player(game_session_id, player_id).await {
            Ok(admission) => {
                info!(
                    "Player '{}' admitted into {} as {}",
                    player_id, game_session_id, admission.player_session_id
                );
                Some(admission)
            }
            Err(e) => {
                warn!(
                    "Admission of player '{}' into {} failed: {}",
                    player_id, game_session_id, e
                );
                None
            }
        }
    }
}
