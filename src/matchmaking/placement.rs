//! New session placement

use crate::backend::SessionBackendClient;
use crate::error::Result;
use crate::types::{DesiredPlayer, PlacementRequest, PlacementResult};
use crate::utils::generate_placement_id;
use std::sync::Arc;
use tracing::{error, info};

/// Issues a new-session placement when no joinable session exists.
///
/// Each call carries a freshly generated placement id. The backend result is
/// returned as-is (normally `PENDING`); nothing here polls or retries.
pub struct PlacementOrchestrator {
    backend: Arc<dyn SessionBackendClient>,
    max_players: u32,
}

impl PlacementOrchestrator {
    pub fn new(backend: Arc<dyn SessionBackendClient>, max_players: u32) -> Self {
        Self {
            backend,
            max_players,
        }
    }

    pub async fn request_placement(
        &self,
        queue_name: &str,
        player_id: &str,
    ) -> Result<PlacementResult> {
        let request = PlacementRequest {
            placement_id: generate_placement_id(),
            queue_name: queue_name.to_string(),
            max_players: self.max_players,
            desired_players: vec![DesiredPlayer {
                player_id: player_id.to_string(),
            }],
        };
        let placement_id = request.placement_id;

        info!(
            "Requesting placement {} on queue '{}' for player '{}'",
            placement_id, queue_name, player_id
        );

        match self.backend.request_placement(request).await {
            Ok(result) => {
                info!(
                    "Placement {} submitted with status {:?}",
                    result.placement_id, result.status
                );
                Ok(result)
            }
            Err(e) => {
                error!("Placement {} failed: {}", placement_id, e);
                Err(e)
            }
        }
    }
}
