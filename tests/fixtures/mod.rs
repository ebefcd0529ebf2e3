//! Test fixtures for integration testing

#![allow(dead_code)]

use session_broker::backend::InMemorySessionBackend;
use session_broker::config::MatchmakingSettings;
use session_broker::types::{GameSession, GameSessionStatus};
use session_broker::utils::timestamp_from_secs;
use session_broker::MatchRequestHandler;
use std::sync::Arc;

pub const TARGET_QUEUE: &str = "rtgl-queue-2022-1";
pub const DESTINATION: &str = "arn:aws:gamelift:us-east-1::alias/alias-a1b2c3";

/// A session with `open_slots` free out of `max`
pub fn joinable_session(id: &str, created_secs: i64, open_slots: u32, max: u32) -> GameSession {
    GameSession {
        game_session_id: id.to_string(),
        name: Some(format!("{}-name", id)),
        fleet_id: Some("fleet-123".to_string()),
        status: GameSessionStatus::Active,
        has_available_player_sessions: open_slots > 0,
        current_player_session_count: max - open_slots,
        maximum_player_session_count: max,
        creation_time: timestamp_from_secs(created_secs),
        ip_address: Some("192.0.2.10".to_string()),
        dns_name: None,
        port: Some(7777),
    }
}

/// Backend with the target queue routing to one destination
pub fn backend_with_target_queue() -> Arc<InMemorySessionBackend> {
    Arc::new(InMemorySessionBackend::with_queue(TARGET_QUEUE, DESTINATION))
}

pub fn handler_for(backend: Arc<InMemorySessionBackend>) -> MatchRequestHandler {
    MatchRequestHandler::new(backend, MatchmakingSettings::default())
}

pub fn handler_with_settings(
    backend: Arc<InMemorySessionBackend>,
    settings: MatchmakingSettings,
) -> MatchRequestHandler {
    MatchRequestHandler::new(backend, settings)
}

pub fn find_match_body(player_id: &str) -> Vec<u8> {
    serde_json::json!({ "opCode": "1", "playerId": player_id })
        .to_string()
        .into_bytes()
}
