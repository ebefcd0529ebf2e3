//! Integration tests for the session broker
//!
//! These tests drive the full find-or-create flow against the in-memory
//! backend:
//! - joining the oldest joinable session
//! - placing a new session when nothing is joinable
//! - queue resolution failures
//! - admission failures and the placement fallback

mod fixtures;

use session_broker::backend::{BackendCall, BackendOperation, InMemorySessionBackend};
use session_broker::config::MatchmakingSettings;
use session_broker::types::{DesiredPlayer, DestinationRef, MatchOutcome, RoutingQueue};
use std::collections::HashSet;
use std::sync::Arc;

use fixtures::{
    backend_with_target_queue, find_match_body, handler_for, handler_with_settings,
    joinable_session, DESTINATION, TARGET_QUEUE,
};

#[tokio::test]
async fn test_joins_oldest_joinable_session() {
    let backend = backend_with_target_queue();
    backend.add_session(DESTINATION, joinable_session("gs-1", 100, 1, 2));
    backend.add_session(DESTINATION, joinable_session("gs-2", 50, 1, 2));

    let handler = handler_for(backend.clone());
    let response = handler.handle(&find_match_body("p1")).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body["GameSessionId"], "gs-2");
    assert_eq!(response.body["PlayerId"], "p1");
    assert_eq!(response.body["PlayerSessionStatus"], "RESERVED");
    assert_eq!(response.body["GameSessionStatus"], "ACTIVE");
    assert!(backend.placement_requests().is_empty());
}

#[tokio::test]
async fn test_full_sessions_are_never_joined() {
    let backend = backend_with_target_queue();
    backend.add_session(DESTINATION, joinable_session("full-old", 10, 0, 2));
    backend.add_session(DESTINATION, joinable_session("open-new", 90, 1, 2));

    let handler = handler_for(backend.clone());
    let response = handler.handle(&find_match_body("p1")).await;

    assert_eq!(response.body["GameSessionId"], "open-new");
}

#[tokio::test]
async fn test_places_new_session_when_none_joinable() {
    let backend = backend_with_target_queue();

    let handler = handler_for(backend.clone());
    let response = handler.handle(&find_match_body("p1")).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(backend.admission_attempts(), 0);

    let requests = backend.placement_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].queue_name, TARGET_QUEUE);
    assert_eq!(requests[0].max_players, 2);
    assert_eq!(
        requests[0].desired_players,
        vec![DesiredPlayer {
            player_id: "p1".to_string()
        }]
    );

    // The body is the placement result exactly as the backend returned it
    let placements = backend.placements();
    assert_eq!(response.body, serde_json::to_value(&placements[0]).unwrap());
    assert_eq!(response.body["Status"], "PENDING");
}

#[tokio::test]
async fn test_backend_calls_are_sequential_and_scoped() {
    let backend = backend_with_target_queue();

    let handler = handler_for(backend.clone());
    handler.handle(&find_match_body("p1")).await;

    let calls = backend.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], BackendCall::DescribeRoutingQueues { limit: 5 });
    match &calls[1] {
        BackendCall::SearchSessions(search) => {
            assert_eq!(search.destination, DestinationRef::new(DESTINATION));
            assert_eq!(search.filter_expression, "hasAvailablePlayerSessions=true");
        }
        other => panic!("expected a session search, got {:?}", other),
    }
    assert!(matches!(calls[2], BackendCall::RequestPlacement(_)));
}

#[tokio::test]
async fn test_only_first_destination_is_searched() {
    let backend = Arc::new(InMemorySessionBackend::new());
    backend.add_queue(RoutingQueue {
        name: TARGET_QUEUE.to_string(),
        arn: None,
        timeout_in_seconds: None,
        destinations: vec![
            DestinationRef::new("alias-first"),
            DestinationRef::new("alias-second"),
        ],
    });
    backend.add_session("alias-second", joinable_session("gs-elsewhere", 1, 1, 2));

    let handler = handler_for(backend.clone());
    let outcome = handler.find_match("p1").await.unwrap();

    assert!(matches!(outcome, MatchOutcome::Placed(_)));
}

#[tokio::test]
async fn test_unknown_queue_is_reported_not_crashed() {
    let backend = Arc::new(InMemorySessionBackend::with_queue(
        "some-other-queue",
        DESTINATION,
    ));

    let handler = handler_for(backend.clone());
    let response = handler.handle(&find_match_body("p1")).await;

    assert_eq!(response.status_code, 404);
    assert_eq!(response.body["error"], "queue_not_found");
    assert!(response.body["message"]
        .as_str()
        .unwrap()
        .contains(TARGET_QUEUE));
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn test_queue_beyond_first_page_is_not_found() {
    let backend = Arc::new(InMemorySessionBackend::new());
    for i in 0..5 {
        backend.add_queue(RoutingQueue {
            name: format!("filler-{}", i),
            arn: None,
            timeout_in_seconds: None,
            destinations: vec![DestinationRef::new("alias-filler")],
        });
    }
    backend.add_queue(RoutingQueue {
        name: TARGET_QUEUE.to_string(),
        arn: None,
        timeout_in_seconds: None,
        destinations: vec![DestinationRef::new(DESTINATION)],
    });

    let handler = handler_for(backend);
    let response = handler.handle(&find_match_body("p1")).await;

    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn test_admission_failure_falls_back_to_placement() {
    let backend = backend_with_target_queue();
    backend.add_session(DESTINATION, joinable_session("gs-1", 100, 1, 2));
    backend.fail(BackendOperation::AdmitPlayer);

    let handler = handler_for(backend.clone());
    let response = handler.handle(&find_match_body("p1")).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(backend.admission_attempts(), 1);
    assert_eq!(backend.placement_requests().len(), 1);

    // Never a fabricated admission
    assert!(response.body.get("PlayerSessionId").is_none());
    assert_eq!(response.body["Status"], "PENDING");
}

#[tokio::test]
async fn test_admission_failure_without_fallback_is_explicit() {
    let backend = backend_with_target_queue();
    backend.add_session(DESTINATION, joinable_session("gs-1", 100, 1, 2));
    backend.fail(BackendOperation::AdmitPlayer);

    let handler = handler_with_settings(
        backend.clone(),
        MatchmakingSettings {
            fallback_to_placement: false,
            ..MatchmakingSettings::default()
        },
    );
    let response = handler.handle(&find_match_body("p1")).await;

    assert_eq!(response.status_code, 409);
    assert_eq!(response.body["error"], "admission_failed");
    assert!(backend.placement_requests().is_empty());
}

#[tokio::test]
async fn test_backend_outage_maps_to_bad_gateway() {
    for operation in [
        BackendOperation::DescribeRoutingQueues,
        BackendOperation::SearchSessions,
        BackendOperation::RequestPlacement,
    ] {
        let backend = backend_with_target_queue();
        backend.fail(operation);

        let handler = handler_for(backend);
        let response = handler.handle(&find_match_body("p1")).await;

        assert_eq!(response.status_code, 502, "operation {:?}", operation);
        assert_eq!(response.body["error"], "backend_unavailable");
    }
}

#[tokio::test]
async fn test_placement_ids_are_unique_across_requests() {
    let backend = backend_with_target_queue();
    let handler = handler_for(backend.clone());

    for i in 0..25 {
        let response = handler.handle(&find_match_body(&format!("p{}", i))).await;
        assert_eq!(response.status_code, 200);
    }

    let ids: HashSet<_> = backend
        .placement_requests()
        .into_iter()
        .map(|r| r.placement_id)
        .collect();
    assert_eq!(ids.len(), 25);
}

#[tokio::test]
async fn test_no_op_requests_leave_backend_untouched() {
    let backend = backend_with_target_queue();
    let handler = handler_for(backend.clone());

    for body in [
        r#"{}"#,
        r#"{"playerId": "p1"}"#,
        r#"{"opCode": "2", "playerId": "p1"}"#,
        r#"{"opCode": null}"#,
        r#"null"#,
        r#"5"#,
        r#"[1,2]"#,
        r#""x""#,
        r#"true"#,
        r#"false"#,
    ] {
        let response = handler.handle(body.as_bytes()).await;
        assert_eq!(response.status_code, 200, "body {}", body);
        assert_eq!(response.body, serde_json::json!({}), "body {}", body);
    }

    assert!(backend.calls().is_empty());
}
