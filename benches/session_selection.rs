//! Performance benchmarks for session selection and the find-match flow

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use session_broker::backend::InMemorySessionBackend;
use session_broker::config::MatchmakingSettings;
use session_broker::matchmaking::select_oldest_joinable;
use session_broker::types::{GameSession, GameSessionStatus};
use session_broker::utils::timestamp_from_secs;
use session_broker::MatchRequestHandler;
use std::sync::Arc;

const QUEUE: &str = "bench-queue";
const DESTINATION: &str = "alias-bench";

fn bench_session(i: u32) -> GameSession {
    GameSession {
        game_session_id: format!("gs-{}", i),
        name: None,
        fleet_id: Some("fleet-bench".to_string()),
        status: GameSessionStatus::Active,
        // every third session is full
        has_available_player_sessions: i % 3 != 0,
        current_player_session_count: 1,
        maximum_player_session_count: 2,
        creation_time: timestamp_from_secs(1_000_000 - i as i64 * 7 % 5_000),
        ip_address: None,
        dns_name: None,
        port: Some(7777),
    }
}

fn bench_select_oldest_joinable(c: &mut Criterion) {
    let sessions: Vec<GameSession> = (0..100).map(bench_session).collect();

    c.bench_function("select_oldest_joinable_100_sessions", |b| {
        b.iter(|| black_box(select_oldest_joinable(black_box(&sessions))))
    });
}

fn bench_find_match_placement(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("find_match_placement", |b| {
        b.iter(|| {
            rt.block_on(async {
                let backend = Arc::new(InMemorySessionBackend::with_queue(QUEUE, DESTINATION));
                let handler = MatchRequestHandler::new(
                    backend,
                    MatchmakingSettings {
                        target_queue_name: QUEUE.to_string(),
                        ..MatchmakingSettings::default()
                    },
                );

                black_box(handler.find_match("bench_player").await)
            })
        })
    });
}

fn bench_find_match_join(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("find_match_join", |b| {
        b.iter(|| {
            rt.block_on(async {
                let backend = Arc::new(InMemorySessionBackend::with_queue(QUEUE, DESTINATION));
                for i in 1..20 {
                    backend.add_session(DESTINATION, bench_session(i));
                }
                let handler = MatchRequestHandler::new(
                    backend,
                    MatchmakingSettings {
                        target_queue_name: QUEUE.to_string(),
                        ..MatchmakingSettings::default()
                    },
                );

                let body = br#"{"opCode":"1","playerId":"bench_player"}"#;
                black_box(handler.handle(body).await)
            })
        })
    });
}

criterion_group!(
    benches,
    bench_select_oldest_joinable,
    bench_find_match_placement,
    bench_find_match_join
);
criterion_main!(benches);
