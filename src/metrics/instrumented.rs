//! Backend decorator that records call counts and latencies

use crate::backend::{SessionBackendClient, SessionSearch};
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::types::{GameSession, PlacementRequest, PlacementResult, PlayerAdmission, RoutingQueue};
use async_trait::async_trait;
use std::sync::Arc;

/// Wraps a backend client and records every call into a `MetricsCollector`
pub struct InstrumentedBackend {
    inner: Arc<dyn SessionBackendClient>,
    metrics_collector: Arc<MetricsCollector>,
}

impl InstrumentedBackend {
    pub fn new(
        inner: Arc<dyn SessionBackendClient>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            inner,
            metrics_collector,
        }
    }

    fn observe<T>(&self, operation: &str, timer: crate::metrics::MetricsTimer, result: &Result<T>) {
        self.metrics_collector
            .record_backend_call(operation, result.is_ok(), timer.stop());
    }
}

#[async_trait]
impl SessionBackendClient for InstrumentedBackend {
    async fn search_sessions(&self, search: SessionSearch) -> Result<Vec<GameSession>> {
        let timer = self.metrics_collector.start_timer();
        let result = self.inner.search_sessions(search).await;
        self.observe("SearchGameSessions", timer, &result);
        result
    }

    async fn describe_routing_queues(&self, limit: u32) -> Result<Vec<RoutingQueue>> {
        let timer = self.metrics_collector.start_timer();
        let result = self.inner.describe_routing_queues(limit).await;
        self.observe("DescribeGameSessionQueues", timer, &result);
        result
    }

    async fn request_placement(&self, request: PlacementRequest) -> Result<PlacementResult> {
        let timer = self.metrics_collector.start_timer();
        let result = self.inner.request_placement(request).await;
        self.observe("StartGameSessionPlacement", timer, &result);
        result
    }

    async fn admit_player(
        &self,
        game_session_id: &str,
        player_id: &str,
    ) -> Result<PlayerAdmission> {
        let timer = self.metrics_collector.start_timer();
        let result = self.inner.admit_player(game_session_id, player_id).await;
        self.observe("CreatePlayerSession", timer, &result);
        result
    }
}
