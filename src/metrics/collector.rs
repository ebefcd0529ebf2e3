//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the session broker: request
//! outcomes, backend call results and latencies.

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the session broker
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Match request metrics
    request_metrics: RequestMetrics,

    /// Session backend metrics
    backend_metrics: BackendMetrics,
}

/// Match request metrics
#[derive(Clone)]
pub struct RequestMetrics {
    /// Total match requests by outcome
    pub match_requests_total: IntCounterVec,

    /// Admissions that lost the race and fell back to a placement
    pub admission_fallbacks_total: IntCounter,

    /// End-to-end request handling time
    pub request_duration: Histogram,
}

/// Session backend metrics
#[derive(Clone)]
pub struct BackendMetrics {
    /// Backend calls by operation and status
    pub backend_calls_total: IntCounterVec,

    /// Backend call durations
    pub backend_call_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let request_metrics = RequestMetrics::new(&registry)?;
        let backend_metrics = BackendMetrics::new(&registry)?;

        Ok(Self {
            registry,
            request_metrics,
            backend_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn requests(&self) -> &RequestMetrics {
        &self.request_metrics
    }

    pub fn backend(&self) -> &BackendMetrics {
        &self.backend_metrics
    }

    /// Record a handled match request
    pub fn record_match_request(&self, outcome: &str, duration: Duration) {
        self.request_metrics
            .match_requests_total
            .with_label_values(&[outcome])
            .inc();

        self.request_metrics
            .request_duration
            .observe(duration.as_secs_f64());
    }

    /// Record an admission that fell back to a placement
    pub fn record_admission_fallback(&self) {
        self.request_metrics.admission_fallbacks_total.inc();
    }

    /// Record a backend call
    pub fn record_backend_call(&self, operation: &str, success: bool, duration: Duration) {
        let status = if success { "success" } else { "error" };

        self.backend_metrics
            .backend_calls_total
            .with_label_values(&[operation, status])
            .inc();

        self.backend_metrics
            .backend_call_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl RequestMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let match_requests_total = IntCounterVec::new(
            Opts::new(
                "session_broker_match_requests_total",
                "Total match requests by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(match_requests_total.clone()))?;

        let admission_fallbacks_total = IntCounter::new(
            "session_broker_admission_fallbacks_total",
            "Failed admissions that fell back to a placement",
        )?;
        registry.register(Box::new(admission_fallbacks_total.clone()))?;

        let request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "session_broker_request_duration_seconds",
                "Match request handling time",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            match_requests_total,
            admission_fallbacks_total,
            request_duration,
        })
    }
}

impl BackendMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let backend_calls_total = IntCounterVec::new(
            Opts::new(
                "session_broker_backend_calls_total",
                "Session backend calls by operation and status",
            ),
            &["operation", "status"],
        )?;
        registry.register(Box::new(backend_calls_total.clone()))?;

        let backend_call_duration = HistogramVec::new(
            HistogramOpts::new(
                "session_broker_backend_call_duration_seconds",
                "Session backend call duration",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(backend_call_duration.clone()))?;

        Ok(Self {
            backend_calls_total,
            backend_call_duration,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_request_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_match_request("joined", Duration::from_millis(12));
        collector.record_match_request("joined", Duration::from_millis(8));
        collector.record_match_request("placed", Duration::from_millis(20));

        let requests = &collector.requests().match_requests_total;
        assert_eq!(requests.with_label_values(&["joined"]).get(), 2);
        assert_eq!(requests.with_label_values(&["placed"]).get(), 1);
        assert_eq!(collector.requests().request_duration.get_sample_count(), 3);
    }

    #[test]
    fn test_backend_call_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_backend_call("SearchGameSessions", true, Duration::from_millis(5));
        collector.record_backend_call("SearchGameSessions", false, Duration::from_millis(5));

        let calls = &collector.backend().backend_calls_total;
        assert_eq!(
            calls
                .with_label_values(&["SearchGameSessions", "error"])
                .get(),
            1
        );
    }

    #[test]
    fn test_registries_are_independent() {
        let a = MetricsCollector::new().unwrap();
        let b = MetricsCollector::new().unwrap();

        a.record_admission_fallback();
        assert_eq!(a.requests().admission_fallbacks_total.get(), 1);
        assert_eq!(b.requests().admission_fallbacks_total.get(), 0);
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.stop() >= Duration::from_millis(10));
    }
}
