//! Metrics and monitoring for the session broker
//!
//! Prometheus counters and histograms for request outcomes and backend
//! calls, plus a backend decorator that records every call.

pub mod collector;
pub mod instrumented;

pub use collector::{BackendMetrics, MetricsCollector, MetricsTimer, RequestMetrics};
pub use instrumented::InstrumentedBackend;
