//! `AggregatedSnapshot` and the narrow `MetricsSnapshot` decision input
//! (spec.md §3/§4.4).

use serde::Serialize;

/// Immutable value produced by `MetricsCollector::snapshot`. `Serialize`
/// only (no `Deserialize`) — this type flows out to exporters, never back in.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedSnapshot {
    pub total_executions: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub skipped_count: u64,

    pub success_tps: f64,
    pub failure_tps: f64,
    pub response_tps: f64,

    pub success_latency_percentiles_nanos: Vec<(f64, u64)>,
    pub failure_latency_percentiles_nanos: Vec<(f64, u64)>,
    pub queue_wait_percentiles_nanos: Vec<(f64, u64)>,

    pub queue_depth: u64,
    pub elapsed_millis: i64,
}

impl AggregatedSnapshot {
    pub fn failure_rate(&self) -> f64 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.failure_count as f64 / self.total_executions as f64
        }
    }
}

/// Narrow decision input passed to `RampDecisionPolicy` predicates.
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub failure_rate: f64,
    pub recent_failure_rate: f64,
    pub backpressure_level: f64,
    pub total_executions: u64,
    pub elapsed_ms: i64,
}

/// Narrow facade the adaptive controller reads through — deliberately
/// smaller than `AggregatedSnapshot` so the controller can't reach into
/// histogram internals it has no business touching.
pub trait SnapshotProvider: Send + Sync {
    fn failure_rate(&self) -> f64;
    fn total_executions(&self) -> u64;
    fn elapsed_ms(&self) -> i64;
    fn recent_failure_rate(&self, window_seconds: u64) -> f64;
}
