//! `MetricsCollector`: the single point every execution record flows
//! through (spec.md §4.4). Counters are plain atomics in the teacher's
//! style; percentile state lives in `LatencyHistogram`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::error::ConfigError;
use crate::metrics::histogram::LatencyHistogram;
use crate::metrics::recent_window::RecentFailureWindow;
use crate::metrics::snapshot::{AggregatedSnapshot, SnapshotProvider};
use crate::task::{ExecutionRecord, TaskResult};

const DEFAULT_QUANTILES: [f64; 6] = [0.5, 0.75, 0.9, 0.95, 0.99, 0.999];
const RECENT_WINDOW_CAPACITY: usize = 256;
const RECENT_WINDOW_MIN_INTERVAL_MS: i64 = 200;

pub struct MetricsCollector {
    start: Instant,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    skipped_count: AtomicU64,
    success_latency: LatencyHistogram,
    failure_latency: LatencyHistogram,
    queue_wait: LatencyHistogram,
    recent: RecentFailureWindow,
    closed: std::sync::atomic::AtomicBool,
    quantiles: Vec<f64>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            skipped_count: AtomicU64::new(0),
            success_latency: LatencyHistogram::new(),
            failure_latency: LatencyHistogram::new(),
            queue_wait: LatencyHistogram::new(),
            recent: RecentFailureWindow::new(RECENT_WINDOW_CAPACITY, RECENT_WINDOW_MIN_INTERVAL_MS),
            closed: std::sync::atomic::AtomicBool::new(false),
            quantiles: DEFAULT_QUANTILES.to_vec(),
        }
    }

    /// Same as `new`, but reporting `quantiles` in place of the default set
    /// (spec.md §4.4). Each value must lie strictly in `(0, 1)`.
    pub fn with_quantiles(quantiles: Vec<f64>) -> Result<Self, ConfigError> {
        for &value in &quantiles {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::InvalidPercentile { value });
            }
        }
        Ok(Self {
            quantiles,
            ..Self::new()
        })
    }

    pub fn elapsed_millis(&self) -> i64 {
        self.start.elapsed().as_millis() as i64
    }

    /// Fold a single execution record into the running counters. A no-op
    /// after `close()`.
    pub fn record(&self, record: &ExecutionRecord) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        self.queue_wait.record(record.queue_wait_nanos());
        match &record.outcome {
            TaskResult::Success(_) => {
                self.success_count.fetch_add(1, Ordering::Relaxed);
                self.success_latency.record(record.latency_nanos());
            }
            TaskResult::Failure(_) => {
                self.failure_count.fetch_add(1, Ordering::Relaxed);
                self.failure_latency.record(record.latency_nanos());
            }
            TaskResult::Skipped(_) => {
                self.skipped_count.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.recent.sample(
            self.elapsed_millis(),
            self.total_executions(),
            self.failure_count.load(Ordering::Relaxed),
        );
    }

    pub fn total_executions(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
            + self.failure_count.load(Ordering::Relaxed)
            + self.skipped_count.load(Ordering::Relaxed)
    }

    /// Stops further `record` calls from mutating state; existing counters
    /// remain readable through `snapshot`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn snapshot(&self, queue_depth: u64) -> AggregatedSnapshot {
        let elapsed_millis = self.elapsed_millis();
        let elapsed_secs = (elapsed_millis as f64 / 1000.0).max(1e-9);
        let success = self.success_count.load(Ordering::Relaxed);
        let failure = self.failure_count.load(Ordering::Relaxed);
        let skipped = self.skipped_count.load(Ordering::Relaxed);

        AggregatedSnapshot {
            total_executions: success + failure + skipped,
            success_count: success,
            failure_count: failure,
            skipped_count: skipped,
            success_tps: success as f64 / elapsed_secs,
            failure_tps: failure as f64 / elapsed_secs,
            response_tps: (success + failure) as f64 / elapsed_secs,
            success_latency_percentiles_nanos: self.success_latency.percentiles(&self.quantiles),
            failure_latency_percentiles_nanos: self.failure_latency.percentiles(&self.quantiles),
            queue_wait_percentiles_nanos: self.queue_wait.percentiles(&self.quantiles),
            queue_depth,
            elapsed_millis,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotProvider for MetricsCollector {
    fn failure_rate(&self) -> f64 {
        let total = self.total_executions();
        if total == 0 {
            0.0
        } else {
            self.failure_count.load(Ordering::Relaxed) as f64 / total as f64
        }
    }

    fn total_executions(&self) -> u64 {
        MetricsCollector::total_executions(self)
    }

    fn elapsed_ms(&self) -> i64 {
        self.elapsed_millis()
    }

    fn recent_failure_rate(&self, window_seconds: u64) -> f64 {
        self.recent
            .recent_failure_rate(self.elapsed_millis(), window_seconds as i64 * 1000)
            .unwrap_or_else(|| self.failure_rate())
    }
}
