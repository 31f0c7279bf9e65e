//! Maps a `--task` name to a built-in demo [`Task`]. Real workloads are
//! expected to be supplied by embedding `pulsegen-core` directly; these two
//! are here only so the CLI binary is runnable end-to-end out of the box
//! (spec.md §6 out-of-scope note: "HTTP/DB/gRPC example tasks... are thin
//! adapters over the core and contribute no novel engineering").

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use miette::Result;
use pulsegen_core::task::{Task, TaskError, TaskResult};

/// Does nothing and always succeeds; useful for exercising the engine,
/// rate controller, and exporters without any workload of its own.
struct NoopTask;

impl Task for NoopTask {
    fn execute(&self, _iteration: u64) -> TaskResult {
        TaskResult::Success(serde_json::Value::Null)
    }
}

/// Sleeps for a fixed latency per invocation and fails a configured
/// fraction of the time, deterministically, so `--task synthetic-latency`
/// runs are reproducible across invocations with the same flags.
struct SyntheticLatencyTask {
    latency: Duration,
    failure_rate: f64,
    counter: AtomicU64,
}

impl Task for SyntheticLatencyTask {
    fn execute(&self, iteration: u64) -> TaskResult {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        if self.failure_rate > 0.0 && pseudo_random_unit(&self.counter) < self.failure_rate {
            TaskResult::Failure(TaskError::new(format!(
                "synthetic failure at iteration {iteration}"
            )))
        } else {
            TaskResult::Success(serde_json::json!({ "iteration": iteration }))
        }
    }
}

/// Deterministic xorshift PRNG — avoids pulling in `rand` for a CLI demo task.
fn pseudo_random_unit(counter: &AtomicU64) -> f64 {
    let mut x = counter
        .fetch_add(1, Ordering::Relaxed)
        .wrapping_add(0x9E3779B97F4A7C15);
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    (x % 10_000) as f64 / 10_000.0
}

pub fn build_task(name: &str, latency_ms: u64, failure_rate: f64) -> Result<Arc<dyn Task>> {
    match name {
        "noop" => Ok(Arc::new(NoopTask)),
        "synthetic-latency" => Ok(Arc::new(SyntheticLatencyTask {
            latency: Duration::from_millis(latency_ms),
            failure_rate,
            counter: AtomicU64::new(1),
        })),
        other => Err(miette::miette!(
            "unknown task '{}': expected one of noop, synthetic-latency",
            other
        )),
    }
}
