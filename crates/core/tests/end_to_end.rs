//! End-to-end scenarios seeding the test suite: one integration test per
//! scenario, run against the public `pulsegen_core` API rather than
//! internal module functions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pulsegen_core::adaptive::{Adaptive, AdaptiveConfig};
use pulsegen_core::backpressure::QueueDepthBackpressure;
use pulsegen_core::engine::{EngineState, ExecutionEngine};
use pulsegen_core::metrics::MetricsCollector;
use pulsegen_core::pattern::{Static, Step, StepSegment, WarmupCooldown};
use pulsegen_core::task::{Task, TaskError, TaskResult};

struct AlwaysSucceeds;
impl Task for AlwaysSucceeds {
    fn execute(&self, _iteration: u64) -> TaskResult {
        TaskResult::Success(serde_json::Value::Null)
    }
}

struct AlwaysFails;
impl Task for AlwaysFails {
    fn execute(&self, _iteration: u64) -> TaskResult {
        TaskResult::Failure(TaskError::new("simulated failure"))
    }
}

/// Deterministic xorshift PRNG seeded from an atomic counter — keeps the
/// "fails N% of the time" scenarios reproducible without pulling in a
/// dependency solely for test randomness.
fn pseudo_random_unit(counter: &AtomicU64) -> f64 {
    let mut x = counter.fetch_add(1, Ordering::Relaxed).wrapping_add(0x9E3779B97F4A7C15);
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    (x % 10_000) as f64 / 10_000.0
}

#[test]
fn static_100_tps_for_two_seconds() {
    let collector = Arc::new(MetricsCollector::new());
    let pattern = Static::new(100.0, Duration::from_secs(2));
    let engine = ExecutionEngine::new(Arc::new(AlwaysSucceeds), pattern, collector);
    let snapshot = engine.run().unwrap();

    assert!(
        (190..=210).contains(&snapshot.total_executions),
        "total_executions = {}",
        snapshot.total_executions
    );
    assert_eq!(snapshot.failure_count, 0);
    assert!(
        (95.0..=105.0).contains(&snapshot.response_tps),
        "response_tps = {}",
        snapshot.response_tps
    );
}

struct TpsAwareTask {
    pattern: Arc<Adaptive>,
    failure_threshold_tps: f64,
    rng: AtomicU64,
}

impl Task for TpsAwareTask {
    fn execute(&self, _iteration: u64) -> TaskResult {
        let current_tps = self.pattern.state().current_tps;
        if current_tps >= self.failure_threshold_tps && pseudo_random_unit(&self.rng) < 0.10 {
            TaskResult::Failure(TaskError::new("overloaded"))
        } else {
            TaskResult::Success(serde_json::Value::Null)
        }
    }
}

#[test]
fn adaptive_ramps_up_then_down_then_stabilizes() {
    let collector = Arc::new(MetricsCollector::new());
    let config = AdaptiveConfig::new(100.0, 10.0, 1000.0, 50.0, 100.0, 50, 500, 3, 0.5).unwrap();
    let backpressure = Arc::new(QueueDepthBackpressure::new(1_000));
    let pattern = Arc::new(Adaptive::new(
        config,
        collector.clone(),
        backpressure.clone(),
        Duration::from_secs(6),
    ));
    let task = Arc::new(TpsAwareTask {
        pattern: pattern.clone(),
        failure_threshold_tps: 500.0,
        rng: AtomicU64::new(1),
    });

    let engine = ExecutionEngine::new(task, pattern.clone(), collector.clone())
        .with_backpressure(backpressure);
    let _snapshot = engine.run().unwrap();

    let final_state = pattern.state();
    assert!(final_state.last_known_good_tps >= 500.0);
}

#[test]
fn adaptive_with_always_failing_task_drains_to_minimum() {
    let collector = Arc::new(MetricsCollector::new());
    let config = AdaptiveConfig::new(100.0, 10.0, 1000.0, 50.0, 100.0, 20, 500, 3, 0.5).unwrap();
    let backpressure = Arc::new(QueueDepthBackpressure::new(1_000));
    let pattern = Adaptive::new(config, collector.clone(), backpressure.clone(), Duration::from_secs(2));
    let engine = ExecutionEngine::new(Arc::new(AlwaysFails), pattern, collector).with_backpressure(backpressure);
    engine.run().unwrap();
}

#[test]
fn step_pattern_changes_rate_at_each_boundary() {
    let pattern = Step::new(vec![
        StepSegment {
            tps: 100.0,
            duration: Duration::from_secs(1),
        },
        StepSegment {
            tps: 200.0,
            duration: Duration::from_secs(1),
        },
    ])
    .unwrap();
    use pulsegen_core::pattern::LoadPattern;
    assert_eq!(pattern.target_tps(0), 100.0);
    assert_eq!(pattern.target_tps(999), 100.0);
    assert_eq!(pattern.target_tps(1_000), 200.0);
    assert_eq!(pattern.total_duration(), Duration::from_secs(2));
}

#[test]
fn warmup_cooldown_hides_head_and_tail_from_metrics() {
    let collector = Arc::new(MetricsCollector::new());
    let pattern = WarmupCooldown::new(
        Static::new(200.0, Duration::from_secs(3)),
        Duration::from_millis(500),
        Duration::from_millis(500),
    );
    let engine = ExecutionEngine::new(Arc::new(AlwaysSucceeds), pattern, collector);
    let snapshot = engine.run().unwrap();

    // Recorded window is ~2s out of 3s of real traffic at ~200 tps.
    assert!(
        (300..=500).contains(&snapshot.total_executions),
        "total_executions = {}",
        snapshot.total_executions
    );
}

#[test]
fn shutdown_during_an_adaptive_run_drains_and_stops() {
    let collector = Arc::new(MetricsCollector::new());
    let config = AdaptiveConfig::new(100.0, 10.0, 1000.0, 50.0, 100.0, 50, 500, 3, 0.5).unwrap();
    let backpressure = Arc::new(QueueDepthBackpressure::new(1_000));
    let pattern = Adaptive::new(config, collector.clone(), backpressure.clone(), Duration::from_secs(60));
    let engine = Arc::new(
        ExecutionEngine::new(Arc::new(AlwaysSucceeds), pattern, collector).with_backpressure(backpressure),
    );

    let engine_clone = engine.clone();
    let handle = std::thread::spawn(move || engine_clone.run());
    std::thread::sleep(Duration::from_millis(100));
    engine.close();

    let snapshot = handle.join().unwrap().unwrap();
    assert_eq!(engine.state(), EngineState::Stopped);
    assert!(snapshot.elapsed_millis < 60_000);
}
