use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use pulsegen_core::adaptive::{Adaptive, AdaptiveConfig};
use pulsegen_core::backpressure::QueueDepthBackpressure;
use pulsegen_core::metrics::SnapshotProvider;
use pulsegen_core::pattern::LoadPattern;

struct FixedMetrics {
    total_executions: AtomicU64,
}

impl SnapshotProvider for FixedMetrics {
    fn failure_rate(&self) -> f64 {
        0.001
    }
    fn total_executions(&self) -> u64 {
        self.total_executions.fetch_add(1, Ordering::Relaxed)
    }
    fn elapsed_ms(&self) -> i64 {
        0
    }
    fn recent_failure_rate(&self, _window_seconds: u64) -> f64 {
        0.001
    }
}

fn bench_adaptive_tick(c: &mut Criterion) {
    let config = AdaptiveConfig::new(100.0, 10.0, 5_000.0, 50.0, 100.0, 1, 10_000, 3, 0.5).unwrap();
    let metrics = Arc::new(FixedMetrics {
        total_executions: AtomicU64::new(0),
    });
    let backpressure = Arc::new(QueueDepthBackpressure::new(1_000));
    let pattern = Adaptive::new(config, metrics, backpressure, Duration::from_secs(3600));

    let mut elapsed_ms: i64 = 0;
    c.bench_function("adaptive_decision_tick", |b| {
        b.iter(|| {
            elapsed_ms += 1;
            pattern.target_tps(elapsed_ms)
        })
    });
}

criterion_group!(benches, bench_adaptive_tick);
criterion_main!(benches);
