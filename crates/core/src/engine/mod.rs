//! `ExecutionEngine` (spec.md §4.1): owns the worker pool, drives the
//! per-invocation release loop at the pattern's target TPS, and
//! orchestrates shutdown.

mod worker_pool;

pub use worker_pool::{CooperativePool, Job, PooledPool, WorkerPool};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::backpressure::QueueDepthBackpressure;
use crate::error::EngineError;
use crate::metrics::{AggregatedSnapshot, MetricsCollector};
use crate::pattern::LoadPattern;
use crate::shutdown::ShutdownCoordinator;
use crate::task::{ExecutionRecord, Task, ThreadStrategy};

/// Also used by callers (e.g. the CLI) as the default bound for an
/// externally-constructed `QueueDepthBackpressure` shared with the engine.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4_096;
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_FORCE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
    Stopping,
}

fn build_pool(strategy: ThreadStrategy) -> Box<dyn WorkerPool> {
    match strategy.resolve(ThreadStrategy::Cooperative) {
        ThreadStrategy::Cooperative => Box::new(CooperativePool::new()),
        ThreadStrategy::Pooled(workers) => Box::new(PooledPool::new(workers, DEFAULT_QUEUE_CAPACITY)),
        ThreadStrategy::Inherited => unreachable!("resolve() against a concrete fallback never returns Inherited"),
    }
}

pub struct ExecutionEngine<P: LoadPattern> {
    task: Arc<dyn Task>,
    pattern: P,
    rate: crate::rate::RateController,
    collector: Arc<MetricsCollector>,
    backpressure: Arc<QueueDepthBackpressure>,
    pool: Box<dyn WorkerPool>,
    shutdown: ShutdownCoordinator,
    state: RwLock<EngineState>,
    cancelled: AtomicBool,
    shutdown_degraded: AtomicBool,
    start: Instant,
    drain_timeout: Duration,
    force_timeout: Duration,
}

impl<P: LoadPattern> ExecutionEngine<P> {
    pub fn new(task: Arc<dyn Task>, pattern: P, collector: Arc<MetricsCollector>) -> Self {
        let pool = build_pool(task.thread_strategy());
        Self {
            task,
            pattern,
            rate: crate::rate::RateController::new(),
            collector,
            backpressure: Arc::new(QueueDepthBackpressure::new(DEFAULT_QUEUE_CAPACITY as u64)),
            pool,
            shutdown: ShutdownCoordinator::default(),
            state: RwLock::new(EngineState::Stopped),
            cancelled: AtomicBool::new(false),
            shutdown_degraded: AtomicBool::new(false),
            start: Instant::now(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            force_timeout: DEFAULT_FORCE_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, drain_timeout: Duration, force_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self.force_timeout = force_timeout;
        self
    }

    /// Replaces the engine's default queue-depth backpressure with an
    /// externally-owned one, so a caller can hand the same `Arc` to an
    /// `Adaptive` pattern and have it observe the depth this engine
    /// actually ticks (see `backpressure()`).
    pub fn with_backpressure(mut self, backpressure: Arc<QueueDepthBackpressure>) -> Self {
        self.backpressure = backpressure;
        self
    }

    pub fn backpressure(&self) -> Arc<QueueDepthBackpressure> {
        self.backpressure.clone()
    }

    pub fn state(&self) -> EngineState {
        *self.state.read()
    }

    /// True if the drain/force-terminate sequence had to fall back to
    /// forced termination and even that didn't converge in time. Checked
    /// by callers (e.g. the CLI) that map this to a distinct exit code.
    pub fn shutdown_degraded(&self) -> bool {
        self.shutdown_degraded.load(Ordering::Acquire)
    }

    /// Idempotent: requests the run loop exit as soon as it next checks,
    /// without blocking. `run()` still performs the drain/force/callback
    /// sequence on its way out.
    pub fn close(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn register_shutdown_callback(
        &self,
        name: impl Into<String>,
        run: impl FnOnce() -> Result<(), String> + Send + 'static,
    ) {
        self.shutdown.register(name, run);
    }

    fn now_nanos(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    /// Runs to completion, cancellation (`close()`), or task init failure.
    pub fn run(&self) -> Result<AggregatedSnapshot, EngineError> {
        if let Err(err) = self.task.init() {
            tracing::error!(error = %err, "task init failed, engine never entered RUNNING");
            return Err(EngineError::TaskInit(err.message));
        }

        *self.state.write() = EngineState::Running;
        let span = tracing::info_span!("engine_run");
        let _entered = span.enter();

        let total_ms = self.pattern.total_duration().as_millis() as i64;
        let mut iteration: u64 = 0;

        loop {
            if self.cancelled.load(Ordering::Acquire) {
                break;
            }
            let elapsed = self.rate.elapsed_millis();
            if elapsed >= total_ms {
                break;
            }

            let target_tps = self.pattern.target_tps(elapsed);
            self.rate.wait_for_next(target_tps);

            let submit_time_nanos = self.now_nanos();
            let should_record = self.pattern.should_record_metrics(elapsed);
            let task = self.task.clone();
            let collector = self.collector.clone();
            let start_ref = self.start;
            let it = iteration;

            self.pool.submit(Box::new(move || {
                let start_time_nanos = start_ref.elapsed().as_nanos() as u64;
                let outcome = task.execute(it);
                let end_time_nanos = start_ref.elapsed().as_nanos() as u64;
                if should_record {
                    let record = ExecutionRecord {
                        iteration: it,
                        submit_time_nanos,
                        start_time_nanos,
                        end_time_nanos,
                        outcome,
                    };
                    collector.record(&record);
                }
            }));

            self.backpressure.set_depth(self.pool.queue_depth());
            iteration += 1;
        }

        *self.state.write() = EngineState::Stopping;
        if let Err(err) = self
            .shutdown
            .shutdown(self.pool.as_ref(), self.drain_timeout, self.force_timeout)
        {
            tracing::error!(error = %err, "shutdown did not converge cleanly");
            self.shutdown_degraded.store(true, Ordering::Release);
        }

        if let Err(err) = self.task.teardown() {
            tracing::warn!(error = %err, "task teardown failed; snapshot result unaffected");
        }

        self.collector.close();
        *self.state.write() = EngineState::Stopped;
        Ok(self.collector.snapshot(self.pool.queue_depth()))
    }
}
