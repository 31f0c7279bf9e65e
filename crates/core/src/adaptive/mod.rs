//! The adaptive load controller (spec.md §4.3): a `LoadPattern` that
//! rewrites its own `targetTps` output from a metrics/backpressure
//! read-back, tick-gated by `rampInterval`.

mod config;
mod decision;
mod listener;
mod policy;
mod state;

pub use config::AdaptiveConfig;
pub use decision::AdjustmentDecision;
pub use listener::{AdaptiveEvent, AdaptiveListener, AdjustmentReason};
pub use policy::{DefaultRampDecisionPolicy, RampDecisionPolicy};
pub use state::{AdaptiveState, Phase};

use std::sync::Arc;
use std::time::Duration;

use crate::backpressure::BackpressureProvider;
use crate::metrics::{MetricsSnapshot, SnapshotProvider};
use crate::pattern::LoadPattern;
use state::AtomicAdaptiveState;

/// -1 is the "uninitialized" sentinel for `lastAdjustmentMs` (spec.md §3).
const UNINITIALIZED: i64 = -1;

pub struct Adaptive {
    config: AdaptiveConfig,
    policy: Box<dyn RampDecisionPolicy>,
    state: AtomicAdaptiveState,
    listeners: Vec<Box<dyn AdaptiveListener>>,
    metrics: Arc<dyn SnapshotProvider>,
    backpressure: Arc<dyn BackpressureProvider>,
    recent_failure_window_seconds: u64,
    total_duration: Duration,
}

impl Adaptive {
    pub fn new(
        config: AdaptiveConfig,
        metrics: Arc<dyn SnapshotProvider>,
        backpressure: Arc<dyn BackpressureProvider>,
        total_duration: Duration,
    ) -> Self {
        let sentinel = AdaptiveState {
            phase: Phase::RampUp,
            current_tps: config.initial_tps,
            last_adjustment_ms: UNINITIALIZED,
            phase_start_ms: UNINITIALIZED,
            stable_intervals_count: 0,
            last_known_good_tps: config.initial_tps,
            in_recovery: false,
            transition_count: 0,
        };
        Self {
            config,
            policy: Box::new(DefaultRampDecisionPolicy::default()),
            state: AtomicAdaptiveState::new(sentinel),
            listeners: Vec::new(),
            metrics,
            backpressure,
            recent_failure_window_seconds: 10,
            total_duration,
        }
    }

    pub fn with_policy(mut self, policy: impl RampDecisionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_listener(mut self, listener: impl AdaptiveListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn with_recent_failure_window_seconds(mut self, seconds: u64) -> Self {
        self.recent_failure_window_seconds = seconds;
        self
    }

    pub fn state(&self) -> Arc<AdaptiveState> {
        self.state.load()
    }

    fn capture_metrics(&self, elapsed_ms: i64) -> MetricsSnapshot {
        MetricsSnapshot {
            failure_rate: self.metrics.failure_rate(),
            recent_failure_rate: self
                .metrics
                .recent_failure_rate(self.recent_failure_window_seconds),
            backpressure_level: self.backpressure.level(),
            total_executions: self.metrics.total_executions(),
            elapsed_ms,
        }
    }

    fn emit_events(
        &self,
        previous: &AdaptiveState,
        next: &AdaptiveState,
        decision: &AdjustmentDecision,
    ) {
        if next.phase != previous.phase {
            for listener in &self.listeners {
                listener::notify(
                    listener.as_ref(),
                    AdaptiveEvent::PhaseTransition {
                        from: previous.phase,
                        to: next.phase,
                        tps: next.current_tps,
                        reason: decision.reason,
                    },
                );
            }
            if next.phase == Phase::Sustain && decision.reason == AdjustmentReason::StabilityDetected {
                for listener in &self.listeners {
                    listener::notify(
                        listener.as_ref(),
                        AdaptiveEvent::StabilityDetected {
                            tps: next.current_tps,
                        },
                    );
                }
            }
            if next.phase == Phase::RampUp && decision.reason == AdjustmentReason::RecoveryFromMinimum {
                for listener in &self.listeners {
                    listener::notify(
                        listener.as_ref(),
                        AdaptiveEvent::Recovery {
                            last_known_good_tps: previous.last_known_good_tps,
                            recovery_tps: next.current_tps,
                        },
                    );
                }
            }
        }
        if (next.current_tps - previous.current_tps).abs() > f64::EPSILON {
            for listener in &self.listeners {
                listener::notify(
                    listener.as_ref(),
                    AdaptiveEvent::TpsChange {
                        previous: previous.current_tps,
                        new: next.current_tps,
                        phase: next.phase,
                    },
                );
            }
        }
    }
}

impl LoadPattern for Adaptive {
    fn target_tps(&self, elapsed_ms: i64) -> f64 {
        let current = self.state.load();

        if current.last_adjustment_ms == UNINITIALIZED {
            let initialized = AdaptiveState::initial(self.config.initial_tps, elapsed_ms);
            let tps = initialized.current_tps;
            self.state.store(initialized);
            return tps;
        }

        if elapsed_ms - current.last_adjustment_ms < self.config.ramp_interval_ms {
            return current.current_tps;
        }

        let m = self.capture_metrics(elapsed_ms);
        let decision = decision::decide(&current, &self.config, self.policy.as_ref(), &m);
        let next = decision::apply(&current, &decision, &self.config, self.policy.as_ref(), &m, elapsed_ms);
        let new_tps = next.current_tps;

        // Open Question #2: listeners fire strictly after the CAS publish.
        self.state.store(next.clone());
        self.emit_events(&current, &next, &decision);

        new_tps
    }

    fn total_duration(&self) -> Duration {
        self.total_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backpressure::QueueDepthBackpressure;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FixedMetrics {
        failure_rate: f64,
        total_executions: AtomicU64,
    }

    impl SnapshotProvider for FixedMetrics {
        fn failure_rate(&self) -> f64 {
            self.failure_rate
        }
        fn total_executions(&self) -> u64 {
            self.total_executions.load(Ordering::Relaxed)
        }
        fn elapsed_ms(&self) -> i64 {
            0
        }
        fn recent_failure_rate(&self, _window_seconds: u64) -> f64 {
            self.failure_rate
        }
    }

    fn pattern(failure_rate: f64) -> Adaptive {
        let config = AdaptiveConfig::new(100.0, 10.0, 1000.0, 50.0, 100.0, 1_000, 10_000, 3, 0.5).unwrap();
        let metrics = Arc::new(FixedMetrics {
            failure_rate,
            total_executions: AtomicU64::new(1_000),
        });
        let backpressure = Arc::new(QueueDepthBackpressure::new(1_000));
        Adaptive::new(config, metrics, backpressure, Duration::from_secs(60))
    }

    #[test]
    fn first_call_initializes_at_initial_tps() {
        let pattern = pattern(0.0);
        assert_eq!(pattern.target_tps(0), 100.0);
    }

    #[test]
    fn holds_between_ramp_intervals() {
        let pattern = pattern(0.0);
        pattern.target_tps(0);
        assert_eq!(pattern.target_tps(500), 100.0);
    }

    #[test]
    fn ramps_up_once_interval_elapses() {
        let pattern = pattern(0.0);
        pattern.target_tps(0);
        assert_eq!(pattern.target_tps(1_000), 150.0);
    }

    #[test]
    fn always_failing_task_drives_tps_to_minimum() {
        let pattern = pattern(1.0);
        pattern.target_tps(0);
        let mut elapsed = 0;
        let mut last = 100.0;
        for _ in 0..50 {
            elapsed += 1_000;
            last = pattern.target_tps(elapsed);
        }
        assert_eq!(last, 10.0);
        assert!(pattern.state().in_recovery);
    }
}
