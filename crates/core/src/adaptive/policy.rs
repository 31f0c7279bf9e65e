//! `RampDecisionPolicy` (spec.md §3): three pure predicates over a
//! `MetricsSnapshot`. Threshold/violation shape mirrors the teacher's
//! `Guardrails`/`Violation` pair in its safety-executor module.

use crate::metrics::MetricsSnapshot;

pub trait RampDecisionPolicy: Send + Sync {
    fn should_ramp_down(&self, m: &MetricsSnapshot) -> bool;
    fn should_ramp_up(&self, m: &MetricsSnapshot) -> bool;
    fn can_recover_from_minimum(&self, m: &MetricsSnapshot) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultRampDecisionPolicy {
    pub error_threshold: f64,
    pub ramp_down_threshold: f64,
    pub ramp_up_threshold: f64,
}

impl Default for DefaultRampDecisionPolicy {
    fn default() -> Self {
        Self {
            error_threshold: 0.01,
            ramp_down_threshold: 0.7,
            ramp_up_threshold: 0.3,
        }
    }
}

impl RampDecisionPolicy for DefaultRampDecisionPolicy {
    fn should_ramp_down(&self, m: &MetricsSnapshot) -> bool {
        m.failure_rate >= self.error_threshold || m.backpressure_level >= self.ramp_down_threshold
    }

    fn should_ramp_up(&self, m: &MetricsSnapshot) -> bool {
        m.failure_rate < self.error_threshold && m.backpressure_level <= self.ramp_up_threshold
    }

    fn can_recover_from_minimum(&self, m: &MetricsSnapshot) -> bool {
        m.recent_failure_rate < self.error_threshold && m.backpressure_level <= self.ramp_up_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(failure_rate: f64, recent_failure_rate: f64, backpressure_level: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            failure_rate,
            recent_failure_rate,
            backpressure_level,
            total_executions: 100,
            elapsed_ms: 1_000,
        }
    }

    #[test]
    fn ramps_down_on_failure_rate_alone() {
        let policy = DefaultRampDecisionPolicy::default();
        assert!(policy.should_ramp_down(&snapshot(0.02, 0.0, 0.0)));
    }

    #[test]
    fn ramps_down_on_backpressure_alone() {
        let policy = DefaultRampDecisionPolicy::default();
        assert!(policy.should_ramp_down(&snapshot(0.0, 0.0, 0.8)));
    }

    #[test]
    fn ramps_up_only_when_both_signals_are_clean() {
        let policy = DefaultRampDecisionPolicy::default();
        assert!(policy.should_ramp_up(&snapshot(0.0, 0.0, 0.1)));
        assert!(!policy.should_ramp_up(&snapshot(0.02, 0.0, 0.1)));
        assert!(!policy.should_ramp_up(&snapshot(0.0, 0.0, 0.5)));
    }

    #[test]
    fn recovery_uses_recent_failure_rate_not_failure_rate() {
        let policy = DefaultRampDecisionPolicy::default();
        assert!(policy.can_recover_from_minimum(&snapshot(0.5, 0.0, 0.1)));
        assert!(!policy.can_recover_from_minimum(&snapshot(0.0, 0.5, 0.1)));
    }
}
