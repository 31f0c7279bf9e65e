//! The decision function (spec.md §4.3.3-4.3.6): derives an
//! `AdjustmentDecision` from the current `AdaptiveState` plus a freshly
//! captured `MetricsSnapshot`, then applies the state update rule
//! (§4.3.5). Modeled on the teacher's `Solver::ask` phase `match` that can
//! fall through to the next phase within the same call.

use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::listener::AdjustmentReason;
use crate::adaptive::policy::RampDecisionPolicy;
use crate::adaptive::state::{AdaptiveState, Phase};
use crate::metrics::MetricsSnapshot;

#[derive(Debug, Clone, Copy)]
pub struct AdjustmentDecision {
    pub new_phase: Phase,
    pub new_tps: f64,
    pub reason: AdjustmentReason,
}

/// `stableIntervalsCount` only ever increments on a tick where
/// `shouldRampUp` held (see `apply`), and resets on any phase/TPS change —
/// so the counter crossing the threshold already implies consecutiveness.
fn is_stable(state: &AdaptiveState, config: &AdaptiveConfig) -> bool {
    state.stable_intervals_count >= config.stable_intervals_required
}

pub fn decide(
    state: &AdaptiveState,
    config: &AdaptiveConfig,
    policy: &dyn RampDecisionPolicy,
    m: &MetricsSnapshot,
) -> AdjustmentDecision {
    match state.phase {
        Phase::RampUp => decide_ramp_up(state, config, policy, m),
        Phase::RampDown => decide_ramp_down(state, config, policy, m),
        Phase::Sustain => decide_sustain(state, config, policy, m),
    }
}

fn decide_ramp_up(
    state: &AdaptiveState,
    config: &AdaptiveConfig,
    policy: &dyn RampDecisionPolicy,
    m: &MetricsSnapshot,
) -> AdjustmentDecision {
    if policy.should_ramp_down(m) {
        return AdjustmentDecision {
            new_phase: Phase::RampDown,
            new_tps: (state.current_tps - config.ramp_decrement).max(config.min_tps),
            reason: AdjustmentReason::FailureOrBackpressure,
        };
    }
    if state.current_tps >= config.max_tps {
        return AdjustmentDecision {
            new_phase: Phase::Sustain,
            new_tps: state.current_tps,
            reason: AdjustmentReason::MaxTpsReached,
        };
    }
    if is_stable(state, config) {
        return AdjustmentDecision {
            new_phase: Phase::Sustain,
            new_tps: state.current_tps,
            reason: AdjustmentReason::StabilityDetected,
        };
    }
    if policy.should_ramp_up(m) {
        return AdjustmentDecision {
            new_phase: Phase::RampUp,
            new_tps: (state.current_tps + config.ramp_increment).min(config.max_tps),
            reason: AdjustmentReason::ImprovingConditions,
        };
    }
    AdjustmentDecision {
        new_phase: Phase::RampUp,
        new_tps: state.current_tps,
        reason: AdjustmentReason::ModeratePressureHold,
    }
}

fn decide_ramp_down(
    state: &AdaptiveState,
    config: &AdaptiveConfig,
    policy: &dyn RampDecisionPolicy,
    m: &MetricsSnapshot,
) -> AdjustmentDecision {
    if state.in_recovery {
        if policy.can_recover_from_minimum(m) {
            return AdjustmentDecision {
                new_phase: Phase::RampUp,
                new_tps: (state.last_known_good_tps * config.recovery_tps_ratio).max(config.min_tps),
                reason: AdjustmentReason::RecoveryFromMinimum,
            };
        }
        return AdjustmentDecision {
            new_phase: Phase::RampDown,
            new_tps: config.min_tps,
            reason: AdjustmentReason::HoldAtMinimum,
        };
    }
    if !policy.should_ramp_down(m) {
        if is_stable(state, config) {
            return AdjustmentDecision {
                new_phase: Phase::Sustain,
                new_tps: state.current_tps,
                reason: AdjustmentReason::ConditionsImproved,
            };
        }
        return AdjustmentDecision {
            new_phase: Phase::RampDown,
            new_tps: state.current_tps,
            reason: AdjustmentReason::HoldDuringRampDown,
        };
    }
    AdjustmentDecision {
        new_phase: Phase::RampDown,
        new_tps: (state.current_tps - config.ramp_decrement).max(config.min_tps),
        reason: AdjustmentReason::FailureOrBackpressure,
    }
}

fn decide_sustain(
    state: &AdaptiveState,
    config: &AdaptiveConfig,
    policy: &dyn RampDecisionPolicy,
    m: &MetricsSnapshot,
) -> AdjustmentDecision {
    if policy.should_ramp_down(m) {
        return AdjustmentDecision {
            new_phase: Phase::RampDown,
            new_tps: (state.current_tps - config.ramp_decrement).max(config.min_tps),
            reason: AdjustmentReason::FailureOrBackpressure,
        };
    }
    let sustained_long_enough = m.elapsed_ms - state.phase_start_ms >= config.sustain_duration_ms;
    if sustained_long_enough && policy.should_ramp_up(m) && state.current_tps < config.max_tps {
        return AdjustmentDecision {
            new_phase: Phase::RampUp,
            new_tps: (state.current_tps + config.ramp_increment).min(config.max_tps),
            reason: AdjustmentReason::SustainElapsedRampUp,
        };
    }
    AdjustmentDecision {
        new_phase: Phase::Sustain,
        new_tps: state.current_tps,
        reason: AdjustmentReason::SustainHold,
    }
}

/// State update rule (spec.md §4.3.5). `elapsed_ms` is the tick's elapsed
/// time, always written to `lastAdjustmentMs` regardless of branch taken.
pub fn apply(
    state: &AdaptiveState,
    decision: &AdjustmentDecision,
    config: &AdaptiveConfig,
    policy: &dyn RampDecisionPolicy,
    m: &MetricsSnapshot,
    elapsed_ms: i64,
) -> AdaptiveState {
    let mut next = state.clone();
    next.last_adjustment_ms = elapsed_ms;

    if decision.new_phase != state.phase {
        next.phase = decision.new_phase;
        next.current_tps = decision.new_tps;
        next.phase_start_ms = elapsed_ms;
        next.stable_intervals_count = 0;
        next.transition_count += 1;
        if decision.new_phase == Phase::RampDown {
            next.last_known_good_tps = next.last_known_good_tps.max(state.current_tps);
        }
        next.in_recovery = decision.new_phase == Phase::RampDown && decision.new_tps == config.min_tps;
    } else if decision.new_tps != state.current_tps {
        next.current_tps = decision.new_tps;
        next.stable_intervals_count = 0;
    } else if policy.should_ramp_up(m) {
        next.stable_intervals_count += 1;
    }

    next
}
