//! `AdaptiveListener` (spec.md §4.3.7): best-effort, synchronous event
//! fan-out. Failures are logged and swallowed, never propagated into the
//! decision loop.

use crate::adaptive::state::Phase;

#[derive(Debug, Clone, Copy)]
pub enum AdaptiveEvent {
    PhaseTransition {
        from: Phase,
        to: Phase,
        tps: f64,
        reason: AdjustmentReason,
    },
    TpsChange {
        previous: f64,
        new: f64,
        phase: Phase,
    },
    StabilityDetected {
        tps: f64,
    },
    Recovery {
        last_known_good_tps: f64,
        recovery_tps: f64,
    },
}

/// Why a tick's decision landed where it did — carried on
/// `PhaseTransition` for observability, matching spec.md's `reason` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentReason {
    FailureOrBackpressure,
    MaxTpsReached,
    StabilityDetected,
    ImprovingConditions,
    ModeratePressureHold,
    RecoveryFromMinimum,
    HoldAtMinimum,
    ConditionsImproved,
    HoldDuringRampDown,
    SustainElapsedRampUp,
    SustainHold,
}

pub trait AdaptiveListener: Send + Sync {
    fn on_event(&self, event: AdaptiveEvent);
}

/// Invoke `listener.on_event` and swallow any unwind, logging it instead —
/// a listener must never be able to take down the decision loop.
pub fn notify(listener: &dyn AdaptiveListener, event: AdaptiveEvent) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        listener.on_event(event);
    }));
    if outcome.is_err() {
        tracing::warn!("adaptive listener panicked while handling {:?}", event);
    }
}
