//! `AdaptiveState` (spec.md §3) behind a single `RwLock<Arc<_>>` cell —
//! modeled on the teacher's `AtomicConfig`/`ConfigSnapshot`: one immutable
//! snapshot swapped as a whole, never mutated field-by-field.

use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    RampUp,
    RampDown,
    Sustain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveState {
    pub phase: Phase,
    pub current_tps: f64,
    pub last_adjustment_ms: i64,
    pub phase_start_ms: i64,
    pub stable_intervals_count: u32,
    pub last_known_good_tps: f64,
    pub in_recovery: bool,
    pub transition_count: u64,
}

impl AdaptiveState {
    /// State as of `targetTps`'s first call (spec.md §4.3.1).
    pub fn initial(initial_tps: f64, elapsed_ms: i64) -> Self {
        Self {
            phase: Phase::RampUp,
            current_tps: initial_tps,
            last_adjustment_ms: elapsed_ms,
            phase_start_ms: elapsed_ms,
            stable_intervals_count: 0,
            last_known_good_tps: initial_tps,
            in_recovery: false,
            transition_count: 0,
        }
    }
}

/// Single atomically-swapped cell holding the current `AdaptiveState`.
pub struct AtomicAdaptiveState {
    inner: RwLock<Arc<AdaptiveState>>,
}

impl AtomicAdaptiveState {
    pub fn new(state: AdaptiveState) -> Self {
        Self {
            inner: RwLock::new(Arc::new(state)),
        }
    }

    pub fn load(&self) -> Arc<AdaptiveState> {
        self.inner.read().clone()
    }

    /// Replace the whole snapshot. Returns the previous snapshot so the
    /// caller can compare before/after for listener events without a
    /// second read under a changed lock.
    pub fn store(&self, state: AdaptiveState) -> Arc<AdaptiveState> {
        let mut guard = self.inner.write();
        std::mem::replace(&mut *guard, Arc::new(state))
    }
}
