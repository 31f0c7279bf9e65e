//! `LoadPattern` (spec.md §3/§6): a pure function of elapsed time except for
//! the `Adaptive` variant, which closes the loop through a metrics/backpressure
//! read-back. Each variant below is a small, independently testable struct,
//! the same way the teacher crate keeps one optimisation strategy per file
//! behind a shared `Strategy` trait.

mod ramp_up;
mod ramp_up_sustain;
mod sine;
mod spike;
mod static_pattern;
mod step;
mod warmup_cooldown;

pub use ramp_up::RampUp;
pub use ramp_up_sustain::RampUpThenSustain;
pub use sine::SineWave;
pub use spike::Spike;
pub use static_pattern::Static;
pub use step::{Step, StepSegment};
pub use warmup_cooldown::WarmupCooldown;

use std::time::Duration;

/// Pure function `target_tps(elapsed_ms) -> f64`; implementations must be
/// deterministic and cheap, with `Adaptive` (see `crate::adaptive`) as the
/// sole, explicitly-documented exception.
pub trait LoadPattern: Send + Sync {
    fn target_tps(&self, elapsed_ms: i64) -> f64;

    fn total_duration(&self) -> Duration;

    /// Whether this pattern wraps another pattern with warm-up/cool-down
    /// windows. Default: false.
    fn supports_warmup_cooldown(&self) -> bool {
        false
    }

    /// Whether an invocation at `elapsed_ms` should be recorded by the
    /// metrics collector. Default: true.
    fn should_record_metrics(&self, _elapsed_ms: i64) -> bool {
        true
    }
}

/// Lets an `Arc<Adaptive>` (or any shared pattern) be handed to the engine
/// while another owner — typically the task itself — keeps its own handle
/// to read back `Adaptive::state()`.
impl<P: LoadPattern + ?Sized> LoadPattern for std::sync::Arc<P> {
    fn target_tps(&self, elapsed_ms: i64) -> f64 {
        (**self).target_tps(elapsed_ms)
    }

    fn total_duration(&self) -> Duration {
        (**self).total_duration()
    }

    fn supports_warmup_cooldown(&self) -> bool {
        (**self).supports_warmup_cooldown()
    }

    fn should_record_metrics(&self, elapsed_ms: i64) -> bool {
        (**self).should_record_metrics(elapsed_ms)
    }
}
