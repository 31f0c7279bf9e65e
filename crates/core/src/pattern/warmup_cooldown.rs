use super::LoadPattern;
use std::time::Duration;

/// Decorator wrapping another pattern: zeroes metric recording during the
/// head (`warmup`) and tail (`cooldown`) windows, without changing the
/// underlying TPS.
pub struct WarmupCooldown<P: LoadPattern> {
    inner: P,
    warmup: Duration,
    cooldown: Duration,
}

impl<P: LoadPattern> WarmupCooldown<P> {
    pub fn new(inner: P, warmup: Duration, cooldown: Duration) -> Self {
        Self {
            inner,
            warmup,
            cooldown,
        }
    }
}

impl<P: LoadPattern> LoadPattern for WarmupCooldown<P> {
    fn target_tps(&self, elapsed_ms: i64) -> f64 {
        self.inner.target_tps(elapsed_ms)
    }

    fn total_duration(&self) -> Duration {
        self.inner.total_duration()
    }

    fn supports_warmup_cooldown(&self) -> bool {
        true
    }

    fn should_record_metrics(&self, elapsed_ms: i64) -> bool {
        let total_ms = self.total_duration().as_millis() as i64;
        let warmup_ms = self.warmup.as_millis() as i64;
        let cooldown_start_ms = total_ms - self.cooldown.as_millis() as i64;
        elapsed_ms >= warmup_ms && elapsed_ms <= cooldown_start_ms
    }
}
