use super::LoadPattern;
use std::time::Duration;

/// Baseline TPS with periodic bursts: every `spike_interval`, TPS jumps to
/// `spike_tps` for `spike_width`, then returns to `baseline_tps`.
pub struct Spike {
    baseline_tps: f64,
    spike_tps: f64,
    spike_interval: Duration,
    spike_width: Duration,
    duration: Duration,
}

impl Spike {
    pub fn new(
        baseline_tps: f64,
        spike_tps: f64,
        spike_interval: Duration,
        spike_width: Duration,
        duration: Duration,
    ) -> Self {
        Self {
            baseline_tps,
            spike_tps,
            spike_interval,
            spike_width,
            duration,
        }
    }
}

impl LoadPattern for Spike {
    fn target_tps(&self, elapsed_ms: i64) -> f64 {
        let interval_ms = self.spike_interval.as_millis() as i64;
        let width_ms = self.spike_width.as_millis() as i64;
        if interval_ms <= 0 {
            return self.baseline_tps;
        }
        let phase = elapsed_ms.rem_euclid(interval_ms);
        if phase < width_ms {
            self.spike_tps
        } else {
            self.baseline_tps
        }
    }

    fn total_duration(&self) -> Duration {
        self.duration
    }
}
