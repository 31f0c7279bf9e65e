use super::LoadPattern;
use std::time::Duration;

/// Sinusoidal TPS oscillating around `baseline_tps` with `amplitude` and
/// `period`, floored at zero.
pub struct SineWave {
    baseline_tps: f64,
    amplitude: f64,
    period: Duration,
    duration: Duration,
}

impl SineWave {
    pub fn new(baseline_tps: f64, amplitude: f64, period: Duration, duration: Duration) -> Self {
        Self {
            baseline_tps,
            amplitude,
            period,
            duration,
        }
    }
}

impl LoadPattern for SineWave {
    fn target_tps(&self, elapsed_ms: i64) -> f64 {
        let period_ms = self.period.as_millis() as f64;
        if period_ms <= 0.0 {
            return self.baseline_tps.max(0.0);
        }
        let phase = 2.0 * std::f64::consts::PI * (elapsed_ms as f64 / period_ms);
        (self.baseline_tps + self.amplitude * phase.sin()).max(0.0)
    }

    fn total_duration(&self) -> Duration {
        self.duration
    }
}
