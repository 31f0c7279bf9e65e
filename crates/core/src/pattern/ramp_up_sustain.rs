use super::LoadPattern;
use std::time::Duration;

/// Linear ramp to `max_tps`, then hold for the remainder of the run.
pub struct RampUpThenSustain {
    max_tps: f64,
    ramp_duration: Duration,
    sustain_duration: Duration,
}

impl RampUpThenSustain {
    pub fn new(max_tps: f64, ramp_duration: Duration, sustain_duration: Duration) -> Self {
        Self {
            max_tps,
            ramp_duration,
            sustain_duration,
        }
    }
}

impl LoadPattern for RampUpThenSustain {
    fn target_tps(&self, elapsed_ms: i64) -> f64 {
        let ramp_ms = self.ramp_duration.as_millis() as i64;
        if ramp_ms <= 0 || elapsed_ms >= ramp_ms {
            return self.max_tps;
        }
        self.max_tps * (elapsed_ms as f64 / ramp_ms as f64)
    }

    fn total_duration(&self) -> Duration {
        self.ramp_duration + self.sustain_duration
    }
}
