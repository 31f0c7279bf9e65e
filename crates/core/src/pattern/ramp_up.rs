use super::LoadPattern;
use std::time::Duration;

/// Linear ramp from 0 TPS to `max_tps` over `duration`.
pub struct RampUp {
    max_tps: f64,
    duration: Duration,
}

impl RampUp {
    pub fn new(max_tps: f64, duration: Duration) -> Self {
        Self { max_tps, duration }
    }
}

impl LoadPattern for RampUp {
    fn target_tps(&self, elapsed_ms: i64) -> f64 {
        let duration_ms = self.duration.as_millis() as i64;
        if duration_ms <= 0 {
            return self.max_tps;
        }
        let fraction = (elapsed_ms as f64 / duration_ms as f64).clamp(0.0, 1.0);
        self.max_tps * fraction
    }

    fn total_duration(&self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let pattern = RampUp::new(1000.0, Duration::from_secs(10));
        assert_eq!(pattern.target_tps(0), 0.0);
    }

    #[test]
    fn reaches_max_at_duration_end() {
        let pattern = RampUp::new(1000.0, Duration::from_secs(10));
        assert_eq!(pattern.target_tps(10_000), 1000.0);
    }

    #[test]
    fn clamps_after_duration() {
        let pattern = RampUp::new(1000.0, Duration::from_secs(10));
        assert_eq!(pattern.target_tps(20_000), 1000.0);
    }

    #[test]
    fn halfway_is_half_max() {
        let pattern = RampUp::new(1000.0, Duration::from_secs(10));
        assert_eq!(pattern.target_tps(5_000), 500.0);
    }
}
