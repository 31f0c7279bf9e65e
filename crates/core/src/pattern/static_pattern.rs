use super::LoadPattern;
use std::time::Duration;

/// Constant TPS for a fixed duration.
pub struct Static {
    tps: f64,
    duration: Duration,
}

impl Static {
    pub fn new(tps: f64, duration: Duration) -> Self {
        Self { tps, duration }
    }
}

impl LoadPattern for Static {
    fn target_tps(&self, _elapsed_ms: i64) -> f64 {
        self.tps
    }

    fn total_duration(&self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_tps_is_constant_over_time() {
        let pattern = Static::new(100.0, Duration::from_secs(2));
        assert_eq!(pattern.target_tps(0), 100.0);
        assert_eq!(pattern.target_tps(1_999), 100.0);
    }

    #[test]
    fn same_elapsed_returns_same_value() {
        let pattern = Static::new(42.0, Duration::from_secs(1));
        assert_eq!(pattern.target_tps(500), pattern.target_tps(500));
    }
}
