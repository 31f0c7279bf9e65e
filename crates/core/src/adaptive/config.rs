//! `AdaptiveConfig` (spec.md §3): validated once at construction, mirroring
//! the teacher's parse-then-validate config style.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    pub initial_tps: f64,
    pub min_tps: f64,
    pub max_tps: f64,
    pub ramp_increment: f64,
    pub ramp_decrement: f64,
    pub ramp_interval_ms: i64,
    pub sustain_duration_ms: i64,
    pub stable_intervals_required: u32,
    pub recovery_tps_ratio: f64,
}

impl AdaptiveConfig {
    pub fn new(
        initial_tps: f64,
        min_tps: f64,
        max_tps: f64,
        ramp_increment: f64,
        ramp_decrement: f64,
        ramp_interval_ms: i64,
        sustain_duration_ms: i64,
        stable_intervals_required: u32,
        recovery_tps_ratio: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            initial_tps,
            min_tps,
            max_tps,
            ramp_increment,
            ramp_decrement,
            ramp_interval_ms,
            sustain_duration_ms,
            stable_intervals_required,
            recovery_tps_ratio,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("initialTps", self.initial_tps),
            ("minTps", self.min_tps),
            ("maxTps", self.max_tps),
            ("rampIncrement", self.ramp_increment),
            ("rampDecrement", self.ramp_decrement),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::MustBePositive { field, value });
            }
        }
        if !(self.min_tps <= self.initial_tps && self.initial_tps <= self.max_tps) {
            return Err(ConfigError::TpsOrdering {
                min: self.min_tps,
                initial: self.initial_tps,
                max: self.max_tps,
            });
        }
        if self.ramp_interval_ms <= 0 {
            return Err(ConfigError::MustBePositive {
                field: "rampIntervalMs",
                value: self.ramp_interval_ms as f64,
            });
        }
        if self.sustain_duration_ms <= 0 {
            return Err(ConfigError::MustBePositive {
                field: "sustainDurationMs",
                value: self.sustain_duration_ms as f64,
            });
        }
        if !(self.recovery_tps_ratio > 0.0 && self.recovery_tps_ratio <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "recoveryTpsRatio",
                value: self.recovery_tps_ratio,
                low: 0.0,
                high: 1.0,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> (f64, f64, f64, f64, f64, i64, i64, u32, f64) {
        (100.0, 10.0, 1000.0, 50.0, 100.0, 1_000, 10_000, 3, 0.5)
    }

    #[test]
    fn accepts_well_formed_config() {
        let (a, b, c, d, e, f, g, h, i) = valid();
        assert!(AdaptiveConfig::new(a, b, c, d, e, f, g, h, i).is_ok());
    }

    #[test]
    fn rejects_tps_ordering_violation() {
        let (_, b, c, d, e, f, g, h, i) = valid();
        let result = AdaptiveConfig::new(5.0, b, c, d, e, f, g, h, i);
        assert!(matches!(result, Err(ConfigError::TpsOrdering { .. })));
    }

    #[test]
    fn rejects_non_positive_increment() {
        let (a, b, c, _, e, f, g, h, i) = valid();
        let result = AdaptiveConfig::new(a, b, c, 0.0, e, f, g, h, i);
        assert!(matches!(result, Err(ConfigError::MustBePositive { .. })));
    }

    #[test]
    fn rejects_out_of_range_recovery_ratio() {
        let (a, b, c, d, e, f, g, h, _) = valid();
        let result = AdaptiveConfig::new(a, b, c, d, e, f, g, h, 1.5);
        assert!(matches!(result, Err(ConfigError::OutOfRange { .. })));
    }
}
