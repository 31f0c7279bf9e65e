use super::LoadPattern;
use crate::error::ConfigError;
use std::time::Duration;

/// One `{tps, duration}` window of a `Step` pattern.
#[derive(Debug, Clone, Copy)]
pub struct StepSegment {
    pub tps: f64,
    pub duration: Duration,
}

/// Ordered sequence of constant-TPS windows.
pub struct Step {
    segments: Vec<StepSegment>,
}

impl Step {
    pub fn new(segments: Vec<StepSegment>) -> Result<Self, ConfigError> {
        if segments.is_empty() {
            return Err(ConfigError::EmptySteps);
        }
        Ok(Self { segments })
    }

    fn segment_at(&self, elapsed_ms: i64) -> Option<&StepSegment> {
        let mut cursor_ms: i64 = 0;
        for segment in &self.segments {
            let segment_ms = segment.duration.as_millis() as i64;
            if elapsed_ms < cursor_ms + segment_ms {
                return Some(segment);
            }
            cursor_ms += segment_ms;
        }
        None
    }
}

impl LoadPattern for Step {
    fn target_tps(&self, elapsed_ms: i64) -> f64 {
        self.segment_at(elapsed_ms)
            .map(|segment| segment.tps)
            .unwrap_or(0.0)
    }

    fn total_duration(&self) -> Duration {
        self.segments.iter().map(|s| s.duration).sum()
    }
}
