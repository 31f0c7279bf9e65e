//! `recentFailureRate(windowSeconds)` (spec.md §4.4): a small ring of
//! `{timestamp, totalExecutions, failureCount}` samples, interpolated to
//! find the delta between "now" and "now - window". Modeled directly on
//! the teacher's `TelemetryRingBuffer` (bounded `VecDeque`, push evicts
//! oldest).

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct Sample {
    timestamp_ms: i64,
    total_executions: u64,
    failure_count: u64,
}

/// Ring of counter samples, taken at <= 1 Hz, used to compute a failure
/// rate over a sliding time window without retaining full per-invocation
/// history.
pub struct RecentFailureWindow {
    samples: parking_lot::Mutex<VecDeque<Sample>>,
    capacity: usize,
    min_sample_interval_ms: i64,
}

impl RecentFailureWindow {
    pub fn new(capacity: usize, min_sample_interval_ms: i64) -> Self {
        Self {
            samples: parking_lot::Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            min_sample_interval_ms,
        }
    }

    /// Record a counter snapshot at `now_ms`. No-op if the last sample is
    /// younger than `min_sample_interval_ms` (keeps the sampling rate <= 1 Hz
    /// by default).
    pub fn sample(&self, now_ms: i64, total_executions: u64, failure_count: u64) {
        let mut samples = self.samples.lock();
        if let Some(last) = samples.back() {
            if now_ms - last.timestamp_ms < self.min_sample_interval_ms {
                return;
            }
        }
        if samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(Sample {
            timestamp_ms: now_ms,
            total_executions,
            failure_count,
        });
    }

    /// Failure rate over the last `window_ms`, linearly interpolating
    /// between recorded samples to find the counter values at
    /// `now_ms - window_ms`. Returns `None` when there isn't enough history
    /// to interpolate (fewer than two samples, or the window predates the
    /// oldest sample).
    pub fn recent_failure_rate(&self, now_ms: i64, window_ms: i64) -> Option<f64> {
        let samples = self.samples.lock();
        if samples.len() < 2 {
            return None;
        }
        let target_ms = now_ms - window_ms;
        let oldest = samples.front().unwrap();
        if target_ms < oldest.timestamp_ms {
            return None;
        }

        let past = interpolate(&samples, target_ms)?;
        let present = interpolate(&samples, now_ms)?;

        let exec_delta = present.0.saturating_sub(past.0);
        let failure_delta = present.1.saturating_sub(past.1);

        if exec_delta == 0 {
            Some(0.0)
        } else {
            Some(failure_delta as f64 / exec_delta as f64)
        }
    }
}

/// Linearly interpolate `(total_executions, failure_count)` at `at_ms`
/// from the sample ring. Clamps to the nearest edge sample outside range.
fn interpolate(samples: &VecDeque<Sample>, at_ms: i64) -> Option<(u64, u64)> {
    if samples.is_empty() {
        return None;
    }
    if at_ms <= samples.front().unwrap().timestamp_ms {
        let s = samples.front().unwrap();
        return Some((s.total_executions, s.failure_count));
    }
    if at_ms >= samples.back().unwrap().timestamp_ms {
        let s = samples.back().unwrap();
        return Some((s.total_executions, s.failure_count));
    }

    let materialized: Vec<Sample> = samples.iter().copied().collect();
    for window in materialized.windows(2) {
        let (a, b) = (window[0], window[1]);
        if a.timestamp_ms <= at_ms && at_ms <= b.timestamp_ms {
            return Some(interpolate_pair(a, b, at_ms));
        }
    }
    None
}

fn interpolate_pair(a: Sample, b: Sample, at_ms: i64) -> (u64, u64) {
    let span = (b.timestamp_ms - a.timestamp_ms).max(1) as f64;
    let fraction = (at_ms - a.timestamp_ms) as f64 / span;
    let exec = a.total_executions as f64
        + fraction * (b.total_executions as f64 - a.total_executions as f64);
    let fail =
        a.failure_count as f64 + fraction * (b.failure_count as f64 - a.failure_count as f64);
    (exec.round() as u64, fail.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_enough_history_returns_none() {
        let window = RecentFailureWindow::new(16, 0);
        window.sample(0, 10, 1);
        assert_eq!(window.recent_failure_rate(0, 10_000), None);
    }

    #[test]
    fn rate_over_window_interpolates() {
        let window = RecentFailureWindow::new(16, 0);
        window.sample(0, 0, 0);
        window.sample(10_000, 1000, 10);
        // 10s window ending at t=10_000 covers the whole span: 10/1000.
        let rate = window.recent_failure_rate(10_000, 10_000).unwrap();
        assert!((rate - 0.01).abs() < 1e-9);
    }

    #[test]
    fn sampling_respects_min_interval() {
        let window = RecentFailureWindow::new(16, 1_000);
        window.sample(0, 0, 0);
        window.sample(500, 100, 100); // too soon, dropped
        window.sample(1_000, 200, 1);
        let rate = window.recent_failure_rate(1_000, 1_000).unwrap();
        assert!((rate - (1.0 / 200.0)).abs() < 1e-9);
    }

    #[test]
    fn eviction_bounds_capacity() {
        let window = RecentFailureWindow::new(2, 0);
        window.sample(0, 0, 0);
        window.sample(1, 10, 0);
        window.sample(2, 20, 0);
        assert_eq!(window.samples.lock().len(), 2);
    }
}
