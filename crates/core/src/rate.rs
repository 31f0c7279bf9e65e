//! Rate controller (spec.md §4.2): converts a time-varying target TPS into
//! precisely timed per-invocation release signals.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

const MAX_SLEEP_MILLIS: f64 = 1000.0;
const SUB_MILLIS_SPIN_THRESHOLD_MS: f64 = 1.0;
const ELAPSED_CACHE_TTL_MICROS: u64 = 10_000;

/// Paces releases so the long-run observed rate matches a momentary target
/// TPS. One instance drives a single release thread; `released_count` is
/// still an atomic because metrics/gauges read it from other threads.
pub struct RateController {
    start: Instant,
    released_count: AtomicU64,
    cached_elapsed_millis: parking_lot::Mutex<(Instant, i64)>,
}

impl RateController {
    pub fn new() -> Self {
        let start = Instant::now();
        Self {
            start,
            released_count: AtomicU64::new(0),
            cached_elapsed_millis: parking_lot::Mutex::new((start, 0)),
        }
    }

    pub fn elapsed_millis(&self) -> i64 {
        let now = Instant::now();
        {
            let cache = self.cached_elapsed_millis.lock();
            if now.duration_since(cache.0).as_micros() < ELAPSED_CACHE_TTL_MICROS as u128 {
                return cache.1;
            }
        }
        let fresh = self.start.elapsed().as_millis() as i64;
        let mut cache = self.cached_elapsed_millis.lock();
        *cache = (now, fresh);
        fresh
    }

    /// Block the caller until the expected release count for "now" catches
    /// up with the observed release count, then return. `target_tps` is
    /// read fresh from the load pattern on every call — the controller does
    /// no smoothing of its own.
    pub fn wait_for_next(&self, target_tps: f64) {
        if target_tps <= 0.0 {
            std::thread::sleep(std::time::Duration::from_millis(1));
            return;
        }

        let elapsed_ms = self.elapsed_millis();
        let expected_count = ((target_tps * elapsed_ms as f64) / 1000.0).floor() as i64;
        let observed_count = self.released_count.fetch_add(1, Ordering::SeqCst) as i64 + 1;

        if observed_count <= expected_count {
            return;
        }

        let behind = observed_count - expected_count;
        let sleep_millis = ((behind as f64) * 1000.0 / target_tps).clamp(0.0, MAX_SLEEP_MILLIS);

        if sleep_millis <= 0.0 {
            return;
        }

        if sleep_millis < SUB_MILLIS_SPIN_THRESHOLD_MS {
            let sleep_micros = (sleep_millis * 1000.0) as u64;
            let deadline = Instant::now() + std::time::Duration::from_micros(sleep_micros);
            while Instant::now() < deadline {
                std::hint::spin_loop();
            }
        } else {
            std::thread::sleep(std::time::Duration::from_millis(sleep_millis.round() as u64));
        }
    }

    pub fn released_count(&self) -> u64 {
        self.released_count.load(Ordering::SeqCst)
    }
}

impl Default for RateController {
    fn default() -> Self {
        Self::new()
    }
}
