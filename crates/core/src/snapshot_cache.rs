//! `CachedSnapshotFacade` (spec.md §4.5): TTL-gated read-through cache in
//! front of the metrics collector, so the adaptive controller's per-tick
//! reads don't dominate collector CPU. Same "atomic reference to one
//! value" shape as `adaptive::state::AtomicAdaptiveState`/the teacher's
//! `AtomicConfig`, plus a TTL instead of swap-on-every-write.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::metrics::{MetricsCollector, SnapshotProvider};

struct CachedEntry<T> {
    snapshot: T,
    stamp: Instant,
}

/// Wraps any `Fn() -> T` refresh closure (typically a collector read) with
/// a `ttl`-bounded cache. Concurrent readers during a refresh all observe
/// the winner's published value; no reader ever holds the refresh mutex
/// across the closure call except the one actually doing the refresh.
pub struct CachedSnapshotFacade<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync,
{
    cell: RwLock<Arc<CachedEntry<T>>>,
    refresh_lock: Mutex<()>,
    refresh: F,
    ttl: Duration,
}

impl<T, F> CachedSnapshotFacade<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync,
{
    pub fn new(initial: T, refresh: F, ttl: Duration) -> Self {
        Self {
            cell: RwLock::new(Arc::new(CachedEntry {
                snapshot: initial,
                stamp: Instant::now(),
            })),
            refresh_lock: Mutex::new(()),
            refresh,
            ttl,
        }
    }

    pub fn with_default_ttl(refresh: F) -> Self
    where
        T: Default,
    {
        Self::new(T::default(), refresh, Duration::from_millis(100))
    }

    /// Returns a value at most `ttl` old (spec.md §4.5 property 1).
    pub fn get(&self) -> T {
        let entry = self.cell.read().clone();
        if entry.stamp.elapsed() < self.ttl {
            return entry.snapshot.clone();
        }

        let _guard = self.refresh_lock.lock();
        // Re-check: another thread may have refreshed while we waited for
        // the lock (property 2 — only one refresh per window).
        let entry = self.cell.read().clone();
        if entry.stamp.elapsed() < self.ttl {
            return entry.snapshot.clone();
        }

        let fresh = (self.refresh)();
        let published = Arc::new(CachedEntry {
            snapshot: fresh.clone(),
            stamp: Instant::now(),
        });
        *self.cell.write() = published;
        fresh
    }
}

#[derive(Clone, Copy, Default)]
struct SnapshotFields {
    failure_rate: f64,
    total_executions: u64,
    elapsed_ms: i64,
    recent_failure_rate: f64,
}

/// `SnapshotProvider` backed by a `MetricsCollector`, read through a
/// `CachedSnapshotFacade` so an adaptive pattern's per-tick reads don't
/// recompute the collector's histogram/window state on every call. The
/// recent-failure window is fixed at construction, matching the fixed
/// `recentFailureWindowSeconds` an `Adaptive` always calls with.
pub struct CachedCollectorSnapshot {
    cache: CachedSnapshotFacade<SnapshotFields, Box<dyn Fn() -> SnapshotFields + Send + Sync>>,
}

impl CachedCollectorSnapshot {
    pub fn new(collector: Arc<MetricsCollector>, recent_window_seconds: u64, ttl: Duration) -> Self {
        let refresh: Box<dyn Fn() -> SnapshotFields + Send + Sync> = Box::new(move || SnapshotFields {
            failure_rate: collector.failure_rate(),
            total_executions: collector.total_executions(),
            elapsed_ms: collector.elapsed_ms(),
            recent_failure_rate: collector.recent_failure_rate(recent_window_seconds),
        });
        Self {
            cache: CachedSnapshotFacade::new(SnapshotFields::default(), refresh, ttl),
        }
    }
}

impl SnapshotProvider for CachedCollectorSnapshot {
    fn failure_rate(&self) -> f64 {
        self.cache.get().failure_rate
    }

    fn total_executions(&self) -> u64 {
        self.cache.get().total_executions
    }

    fn elapsed_ms(&self) -> i64 {
        self.cache.get().elapsed_ms
    }

    fn recent_failure_rate(&self, _window_seconds: u64) -> f64 {
        self.cache.get().recent_failure_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn serves_cached_value_within_ttl() {
        let calls = AtomicUsize::new(0);
        let cache = CachedSnapshotFacade::new(
            0u64,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                42
            },
            Duration::from_millis(50),
        );
        assert_eq!(cache.get(), 0); // seeded value, still fresh
        assert_eq!(cache.get(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn refreshes_after_ttl_elapses() {
        let calls = AtomicUsize::new(0);
        let cache = CachedSnapshotFacade::new(
            0u64,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                99
            },
            Duration::from_millis(1),
        );
        thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_readers_see_a_consistent_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let cache = Arc::new(CachedSnapshotFacade::new(
            0u64,
            move || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                7
            },
            Duration::from_millis(1),
        ));
        thread::sleep(Duration::from_millis(5));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || cache.get())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
