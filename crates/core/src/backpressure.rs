//! `BackpressureProvider` (spec.md §3/§9): a non-blocking scalar signal in
//! `[0,1]` describing how overloaded task-side resources are. The core
//! ships a queue-depth implementation and a max-across-providers composite;
//! everything else (connection pools, DB-specific signals) is the task's
//! own exporter concern, not this crate's.

use std::sync::atomic::{AtomicU64, Ordering};

pub trait BackpressureProvider: Send + Sync {
    /// Current backpressure level in `[0, 1]`.
    fn level(&self) -> f64;

    fn description(&self) -> String;
}

/// `min(1.0, current_depth / max_depth)`.
pub struct QueueDepthBackpressure {
    current_depth: AtomicU64,
    max_depth: u64,
}

impl QueueDepthBackpressure {
    pub fn new(max_depth: u64) -> Self {
        Self {
            current_depth: AtomicU64::new(0),
            max_depth: max_depth.max(1),
        }
    }

    pub fn set_depth(&self, depth: u64) {
        self.current_depth.store(depth, Ordering::SeqCst);
    }
}

impl BackpressureProvider for QueueDepthBackpressure {
    fn level(&self) -> f64 {
        let depth = self.current_depth.load(Ordering::SeqCst) as f64;
        (depth / self.max_depth as f64).min(1.0)
    }

    fn description(&self) -> String {
        format!(
            "queue depth {}/{}",
            self.current_depth.load(Ordering::SeqCst),
            self.max_depth
        )
    }
}

/// Max across sub-providers — the worst signal wins.
pub struct CompositeBackpressure {
    providers: Vec<Box<dyn BackpressureProvider>>,
}

impl CompositeBackpressure {
    pub fn new(providers: Vec<Box<dyn BackpressureProvider>>) -> Self {
        Self { providers }
    }
}

impl BackpressureProvider for CompositeBackpressure {
    fn level(&self) -> f64 {
        self.providers
            .iter()
            .map(|p| p.level())
            .fold(0.0_f64, f64::max)
    }

    fn description(&self) -> String {
        self.providers
            .iter()
            .map(|p| p.description())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_depth_clamps_to_one() {
        let provider = QueueDepthBackpressure::new(10);
        provider.set_depth(100);
        assert_eq!(provider.level(), 1.0);
    }

    #[test]
    fn queue_depth_zero_when_empty() {
        let provider = QueueDepthBackpressure::new(10);
        assert_eq!(provider.level(), 0.0);
    }

    #[test]
    fn composite_reports_max() {
        let low = QueueDepthBackpressure::new(100);
        low.set_depth(10);
        let high = QueueDepthBackpressure::new(100);
        high.set_depth(90);
        let composite = CompositeBackpressure::new(vec![Box::new(low), Box::new(high)]);
        assert!((composite.level() - 0.9).abs() < 1e-9);
    }
}
