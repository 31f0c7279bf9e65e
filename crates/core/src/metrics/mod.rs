//! Metrics collection (spec.md §4.4): latency histograms, counters, and
//! the sliding-window recent failure rate, folded together by
//! `MetricsCollector`.

mod collector;
mod histogram;
mod recent_window;
mod snapshot;

pub use collector::MetricsCollector;
pub use histogram::LatencyHistogram;
pub use recent_window::RecentFailureWindow;
pub use snapshot::{AggregatedSnapshot, MetricsSnapshot, SnapshotProvider};
