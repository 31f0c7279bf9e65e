//! Latency histogram wrapper over `hdrhistogram`: bounded relative error,
//! auto-resizing range. See spec.md §9's open question on histogram
//! backing — HDR was picked because the pack already reaches for
//! `hdrhistogram` for this exact kind of percentile bookkeeping.

use hdrhistogram::Histogram as HdrHistogram;
use parking_lot::RwLock;

const SIGNIFICANT_DIGITS: u8 = 3;

pub struct LatencyHistogram {
    inner: RwLock<HdrHistogram<u64>>,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, value_nanos: u64) {
        // auto_resize makes this infallible in practice; swallow the one
        // theoretical error path (value would overflow resize limits).
        let _ = self.inner.write().record(value_nanos);
    }

    pub fn len(&self) -> u64 {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Percentile value in nanoseconds for `quantile` in `(0, 1)`, or `None`
    /// when the histogram has no samples.
    pub fn value_at_quantile(&self, quantile: f64) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        Some(self.inner.read().value_at_quantile(quantile))
    }

    pub fn percentiles(&self, quantiles: &[f64]) -> Vec<(f64, u64)> {
        quantiles
            .iter()
            .filter_map(|&q| self.value_at_quantile(q).map(|v| (q, v)))
            .collect()
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        let mut histogram = HdrHistogram::<u64>::new(SIGNIFICANT_DIGITS)
            .expect("significant_digits is a valid HDR precision");
        histogram.auto(true);
        Self {
            inner: RwLock::new(histogram),
        }
    }
}
