use std::time::Duration;

/// Running RTT aggregate; keeps no individual samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RttTracker {
    count: u64,
    min: f64,
    max: f64,
    sum: f64,
    sum_squares: f64,
}

/// Milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RttSummary {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub mdev: f64,
}

impl RttTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, rtt: Duration) {
        #[allow(clippy::cast_precision_loss)]
        let millis = rtt.as_nanos() as f64 / 1_000_000.0;
        self.record_millis(millis);
    }

    pub fn record_millis(&mut self, rtt: f64) {
        if self.count == 0 {
            self.min = rtt;
            self.max = rtt;
        } else {
            self.min = self.min.min(rtt);
            self.max = self.max.max(rtt);
        }
        self.count += 1;
        self.sum += rtt;
        self.sum_squares += rtt * rtt;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `None` until the first sample.
    pub fn summary(&self) -> Option<RttSummary> {
        if self.count == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.count as f64;
        let avg = self.sum / n;
        // Rounding can push the variance a hair below zero for identical samples.
        let variance = (self.sum_squares / n - avg * avg).max(0.0);
        Some(RttSummary { min: self.min, avg, max: self.max, mdev: variance.sqrt() })
    }
}
