use crate::rtt_tracker::{RttSummary, RttTracker};
use std::time::{Duration, Instant};

/// Totals of one session. `received <= transmitted` always holds: duplicate
/// replies and ICMP errors are counted separately.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug)]
pub struct SessionStats {
    pub transmitted: u64,
    pub received: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub rtt: RttTracker,
    pub start: Instant,
    /// Wall time from start to termination; zero while running.
    pub elapsed: Duration,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            transmitted: 0,
            received: 0,
            duplicates: 0,
            errors: 0,
            rtt: RttTracker::new(),
            start: Instant::now(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn packet_loss_percent(&self) -> f64 {
        if self.transmitted == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let loss = (self.transmitted - self.received) as f64 / self.transmitted as f64 * 100.0;
        loss
    }

    pub fn rtt_summary(&self) -> Option<RttSummary> {
        self.rtt.summary()
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
