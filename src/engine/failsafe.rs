//! Failsafe monitor
//!
//! Tracks the last successful poll. Once the device has been silent for longer
//! than the configured timeout, every failing tick must push neutral values
//! until a poll succeeds again.

use chrono::Local;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct FailsafeMonitor {
    last_ok: Instant,
    tripped: bool,
}

impl FailsafeMonitor {
    pub fn new(now: Instant) -> Self {
        Self {
            last_ok: now,
            tripped: false,
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Records a successful poll. Returns true if this ends a failsafe episode.
    pub fn record_success(&mut self, now: Instant) -> bool {
        self.last_ok = now;
        if self.tripped {
            self.tripped = false;
            info!("Controller responding again, failsafe released");
            return true;
        }
        false
    }

    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_ok) > timeout
    }

    /// Called on a failing tick. Returns true if neutral values must be sent.
    pub fn check(&mut self, now: Instant, timeout: Duration) -> bool {
        if !self.is_expired(now, timeout) {
            return false;
        }
        if !self.tripped {
            self.tripped = true;
            warn!(
                "No controller data for {:.0} ms, forcing outputs to neutral ({})",
                now.saturating_duration_since(self.last_ok).as_secs_f64() * 1000.0,
                Local::now().format("%H:%M:%S.%3f")
            );
        }
        true
    }

    /// Time left before [`check`](Self::check) starts returning true; zero once expired
    pub fn time_until_trip(&self, now: Instant, timeout: Duration) -> Duration {
        match self.last_ok.checked_add(timeout) {
            Some(deadline) => deadline.saturating_duration_since(now),
            None => timeout.saturating_sub(now.saturating_duration_since(self.last_ok)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(250);

    #[test]
    fn trips_only_after_timeout() {
        let t0 = Instant::now();
        let mut fs = FailsafeMonitor::new(t0);
        assert!(!fs.check(t0 + Duration::from_millis(100), TIMEOUT));
        assert!(!fs.check(t0 + TIMEOUT, TIMEOUT));
        assert!(!fs.is_tripped());
        assert!(fs.check(t0 + Duration::from_millis(251), TIMEOUT));
        assert!(fs.is_tripped());
        assert!(fs.check(t0 + Duration::from_secs(5), TIMEOUT));
    }

    #[test]
    fn success_resets_episode() {
        let t0 = Instant::now();
        let mut fs = FailsafeMonitor::new(t0);
        assert!(fs.check(t0 + Duration::from_secs(1), TIMEOUT));
        assert!(fs.record_success(t0 + Duration::from_secs(2)));
        assert!(!fs.is_tripped());
        assert!(!fs.check(t0 + Duration::from_millis(2100), TIMEOUT));
        assert!(!fs.record_success(t0 + Duration::from_millis(2200)));
    }

    #[test]
    fn time_until_trip_counts_down() {
        let t0 = Instant::now();
        let fs = FailsafeMonitor::new(t0);
        assert_eq!(
            fs.time_until_trip(t0 + Duration::from_millis(100), TIMEOUT),
            Duration::from_millis(150)
        );
        assert_eq!(fs.time_until_trip(t0 + Duration::from_secs(1), TIMEOUT), Duration::ZERO);
    }

    #[test]
    fn unrepresentable_deadline_does_not_panic() {
        let t0 = Instant::now();
        let mut fs = FailsafeMonitor::new(t0);
        let later = t0 + Duration::from_millis(10);
        assert_eq!(
            fs.time_until_trip(later, Duration::MAX),
            Duration::MAX - Duration::from_millis(10)
        );
        assert!(!fs.check(later, Duration::MAX));
    }
}
