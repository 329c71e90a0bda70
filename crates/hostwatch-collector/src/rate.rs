//! Throughput from cumulative byte counters.

use chrono::{DateTime, Utc};

/// Smallest interval used as divisor, in seconds. Guards against
/// back-to-back ticks producing a zero or negative elapsed time.
pub const MIN_INTERVAL_SECS: f64 = 1e-6;

/// Converts two cumulative byte readings into megabits per second.
///
/// A counter that went backwards (interface restart, wrap) yields a negative
/// rate. The value is returned as-is; callers decide how to report it.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use hostwatch_collector::rate::rate_mbps;
///
/// let t0 = Utc::now();
/// let mbps = rate_mbps(0, 1_250_000, t0, t0 + Duration::seconds(1));
/// assert!((mbps - 10.0).abs() < 1e-9);
/// ```
pub fn rate_mbps(
    prev_bytes: u64,
    curr_bytes: u64,
    prev_time: DateTime<Utc>,
    curr_time: DateTime<Utc>,
) -> f64 {
    let elapsed = curr_time - prev_time;
    let secs = match elapsed.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => elapsed.num_milliseconds() as f64 / 1_000.0,
    };
    let dt = secs.max(MIN_INTERVAL_SECS);
    let delta = curr_bytes as f64 - prev_bytes as f64;
    delta * 8.0 / dt / 1_000_000.0
}

/// Carries the previous reading of one byte counter across ticks.
#[derive(Debug, Default, Clone)]
pub struct RateCalculator {
    prev: Option<(u64, DateTime<Utc>)>,
}

impl RateCalculator {
    pub fn new() -> Self {
        Self { prev: None }
    }

    /// A calculator whose first [`update`](Self::update) already yields a rate.
    pub fn with_baseline(bytes: u64, at: DateTime<Utc>) -> Self {
        Self {
            prev: Some((bytes, at)),
        }
    }

    /// Records `bytes` observed at `now` and returns the rate since the
    /// previous observation, or `None` if this is the first one.
    pub fn update(&mut self, bytes: u64, now: DateTime<Utc>) -> Option<f64> {
        let rate = self
            .prev
            .map(|(prev_bytes, prev_time)| rate_mbps(prev_bytes, bytes, prev_time, now));
        self.prev = Some((bytes, now));
        rate
    }

    pub fn has_baseline(&self) -> bool {
        self.prev.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn rate_over_one_second() {
        let t0 = Utc::now();
        let mbps = rate_mbps(1_000, 1_125_000, t0, t0 + Duration::seconds(1));
        let expected = (1_125_000.0 - 1_000.0) * 8.0 / 1.0 / 1e6;
        assert!((mbps - expected).abs() < 1e-9);
        assert!((mbps - 8.992).abs() < 1e-9);
    }

    #[test]
    fn zero_interval_uses_floor() {
        let t0 = Utc::now();
        let mbps = rate_mbps(0, 1, t0, t0);
        assert!(mbps.is_finite());
        assert!((mbps - 8.0 / MIN_INTERVAL_SECS / 1e6).abs() < 1e-6);
    }

    #[test]
    fn clock_going_backwards_uses_floor() {
        let t0 = Utc::now();
        let mbps = rate_mbps(0, 0, t0, t0 - Duration::seconds(5));
        assert_eq!(mbps, 0.0);
    }

    #[test]
    fn counter_reset_yields_negative_rate() {
        let t0 = Utc::now();
        let mbps = rate_mbps(2_000_000, 0, t0, t0 + Duration::seconds(2));
        assert!(mbps < 0.0);
        assert!((mbps + 8.0).abs() < 1e-9);
    }

    #[test]
    fn calculator_needs_a_baseline() {
        let t0 = Utc::now();
        let mut calc = RateCalculator::new();
        assert!(!calc.has_baseline());
        assert_eq!(calc.update(1_000, t0), None);
        let rate = calc.update(126_000, t0 + Duration::seconds(1)).unwrap();
        assert!((rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn calculator_with_baseline_rates_first_update() {
        let t0 = Utc::now();
        let mut calc = RateCalculator::with_baseline(0, t0);
        let rate = calc.update(250_000, t0 + Duration::milliseconds(500)).unwrap();
        assert!((rate - 4.0).abs() < 1e-9);
    }
}
