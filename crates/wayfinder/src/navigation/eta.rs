//! Projected arrival time.

use chrono::{DateTime, Duration, Utc};

/// Projects an arrival timestamp from remaining step durations and delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrivalEstimator;

impl ArrivalEstimator {
    /// Seconds left on the route: remaining step durations plus delay.
    #[must_use]
    pub fn remaining_secs<I>(remaining_step_durations: I, accumulated_delay_s: u64) -> u64
    where
        I: IntoIterator<Item = u64>,
    {
        remaining_step_durations
            .into_iter()
            .fold(accumulated_delay_s, u64::saturating_add)
    }

    /// Projected arrival at `now` plus the remaining seconds.
    #[must_use]
    pub fn estimate<I>(
        now: DateTime<Utc>,
        remaining_step_durations: I,
        accumulated_delay_s: u64,
    ) -> DateTime<Utc>
    where
        I: IntoIterator<Item = u64>,
    {
        let secs = Self::remaining_secs(remaining_step_durations, accumulated_delay_s);
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        Duration::try_seconds(secs)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_sum_of_durations() {
        let eta = ArrivalEstimator::estimate(t0(), [60, 120, 30], 0);
        assert_eq!(eta, t0() + Duration::seconds(210));
    }

    #[test]
    fn test_delay_added() {
        let eta = ArrivalEstimator::estimate(t0(), [60], 45);
        assert_eq!(eta, t0() + Duration::seconds(105));
    }

    #[test]
    fn test_no_remaining_steps() {
        let eta = ArrivalEstimator::estimate(t0(), std::iter::empty(), 0);
        assert_eq!(eta, t0());
    }

    #[test]
    fn test_overflow_saturates() {
        assert_eq!(ArrivalEstimator::remaining_secs([u64::MAX, 10], 5), u64::MAX);
        let eta = ArrivalEstimator::estimate(t0(), [u64::MAX], 0);
        assert_eq!(eta, DateTime::<Utc>::MAX_UTC);
    }
}
