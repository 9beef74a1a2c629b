//! Cadence arithmetic shared by the run loop and status reporting.
//!
//! Every capture is timed from the *start* of the previous capture, so the
//! time a capture takes is absorbed into the interval. When a capture runs
//! longer than the interval the next one starts immediately: nothing is
//! skipped and nothing is bunched up to catch up.

use crate::timelapse::config::TimelapseConfig;
use std::time::Duration;

/// Fixed cadence of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    interval: Duration,
    total_count: u32,
}

impl Schedule {
    pub fn new(interval: Duration, total_count: u32) -> Self {
        Self {
            interval,
            total_count,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Planned time from the first to the last capture: `interval * (total_count - 1)`.
    /// `None` when that does not fit in a `Duration`.
    pub fn checked_planned_duration(&self) -> Option<Duration> {
        self.interval.checked_mul(self.total_count.saturating_sub(1))
    }

    /// Planned time from the first to the last capture, saturating at `Duration::MAX`.
    pub fn planned_duration(&self) -> Duration {
        self.checked_planned_duration().unwrap_or(Duration::MAX)
    }

    /// True once `images_taken` reaches the total.
    pub fn is_complete(&self, images_taken: u32) -> bool {
        images_taken >= self.total_count
    }

    /// How long to keep waiting, given the time since the last capture
    /// started. `None` when the next capture is already due.
    pub fn remaining_wait(&self, since_capture_start: Duration) -> Option<Duration> {
        self.interval
            .checked_sub(since_capture_start)
            .filter(|wait| !wait.is_zero())
    }

    /// Seconds until the next capture is due. Negative after an overrun.
    pub fn time_to_next_secs(&self, since_capture_start: Duration) -> f64 {
        self.interval.as_secs_f64() - since_capture_start.as_secs_f64()
    }

    /// Estimated seconds until the run completes.
    pub fn time_remaining_secs(&self, time_to_next: f64, images_taken: u32) -> f64 {
        let intervals_after_next = self
            .total_count
            .saturating_sub(images_taken)
            .saturating_sub(1);
        time_to_next + self.interval.as_secs_f64() * f64::from(intervals_after_next)
    }
}

impl From<&TimelapseConfig> for Schedule {
    fn from(config: &TimelapseConfig) -> Self {
        Self::new(config.interval, config.total_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_wait() {
        let schedule = Schedule::new(Duration::from_secs(10), 3);

        assert_eq!(
            schedule.remaining_wait(Duration::from_secs(4)),
            Some(Duration::from_secs(6))
        );
        assert_eq!(schedule.remaining_wait(Duration::from_secs(10)), None);
        assert_eq!(schedule.remaining_wait(Duration::from_secs(15)), None);
    }

    #[test]
    fn test_overrun_reports_negative_time_to_next() {
        let schedule = Schedule::new(Duration::from_secs(10), 3);
        let time_to_next = schedule.time_to_next_secs(Duration::from_secs(15));
        assert!((time_to_next + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_remaining_counts_intervals_after_next() {
        let schedule = Schedule::new(Duration::from_secs(10), 3);

        // one image taken, 6s to the next, then one more interval
        let remaining = schedule.time_remaining_secs(6.0, 1);
        assert!((remaining - 16.0).abs() < 1e-9);

        // two taken, only the wait for the last capture is left
        let remaining = schedule.time_remaining_secs(2.5, 2);
        assert!((remaining - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_interval_never_waits() {
        let schedule = Schedule::new(Duration::ZERO, 5);
        assert_eq!(schedule.remaining_wait(Duration::ZERO), None);
        assert_eq!(schedule.planned_duration(), Duration::ZERO);
    }

    #[test]
    fn test_planned_duration_saturates() {
        let schedule = Schedule::new(Duration::from_secs(u64::MAX / 10), 100);
        assert_eq!(schedule.checked_planned_duration(), None);
        assert_eq!(schedule.planned_duration(), Duration::MAX);

        // a single image never waits, whatever the interval
        let single = Schedule::new(Duration::MAX, 1);
        assert_eq!(single.checked_planned_duration(), Some(Duration::ZERO));
    }

    #[test]
    fn test_completion() {
        let schedule = Schedule::new(Duration::from_secs(1), 2);
        assert!(!schedule.is_complete(1));
        assert!(schedule.is_complete(2));
    }
}
