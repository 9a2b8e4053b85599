//! Single-shot timers owned by the state machine.
//!
//! A [`OneShot`] records when it was armed and for how long. It never fires on
//! its own: the owner polls it with the current time, which keeps the state
//! machine pure and lets simulations drive time explicitly.

use std::{ops::Sub, time::Duration};

/// Timers a session may have armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Bounds how long a frame may stay loading.
    LoadWatchdog,
    /// Trailing-edge debounce for viewport changes.
    ResizeDebounce,
}

/// Single-shot timer.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneShot<I> {
    armed_at: I,
    timeout: Duration,
}

impl<I> OneShot<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Arm a timer at `now` that expires after `timeout`.
    pub fn arm(now: I, timeout: Duration) -> Self {
        Self { armed_at: now, timeout }
    }

    /// Instant the timer was armed.
    pub fn armed_at(&self) -> I {
        self.armed_at
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time spent since arming.
    pub fn elapsed(&self, now: I) -> Duration {
        if now > self.armed_at { now - self.armed_at } else { Duration::ZERO }
    }

    /// Elapsed time, if the timer has expired. `None` otherwise.
    pub fn expired(&self, now: I) -> Option<Duration> {
        let elapsed = self.elapsed(now);
        (elapsed >= self.timeout).then_some(elapsed)
    }

    /// Time left until expiry, zero once expired.
    pub fn remaining(&self, now: I) -> Duration {
        self.timeout.saturating_sub(self.elapsed(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Plain durations stand in for instants.
    type Virtual = Duration;

    #[test]
    fn fires_exactly_at_deadline() {
        let timer = OneShot::<Virtual>::arm(Duration::from_secs(1), Duration::from_secs(15));

        assert_eq!(timer.expired(Duration::from_millis(15_999)), None);
        assert_eq!(timer.expired(Duration::from_secs(16)), Some(Duration::from_secs(15)));
    }

    #[test]
    fn remaining_counts_down_and_saturates() {
        let timer = OneShot::<Virtual>::arm(Duration::ZERO, Duration::from_millis(100));

        assert_eq!(timer.remaining(Duration::from_millis(30)), Duration::from_millis(70));
        assert_eq!(timer.remaining(Duration::from_millis(500)), Duration::ZERO);
    }

    #[test]
    fn earlier_now_counts_as_not_elapsed() {
        let timer = OneShot::<Virtual>::arm(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(timer.elapsed(Duration::from_secs(1)), Duration::ZERO);
    }
}
