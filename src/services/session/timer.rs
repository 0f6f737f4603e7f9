use time::OffsetDateTime;

use crate::core::config::TimerPolicy;

/// Outcome of one one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerTick {
    /// Still counting down; carries the new remaining value.
    Running(u64),
    /// The countdown just reached zero. Emitted exactly once.
    Expired,
    /// Already expired; ticks are no-ops and never go below zero.
    Idle,
}

/// Deterministic countdown. The async driver owns the 1-second cadence;
/// this type owns the decrement/expiry rules so they can be tested without
/// real time.
#[derive(Debug)]
pub(crate) struct CountdownTimer {
    remaining: u64,
    expired: bool,
}

impl CountdownTimer {
    pub(crate) fn new(remaining: u64) -> Self {
        Self { remaining, expired: false }
    }

    pub(crate) fn remaining(&self) -> u64 {
        self.remaining
    }

    pub(crate) fn tick(&mut self) -> TimerTick {
        if self.expired {
            return TimerTick::Idle;
        }

        if self.remaining <= 1 {
            self.remaining = 0;
            self.expired = true;
            return TimerTick::Expired;
        }

        self.remaining -= 1;
        TimerTick::Running(self.remaining)
    }
}

/// Reconstructs `time_remaining` when a session is re-hydrated.
pub(crate) fn reconcile(
    policy: TimerPolicy,
    stored_remaining: u64,
    started_at: OffsetDateTime,
    total_seconds: u64,
    now: OffsetDateTime,
) -> u64 {
    match policy {
        TimerPolicy::TickCount => stored_remaining,
        TimerPolicy::WallClock => {
            let elapsed = (now - started_at).whole_seconds().max(0) as u64;
            total_seconds.saturating_sub(elapsed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn two_ticks_expire_on_the_second() {
        let mut timer = CountdownTimer::new(2);

        assert_eq!(timer.tick(), TimerTick::Running(1));
        assert_eq!(timer.remaining(), 1);

        assert_eq!(timer.tick(), TimerTick::Expired);
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn expiry_fires_exactly_once_and_clamps_at_zero() {
        let mut timer = CountdownTimer::new(1);

        assert_eq!(timer.tick(), TimerTick::Expired);
        assert_eq!(timer.tick(), TimerTick::Idle);
        assert_eq!(timer.tick(), TimerTick::Idle);
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn zero_start_expires_on_first_tick() {
        let mut timer = CountdownTimer::new(0);
        assert_eq!(timer.tick(), TimerTick::Expired);
        assert_eq!(timer.tick(), TimerTick::Idle);
    }

    #[test]
    fn long_countdown_decrements_monotonically() {
        let mut timer = CountdownTimer::new(5);
        let mut seen = Vec::new();
        loop {
            match timer.tick() {
                TimerTick::Running(remaining) => seen.push(remaining),
                TimerTick::Expired => break,
                TimerTick::Idle => unreachable!("idle before expiry"),
            }
        }
        assert_eq!(seen, vec![4, 3, 2, 1]);
    }

    #[test]
    fn reconcile_tick_count_resumes_from_stored_value() {
        let started = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let now = started + Duration::seconds(600);

        let remaining = reconcile(TimerPolicy::TickCount, 9_000, started, 10_800, now);
        assert_eq!(remaining, 9_000);
    }

    #[test]
    fn reconcile_wall_clock_charges_elapsed_time() {
        let started = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let now = started + Duration::seconds(600);

        let remaining = reconcile(TimerPolicy::WallClock, 9_000, started, 10_800, now);
        assert_eq!(remaining, 10_200);
    }

    #[test]
    fn reconcile_wall_clock_clamps_at_zero() {
        let started = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let now = started + Duration::seconds(20_000);

        let remaining = reconcile(TimerPolicy::WallClock, 42, started, 10_800, now);
        assert_eq!(remaining, 0);
    }
}
