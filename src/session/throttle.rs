use std::time::{Duration, Instant};

use strum::Display;

use crate::store::Direction;

/// Drops navigation requests issued before the cooldown elapses.
#[derive(Debug, Clone)]
pub struct Throttle {
    cooldown: Duration,
    fast_cooldown: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(cooldown: Duration, fast_cooldown: Duration) -> Self {
        Self {
            cooldown,
            fast_cooldown,
            last: None,
        }
    }

    /// Claims a slot at `now`; `false` means the request must be dropped.
    pub fn try_acquire(&mut self, now: Instant, fast: bool) -> bool {
        let window = if fast {
            self.fast_cooldown
        } else {
            self.cooldown
        };
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < window {
                return false;
            }
        }
        self.last = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StopReason {
    Released,
    Cancelled,
    Failed,
    Disabled,
    Replaced,
}

/// A repeating navigation task that fires every `interval` until stopped.
#[derive(Debug, Clone)]
pub struct FastForward {
    direction: Direction,
    interval: Duration,
    next_due: Instant,
    ticks: u64,
}

impl FastForward {
    pub fn start(direction: Direction, interval: Duration, now: Instant) -> Self {
        Self {
            direction,
            interval,
            next_due: now,
            ticks: 0,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns `true` when a tick is due at `now` and schedules the next one.
    pub fn due(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.ticks += 1;
        self.next_due = now + self.interval;
        true
    }

    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_drops_calls_inside_cooldown() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(200), Duration::from_millis(50));
        assert!(throttle.try_acquire(start, false));
        assert!(!throttle.try_acquire(start + Duration::from_millis(150), false));
        assert!(throttle.try_acquire(start + Duration::from_millis(200), false));
    }

    #[test]
    fn fast_mode_uses_shorter_window() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(200), Duration::from_millis(50));
        assert!(throttle.try_acquire(start, true));
        assert!(!throttle.try_acquire(start + Duration::from_millis(30), true));
        assert!(throttle.try_acquire(start + Duration::from_millis(60), true));
    }

    #[test]
    fn fast_forward_fires_on_interval() {
        let start = Instant::now();
        let mut task = FastForward::start(Direction::Next, Duration::from_millis(100), start);
        assert!(task.due(start));
        assert!(!task.due(start + Duration::from_millis(40)));
        assert_eq!(
            task.time_until_due(start + Duration::from_millis(40)),
            Duration::from_millis(60)
        );
        assert!(task.due(start + Duration::from_millis(100)));
        assert_eq!(task.ticks(), 2);
    }
}
