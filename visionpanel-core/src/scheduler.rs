//! Trailing-edge debounce scheduling.
//!
//! The `Debouncer` holds at most one pending deadline. `schedule` replaces it,
//! and the owner polls `take_due` from its event loop. Time comes from a
//! `Clock` so tests can drive it by hand.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Single-slot trailing-edge debouncer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the debouncer, cancelling any pending deadline.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the pending deadline, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// Returns `true` exactly once when the deadline has passed, and disarms.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn test_fires_after_delay_once() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.schedule(clock.now());
        assert!(!debouncer.take_due(clock.now()));

        clock.advance(Duration::from_millis(499));
        assert!(!debouncer.take_due(clock.now()));

        clock.advance(Duration::from_millis(1));
        assert!(debouncer.take_due(clock.now()));
        assert!(!debouncer.take_due(clock.now()), "disarmed after firing");
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_reschedule_pushes_deadline() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(DELAY);

        debouncer.schedule(clock.now());
        clock.advance(Duration::from_millis(400));
        debouncer.schedule(clock.now());
        clock.advance(Duration::from_millis(400));
        assert!(!debouncer.take_due(clock.now()));
        assert_eq!(
            debouncer.remaining(clock.now()),
            Some(Duration::from_millis(100))
        );

        clock.advance(Duration::from_millis(100));
        assert!(debouncer.take_due(clock.now()));
    }

    #[test]
    fn test_cancel() {
        let clock = ManualClock::new();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(clock.now());
        debouncer.cancel();
        clock.advance(DELAY);
        assert!(!debouncer.take_due(clock.now()));
        assert_eq!(debouncer.remaining(clock.now()), None);
    }
}
