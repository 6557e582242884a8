//! Cancellable scheduled tasks
//!
//! Timers here are plain values owned by whoever armed them: nothing runs
//! in the background. The owner passes the current [`Instant`] to `poll`
//! from its event loop, and dropping the owner drops the task.

use std::time::{Duration, Instant};

/// One-shot deadline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer to fire `delay` after `now`
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before firing, if armed
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Fire once the deadline has passed; a fired timer disarms itself
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Trailing-edge debouncer
///
/// Each `schedule` replaces the pending value and pushes the deadline back,
/// so a burst of calls yields only the last value, once the burst has been
/// quiet for the full delay.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    timer: Timer,
    pending: Option<T>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timer: Timer::new(),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queue a value, superseding any pending one
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.timer.arm(now, self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending value once the quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.timer.poll(now) {
            self.pending.take()
        } else {
            None
        }
    }

    /// Release the pending value immediately, cancelling the timer
    pub fn flush(&mut self) -> Option<T> {
        self.timer.cancel();
        self.pending.take()
    }

    /// Drop the pending value without releasing it
    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_timer_fires_once() {
        let start = Instant::now();
        let mut timer = Timer::new();
        assert!(!timer.poll(start));

        timer.arm(start, ms(100));
        assert!(!timer.poll(start + ms(99)));
        assert_eq!(timer.remaining(start + ms(40)), Some(ms(60)));
        assert!(timer.poll(start + ms(100)));
        assert!(!timer.poll(start + ms(200)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_timer_cancel() {
        let start = Instant::now();
        let mut timer = Timer::new();
        timer.arm(start, ms(10));
        timer.cancel();
        assert!(!timer.poll(start + ms(50)));
    }

    #[test]
    fn test_burst_yields_last_value_once() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(300));

        for (i, offset) in [0, 50, 100, 150, 200].iter().enumerate() {
            debouncer.schedule(i, start + ms(*offset));
            assert_eq!(debouncer.poll(start + ms(*offset)), None);
        }

        // 300ms after the first edit, but only 100ms after the last
        assert_eq!(debouncer.poll(start + ms(300)), None);
        assert_eq!(debouncer.poll(start + ms(500)), Some(4));
        assert_eq!(debouncer.poll(start + ms(900)), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_flush_cancels_pending_timer() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(300));
        debouncer.schedule("draft", start);

        assert_eq!(debouncer.flush(), Some("draft"));
        assert_eq!(debouncer.poll(start + ms(1000)), None);
        assert_eq!(debouncer.flush(), None);
    }

    #[test]
    fn test_cancel_drops_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(300));
        debouncer.schedule(1, start);
        debouncer.cancel();
        assert_eq!(debouncer.poll(start + ms(400)), None);
    }
}
