//! Trailing-edge debounce primitive used by the autosave scheduler.

use std::time::{Duration, Instant};

/// A reusable trailing-edge debouncer.
///
/// Each `trigger` re-arms the deadline; the action fires only once the
/// full delay passes without another trigger. Polled cooperatively via
/// `fire_ready`, so it needs no timer thread.
#[derive(Debug)]
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

    /// Arm (or re-arm) the debounce window from now.
    pub fn trigger(&mut self) {
        self.trigger_at(Instant::now());
    }

    /// Arm from an explicit instant. Tests drive time through this.
    pub fn trigger_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed. Returns true at most once
    /// per trigger.
    pub fn fire_ready(&mut self) -> bool {
        self.fire_ready_at(Instant::now())
    }

    pub fn fire_ready_at(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
