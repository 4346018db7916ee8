//! Trailing-edge debounce with explicit time.
//!
//! Every `schedule` replaces the pending payload and pushes the deadline out
//! by the quiet window, so a burst of calls collapses into one payload that
//! becomes due once the burst has been quiet for the full window. Time is
//! passed in, never read, so the same state machine runs under tokio, in a
//! browser tick, or in a test with a hand-made clock.

use std::ops::Add;
use std::time::Duration;

/// A point in time the debouncer can compare and offset.
pub trait Moment: Copy + Ord + Add<Duration, Output = Self> {}

impl<I> Moment for I where I: Copy + Ord + Add<Duration, Output = I> {}

#[derive(Debug, Clone)]
struct Pending<T, I> {
    payload: T,
    deadline: I,
}

#[derive(Debug, Clone)]
pub struct Debouncer<T, I> {
    quiet: Duration,
    pending: Option<Pending<T, I>>,
}

impl<T, I: Moment> Debouncer<T, I> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Replace the pending payload and restart the quiet window at `now`.
    ///
    /// Returns `true` when an earlier payload was superseded.
    pub fn schedule(&mut self, payload: T, now: I) -> bool {
        self.schedule_at(payload, now + self.quiet)
    }

    /// Replace the pending payload and make it due at `now`.
    pub fn schedule_now(&mut self, payload: T, now: I) -> bool {
        self.schedule_at(payload, now)
    }

    /// Make the pending payload (if any) due at `now`.
    pub fn expedite(&mut self, now: I) -> bool {
        match &mut self.pending {
            Some(pending) => {
                pending.deadline = pending.deadline.min(now);
                true
            }
            None => false,
        }
    }

    fn schedule_at(&mut self, payload: T, deadline: I) -> bool {
        self.pending
            .replace(Pending { payload, deadline })
            .is_some()
    }

    pub fn deadline(&self) -> Option<I> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_due(&self, now: I) -> bool {
        self.pending.as_ref().is_some_and(|p| p.deadline <= now)
    }

    /// Take the payload if its deadline has passed.
    pub fn take_due(&mut self, now: I) -> Option<T> {
        if self.is_due(now) { self.flush() } else { None }
    }

    /// Take the payload regardless of its deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.payload)
    }

    /// Drop the payload without emitting it.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
