//! Timers reused across loop iterations.
//!
//! Both types are created once per run. The idle timer is reset in place
//! instead of building a fresh timeout every time around the loop.

use crossbeam_channel::{after, never, Receiver};
use std::time::{Duration, Instant};

// Poll period used when no stall timeout is configured.
const DISARMED_PERIOD: Duration = Duration::from_secs(60);

/// One-shot deadline for a whole run.
#[derive(Debug)]
pub struct Deadline {
    at: Option<Instant>,
    rx: Receiver<Instant>,
}

impl Deadline {
    pub fn new(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(t) => Self {
                at: Instant::now().checked_add(t),
                rx: after(t),
            },
            None => Self {
                at: None,
                rx: never(),
            },
        }
    }

    /// Receiver that yields once when the deadline passes.
    pub fn receiver(&self) -> &Receiver<Instant> {
        &self.rx
    }

    pub fn is_expired(&self) -> bool {
        self.at.map_or(false, |at| Instant::now() >= at)
    }
}

/// Timer that fires when nothing has happened for `period`.
#[derive(Debug)]
pub struct IdleTimer {
    period: Option<Duration>,
    last_reset: Instant,
}

impl IdleTimer {
    pub fn new(period: Option<Duration>) -> Self {
        Self {
            period,
            last_reset: Instant::now(),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.period.is_some()
    }

    pub fn reset(&mut self) {
        self.last_reset = Instant::now();
    }

    /// Time left before the timer fires.
    pub fn remaining(&self) -> Duration {
        let period = self.period.unwrap_or(DISARMED_PERIOD);
        period.saturating_sub(self.last_reset.elapsed())
    }

    pub fn idle_for(&self) -> Duration {
        self.last_reset.elapsed()
    }
}
