//! Time source for pacing the control loop.
//!
//! Only the runner reads a clock. Controllers count ticks, so a robot behaves
//! the same under [`MonotonicClock`] and under [`VirtualClock`].

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;

    /// Wait out the rest of a tick period.
    fn sleep(&self, d: Duration);

    /// Time since `epoch`; zero if `epoch` lies in the future.
    fn elapsed_since(&self, epoch: Instant) -> Duration {
        self.now().saturating_duration_since(epoch)
    }
}

/// Wall-clock pacing for runs against real or real-time simulated hardware.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

/// Simulated time: sleeping moves the clock forward and returns at once.
///
/// Clones share one timeline, so a test can hand one copy to the runner and
/// read the total run time from another.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Arc::default(),
        }
    }

    /// Move simulated time forward, as if a tick had overrun by `d`.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed = elapsed.saturating_add(d);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map_or(Duration::ZERO, |e| *e)
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
