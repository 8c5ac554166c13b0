//! Time sources for history timestamps
//!
//! The recorder stamps each pushed command with `Clock::now()` so history can
//! be cut back in step with an external timeline (a screen recording, for
//! instance). Hosts that own such a timeline install a `ManualClock` and move
//! it themselves.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

pub trait Clock {
    /// Current time in seconds; must never go backwards
    fn now(&self) -> f64;
}

/// Seconds elapsed since the clock was created
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Externally driven clock; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        ManualClock { time: Rc::new(Cell::new(start)) }
    }

    /// Move to `time`; earlier values are ignored
    pub fn set(&self, time: f64) {
        if time >= self.time.get() {
            self.time.set(time);
        }
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.time.get() + seconds.max(0.0));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.time.get()
    }
}
