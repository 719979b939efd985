//! Millisecond clock sources
//!
//! The race timer only needs a monotonic millisecond counter. On the gate
//! board that is the hardware tick; on a host it is `Instant`, and tests drive
//! a [`ManualClock`] by hand.

use std::cell::Cell;
use std::time::Instant;

/// Monotonic millisecond counter
///
/// Readings are `u32` and wrap after ~49 days, like the board's tick counter.
/// Consumers must use wrapping arithmetic on differences.
pub trait Clock {
    /// Current reading in milliseconds
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Milliseconds elapsed since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u32 {
        // Truncation gives the same wrap-around as the hardware counter
        self.origin.elapsed().as_millis() as u32
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    /// Jump to an absolute reading
    pub fn set(&self, now_ms: u32) {
        self.now.set(now_ms);
    }

    /// Move forward by `delta_ms`, wrapping like the hardware counter
    pub fn advance(&self, delta_ms: u32) {
        self.now.set(self.now.get().wrapping_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}
