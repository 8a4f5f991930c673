//! Playback time sources
//!
//! The engine never reads wall-clock time on its own. A session samples its
//! [`PlaybackClock`] exactly once per tick, so everything judged in that tick
//! sees the same instant.

use std::cell::Cell;
use std::time::Instant;

/// Anything that can report the current playback position in seconds
pub trait PlaybackClock {
    fn now(&self) -> f64;
}

impl<F> PlaybackClock for F
where
    F: Fn() -> f64,
{
    fn now(&self) -> f64 {
        self()
    }
}

/// A clock the host (or a test) moves by hand
///
/// ```
/// use tja::{ManualClock, PlaybackClock};
///
/// let clock = ManualClock::new(1.0);
/// clock.advance(0.5);
/// assert_eq!(clock.now(), 1.5);
/// clock.set(0.25);
/// assert_eq!(clock.now(), 0.25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Cell<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            time: Cell::new(start),
        }
    }

    pub fn set(&self, time: f64) {
        self.time.set(time);
    }

    pub fn advance(&self, seconds: f64) {
        self.time.set(self.time.get() + seconds);
    }
}

impl PlaybackClock for ManualClock {
    fn now(&self) -> f64 {
        self.time.get()
    }
}

/// Monotonic time since construction, shifted by a start position
#[derive(Debug, Clone, Copy)]
pub struct InstantClock {
    origin: Instant,
    start: f64,
}

impl InstantClock {
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Report `start` seconds at construction, e.g. a negative lead-in
    pub fn starting_at(start: f64) -> Self {
        Self {
            origin: Instant::now(),
            start,
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for InstantClock {
    fn now(&self) -> f64 {
        self.start + self.origin.elapsed().as_secs_f64()
    }
}
