//! Monotonic clocks and cadence estimation.

use crate::lockfree::AtomicDouble;
use std::time::Instant;

/// Monotonic time source, in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall-independent clock backed by [`Instant`].
#[derive(Debug, Clone)]
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
    #[inline]
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually driven clock for deterministic tests and offline rendering.
#[derive(Debug, Default)]
pub struct ManualClock {
    time: AtomicDouble,
}

impl ManualClock {
    /// Clock reading `start` seconds until moved.
    pub fn new(start: f64) -> Self {
        Self {
            time: AtomicDouble::new(start),
        }
    }

    pub fn set(&self, time: f64) {
        self.time.set(time);
    }

    /// Moves the clock forward by `delta` seconds.
    pub fn advance(&self, delta: f64) {
        self.time.set(self.time.get() + delta);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> f64 {
        self.time.get()
    }
}

/// Exponential moving average of the interval between successive ticks.
///
/// The first tick only records a timestamp. Every following tick folds the
/// elapsed time, clamped to `[0, max_delta]`, into the average. Until a second
/// tick arrives [`interval`](SmoothedIntervalTimer::interval) reports zero.
#[derive(Debug, Clone)]
pub struct SmoothedIntervalTimer {
    last: Option<f64>,
    interval: f64,
    /// Set by the first measured interval, even a zero one.
    seeded: bool,
    smoothing: f64,
    max_delta: f64,
}

impl SmoothedIntervalTimer {
    /// `smoothing` is clamped to `[0, 1]`; `max_delta` is in seconds.
    pub fn new(smoothing: f64, max_delta: f64) -> Self {
        Self {
            last: None,
            interval: 0.0,
            seeded: false,
            smoothing: smoothing.clamp(0.0, 1.0),
            max_delta,
        }
    }

    /// Record a tick at `now` and return the updated smoothed interval.
    #[inline]
    pub fn tick(&mut self, now: f64) -> f64 {
        if let Some(last) = self.last {
            let delta = (now - last).clamp(0.0, self.max_delta);
            self.interval = if self.seeded {
                self.interval + self.smoothing * (delta - self.interval)
            } else {
                delta
            };
            self.seeded = true;
        }
        self.last = Some(now);
        self.interval
    }

    /// Current smoothed interval in seconds, zero before the second tick.
    #[inline]
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Forgets the last tick and the average.
    pub fn reset(&mut self) {
        self.last = None;
        self.interval = 0.0;
        self.seeded = false;
    }
}
