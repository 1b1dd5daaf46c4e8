//! Lock-free primitives shared between the render and control threads.

use atomic_float::AtomicF64;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Cache-line aligned sticky flag.
///
/// Raised by whichever thread observes a condition, consumed by the control
/// thread with [`take`](AtomicFlag::take). A raised flag stays raised until it
/// is taken, no matter how many times it is raised in between.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    /// Sets the flag. A single store, RT-safe.
    #[inline]
    pub fn raise(&self) {
        self.value.store(true, Ordering::Release);
    }

    #[inline]
    pub fn clear(&self) {
        self.value.store(false, Ordering::Release);
    }

    /// Test-and-clear. Returns whether the flag was raised.
    #[inline]
    pub fn take(&self) -> bool {
        self.value.swap(false, Ordering::AcqRel)
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Cache-line aligned atomic f64.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicDouble {
    value: AtomicF64,
}

impl AtomicDouble {
    pub fn new(value: f64) -> Self {
        Self {
            value: AtomicF64::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.value.store(value, Ordering::Release);
    }

    /// Stores `value` and returns the previous one.
    #[inline]
    pub fn swap(&self, value: f64) -> f64 {
        self.value.swap(value, Ordering::AcqRel)
    }
}

impl Default for AtomicDouble {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Saturating work counter.
///
/// The render thread files requests with [`request`](RequestCounter::request);
/// the control thread claims everything filed so far with
/// [`drain`](RequestCounter::drain). The pending count never exceeds `limit`.
#[derive(Debug)]
#[repr(align(64))]
pub struct RequestCounter {
    pending: AtomicUsize,
    limit: usize,
}

impl RequestCounter {
    /// Counter saturating at `limit` pending requests.
    pub fn new(limit: usize) -> Self {
        Self {
            pending: AtomicUsize::new(0),
            limit,
        }
    }

    /// Adds up to `count` requests. Returns how many were actually filed.
    #[inline]
    pub fn request(&self, count: usize) -> usize {
        let limit = self.limit;
        match self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let next = current.saturating_add(count).min(limit);
                (next != current).then_some(next)
            }) {
            Ok(previous) => (previous.saturating_add(count)).min(limit) - previous,
            Err(_) => 0,
        }
    }

    /// Claims and clears every pending request.
    #[inline]
    pub fn drain(&self) -> usize {
        self.pending.swap(0, Ordering::AcqRel)
    }

    /// Requests filed and not yet drained.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Discards every pending request.
    pub fn reset(&self) {
        self.pending.store(0, Ordering::Release);
    }
}
