//! Stream handles and per-stream shared state.

use crate::allocator::PacketAllocator;
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use eventlink_core::{RequestCounter, MAX_STREAMS};

/// Opaque, 1-based handle of a logical event source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamHandle(u8);

impl StreamHandle {
    /// First stream, present whenever the bridge has any streams at all.
    pub const DEFAULT: Self = Self(1);

    /// Handle for the zero-based stream slot `index`.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        (index < MAX_STREAMS).then(|| Self(index as u8 + 1))
    }

    /// Zero-based position of the stream.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// One-based stream id.
    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// State both threads touch for one stream.
#[derive(Debug)]
pub(crate) struct StreamShared {
    /// Packets the render side is waiting for.
    pub requests: RequestCounter,
    /// Capacity the control side gives newly created packets.
    events_per_packet: AtomicUsize,
}

impl StreamShared {
    pub fn new(max_packets: usize, events_per_packet: usize) -> Self {
        Self {
            requests: RequestCounter::new(max_packets),
            events_per_packet: AtomicUsize::new(events_per_packet),
        }
    }

    #[inline]
    pub fn events_per_packet(&self) -> usize {
        self.events_per_packet.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_events_per_packet(&self, value: usize) {
        self.events_per_packet.store(value, Ordering::Release);
    }
}

/// A stream as seen by the render thread: its handle plus its allocator.
#[derive(Debug)]
pub struct Stream {
    handle: StreamHandle,
    pub(crate) allocator: PacketAllocator,
}

impl Stream {
    pub(crate) fn new(handle: StreamHandle, allocator: PacketAllocator) -> Self {
        Self { handle, allocator }
    }

    #[inline]
    pub fn handle(&self) -> StreamHandle {
        self.handle
    }

    /// The stream's render-side packet pool.
    #[inline]
    pub fn allocator(&self) -> &PacketAllocator {
        &self.allocator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_one_based() {
        assert_eq!(StreamHandle::DEFAULT.get(), 1);
        assert_eq!(StreamHandle::DEFAULT.index(), 0);
        let third = StreamHandle::from_index(2).unwrap();
        assert_eq!(third.get(), 3);
        assert_eq!(third.index(), 2);
        assert!(StreamHandle::from_index(MAX_STREAMS).is_none());
    }

    #[test]
    fn test_shared_capacity_roundtrip() {
        let shared = StreamShared::new(16, 64);
        assert_eq!(shared.events_per_packet(), 64);
        shared.set_events_per_packet(128);
        assert_eq!(shared.events_per_packet(), 128);
    }
}
