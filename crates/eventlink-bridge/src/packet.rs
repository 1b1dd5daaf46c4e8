//! Pooled, fixed-capacity event storage.

use eventlink_core::Event;

/// Append-only event buffer exchanged between the render and control threads.
///
/// Storage is reserved up front, so [`try_push`](EventPacket::try_push) and
/// [`clear`](EventPacket::clear) never touch the allocator. Only
/// [`grow`](EventPacket::grow) reallocates, and only the control thread calls it.
#[derive(Debug)]
pub struct EventPacket {
    events: Vec<Event>,
    capacity: usize,
}

impl EventPacket {
    /// Allocates storage for exactly `capacity` events. Control thread only.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Events the packet can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.events.len() >= self.capacity
    }

    /// RT-safe: appends within reserved capacity or refuses.
    #[inline]
    pub fn try_push(&mut self, event: Event) -> bool {
        if self.is_full() {
            return false;
        }
        self.events.push(event);
        true
    }

    /// RT-safe: keeps the storage.
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events pushed since the last clear, in push order.
    #[inline]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Stamps every event's absolute output time from its frame offset.
    #[inline]
    pub fn stamp(&mut self, output_time: f64, sample_rate: f64) {
        for event in self.events.iter_mut() {
            event.stamp(output_time, sample_rate);
        }
    }

    /// Grows capacity in place, keeping current contents. Never shrinks.
    ///
    /// Allocates. Control thread only.
    pub fn grow(&mut self, new_capacity: usize) {
        if new_capacity <= self.capacity {
            return;
        }
        self.events.reserve_exact(new_capacity - self.events.len());
        self.capacity = new_capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut packet = EventPacket::with_capacity(2);
        assert!(packet.try_push(Event::parameter(0, 1, 0.1)));
        assert!(packet.try_push(Event::parameter(1, 1, 0.2)));
        assert!(packet.is_full());
        assert!(!packet.try_push(Event::parameter(2, 1, 0.3)));
        assert_eq!(packet.len(), 2);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut packet = EventPacket::with_capacity(4);
        packet.try_push(Event::note_on(0, 0, 60, 100));
        packet.clear();
        assert!(packet.is_empty());
        assert_eq!(packet.capacity(), 4);
    }

    #[test]
    fn test_grow_preserves_contents() {
        let mut packet = EventPacket::with_capacity(2);
        packet.try_push(Event::note_on(0, 0, 60, 100));
        packet.try_push(Event::note_off(5, 0, 60));
        packet.grow(4);
        assert_eq!(packet.capacity(), 4);
        assert_eq!(packet.events()[1], Event::note_off(5, 0, 60));
        assert!(packet.try_push(Event::note_on(6, 0, 62, 90)));

        packet.grow(3);
        assert_eq!(packet.capacity(), 4);
    }

    #[test]
    fn test_zero_capacity_packet_refuses() {
        let mut packet = EventPacket::with_capacity(0);
        assert!(!packet.try_push(Event::raw(0, [1; 16])));
    }
}
