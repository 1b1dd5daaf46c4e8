//! Render-side packet pool for one stream.
//!
//! Every method here runs on the audio thread: no allocation, no locks, no
//! logging. Capacity problems are answered by filing requests that the
//! control thread services on its next tick.

use crate::packet::EventPacket;
use crate::stream::StreamShared;
use crate::transfer::{TransferEntry, TransferFlags};
use eventlink_core::{BridgeConfig, Event};
use std::collections::VecDeque;
use std::sync::Arc;

/// Where the allocator is in the capacity negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocatorState {
    Idle,
    /// Waiting for newly created packets.
    RequestingPackets,
    /// Resize round in progress: `received` of `total` packets have come back.
    Resizing { received: usize, total: usize },
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_packets: usize,
    initial_events_per_packet: usize,
    load_scale: f64,
}

/// Ordered set of packets one stream fills during a block.
#[derive(Debug)]
pub struct PacketAllocator {
    /// Packets currently on the render side, filled front to back.
    held: VecDeque<EventPacket>,
    active: usize,
    num_required: usize,
    num_accepted: usize,
    /// Sticky until [`take_overflow`](PacketAllocator::take_overflow).
    overflowed: bool,
    /// Packets assigned to this stream, wherever they currently are.
    num_owned: usize,
    /// Requested but not yet delivered.
    num_outstanding: usize,
    resize_pending: bool,
    resize_awaiting: usize,
    resize_received: usize,
    resize_total: usize,
    resize_target: usize,
    /// Set once the per-packet ceiling stopped a resize.
    capacity_capped: bool,
    events_per_packet: usize,
    limits: Limits,
    shared: Arc<StreamShared>,
}

impl PacketAllocator {
    pub(crate) fn new(config: &BridgeConfig, shared: Arc<StreamShared>) -> Self {
        Self {
            held: VecDeque::with_capacity(config.max_packets_per_allocator),
            active: 0,
            num_required: 0,
            num_accepted: 0,
            overflowed: false,
            num_owned: 0,
            num_outstanding: 0,
            resize_pending: false,
            resize_awaiting: 0,
            resize_received: 0,
            resize_total: 0,
            resize_target: 0,
            capacity_capped: false,
            events_per_packet: config.initial_events_per_packet,
            limits: Limits {
                max_packets: config.max_packets_per_allocator,
                initial_events_per_packet: config.initial_events_per_packet,
                load_scale: config.load_scale,
            },
            shared,
        }
    }

    /// Hands the allocator a packet created during setup, outside the
    /// request protocol.
    pub(crate) fn adopt(&mut self, packet: EventPacket) {
        debug_assert!(self.num_owned < self.limits.max_packets);
        self.num_owned += 1;
        self.held.push_back(packet);
    }

    /// Resets the cursor and per-block counters and empties every held packet.
    #[inline]
    pub fn begin_epoch(&mut self) {
        self.active = 0;
        self.num_required = 0;
        self.num_accepted = 0;
        for packet in self.held.iter_mut() {
            packet.clear();
        }
    }

    /// Appends to the active packet, moving on to the next one when full.
    ///
    /// Returns `false` and raises the overflow flag once every held packet is
    /// full. The event is dropped.
    #[inline]
    pub fn push_event(&mut self, event: Event) -> bool {
        self.num_required += 1;
        while let Some(packet) = self.held.get_mut(self.active) {
            if packet.try_push(event) {
                self.num_accepted += 1;
                return true;
            }
            self.active += 1;
        }
        self.overflowed = true;
        false
    }

    /// Files a packet request or starts a resize round if this block dropped
    /// events.
    pub fn request_more_if_needed(&mut self, load_factor: f64) {
        if self.resize_pending || self.num_accepted >= self.num_required {
            return;
        }

        let events_per_packet = if self.events_per_packet > 0 {
            self.events_per_packet
        } else {
            self.limits.initial_events_per_packet
        };
        let scale = load_factor * self.limits.load_scale;
        let base = self.num_required.div_ceil(events_per_packet);
        let needed = (base as f64 * scale).ceil() as usize;
        let committed = self.num_owned + self.num_outstanding;

        if committed < self.limits.max_packets {
            let shortfall = needed
                .saturating_sub(committed)
                .min(self.limits.max_packets - committed);
            if shortfall > 0 {
                self.num_outstanding += self.shared.requests.request(shortfall);
            }
            return;
        }

        if self.capacity_capped || self.num_outstanding > 0 {
            return;
        }
        let required_capacity = (self.num_required as f64 * scale).ceil() as usize;
        if required_capacity <= self.total_capacity() {
            return;
        }
        // The control side enforces the per-packet ceiling and answers with
        // CAPACITY_LIMITED, which caps this allocator when the round ends.
        self.resize_pending = true;
        self.resize_target = events_per_packet.saturating_mul(2);
        self.resize_total = self.num_owned;
        self.resize_awaiting = self.num_owned;
        self.resize_received = 0;
    }

    /// Takes back a packet from the control side, or one whose send aborted.
    pub fn accept_incoming(&mut self, entry: TransferEntry) {
        let TransferEntry { flags, packet, .. } = entry;

        if flags.contains(TransferFlags::NEWLY_CREATED) {
            self.num_outstanding = self.num_outstanding.saturating_sub(1);
            self.num_owned += 1;
        }

        if flags.contains(TransferFlags::ABORTED) && flags.contains(TransferFlags::RESIZE_REQUESTED)
        {
            self.resize_awaiting += 1;
        }

        if flags.contains(TransferFlags::RESIZE_COMPLETED) && self.resize_pending {
            if flags.contains(TransferFlags::CAPACITY_LIMITED) {
                self.capacity_capped = true;
            }
            self.resize_received += 1;
            if self.resize_received >= self.resize_total {
                self.finish_resize();
            }
        }

        debug_assert!(self.held.len() < self.limits.max_packets);
        self.held.push_back(packet);
    }

    fn finish_resize(&mut self) {
        if !self.capacity_capped {
            self.events_per_packet = self.resize_target;
            self.shared.set_events_per_packet(self.resize_target);
        }
        self.resize_pending = false;
        self.resize_awaiting = 0;
        self.resize_received = 0;
        self.resize_total = 0;
    }

    /// Rotates the front packet out, attaching a resize request while a
    /// round still needs packets that have not been grown yet.
    #[inline]
    pub fn release_filled(&mut self) -> Option<(EventPacket, TransferFlags)> {
        let packet = self.held.pop_front()?;
        self.active = self.active.saturating_sub(1);
        let mut flags = TransferFlags::NONE;
        if self.resize_pending
            && self.resize_awaiting > 0
            && packet.capacity() < self.resize_target
        {
            flags.insert(TransferFlags::RESIZE_REQUESTED);
            self.resize_awaiting -= 1;
        }
        Some((packet, flags))
    }

    /// Number of leading held packets that received events this block.
    #[inline]
    pub fn num_filled(&self) -> usize {
        self.held.iter().take_while(|p| !p.is_empty()).count()
    }

    /// Returns and clears the overflow flag.
    #[inline]
    pub fn take_overflow(&mut self) -> bool {
        core::mem::take(&mut self.overflowed)
    }

    /// Whether the current block dropped an event.
    #[inline]
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Events pushed this block, accepted or not.
    #[inline]
    pub fn num_required(&self) -> usize {
        self.num_required
    }

    /// Events that found room this block.
    #[inline]
    pub fn num_accepted(&self) -> usize {
        self.num_accepted
    }

    /// Packets currently on the render side.
    #[inline]
    pub fn num_held(&self) -> usize {
        self.held.len()
    }

    /// Packets assigned to this stream, wherever they are.
    #[inline]
    pub fn num_owned(&self) -> usize {
        self.num_owned
    }

    /// Packets requested from the control side and not yet received.
    #[inline]
    pub fn num_outstanding(&self) -> usize {
        self.num_outstanding
    }

    /// Uniform packet capacity after the last completed resize round.
    #[inline]
    pub fn events_per_packet(&self) -> usize {
        self.events_per_packet
    }

    #[inline]
    pub fn is_resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// True once the control side refused to grow past the per-packet ceiling.
    #[inline]
    pub fn is_capacity_capped(&self) -> bool {
        self.capacity_capped
    }

    /// Sum of capacities of the packets currently held.
    #[inline]
    pub fn held_capacity(&self) -> usize {
        self.held.iter().map(EventPacket::capacity).sum()
    }

    /// Capacity of every owned packet at the current per-packet size.
    #[inline]
    pub fn total_capacity(&self) -> usize {
        self.num_owned * self.events_per_packet
    }

    pub fn state(&self) -> AllocatorState {
        if self.resize_pending {
            AllocatorState::Resizing {
                received: self.resize_received,
                total: self.resize_total,
            }
        } else if self.num_outstanding > 0 {
            AllocatorState::RequestingPackets
        } else {
            AllocatorState::Idle
        }
    }
}
