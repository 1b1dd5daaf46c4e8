//! Transfer units and the two SPSC channels that carry them.

use crate::packet::EventPacket;
use crate::stream::StreamHandle;
use core::ops::{BitOr, BitOrAssign};
use eventlink_core::MAX_PACKETS_PER_TRANSFER;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use smallvec::SmallVec;

/// Per-packet transfer state.
///
/// `RESIZE_COMPLETED` never co-occurs with `NEWLY_CREATED` or `ABORTED`.
/// `CAPACITY_LIMITED` only accompanies `RESIZE_COMPLETED` and means the
/// packet was left at its old size because doubling would cross the ceiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TransferFlags(u8);

impl TransferFlags {
    pub const NONE: Self = Self(0);
    /// Freshly allocated by the control side in answer to a request.
    pub const NEWLY_CREATED: Self = Self(1 << 0);
    /// Channel was full, the packet went straight back to its sender.
    pub const ABORTED: Self = Self(1 << 1);
    /// Render side asks for the packet to be doubled.
    pub const RESIZE_REQUESTED: Self = Self(1 << 2);
    /// Control side answered a resize request.
    pub const RESIZE_COMPLETED: Self = Self(1 << 3);
    /// With `RESIZE_COMPLETED`: growth was refused at the per-packet ceiling.
    pub const CAPACITY_LIMITED: Self = Self(1 << 4);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// `RESIZE_COMPLETED` excludes `NEWLY_CREATED` and `ABORTED`.
    pub const fn is_valid(self) -> bool {
        let completed = self.contains(Self::RESIZE_COMPLETED);
        if completed && (self.contains(Self::NEWLY_CREATED) || self.contains(Self::ABORTED)) {
            return false;
        }
        !self.contains(Self::CAPACITY_LIMITED) || completed
    }
}

impl BitOr for TransferFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TransferFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A packet in flight, tagged with its owning stream.
#[derive(Debug)]
pub struct TransferEntry {
    /// Stream that owns the packet.
    pub stream: StreamHandle,
    pub flags: TransferFlags,
    pub packet: EventPacket,
}

impl TransferEntry {
    /// Debug-asserts that `flags` is a valid combination.
    #[inline]
    pub fn new(stream: StreamHandle, flags: TransferFlags, packet: EventPacket) -> Self {
        debug_assert!(flags.is_valid(), "invalid transfer flags {:#07b}", flags.bits());
        Self {
            stream,
            flags,
            packet,
        }
    }
}

/// Batch of packets moved through a channel in a single push.
///
/// Entries live inline, so building and consuming a unit never allocates.
#[derive(Debug, Default)]
pub struct TransferUnit {
    entries: SmallVec<[TransferEntry; MAX_PACKETS_PER_TRANSFER]>,
}

impl TransferUnit {
    /// Empty batch; stores its entries inline.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_PACKETS_PER_TRANSFER
    }

    /// Appends an entry. The caller ships the batch once it is full.
    #[inline]
    pub fn push(&mut self, entry: TransferEntry) {
        debug_assert!(!self.is_full());
        self.entries.push(entry);
    }

    #[inline]
    pub fn entries(&self) -> &[TransferEntry] {
        &self.entries
    }

    /// Flags every entry as returned-to-sender.
    pub fn abort(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.flags.insert(TransferFlags::ABORTED);
        }
    }
}

impl IntoIterator for TransferUnit {
    type Item = TransferEntry;
    type IntoIter = smallvec::IntoIter<[TransferEntry; MAX_PACKETS_PER_TRANSFER]>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Producing end of a transfer channel.
pub struct TransferSender {
    producer: HeapProd<TransferUnit>,
}

impl TransferSender {
    /// Never blocks. Hands the unit back if the channel is full.
    #[inline]
    pub fn try_send(&mut self, unit: TransferUnit) -> Result<(), TransferUnit> {
        self.producer.try_push(unit)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.producer.is_full()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.producer.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.producer.is_empty()
    }
}

/// Consuming end of a transfer channel.
pub struct TransferReceiver {
    consumer: HeapCons<TransferUnit>,
}

impl TransferReceiver {
    /// Next unit, or `None` if the channel is empty. Never blocks.
    #[inline]
    pub fn try_recv(&mut self) -> Option<TransferUnit> {
        self.consumer.try_pop()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.consumer.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}

/// Create a bounded SPSC channel holding up to `capacity` transfer units.
pub fn transfer_channel(capacity: usize) -> (TransferSender, TransferReceiver) {
    let rb = HeapRb::new(capacity);
    let (producer, consumer) = rb.split();
    (TransferSender { producer }, TransferReceiver { consumer })
}
