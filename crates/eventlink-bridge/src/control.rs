//! Control-thread half of the bridge.
//!
//! Runs once per UI tick. Allocation is allowed here: this is where packets
//! are created and grown, and where a full from-control channel is absorbed
//! by a local retry queue instead of blocking.

use crate::packet::EventPacket;
use crate::shared::SharedState;
use crate::staging::StagingArea;
use crate::stats::{Stats, StreamStats};
use crate::stream::StreamHandle;
use crate::transfer::{TransferEntry, TransferFlags, TransferReceiver, TransferSender, TransferUnit};
use eventlink_core::{Clock, Event, SmoothedIntervalTimer};
use std::collections::VecDeque;
use std::sync::Arc;

/// Events surfaced by one [`ControlSide::update`] tick.
#[derive(Debug, Clone, Copy)]
pub struct Update<'a> {
    /// Events whose time has come, in timestamp order.
    pub newly_ready: &'a [Event],
    /// Everything that arrived this tick, due or not.
    pub newly_acquired: &'a [Event],
}

/// Control-side bookkeeping for the packets of one stream.
#[derive(Debug, Clone, Copy, Default)]
struct PacketLedger {
    num_packets: usize,
    total_capacity: usize,
    max_capacity: usize,
}

impl PacketLedger {
    fn created(&mut self, capacity: usize) {
        self.num_packets += 1;
        self.total_capacity += capacity;
        self.max_capacity = self.max_capacity.max(capacity);
    }

    fn grown(&mut self, old_capacity: usize, new_capacity: usize) {
        self.total_capacity += new_capacity - old_capacity;
        self.max_capacity = self.max_capacity.max(new_capacity);
    }
}

/// Batches outgoing packets and parks whatever the channel refuses.
struct Outbound {
    sender: TransferSender,
    batch: TransferUnit,
    batch_size: usize,
    retry: VecDeque<TransferUnit>,
}

impl Outbound {
    fn push(&mut self, entry: TransferEntry) {
        self.batch.push(entry);
        if self.batch.len() >= self.batch_size {
            self.finish_batch();
        }
    }

    fn finish_batch(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let unit = core::mem::take(&mut self.batch);
        if !self.retry.is_empty() {
            self.retry.push_back(unit);
            return;
        }
        if let Err(unit) = self.sender.try_send(unit) {
            tracing::debug!(
                packets = unit.len(),
                "from-control channel full, deferring transfer unit"
            );
            self.retry.push_back(unit);
        }
    }

    /// Retries queued units in order, stopping at the first refusal.
    fn flush(&mut self) {
        while let Some(unit) = self.retry.pop_front() {
            if let Err(unit) = self.sender.try_send(unit) {
                self.retry.push_front(unit);
                break;
            }
        }
    }

    fn num_queued_packets(&self) -> usize {
        self.retry.iter().map(TransferUnit::len).sum::<usize>() + self.batch.len()
    }
}

/// Control-thread entry points: `update`, the sticky flag checks and `get_stats`.
pub struct ControlSide {
    pub(crate) shared: Arc<SharedState>,
    from_render: TransferReceiver,
    outbound: Outbound,
    staging: StagingArea,
    ledgers: Vec<PacketLedger>,
    timer: SmoothedIntervalTimer,
    clock: Arc<dyn Clock>,
}

impl ControlSide {
    pub(crate) fn new(
        shared: Arc<SharedState>,
        to_render: TransferSender,
        from_render: TransferReceiver,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = &shared.config;
        let timer = SmoothedIntervalTimer::new(config.interval_smoothing, config.max_interval_delta);
        let outbound = Outbound {
            sender: to_render,
            batch: TransferUnit::new(),
            batch_size: config.max_packets_per_transfer,
            retry: VecDeque::new(),
        };
        let ledgers = vec![PacketLedger::default(); config.num_streams];
        Self {
            shared,
            from_render,
            outbound,
            staging: StagingArea::new(),
            ledgers,
            timer,
            clock,
        }
    }

    /// Allocates a packet for `handle` at the stream's current capacity.
    pub(crate) fn create_packet(&mut self, handle: StreamHandle) -> Option<EventPacket> {
        let capacity = self.shared.stream(handle)?.events_per_packet();
        self.ledgers.get_mut(handle.index())?.created(capacity);
        Some(EventPacket::with_capacity(capacity))
    }

    /// One control tick.
    ///
    /// Services packet requests, drains everything the render side shipped
    /// and releases pending events due at or before `current_time`. With
    /// `None` every pending event is released.
    pub fn update(&mut self, current_time: Option<f64>) -> Update<'_> {
        let ui_interval = self.timer.tick(self.clock.now());
        self.shared.ui_interval.set(ui_interval);

        self.staging.begin_tick();
        self.outbound.flush();

        self.service_requests();
        self.drain_from_render();
        self.outbound.finish_batch();

        self.staging.release_due(current_time);
        Update {
            newly_ready: self.staging.newly_ready(),
            newly_acquired: self.staging.newly_acquired(),
        }
    }

    fn service_requests(&mut self) {
        for index in 0..self.shared.streams.len() {
            let Some(handle) = StreamHandle::from_index(index) else {
                break;
            };
            let requested = self.shared.streams[index].requests.drain();
            if requested == 0 {
                continue;
            }
            tracing::debug!(%handle, requested, "creating packets");
            for _ in 0..requested {
                if let Some(packet) = self.create_packet(handle) {
                    self.outbound.push(TransferEntry::new(
                        handle,
                        TransferFlags::NEWLY_CREATED,
                        packet,
                    ));
                }
            }
        }
    }

    fn drain_from_render(&mut self) {
        let ceiling = self.shared.config.max_events_per_packet;
        while let Some(unit) = self.from_render.try_recv() {
            for entry in unit {
                let TransferEntry {
                    stream,
                    flags,
                    mut packet,
                } = entry;
                self.staging.acquire(packet.events());
                packet.clear();

                let mut reply = TransferFlags::NONE;
                if flags.contains(TransferFlags::RESIZE_REQUESTED) {
                    reply.insert(TransferFlags::RESIZE_COMPLETED);
                    let old_capacity = packet.capacity();
                    let new_capacity = old_capacity.saturating_mul(2);
                    if new_capacity > ceiling {
                        tracing::warn!(
                            %stream,
                            capacity = old_capacity,
                            ceiling,
                            "packet capacity limit reached, not growing"
                        );
                        reply.insert(TransferFlags::CAPACITY_LIMITED);
                        self.shared.capacity_limit.raise();
                    } else {
                        packet.grow(new_capacity);
                        if let Some(ledger) = self.ledgers.get_mut(stream.index()) {
                            ledger.grown(old_capacity, new_capacity);
                        }
                        tracing::trace!(%stream, new_capacity, "packet resized");
                    }
                }
                self.outbound.push(TransferEntry::new(stream, reply, packet));
            }
        }
    }

    /// True if a block had to abort a send since the last check.
    pub fn check_dropped_events(&self) -> bool {
        self.shared.dropped_events.take()
    }

    /// True if any stream ran out of packets since the last check.
    pub fn check_render_buffer_overflow(&self) -> bool {
        self.shared.render_overflow.take()
    }

    /// True if a resize was refused at the per-packet ceiling since the last check.
    pub fn check_capacity_limit_reached(&self) -> bool {
        self.shared.capacity_limit.take()
    }

    /// Handle of the first stream.
    #[inline]
    pub fn default_stream(&self) -> StreamHandle {
        StreamHandle::DEFAULT
    }

    #[inline]
    pub fn num_streams(&self) -> usize {
        self.shared.streams.len()
    }

    /// Events received but not yet due.
    pub fn pending_events(&self) -> &[Event] {
        self.staging.pending()
    }

    /// Packets parked locally because the from-control channel was full.
    pub fn num_queued_packets(&self) -> usize {
        self.outbound.num_queued_packets()
    }

    /// Snapshot of packet supply and staging occupancy. No side effects.
    pub fn get_stats(&self) -> Stats {
        let streams: Vec<StreamStats> = self
            .ledgers
            .iter()
            .enumerate()
            .filter_map(|(index, ledger)| {
                let handle = StreamHandle::from_index(index)?;
                let shared = self.shared.stream(handle)?;
                Some(StreamStats {
                    handle,
                    num_packets: ledger.num_packets,
                    event_capacity: ledger.total_capacity,
                    events_per_packet: shared.events_per_packet(),
                    pending_requests: shared.requests.pending(),
                })
            })
            .collect();

        let total_num_packets = self.ledgers.iter().map(|l| l.num_packets).sum();
        let total_event_capacity: usize = self.ledgers.iter().map(|l| l.total_capacity).sum();
        let max_packet_capacity = self
            .ledgers
            .iter()
            .map(|l| l.max_capacity)
            .max()
            .unwrap_or(0);
        let latest_num_events_required = self.shared.num_events_required();
        let utilization = if total_event_capacity > 0 {
            latest_num_events_required as f64 / total_event_capacity as f64
        } else {
            0.0
        };

        Stats {
            total_num_packets,
            total_event_capacity,
            max_packet_capacity,
            latest_num_events_required,
            utilization,
            num_pending_events: self.staging.pending().len(),
            num_newly_acquired_events: self.staging.newly_acquired().len(),
            num_newly_ready_events: self.staging.newly_ready().len(),
            load_factor: self.shared.load_factor.get(),
            streams,
        }
    }
}
