//! Audio-thread half of the bridge.
//!
//! # RT Safety
//!
//! Nothing reachable from [`RenderSide`] allocates, frees, locks or logs.
//! Packets only change hands through the two SPSC channels; when the
//! to-control channel is full the batch is aborted and handed back to its
//! allocator instead of waiting.

use crate::allocator::PacketAllocator;
use crate::shared::SharedState;
use crate::stream::{Stream, StreamHandle};
use crate::transfer::{TransferEntry, TransferReceiver, TransferSender, TransferUnit};
use core::sync::atomic::Ordering;
use eventlink_core::{Clock, Event, RenderInfo, SmoothedIntervalTimer};
use std::sync::Arc;

/// Render-thread entry points: `begin_process`, `push_event`, `end_process`.
pub struct RenderSide {
    pub(crate) shared: Arc<SharedState>,
    streams: Vec<Stream>,
    pub(crate) to_control: TransferSender,
    from_control: TransferReceiver,
    timer: SmoothedIntervalTimer,
    clock: Arc<dyn Clock>,
}

impl RenderSide {
    pub(crate) fn new(
        shared: Arc<SharedState>,
        streams: Vec<Stream>,
        to_control: TransferSender,
        from_control: TransferReceiver,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let timer = SmoothedIntervalTimer::new(
            shared.config.interval_smoothing,
            shared.config.max_interval_delta,
        );
        Self {
            shared,
            streams,
            to_control,
            from_control,
            timer,
            clock,
        }
    }

    /// Absorbs packets handed back by the control side, then opens a new
    /// block on every stream.
    pub fn begin_process(&mut self) {
        while let Some(unit) = self.from_control.try_recv() {
            for entry in unit {
                if let Some(stream) = self.streams.get_mut(entry.stream.index()) {
                    stream.allocator.accept_incoming(entry);
                }
            }
        }
        for stream in self.streams.iter_mut() {
            stream.allocator.begin_epoch();
        }
    }

    /// Queues an event on `stream`. Returns `false` if it was dropped.
    #[inline]
    pub fn push_event(&mut self, stream: StreamHandle, event: Event) -> bool {
        match self.streams.get_mut(stream.index()) {
            Some(stream) => stream.allocator.push_event(event),
            None => false,
        }
    }

    /// [`end_process`](RenderSide::end_process) taking the sample rate from `info`.
    pub fn end_process_with(&mut self, info: &RenderInfo, output_time: f64) {
        self.end_process(output_time, info.sample_rate);
    }

    /// Stamps, batches and ships filled packets, then feeds the load
    /// estimate back into each stream's allocator.
    pub fn end_process(&mut self, output_time: f64, sample_rate: f64) {
        let render_interval = self.timer.tick(self.clock.now());
        self.shared.render_interval.set(render_interval);

        let ui_interval = self.shared.ui_interval.get();
        let load_factor = self.shared.config.load_factor(ui_interval, render_interval);
        self.shared.load_factor.set(load_factor);

        let batch_size = self.shared.config.max_packets_per_transfer;
        let mut dropped = false;

        'streams: for stream in self.streams.iter_mut() {
            let handle = stream.handle();
            let allocator = &mut stream.allocator;
            let mut batch = TransferUnit::new();

            for _ in 0..allocator.num_filled() {
                let Some((mut packet, flags)) = allocator.release_filled() else {
                    break;
                };
                packet.stamp(output_time, sample_rate);
                batch.push(TransferEntry::new(handle, flags, packet));

                if batch.len() >= batch_size {
                    let full = core::mem::take(&mut batch);
                    if !send_or_reclaim(&mut self.to_control, allocator, full) {
                        dropped = true;
                        break 'streams;
                    }
                }
            }

            if !batch.is_empty() && !send_or_reclaim(&mut self.to_control, allocator, batch) {
                dropped = true;
                break;
            }
        }

        if dropped {
            self.shared.dropped_events.raise();
        }

        let mut overflowed = false;
        let mut num_required = 0;
        for stream in self.streams.iter_mut() {
            if !dropped {
                stream.allocator.request_more_if_needed(load_factor);
            }
            overflowed |= stream.allocator.take_overflow();
            num_required += stream.allocator.num_required();
        }
        if overflowed {
            self.shared.render_overflow.raise();
        }
        self.shared
            .num_events_required
            .store(num_required, Ordering::Release);
    }

    /// Handle of the first stream.
    #[inline]
    pub fn default_stream(&self) -> StreamHandle {
        StreamHandle::DEFAULT
    }

    #[inline]
    pub fn num_streams(&self) -> usize {
        self.streams.len()
    }

    /// Stream behind `handle`, if it exists.
    pub fn stream(&self, handle: StreamHandle) -> Option<&Stream> {
        self.streams.get(handle.index())
    }

    pub fn allocator(&self, handle: StreamHandle) -> Option<&PacketAllocator> {
        self.stream(handle).map(Stream::allocator)
    }

    /// Latest load factor estimate.
    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.shared.load_factor.get()
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }
}

/// Sends `unit`, or marks it aborted and returns every packet to `allocator`.
#[inline]
fn send_or_reclaim(
    sender: &mut TransferSender,
    allocator: &mut PacketAllocator,
    unit: TransferUnit,
) -> bool {
    match sender.try_send(unit) {
        Ok(()) => true,
        Err(mut unit) => {
            unit.abort();
            for entry in unit {
                allocator.accept_incoming(entry);
            }
            false
        }
    }
}
