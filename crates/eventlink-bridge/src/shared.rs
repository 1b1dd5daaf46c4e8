//! State published between the two halves outside the channels.

use crate::stream::{StreamHandle, StreamShared};
use core::sync::atomic::{AtomicUsize, Ordering};
use eventlink_core::{AtomicDouble, AtomicFlag, BridgeConfig};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct SharedState {
    pub config: BridgeConfig,
    pub streams: Vec<Arc<StreamShared>>,
    /// A transfer unit was aborted because the to-control channel was full.
    pub dropped_events: AtomicFlag,
    /// Some stream ran out of held packets mid-block.
    pub render_overflow: AtomicFlag,
    /// A resize was refused at the per-packet ceiling.
    pub capacity_limit: AtomicFlag,
    pub ui_interval: AtomicDouble,
    pub render_interval: AtomicDouble,
    pub load_factor: AtomicDouble,
    pub num_events_required: AtomicUsize,
}

impl SharedState {
    pub fn new(config: BridgeConfig) -> Self {
        let streams = (0..config.num_streams)
            .map(|_| {
                Arc::new(StreamShared::new(
                    config.max_packets_per_allocator,
                    config.initial_events_per_packet,
                ))
            })
            .collect();
        let load_factor = AtomicDouble::new(config.min_load_factor);
        Self {
            config,
            streams,
            dropped_events: AtomicFlag::default(),
            render_overflow: AtomicFlag::default(),
            capacity_limit: AtomicFlag::default(),
            ui_interval: AtomicDouble::default(),
            render_interval: AtomicDouble::default(),
            load_factor,
            num_events_required: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn stream(&self, handle: StreamHandle) -> Option<&Arc<StreamShared>> {
        self.streams.get(handle.index())
    }

    #[inline]
    pub fn num_events_required(&self) -> usize {
        self.num_events_required.load(Ordering::Acquire)
    }
}
