//! Observability snapshots.

use crate::stream::StreamHandle;

/// Packet supply of one stream, as tracked by the control side.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamStats {
    pub handle: StreamHandle,
    /// Packets created for the stream so far.
    pub num_packets: usize,
    /// Sum of those packets' capacities.
    pub event_capacity: usize,
    /// Capacity given to newly created packets.
    pub events_per_packet: usize,
    /// Requests filed by the render side and not yet serviced.
    pub pending_requests: usize,
}

/// Bridge-wide snapshot returned by `get_stats`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    /// Packets created across all streams.
    pub total_num_packets: usize,
    pub total_event_capacity: usize,
    /// Largest single packet, never above `max_events_per_packet`.
    pub max_packet_capacity: usize,
    /// Events pushed during the most recent block, accepted or not.
    pub latest_num_events_required: usize,
    /// `latest_num_events_required / total_event_capacity`.
    pub utilization: f64,
    /// Received events still waiting for their time.
    pub num_pending_events: usize,
    pub num_newly_acquired_events: usize,
    pub num_newly_ready_events: usize,
    /// Latest clamped load factor.
    pub load_factor: f64,
    /// Per-stream view, indexed like the stream handles.
    pub streams: Vec<StreamStats>,
}
