//! Bridge configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on concurrently existing streams.
pub const MAX_STREAMS: usize = 8;

/// Upper bound on packets carried by a single transfer unit.
pub const MAX_PACKETS_PER_TRANSFER: usize = 8;

/// Sizing and control-loop parameters for an event bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Streams created at initialization, up to [`MAX_STREAMS`].
    pub num_streams: usize,
    /// Packets created for every stream before the first block.
    pub initial_packets_per_stream: usize,
    /// Capacity of every packet until the first resize round.
    pub initial_events_per_packet: usize,
    /// Hard ceiling on the capacity of a single packet.
    pub max_events_per_packet: usize,
    /// Most packets a single stream may own.
    pub max_packets_per_allocator: usize,
    /// Packets per transfer unit, up to [`MAX_PACKETS_PER_TRANSFER`].
    pub max_packets_per_transfer: usize,
    /// Transfer units each channel can hold.
    pub channel_capacity: usize,
    /// Lower clamp of the load factor; also its value before timing is known.
    pub min_load_factor: f64,
    pub max_load_factor: f64,
    /// Headroom applied on top of the load factor when sizing requests.
    pub load_scale: f64,
    /// EMA coefficient in `(0, 1]` for both interval timers.
    pub interval_smoothing: f64,
    /// Longest single interval, in seconds, the timers accept.
    pub max_interval_delta: f64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            num_streams: 1,
            initial_packets_per_stream: 1,
            initial_events_per_packet: 64,
            max_events_per_packet: 8192,
            max_packets_per_allocator: 16,
            max_packets_per_transfer: MAX_PACKETS_PER_TRANSFER,
            channel_capacity: 32,
            min_load_factor: 1.0,
            max_load_factor: 64.0,
            load_scale: 1.25,
            interval_smoothing: 0.1,
            max_interval_delta: 1.0,
        }
    }
}

impl BridgeConfig {
    /// Checks ranges and cross-field limits. Called by every constructor.
    pub fn validate(&self) -> Result<()> {
        if self.num_streams > MAX_STREAMS {
            return Err(Error::TooManyStreams {
                requested: self.num_streams,
                max: MAX_STREAMS,
            });
        }
        if self.initial_events_per_packet == 0 {
            return Err(Error::InvalidConfig(
                "initial_events_per_packet must be non-zero".into(),
            ));
        }
        if self.initial_events_per_packet > self.max_events_per_packet {
            return Err(Error::InvalidConfig(format!(
                "initial_events_per_packet {} exceeds max_events_per_packet {}",
                self.initial_events_per_packet, self.max_events_per_packet
            )));
        }
        if self.max_packets_per_allocator == 0 {
            return Err(Error::InvalidConfig(
                "max_packets_per_allocator must be non-zero".into(),
            ));
        }
        if self.initial_packets_per_stream > self.max_packets_per_allocator {
            return Err(Error::InvalidConfig(format!(
                "initial_packets_per_stream {} exceeds max_packets_per_allocator {}",
                self.initial_packets_per_stream, self.max_packets_per_allocator
            )));
        }
        if self.max_packets_per_transfer == 0
            || self.max_packets_per_transfer > MAX_PACKETS_PER_TRANSFER
        {
            return Err(Error::InvalidConfig(format!(
                "max_packets_per_transfer {} out of range (1-{})",
                self.max_packets_per_transfer, MAX_PACKETS_PER_TRANSFER
            )));
        }
        if self.channel_capacity == 0 {
            return Err(Error::InvalidConfig(
                "channel_capacity must be non-zero".into(),
            ));
        }
        if !(self.min_load_factor > 0.0 && self.min_load_factor <= self.max_load_factor) {
            return Err(Error::InvalidConfig(format!(
                "load factor range [{}, {}] is invalid",
                self.min_load_factor, self.max_load_factor
            )));
        }
        if !(self.load_scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "load_scale {} must be positive",
                self.load_scale
            )));
        }
        if !(self.interval_smoothing > 0.0 && self.interval_smoothing <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "interval_smoothing {} out of range (0-1]",
                self.interval_smoothing
            )));
        }
        if !(self.max_interval_delta > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_interval_delta {} must be positive",
                self.max_interval_delta
            )));
        }
        Ok(())
    }

    /// Clamps `ui_interval / render_interval` into the configured range.
    ///
    /// Falls back to `min_load_factor` while either interval is still unknown.
    #[inline]
    pub fn load_factor(&self, ui_interval: f64, render_interval: f64) -> f64 {
        if render_interval > 0.0 && ui_interval > 0.0 {
            (ui_interval / render_interval).clamp(self.min_load_factor, self.max_load_factor)
        } else {
            self.min_load_factor
        }
    }
}
