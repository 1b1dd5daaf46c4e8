//! Builder for configuring and constructing an `EventBridge`.

use crate::core::{BridgeConfig, Clock, MonotonicClock};
use crate::{EventBridge, Result};
use std::sync::Arc;

/// Starts from [`BridgeConfig::default`]; every setter overrides one field.
///
/// # Example
///
/// ```
/// use eventlink::prelude::*;
///
/// let bridge = EventLinkBuilder::new()
///     .streams(2)
///     .events_per_packet(128)
///     .channel_capacity(64)
///     .build()
///     .unwrap();
///
/// assert_eq!(bridge.num_streams(), 2);
/// ```
pub struct EventLinkBuilder {
    config: BridgeConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for EventLinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLinkBuilder {
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::default(),
            clock: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 1
    pub fn streams(mut self, count: usize) -> Self {
        self.config.num_streams = count;
        self
    }

    /// Default: 1
    pub fn initial_packets(mut self, count: usize) -> Self {
        self.config.initial_packets_per_stream = count;
        self
    }

    /// Default: 64
    pub fn events_per_packet(mut self, count: usize) -> Self {
        self.config.initial_events_per_packet = count;
        self
    }

    /// Default: 8192
    pub fn max_events_per_packet(mut self, count: usize) -> Self {
        self.config.max_events_per_packet = count;
        self
    }

    /// Default: 16
    pub fn max_packets_per_stream(mut self, count: usize) -> Self {
        self.config.max_packets_per_allocator = count;
        self
    }

    /// Default: 8
    pub fn packets_per_transfer(mut self, count: usize) -> Self {
        self.config.max_packets_per_transfer = count;
        self
    }

    /// Default: 32
    pub fn channel_capacity(mut self, units: usize) -> Self {
        self.config.channel_capacity = units;
        self
    }

    /// Default: 1.0..=64.0
    pub fn load_factor_range(mut self, min: f64, max: f64) -> Self {
        self.config.min_load_factor = min;
        self.config.max_load_factor = max;
        self
    }

    /// Default: [`MonotonicClock`]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validates the configuration and builds an initialized bridge.
    pub fn build(self) -> Result<EventBridge> {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        tracing::debug!(
            streams = self.config.num_streams,
            events_per_packet = self.config.initial_events_per_packet,
            "building event bridge"
        );
        Ok(EventBridge::with_clock(self.config, clock)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_builder_defaults() {
        let bridge = EventLinkBuilder::new().build().unwrap();
        assert_eq!(bridge.config(), &BridgeConfig::default());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = EventLinkBuilder::new().channel_capacity(0).build();
        assert!(matches!(
            result,
            Err(Error::Core(crate::core::Error::InvalidConfig(_)))
        ));
    }
}
