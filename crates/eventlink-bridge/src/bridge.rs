//! Owning coordinator for both halves.

use crate::allocator::PacketAllocator;
use crate::control::{ControlSide, Update};
use crate::render::RenderSide;
use crate::shared::SharedState;
use crate::stats::Stats;
use crate::stream::{Stream, StreamHandle};
use crate::transfer::transfer_channel;
use eventlink_core::{BridgeConfig, Clock, Error, Event, MonotonicClock, RenderInfo, Result};
use std::sync::Arc;

/// Render/control event bridge.
///
/// Owns both halves. Used directly it drives both sides from one thread,
/// which is what offline rendering and tests do. For live audio,
/// [`split`](EventBridge::split) it and move the [`RenderSide`] into the audio
/// callback and the [`ControlSide`] into the UI loop. Lifecycle operations
/// (`initialize`, `reset`, `terminate`) need `&mut self`, so they can only
/// run once the halves are [`reunite`](EventBridge::reunite)d.
///
/// # Example
///
/// ```
/// use eventlink_bridge::EventBridge;
/// use eventlink_core::{BridgeConfig, Event};
///
/// let mut bridge = EventBridge::new(BridgeConfig::default()).unwrap();
/// let stream = bridge.default_stream();
///
/// bridge.begin_process();
/// bridge.push_event(stream, Event::note_on(0, 0, 60, 100));
/// bridge.end_process(0.0, 48000.0);
///
/// let update = bridge.update(Some(1.0));
/// assert_eq!(update.newly_ready.len(), 1);
/// ```
pub struct EventBridge {
    render: RenderSide,
    control: ControlSide,
    config: BridgeConfig,
    clock: Arc<dyn Clock>,
}

impl EventBridge {
    /// Validates `config` and builds a bridge on a [`MonotonicClock`].
    pub fn new(config: BridgeConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Like [`new`](EventBridge::new) with an explicit time source.
    pub fn with_clock(config: BridgeConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let (render, control) = build_halves(&config, &clock);
        Ok(Self {
            render,
            control,
            config,
            clock,
        })
    }

    /// Tears everything down and recreates `num_streams` fresh streams.
    pub fn initialize(&mut self, num_streams: usize) -> Result<()> {
        let config = BridgeConfig {
            num_streams,
            ..self.config.clone()
        };
        config.validate()?;
        let (render, control) = build_halves(&config, &self.clock);
        self.render = render;
        self.control = control;
        self.config = config;
        Ok(())
    }

    /// Frees every packet, staged event, flag and timer, then recreates the
    /// configured streams.
    pub fn reset(&mut self) {
        tracing::debug!(streams = self.config.num_streams, "resetting event bridge");
        let (render, control) = build_halves(&self.config, &self.clock);
        self.render = render;
        self.control = control;
    }

    /// Frees everything and leaves the bridge with no streams.
    pub fn terminate(&mut self) {
        tracing::debug!("terminating event bridge");
        self.config.num_streams = 0;
        self.reset();
    }

    /// Separates the halves for use on two threads.
    pub fn split(self) -> (RenderSide, ControlSide) {
        (self.render, self.control)
    }

    /// Reassembles halves previously obtained from [`split`](EventBridge::split).
    pub fn reunite(render: RenderSide, control: ControlSide) -> Result<Self> {
        if !Arc::ptr_eq(&render.shared, &control.shared) {
            return Err(Error::MismatchedHalves);
        }
        let config = render.shared.config.clone();
        let clock = render.clock();
        Ok(Self {
            render,
            control,
            config,
            clock,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Render half, for driving both sides from one thread.
    pub fn render(&mut self) -> &mut RenderSide {
        &mut self.render
    }

    /// Control half, for driving both sides from one thread.
    pub fn control(&mut self) -> &mut ControlSide {
        &mut self.control
    }

    /// Handle of the first stream.
    #[inline]
    pub fn default_stream(&self) -> StreamHandle {
        StreamHandle::DEFAULT
    }

    /// Validates a 1-based stream id.
    pub fn stream_handle(&self, id: usize) -> Result<StreamHandle> {
        if id == 0 || id > self.config.num_streams {
            return Err(Error::InvalidStream(id));
        }
        StreamHandle::from_index(id - 1).ok_or(Error::InvalidStream(id))
    }

    /// Every configured stream handle, in order.
    pub fn streams(&self) -> impl Iterator<Item = StreamHandle> {
        (0..self.config.num_streams).filter_map(StreamHandle::from_index)
    }

    #[inline]
    pub fn num_streams(&self) -> usize {
        self.config.num_streams
    }

    /// Render-side packet pool of `handle`.
    pub fn allocator(&self, handle: StreamHandle) -> Option<&PacketAllocator> {
        self.render.allocator(handle)
    }

    /// See [`RenderSide::begin_process`].
    pub fn begin_process(&mut self) {
        self.render.begin_process();
    }

    /// See [`RenderSide::push_event`].
    #[inline]
    pub fn push_event(&mut self, stream: StreamHandle, event: Event) -> bool {
        self.render.push_event(stream, event)
    }

    /// See [`RenderSide::end_process`].
    pub fn end_process(&mut self, output_time: f64, sample_rate: f64) {
        self.render.end_process(output_time, sample_rate);
    }

    pub fn end_process_with(&mut self, info: &RenderInfo, output_time: f64) {
        self.render.end_process_with(info, output_time);
    }

    /// See [`ControlSide::update`].
    pub fn update(&mut self, current_time: Option<f64>) -> Update<'_> {
        self.control.update(current_time)
    }

    /// See [`ControlSide::check_dropped_events`].
    pub fn check_dropped_events(&self) -> bool {
        self.control.check_dropped_events()
    }

    /// See [`ControlSide::check_render_buffer_overflow`].
    pub fn check_render_buffer_overflow(&self) -> bool {
        self.control.check_render_buffer_overflow()
    }

    /// See [`ControlSide::check_capacity_limit_reached`].
    pub fn check_capacity_limit_reached(&self) -> bool {
        self.control.check_capacity_limit_reached()
    }

    /// See [`ControlSide::get_stats`].
    pub fn get_stats(&self) -> Stats {
        self.control.get_stats()
    }
}

/// Wires both channels, creates the streams and seeds their initial packets.
fn build_halves(config: &BridgeConfig, clock: &Arc<dyn Clock>) -> (RenderSide, ControlSide) {
    let shared = Arc::new(SharedState::new(config.clone()));
    let (to_control_tx, to_control_rx) = transfer_channel(config.channel_capacity);
    let (from_control_tx, from_control_rx) = transfer_channel(config.channel_capacity);

    let mut control = ControlSide::new(
        Arc::clone(&shared),
        from_control_tx,
        to_control_rx,
        Arc::clone(clock),
    );

    let mut streams = Vec::with_capacity(config.num_streams);
    for (index, stream_shared) in shared.streams.iter().enumerate() {
        let Some(handle) = StreamHandle::from_index(index) else {
            break;
        };
        let mut allocator = PacketAllocator::new(config, Arc::clone(stream_shared));
        for _ in 0..config.initial_packets_per_stream {
            if let Some(packet) = control.create_packet(handle) {
                allocator.adopt(packet);
            }
        }
        streams.push(Stream::new(handle, allocator));
    }

    let render = RenderSide::new(
        Arc::clone(&shared),
        streams,
        to_control_tx,
        from_control_rx,
        Arc::clone(clock),
    );
    (render, control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::EventPacket;
    use crate::transfer::{TransferEntry, TransferFlags, TransferUnit};
    use eventlink_core::ManualClock;

    fn small_config() -> BridgeConfig {
        BridgeConfig {
            num_streams: 2,
            initial_events_per_packet: 4,
            max_events_per_packet: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_packets_are_held() {
        let bridge = EventBridge::new(small_config()).unwrap();
        for handle in bridge.streams() {
            let allocator = bridge.allocator(handle).unwrap();
            assert_eq!(allocator.num_held(), 1);
            assert_eq!(allocator.num_owned(), 1);
        }
        let stats = bridge.get_stats();
        assert_eq!(stats.total_num_packets, 2);
        assert_eq!(stats.total_event_capacity, 8);
        assert_eq!(stats.max_packet_capacity, 4);
    }

    #[test]
    fn test_stream_handle_validation() {
        let bridge = EventBridge::new(small_config()).unwrap();
        assert_eq!(bridge.stream_handle(1).unwrap(), bridge.default_stream());
        assert_eq!(bridge.stream_handle(2).unwrap().get(), 2);
        assert_eq!(bridge.stream_handle(0), Err(Error::InvalidStream(0)));
        assert_eq!(bridge.stream_handle(3), Err(Error::InvalidStream(3)));
    }

    #[test]
    fn test_push_to_unknown_stream_fails() {
        let mut bridge = EventBridge::new(small_config()).unwrap();
        bridge.begin_process();
        let missing = StreamHandle::from_index(5).unwrap();
        assert!(!bridge.push_event(missing, Event::note_on(0, 0, 60, 1)));
    }

    #[test]
    fn test_capacity_limit_reported() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut bridge = EventBridge::with_clock(small_config(), clock).unwrap();
        let stream = bridge.default_stream();

        let mut unit = TransferUnit::new();
        unit.push(TransferEntry::new(
            stream,
            TransferFlags::RESIZE_REQUESTED,
            EventPacket::with_capacity(4),
        ));
        assert!(bridge.render().to_control.try_send(unit).is_ok());

        bridge.update(None);
        assert!(bridge.check_capacity_limit_reached());
        assert!(!bridge.check_capacity_limit_reached());
        assert_eq!(bridge.get_stats().max_packet_capacity, 4);
    }

    #[test]
    fn test_initialize_and_terminate() {
        let mut bridge = EventBridge::new(small_config()).unwrap();
        bridge.initialize(4).unwrap();
        assert_eq!(bridge.num_streams(), 4);
        assert_eq!(bridge.get_stats().total_num_packets, 4);

        assert!(bridge.initialize(99).is_err());
        assert_eq!(bridge.num_streams(), 4);

        bridge.terminate();
        assert_eq!(bridge.num_streams(), 0);
        assert_eq!(bridge.get_stats().total_num_packets, 0);
        bridge.begin_process();
        assert!(!bridge.push_event(StreamHandle::DEFAULT, Event::note_on(0, 0, 60, 1)));
    }

    #[test]
    fn test_reset_clears_flags_and_staging() {
        let mut bridge = EventBridge::new(small_config()).unwrap();
        let stream = bridge.default_stream();
        bridge.begin_process();
        for frame in 0..6 {
            bridge.push_event(stream, Event::parameter(frame, 0, 0.0));
        }
        bridge.end_process(10.0, 48000.0);
        bridge.update(Some(0.0));
        assert_eq!(bridge.get_stats().num_pending_events, 4);

        bridge.reset();
        assert!(!bridge.check_render_buffer_overflow());
        let stats = bridge.get_stats();
        assert_eq!(stats.num_pending_events, 0);
        assert_eq!(stats.total_num_packets, 2);
    }

    #[test]
    fn test_split_and_reunite() {
        let bridge = EventBridge::new(small_config()).unwrap();
        let other = EventBridge::new(small_config()).unwrap();

        let (render, control) = bridge.split();
        let (other_render, other_control) = other.split();

        assert!(matches!(
            EventBridge::reunite(render, other_control),
            Err(Error::MismatchedHalves)
        ));
        assert!(EventBridge::reunite(other_render, control).is_err());

        let bridge = EventBridge::new(small_config()).unwrap();
        let (render, control) = bridge.split();
        let bridge = EventBridge::reunite(render, control).unwrap();
        assert_eq!(bridge.num_streams(), 2);
    }
}
