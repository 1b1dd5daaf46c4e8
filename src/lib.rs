//! # eventlink - Real-time Event Bridge
//!
//! Carries timestamped events (parameter changes, notes, buffer-ready
//! notices) out of a hard real-time audio callback to a control/UI thread,
//! and carries fresh or grown event storage back, without the audio thread
//! ever allocating, locking or blocking.
//!
//! ## Architecture
//!
//! eventlink is an umbrella crate that coordinates:
//! - **eventlink-core** - RT-safe primitives (events, sticky flags, interval timers, config)
//! - **eventlink-bridge** - Packet pools, SPSC transfer channels, render and control halves
//!
//! ## Quick Start
//!
//! ```
//! use eventlink::prelude::*;
//!
//! let bridge = EventLink::builder().streams(1).build()?;
//! let stream = bridge.default_stream();
//! let (mut render, mut control) = bridge.split();
//!
//! // Audio callback
//! render.begin_process();
//! render.push_event(stream, Event::parameter(0, 7, 0.5));
//! render.end_process(0.0, 48000.0);
//!
//! // UI tick
//! let update = control.update(Some(0.01));
//! assert_eq!(update.newly_ready.len(), 1);
//! if control.check_dropped_events() {
//!     // the to-control channel overflowed
//! }
//! # Ok::<(), eventlink::Error>(())
//! ```

/// Re-export of eventlink-core for direct access
pub use eventlink_core as core;

/// Re-export of eventlink-bridge for direct access
pub use eventlink_bridge as bridge;

pub use eventlink_core::{
    AtomicDouble, AtomicFlag, BridgeConfig, Clock, Event, EventKind, EventPayload, ManualClock,
    MonotonicClock, RenderInfo, RequestCounter, SmoothedIntervalTimer, MAX_PACKETS_PER_TRANSFER,
    MAX_STREAMS,
};

pub use eventlink_bridge::{
    AllocatorState, ControlSide, EventBridge, EventPacket, PacketAllocator, RenderSide, Stats,
    StreamHandle, StreamStats, TransferFlags, Update,
};

mod builder;
pub mod error;

pub use builder::EventLinkBuilder;
pub use error::{Error, Result};

/// Namespace for building bridges: `EventLink::builder()`.
pub struct EventLink;

impl EventLink {
    /// Starts an [`EventLinkBuilder`] from default settings.
    pub fn builder() -> EventLinkBuilder {
        EventLinkBuilder::new()
    }
}

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        BridgeConfig, ControlSide, Event, EventBridge, EventKind, EventLink, EventLinkBuilder,
        EventPayload, RenderInfo, RenderSide, Stats, StreamHandle, Update,
    };
    pub use crate::{Error, Result};
}
