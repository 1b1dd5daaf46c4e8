//! Real-time safe building blocks for the eventlink render/control bridge.
//!
//! - [`Event`]: fixed-size, `Copy` event with frame offset and output time
//! - [`AtomicFlag`], [`AtomicDouble`], [`RequestCounter`]: lock-free shared state
//! - [`SmoothedIntervalTimer`], [`Clock`]: cadence estimation
//! - [`BridgeConfig`]: sizing and control-loop parameters

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{BridgeConfig, MAX_PACKETS_PER_TRANSFER, MAX_STREAMS};

pub mod event;
pub use event::{Event, EventKind, EventPayload, RenderInfo};

mod lockfree;
pub use lockfree::{AtomicDouble, AtomicFlag, RequestCounter};

pub mod timer;
pub use timer::{Clock, ManualClock, MonotonicClock, SmoothedIntervalTimer};
