//! Allocation-free event bridge from the audio render callback to a control thread.
//!
//! Events pushed on the render thread land in pooled [`EventPacket`]s owned
//! per stream by a [`PacketAllocator`]. At the end of each block filled
//! packets travel to the control thread through a bounded SPSC channel;
//! emptied (and possibly grown) packets come back through a second one.
//! When a block runs out of space the allocator asks the control side for
//! more packets, sized by how many render blocks elapse per control tick.
//! Once a stream owns its maximum number of packets, further demand doubles
//! the size of every packet in a resize round instead.
//!
//! # Primary API
//!
//! - [`EventBridge`]: owns both halves; `initialize` / `reset` / `terminate`
//! - [`RenderSide`]: `begin_process`, `push_event`, `end_process`
//! - [`ControlSide`]: `update`, `check_*`, `get_stats`

mod allocator;
pub use allocator::{AllocatorState, PacketAllocator};

mod bridge;
pub use bridge::EventBridge;

mod control;
pub use control::{ControlSide, Update};

mod packet;
pub use packet::EventPacket;

mod render;
pub use render::RenderSide;

mod shared;

mod staging;
pub use staging::StagingArea;

mod stats;
pub use stats::{Stats, StreamStats};

mod stream;
pub use stream::{Stream, StreamHandle};

pub mod transfer;
pub use transfer::{TransferEntry, TransferFlags, TransferUnit};
