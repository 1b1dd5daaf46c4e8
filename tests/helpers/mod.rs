//! Test helpers and fixtures for eventlink integration tests.
//!
//! Bridges are driven from a single thread with a [`ManualClock`], so the
//! load factor stays at its configured minimum unless a test advances time.

#![allow(dead_code)]

use eventlink::prelude::*;
use eventlink::ManualClock;
use std::sync::Arc;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Standard block size for deterministic testing
pub const TEST_BLOCK_SIZE: u32 = 512;

/// Bridge on a manual clock starting at zero.
pub fn test_bridge(config: BridgeConfig) -> (EventBridge, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0.0));
    let bridge = EventLink::builder()
        .config(config)
        .clock(clock.clone())
        .build()
        .expect("Failed to create test bridge");
    (bridge, clock)
}

/// Parameter event whose id doubles as a unique tag.
pub fn tagged(frame: u32, tag: u32) -> Event {
    Event::parameter(frame, tag, 0.0)
}

pub fn tag_of(event: &Event) -> u32 {
    match event.payload {
        EventPayload::Parameter { id, .. } => id,
        other => panic!("unexpected payload {other:?}"),
    }
}

/// Runs empty blocks and control ticks until every packet is back on the
/// render side.
pub fn settle(bridge: &mut EventBridge) {
    for _ in 0..4 {
        bridge.update(None);
        bridge.begin_process();
        bridge.end_process(0.0, TEST_SAMPLE_RATE);
    }
}
