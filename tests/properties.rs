//! Property tests over random block loads.

mod helpers;

use eventlink::prelude::*;
use eventlink::Clock;
use helpers::{tagged, test_bridge, TEST_SAMPLE_RATE};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_accepts_up_to_held_capacity(
        packets in 1usize..6,
        events_per_packet in 1usize..32,
        n in 0u32..256,
    ) {
        let (mut bridge, _clock) = test_bridge(BridgeConfig {
            initial_packets_per_stream: packets,
            initial_events_per_packet: events_per_packet,
            ..Default::default()
        });
        let stream = bridge.default_stream();

        bridge.begin_process();
        let accepted = (0..n).filter(|&i| bridge.push_event(stream, tagged(i, i))).count();

        prop_assert_eq!(accepted, (n as usize).min(packets * events_per_packet));
        prop_assert!(!bridge.check_render_buffer_overflow());
        bridge.end_process(0.0, TEST_SAMPLE_RATE);
        prop_assert_eq!(
            bridge.check_render_buffer_overflow(),
            n as usize > packets * events_per_packet
        );
    }

    #[test]
    fn prop_packet_capacity_monotonic_and_bounded(
        loads in prop::collection::vec(0u32..200, 1..40),
    ) {
        let (mut bridge, _clock) = test_bridge(BridgeConfig {
            initial_events_per_packet: 4,
            max_events_per_packet: 64,
            max_packets_per_allocator: 4,
            ..Default::default()
        });
        let stream = bridge.default_stream();
        let max = bridge.config().max_events_per_packet;
        let mut last_epp = 4;
        let mut last_max_capacity = 0;

        for (block, load) in loads.iter().enumerate() {
            bridge.begin_process();
            for i in 0..*load {
                bridge.push_event(stream, tagged(i, i));
            }
            bridge.end_process(block as f64, TEST_SAMPLE_RATE);
            bridge.update(None);

            let allocator = bridge.allocator(stream).unwrap();
            prop_assert!(allocator.events_per_packet() >= last_epp);
            prop_assert!(allocator.events_per_packet() <= max);
            prop_assert!(allocator.num_owned() <= bridge.config().max_packets_per_allocator);
            last_epp = allocator.events_per_packet();

            let stats = bridge.get_stats();
            prop_assert!(stats.max_packet_capacity >= last_max_capacity);
            prop_assert!(stats.max_packet_capacity <= max);
            last_max_capacity = stats.max_packet_capacity;
        }
    }

    #[test]
    fn prop_load_factor_within_range(
        steps in prop::collection::vec((0.0f64..0.2, 0.0f64..0.2), 1..30),
    ) {
        let (mut bridge, clock) = test_bridge(BridgeConfig::default());
        let (min, max) = (bridge.config().min_load_factor, bridge.config().max_load_factor);

        for (render_step, control_step) in steps {
            clock.advance(render_step);
            bridge.begin_process();
            bridge.end_process(clock.now(), TEST_SAMPLE_RATE);
            clock.advance(control_step);
            bridge.update(None);

            let load_factor = bridge.get_stats().load_factor;
            prop_assert!(load_factor >= min && load_factor <= max, "{load_factor}");
        }
    }
}
