//! Scheduler invariants under arbitrary event sequences.

use std::time::Duration;

use opennet_announcer::AnnouncerConfig;
use opennet_test_utils::{TestHarness, seed_node};
use proptest::prelude::*;

const WANT: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    MaybeSend,
    AddSeed { ip: u8 },
    CompleteOldest,
    CompleteAll,
    RunQueue,
    SetPeers(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::MaybeSend),
        3 => (0u8..4).prop_map(|ip| Op::AddSeed { ip }),
        2 => Just(Op::CompleteOldest),
        1 => Just(Op::CompleteAll),
        2 => Just(Op::RunQueue),
        1 => (0usize..15).prop_map(Op::SetPeers),
    ]
}

fn harness() -> TestHarness {
    // Zero delays so every gate can be passed without a clock.
    TestHarness::with_config(
        AnnouncerConfig::default()
            .with_want_announcements(WANT)
            .with_cooling_off_period(Duration::ZERO)
            .with_min_added_seeds_interval(Duration::ZERO),
    )
}

proptest! {
    #[test]
    fn prop_counters_stay_bounded(ops in prop::collection::vec(op(), 1..60)) {
        let mut h = harness();
        let mut next_seed = 1u8;

        for op in ops {
            match op {
                Op::MaybeSend => h.announcer.maybe_send_announcement(),
                Op::AddSeed { ip } => {
                    h.seeds.add_connected(seed_node(next_seed, &format!("45.0.0.{}", ip + 1)));
                    next_seed = next_seed.wrapping_add(1).max(1);
                }
                Op::CompleteOldest => {
                    h.sessions.complete_oldest();
                    h.drain_outcomes();
                }
                Op::CompleteAll => {
                    h.complete_all_sessions();
                }
                Op::RunQueue => {
                    h.queue.run_all();
                }
                Op::SetPeers(n) => h.node.set_connected_opennet_peers(n),
            }

            let running = h.announcer.running_announcements();
            let sent = h.announcer.sent_announcements();
            prop_assert!(sent <= WANT, "sent {} above quota", sent);
            prop_assert!(running <= sent, "running {} above sent {}", running, sent);
            prop_assert_eq!(running, h.sessions.active_count());
        }
    }
}
