//! Session outcome handling.

use std::time::Duration;

use assert_matches::assert_matches;
use opennet_announcer::{AnnouncementOutcome, SessionEvent, SessionId};
use opennet_test_utils::{TestHarness, identity, seed_node};

fn dispatch_three(h: &TestHarness) {
    for n in 1..=3 {
        h.seeds.add_connected(seed_node(n, &format!("45.{n}.0.1")));
    }
    h.announcer.maybe_send_announcement();
    assert_eq!(h.announcer.running_announcements(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_counters_accumulate() {
    let mut h = TestHarness::new();
    dispatch_three(&h);

    h.sessions.report_all(AnnouncementOutcome::NodeAdded { peer: identity(100) });
    h.sessions.report_all(AnnouncementOutcome::NodeNotWanted);
    h.sessions.report_all(AnnouncementOutcome::NodeAdded { peer: identity(101) });
    h.sessions.report_all(AnnouncementOutcome::NoRouteFound);
    h.sessions.report_all(AnnouncementOutcome::BogusReference {
        reason: "bad signature".to_string(),
    });
    assert_eq!(h.drain_outcomes(), 15);

    assert_eq!(h.announcer.total_added(), 6);
    assert_eq!(h.announcer.total_not_wanted(), 3);
    // Informational outcomes leave the schedule alone.
    assert_eq!(h.announcer.running_announcements(), 3);
    assert!(h.seeds.disconnected().is_empty());

    let status = h.announcer.status_report();
    assert_eq!(status.added_nodes, 6);
    assert_eq!(status.not_wanted_nodes, 3);
}

#[tokio::test(start_paused = true)]
async fn test_completion_disconnects_seed() {
    let mut h = TestHarness::new();
    dispatch_three(&h);

    let seed = h.sessions.launched()[1];
    assert!(h.sessions.complete(&seed));
    h.drain_outcomes();

    assert_eq!(h.announcer.running_announcements(), 2);
    assert_eq!(h.seeds.disconnected(), vec![seed]);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_completion_counted_once() {
    let mut h = TestHarness::new();
    dispatch_three(&h);

    let seed = h.sessions.launched()[0];
    h.sessions.complete(&seed);
    let event = h.outcomes.try_recv().unwrap();
    assert_matches!(event.outcome, AnnouncementOutcome::SessionCompleted);

    h.announcer.handle_event(event.clone());
    h.announcer.handle_event(event);

    assert_eq!(h.announcer.running_announcements(), 2);
    assert_eq!(h.seeds.disconnected(), vec![seed, seed]);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_session_still_disconnects_seed() {
    let h = TestHarness::new();
    dispatch_three(&h);

    h.announcer.handle_event(SessionEvent {
        session: SessionId::new(999),
        seed: identity(42),
        outcome: AnnouncementOutcome::SessionCompleted,
    });

    assert_eq!(h.announcer.running_announcements(), 3);
    assert_eq!(h.announcer.cooling_off_remaining(), Duration::ZERO);
    assert_eq!(h.seeds.disconnected(), vec![identity(42)]);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_reporter_completes_session() {
    let mut h = TestHarness::new();
    dispatch_three(&h);

    let sessions = h.sessions.take();
    assert_eq!(sessions.len(), 3);
    drop(sessions);
    assert_eq!(h.drain_outcomes(), 3);

    assert_eq!(h.announcer.running_announcements(), 0);
    assert_eq!(h.announcer.cooling_off_remaining(), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_outcomes_after_completion_ignored() {
    let mut h = TestHarness::new();
    dispatch_three(&h);

    let sessions = h.sessions.take();
    for (_, reporter) in &sessions {
        reporter.report(AnnouncementOutcome::SessionCompleted);
        reporter.report(AnnouncementOutcome::NodeAdded { peer: identity(7) });
    }
    drop(sessions);
    assert_eq!(h.drain_outcomes(), 3);

    assert_eq!(h.announcer.total_added(), 0);
    assert_eq!(h.announcer.running_announcements(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_late_outcome_for_finished_session_still_counted() {
    let mut h = TestHarness::new();
    dispatch_three(&h);
    h.complete_all_sessions();

    // An outcome that raced with the completion still counts towards the
    // lifetime total.
    h.announcer.handle_event(SessionEvent {
        session: SessionId::new(1),
        seed: identity(1),
        outcome: AnnouncementOutcome::NodeAdded { peer: identity(9) },
    });

    assert_eq!(h.announcer.total_added(), 1);
    assert_eq!(h.announcer.running_announcements(), 0);
}
