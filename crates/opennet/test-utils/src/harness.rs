//! Announcer wired to mock collaborators.

use std::sync::Arc;

use opennet_announcer::{
    Announcer, AnnouncerConfig, AnnouncerContext, OutcomeReceiver, ScheduledAction,
};

use crate::{ManualTaskQueue, MockNode, MockSeedNetwork, RecordingAlerts, RecordingSessionRunner};

/// An [`Announcer`] with mock collaborators and a manual task queue.
///
/// Outcomes are not applied until [`drain_outcomes`](Self::drain_outcomes) is
/// called.
pub struct TestHarness {
    pub announcer: Arc<Announcer>,
    pub outcomes: OutcomeReceiver,
    pub node: Arc<MockNode>,
    pub seeds: Arc<MockSeedNetwork>,
    pub sessions: Arc<RecordingSessionRunner>,
    pub alerts: Arc<RecordingAlerts>,
    pub queue: Arc<ManualTaskQueue>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(AnnouncerConfig::default())
    }

    pub fn with_config(config: AnnouncerConfig) -> Self {
        let node = Arc::new(MockNode::new());
        let seeds = Arc::new(MockSeedNetwork::new());
        let sessions = Arc::new(RecordingSessionRunner::new());
        let alerts = Arc::new(RecordingAlerts::new());
        let queue = Arc::new(ManualTaskQueue::new());

        let ctx = AnnouncerContext::new(
            node.clone(),
            seeds.clone(),
            seeds.clone(),
            sessions.clone(),
            alerts.clone(),
        );
        let (announcer, outcomes) = Announcer::new(config, ctx, queue.clone());

        Self {
            announcer,
            outcomes,
            node,
            seeds,
            sessions,
            alerts,
            queue,
        }
    }

    /// Apply every outcome reported so far. Returns how many were applied.
    pub fn drain_outcomes(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.outcomes.try_recv() {
            self.announcer.handle_event(event);
            applied += 1;
        }
        applied
    }

    /// Complete all active sessions and apply the outcomes.
    pub fn complete_all_sessions(&mut self) -> usize {
        let count = self.sessions.complete_all();
        self.drain_outcomes();
        count
    }

    /// Whether an action is pending on the queue.
    pub fn is_scheduled(&self, action: ScheduledAction) -> bool {
        self.queue.has(action.name())
    }

    /// Run the first pending instance of an action.
    pub fn run_scheduled(&self, action: ScheduledAction) -> bool {
        self.queue.run_next(action.name())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
