//! Recording session runner and alert sink.

use std::sync::atomic::{AtomicUsize, Ordering};

use opennet_announcer::{
    AlertSink, AnnouncementOutcome, AnnouncementSessionRunner, NodeIdentity, OutcomeReporter,
    SeedNode, UserAlert,
};
use parking_lot::Mutex;

/// Keeps launched sessions until the test reports their outcomes.
#[derive(Debug, Default)]
pub struct RecordingSessionRunner {
    active: Mutex<Vec<(SeedNode, OutcomeReporter)>>,
    launched: Mutex<Vec<NodeIdentity>>,
    total: AtomicUsize,
}

impl RecordingSessionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds of every session launched so far, in order.
    pub fn launched(&self) -> Vec<NodeIdentity> {
        self.launched.lock().clone()
    }

    pub fn launched_count(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Sessions launched but not yet completed through this runner.
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Report an outcome on every active session.
    pub fn report_all(&self, outcome: AnnouncementOutcome) {
        for (_, reporter) in self.active.lock().iter() {
            reporter.report(outcome.clone());
        }
    }

    /// Complete the session with this seed. Returns `false` if none is active.
    pub fn complete(&self, seed: &NodeIdentity) -> bool {
        let session = {
            let mut active = self.active.lock();
            match active.iter().position(|(s, _)| s.identity == *seed) {
                Some(pos) => active.remove(pos),
                None => return false,
            }
        };
        session.1.complete();
        true
    }

    /// Complete the longest running session.
    pub fn complete_oldest(&self) -> Option<NodeIdentity> {
        let (seed, reporter) = {
            let mut active = self.active.lock();
            if active.is_empty() {
                return None;
            }
            active.remove(0)
        };
        reporter.complete();
        Some(seed.identity)
    }

    /// Complete every active session.
    pub fn complete_all(&self) -> usize {
        let sessions = std::mem::take(&mut *self.active.lock());
        let count = sessions.len();
        for (_, reporter) in sessions {
            reporter.complete();
        }
        count
    }

    /// Hand the active sessions to the caller.
    pub fn take(&self) -> Vec<(SeedNode, OutcomeReporter)> {
        std::mem::take(&mut *self.active.lock())
    }
}

impl AnnouncementSessionRunner for RecordingSessionRunner {
    fn launch(&self, seed: SeedNode, reporter: OutcomeReporter) {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.launched.lock().push(seed.identity);
        self.active.lock().push((seed, reporter));
    }
}

/// Collects raised alerts.
#[derive(Debug, Default)]
pub struct RecordingAlerts {
    alerts: Mutex<Vec<UserAlert>>,
}

impl RecordingAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<UserAlert> {
        self.alerts.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.alerts.lock().len()
    }
}

impl AlertSink for RecordingAlerts {
    fn raise(&self, alert: UserAlert) {
        self.alerts.lock().push(alert);
    }
}
