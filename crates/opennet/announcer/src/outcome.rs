//! Announcement session outcomes.
//!
//! Every dispatched session gets an [`OutcomeReporter`]. The session runner
//! reports through it from whatever task it runs on; the events travel over a
//! channel and are applied to the scheduler state by
//! [`Announcer::handle_event`](crate::Announcer::handle_event), so runners never
//! touch the scheduler lock.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::trace;

use crate::types::NodeIdentity;

/// Identifier of a dispatched announcement session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that happened during an announcement session.
#[derive(Debug, Clone, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AnnouncementOutcome {
    /// A node answered the announcement and was added as a peer.
    NodeAdded { peer: NodeIdentity },
    /// A node sent a reference we could not use.
    BogusReference { reason: String },
    /// The session is over. Always the last event of a session.
    SessionCompleted,
    /// A node accepted the announcement but failed to connect.
    NodeFailed { peer: NodeIdentity, reason: String },
    /// The announcement could not be routed any further.
    NoRouteFound,
    /// A node did not want us as a peer.
    NodeNotWanted,
    /// A node wanted us but we did not add it.
    NodeNotAdded,
}

/// An outcome tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub session: SessionId,
    pub seed: NodeIdentity,
    pub outcome: AnnouncementOutcome,
}

/// Receiving end of the outcome channel.
pub type OutcomeReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Sending end of the outcome channel, shared by all reporters.
pub(crate) type OutcomeSender = mpsc::UnboundedSender<SessionEvent>;

pub(crate) fn outcome_channel() -> (OutcomeSender, OutcomeReceiver) {
    mpsc::unbounded_channel()
}

/// Reports the outcomes of a single announcement session.
///
/// Reports after [`AnnouncementOutcome::SessionCompleted`] are ignored.
/// Dropping a reporter that never completed reports the completion itself.
#[derive(Debug)]
pub struct OutcomeReporter {
    session: SessionId,
    seed: NodeIdentity,
    tx: OutcomeSender,
    completed: AtomicBool,
}

impl OutcomeReporter {
    pub(crate) fn new(session: SessionId, seed: NodeIdentity, tx: OutcomeSender) -> Self {
        Self {
            session,
            seed,
            tx,
            completed: AtomicBool::new(false),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// The seed node this session announces to.
    pub fn seed(&self) -> &NodeIdentity {
        &self.seed
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Report an outcome.
    pub fn report(&self, outcome: AnnouncementOutcome) {
        if outcome == AnnouncementOutcome::SessionCompleted {
            if self.completed.swap(true, Ordering::AcqRel) {
                return;
            }
        } else if self.is_completed() {
            trace!(session = %self.session, outcome = outcome.as_ref(), "outcome after completion ignored");
            return;
        }
        self.send(outcome);
    }

    /// Report that the session is over.
    pub fn complete(self) {
        self.report(AnnouncementOutcome::SessionCompleted);
    }

    fn send(&self, outcome: AnnouncementOutcome) {
        let event = SessionEvent {
            session: self.session,
            seed: self.seed,
            outcome,
        };
        // The receiver is gone only when the announcer is shutting down.
        if self.tx.send(event).is_err() {
            trace!(session = %self.session, "outcome channel closed");
        }
    }
}

impl Drop for OutcomeReporter {
    fn drop(&mut self) {
        if !self.completed.swap(true, Ordering::AcqRel) {
            trace!(session = %self.session, "reporter dropped before completion");
            self.send(AnnouncementOutcome::SessionCompleted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter() -> (OutcomeReporter, OutcomeReceiver) {
        let (tx, rx) = outcome_channel();
        (
            OutcomeReporter::new(SessionId::new(7), NodeIdentity::from([7u8; 32]), tx),
            rx,
        )
    }

    fn drain(rx: &mut OutcomeReceiver) -> Vec<AnnouncementOutcome> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.session, SessionId::new(7));
            out.push(event.outcome);
        }
        out
    }

    #[test]
    fn test_reports_in_order() {
        let (reporter, mut rx) = reporter();
        reporter.report(AnnouncementOutcome::NodeNotWanted);
        reporter.report(AnnouncementOutcome::NoRouteFound);
        reporter.complete();

        assert_eq!(
            drain(&mut rx),
            vec![
                AnnouncementOutcome::NodeNotWanted,
                AnnouncementOutcome::NoRouteFound,
                AnnouncementOutcome::SessionCompleted,
            ]
        );
    }

    #[test]
    fn test_reports_after_completion_ignored() {
        let (reporter, mut rx) = reporter();
        reporter.report(AnnouncementOutcome::SessionCompleted);
        reporter.report(AnnouncementOutcome::NodeNotAdded);
        reporter.report(AnnouncementOutcome::SessionCompleted);
        assert!(reporter.is_completed());
        drop(reporter);

        assert_eq!(drain(&mut rx), vec![AnnouncementOutcome::SessionCompleted]);
    }

    #[test]
    fn test_drop_completes_session() {
        let (reporter, mut rx) = reporter();
        reporter.report(AnnouncementOutcome::NodeNotAdded);
        drop(reporter);

        assert_eq!(
            drain(&mut rx),
            vec![
                AnnouncementOutcome::NodeNotAdded,
                AnnouncementOutcome::SessionCompleted,
            ]
        );
    }

    #[test]
    fn test_closed_channel_is_harmless() {
        let (reporter, rx) = reporter();
        drop(rx);
        reporter.report(AnnouncementOutcome::NodeNotWanted);
        reporter.complete();
    }

    #[test]
    fn test_outcome_names() {
        assert_eq!(AnnouncementOutcome::SessionCompleted.as_ref(), "session_completed");
        assert_eq!(AnnouncementOutcome::NoRouteFound.as_ref(), "no_route_found");
    }
}
