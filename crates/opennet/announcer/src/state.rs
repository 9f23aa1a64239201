//! Mutable scheduler state, guarded by the announcer's lock.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::dedup::DedupTracker;
use crate::outcome::SessionId;
use crate::types::NodeIdentity;

/// What the announcer is currently doing, for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AnnouncerPhase {
    #[default]
    Loading,
    ConnectingSeeds,
    NoSeedsAvailable,
}

/// Outcome counters of a single session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounters {
    pub added: usize,
    pub not_wanted: usize,
}

#[derive(Debug)]
pub(crate) struct ActiveSession {
    pub(crate) seed: NodeIdentity,
    pub(crate) counters: SessionCounters,
}

#[derive(Debug, Default)]
pub(crate) struct AnnouncerState {
    pub(crate) phase: AnnouncerPhase,
    /// Sessions in flight.
    pub(crate) running: usize,
    /// Announcements sent in the current cycle. Never above the configured quota.
    pub(crate) sent: usize,
    /// No announcements before this instant.
    pub(crate) cooling_off_until: Option<Instant>,
    pub(crate) time_added_seeds: Option<Instant>,
    /// Since when the peer count has continuously met the target.
    pub(crate) time_got_enough_peers: Option<Instant>,
    /// Latched once we stop waiting for address detection.
    pub(crate) ignore_ip_undetected: bool,
    /// Latched once announcing is shut down for outdated software.
    pub(crate) killed_too_old: bool,
    /// Whether the decision loop ever ran.
    pub(crate) started: bool,
    pub(crate) total_added: u64,
    pub(crate) total_not_wanted: u64,
    pub(crate) dedup: DedupTracker,
    pub(crate) sessions: HashMap<SessionId, ActiveSession>,
    next_session: u64,
}

impl AnnouncerState {
    pub(crate) fn next_session_id(&mut self) -> SessionId {
        self.next_session += 1;
        SessionId::new(self.next_session)
    }

    /// Time left until another seed batch may be connected, zero if it may
    /// happen now.
    pub(crate) fn seed_interval_remaining(&self, now: Instant, interval: Duration) -> Duration {
        match self.time_added_seeds {
            Some(added) => (added + interval).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    pub(crate) fn cooling_off_remaining(&self, now: Instant) -> Duration {
        self.cooling_off_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or_default()
    }

    pub(crate) fn in_cooling_off(&self, now: Instant) -> bool {
        self.cooling_off_until.is_some_and(|until| now < until)
    }

    /// Clear the dedup sets. Refused while sessions are in flight.
    pub(crate) fn clear_dedup(&mut self) -> bool {
        if self.running != 0 {
            return false;
        }
        self.dedup.clear_all();
        true
    }
}
