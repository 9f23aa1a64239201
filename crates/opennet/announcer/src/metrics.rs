//! Announcer metrics.

use metrics::{Counter, Gauge};

/// Announcer metrics
#[derive(Clone, Debug)]
pub(crate) struct AnnouncerMetrics {
    /// Announcement sessions dispatched
    pub(crate) announcements_sent: Counter,
    /// Announcement sessions completed
    pub(crate) announcements_completed: Counter,
    /// Announcement sessions in flight
    pub(crate) running_announcements: Gauge,
    /// Nodes added through announcements
    pub(crate) nodes_added: Counter,
    /// Nodes that did not want us
    pub(crate) nodes_not_wanted: Counter,
    /// Seed connection batches
    pub(crate) seed_batches: Counter,
    /// Seed connection attempts started
    pub(crate) seeds_connected: Counter,
    /// Seed records rejected while building a batch
    pub(crate) seed_records_rejected: Counter,
    /// Dedup cycle resets
    pub(crate) dedup_clears: Counter,
}

impl Default for AnnouncerMetrics {
    fn default() -> Self {
        Self {
            announcements_sent: metrics::counter!("opennet.announcer.announcements_sent_total"),
            announcements_completed: metrics::counter!(
                "opennet.announcer.announcements_completed_total"
            ),
            running_announcements: metrics::gauge!("opennet.announcer.running_announcements"),
            nodes_added: metrics::counter!("opennet.announcer.nodes_added_total"),
            nodes_not_wanted: metrics::counter!("opennet.announcer.nodes_not_wanted_total"),
            seed_batches: metrics::counter!("opennet.announcer.seed_batches_total"),
            seeds_connected: metrics::counter!("opennet.announcer.seeds_connected_total"),
            seed_records_rejected: metrics::counter!(
                "opennet.announcer.seed_records_rejected_total"
            ),
            dedup_clears: metrics::counter!("opennet.announcer.dedup_clears_total"),
        }
    }
}

impl AnnouncerMetrics {
    pub(crate) fn set_running(&self, running: usize) {
        self.running_announcements.set(running as f64);
    }
}
