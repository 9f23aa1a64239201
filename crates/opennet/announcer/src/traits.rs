//! Collaborators the announcer drives.
//!
//! The announcer owns scheduling decisions only. Everything that touches the
//! network, the seed list or the user goes through these traits.

use std::collections::HashSet;
use std::sync::Arc;

use auto_impl::auto_impl;

use crate::address::{AddressClassifier, PublicAddressClassifier};
use crate::alert::UserAlert;
use crate::error::SeedRecordError;
use crate::outcome::OutcomeReporter;
use crate::types::{IpDetection, NodeIdentity, SeedCounts, SeedNode, SeedRecord, UpdaterState};

/// Read-only view of the local node.
#[auto_impl(&, Arc)]
pub trait NodeStatus: Send + Sync {
    /// Whether opennet (and therefore announcing) is enabled.
    fn opennet_enabled(&self) -> bool;

    /// Connected opennet peers, excluding seed nodes.
    fn connected_opennet_peers(&self) -> usize;

    /// All peers of any kind, connected or not.
    fn total_peers(&self) -> usize;

    /// Number of peers the node aims to have.
    fn aim_peer_count(&self) -> usize;

    /// Peers reporting that our software is too old to talk to them.
    fn too_new_peers(&self) -> usize;

    fn updater_state(&self) -> UpdaterState;

    fn ip_detection(&self) -> IpDetection;
}

/// Source of seed node candidates.
#[auto_impl(&, Arc)]
pub trait SeedDirectory: Send + Sync {
    /// Load seed records. Read errors yield an empty list.
    fn load_candidates(&self) -> Vec<SeedRecord>;

    /// Connected seed peers whose identity is not in `exclude`.
    fn connected_seeds(&self, exclude: &HashSet<NodeIdentity>) -> Vec<SeedNode>;

    fn seed_counts(&self) -> SeedCounts;
}

/// Turns seed records into connections.
#[auto_impl(&, Arc)]
pub trait PeerAdmission: Send + Sync {
    /// Parse and verify a seed record.
    fn parse_seed(&self, record: &SeedRecord) -> Result<SeedNode, SeedRecordError>;

    /// Start connecting to a seed. Returns `true` if a connection attempt was made.
    fn try_connect(&self, seed: &SeedNode) -> bool;

    /// Drop a seed connection that is no longer needed. Best effort.
    fn disconnect_seed(&self, identity: &NodeIdentity);
}

/// Runs the announcement protocol with a connected seed.
#[auto_impl(&, Arc)]
pub trait AnnouncementSessionRunner: Send + Sync {
    /// Start a session. Must not block; outcomes go through `reporter`.
    fn launch(&self, seed: SeedNode, reporter: OutcomeReporter);
}

/// Shows alerts to the user.
#[auto_impl(&, Arc)]
pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: UserAlert);
}

/// Handles to every collaborator the announcer needs.
#[derive(Clone)]
pub struct AnnouncerContext {
    pub node: Arc<dyn NodeStatus>,
    pub seeds: Arc<dyn SeedDirectory>,
    pub admission: Arc<dyn PeerAdmission>,
    pub sessions: Arc<dyn AnnouncementSessionRunner>,
    pub alerts: Arc<dyn AlertSink>,
    pub classifier: Arc<dyn AddressClassifier>,
}

impl AnnouncerContext {
    /// Create a context that treats only public addresses as routable.
    pub fn new(
        node: Arc<dyn NodeStatus>,
        seeds: Arc<dyn SeedDirectory>,
        admission: Arc<dyn PeerAdmission>,
        sessions: Arc<dyn AnnouncementSessionRunner>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            node,
            seeds,
            admission,
            sessions,
            alerts,
            classifier: Arc::new(PublicAddressClassifier),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn AddressClassifier>) -> Self {
        self.classifier = classifier;
        self
    }
}

impl std::fmt::Debug for AnnouncerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnouncerContext").finish_non_exhaustive()
    }
}
