//! Mock local node.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use opennet_announcer::{IpDetection, NodeStatus, UpdaterState};
use parking_lot::Mutex;

/// A [`NodeStatus`] whose figures are set by the test.
///
/// Starts with opennet enabled, no peers, an aim of 40 peers, an active
/// updater and a detected address.
#[derive(Debug)]
pub struct MockNode {
    opennet_enabled: AtomicBool,
    connected_opennet_peers: AtomicUsize,
    total_peers: AtomicUsize,
    aim_peer_count: AtomicUsize,
    too_new_peers: AtomicUsize,
    updater: Mutex<UpdaterState>,
    ip_detection: Mutex<IpDetection>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self {
            opennet_enabled: AtomicBool::new(true),
            connected_opennet_peers: AtomicUsize::new(0),
            total_peers: AtomicUsize::new(0),
            aim_peer_count: AtomicUsize::new(40),
            too_new_peers: AtomicUsize::new(0),
            updater: Mutex::new(UpdaterState::Active),
            ip_detection: Mutex::new(IpDetection::Detected),
        }
    }
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_opennet_enabled(&self, enabled: bool) {
        self.opennet_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Set the connected opennet peers. Also raises the total peer count to
    /// at least this value.
    pub fn set_connected_opennet_peers(&self, count: usize) {
        self.connected_opennet_peers.store(count, Ordering::SeqCst);
        self.total_peers.fetch_max(count, Ordering::SeqCst);
    }

    pub fn set_total_peers(&self, count: usize) {
        self.total_peers.store(count, Ordering::SeqCst);
    }

    pub fn set_aim_peer_count(&self, count: usize) {
        self.aim_peer_count.store(count, Ordering::SeqCst);
    }

    pub fn set_too_new_peers(&self, count: usize) {
        self.too_new_peers.store(count, Ordering::SeqCst);
    }

    pub fn set_updater_state(&self, state: UpdaterState) {
        *self.updater.lock() = state;
    }

    pub fn set_ip_detection(&self, detection: IpDetection) {
        *self.ip_detection.lock() = detection;
    }
}

impl NodeStatus for MockNode {
    fn opennet_enabled(&self) -> bool {
        self.opennet_enabled.load(Ordering::SeqCst)
    }

    fn connected_opennet_peers(&self) -> usize {
        self.connected_opennet_peers.load(Ordering::SeqCst)
    }

    fn total_peers(&self) -> usize {
        self.total_peers.load(Ordering::SeqCst)
    }

    fn aim_peer_count(&self) -> usize {
        self.aim_peer_count.load(Ordering::SeqCst)
    }

    fn too_new_peers(&self) -> usize {
        self.too_new_peers.load(Ordering::SeqCst)
    }

    fn updater_state(&self) -> UpdaterState {
        *self.updater.lock()
    }

    fn ip_detection(&self) -> IpDetection {
        *self.ip_detection.lock()
    }
}
