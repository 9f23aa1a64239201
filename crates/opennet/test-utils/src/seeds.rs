//! Mock seed list and seed connections.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy_primitives::B256;
use libp2p::Multiaddr;
use opennet_announcer::{
    NodeIdentity, PeerAdmission, SeedCounts, SeedDirectory, SeedNode, SeedRecord,
    SeedRecordError,
};
use parking_lot::Mutex;

/// Identity with every byte set to `n`.
pub fn identity(n: u8) -> NodeIdentity {
    NodeIdentity::from([n; 32])
}

/// A seed reachable over UDP on `ip`.
pub fn seed_node(n: u8, ip: &str) -> SeedNode {
    let addr = udp_addr(ip);
    SeedNode::new(identity(n), addr.into_iter().collect()).with_name(format!("seed-{n}"))
}

/// Seed list record for [`seed_node`]`(n, ip)`.
///
/// Fields: `identity` (hex), `addrs` (comma separated multiaddrs), `name`.
pub fn seed_record(n: u8, ip: &str) -> SeedRecord {
    SeedRecord::new()
        .with("identity", identity(n).as_b256().to_string())
        .with("addrs", udp_addr(ip).map(|a| a.to_string()).unwrap_or_default())
        .with("name", format!("seed-{n}"))
}

fn udp_addr(ip: &str) -> Option<Multiaddr> {
    let addr = if ip.contains(':') {
        format!("/ip6/{ip}/udp/8443")
    } else {
        format!("/ip4/{ip}/udp/8443")
    };
    addr.parse().ok()
}

/// In-memory seed list and seed connections.
///
/// Connection attempts succeed immediately unless the seed is refused or
/// [`set_connect_immediately`](Self::set_connect_immediately) is off, in which
/// case they stay pending until [`connect_pending`](Self::connect_pending).
#[derive(Debug)]
pub struct MockSeedNetwork {
    records: Mutex<Vec<SeedRecord>>,
    unreadable: AtomicBool,
    connect_immediately: AtomicBool,
    refused: Mutex<HashSet<NodeIdentity>>,
    connected: Mutex<Vec<SeedNode>>,
    pending: Mutex<Vec<SeedNode>>,
    connect_attempts: Mutex<Vec<NodeIdentity>>,
    disconnected: Mutex<Vec<NodeIdentity>>,
}

impl Default for MockSeedNetwork {
    fn default() -> Self {
        Self {
            records: Mutex::default(),
            unreadable: AtomicBool::new(false),
            connect_immediately: AtomicBool::new(true),
            refused: Mutex::default(),
            connected: Mutex::default(),
            pending: Mutex::default(),
            connect_attempts: Mutex::default(),
            disconnected: Mutex::default(),
        }
    }
}

impl MockSeedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&self, record: SeedRecord) {
        self.records.lock().push(record);
    }

    /// Add records for seeds `1..=count` on distinct public addresses.
    pub fn add_public_seeds(&self, count: u8) {
        for n in 1..=count {
            self.add_record(seed_record(n, &format!("45.{n}.0.1")));
        }
    }

    /// Make the seed list fail to load.
    pub fn set_unreadable(&self, unreadable: bool) {
        self.unreadable.store(unreadable, Ordering::SeqCst);
    }

    pub fn set_connect_immediately(&self, immediate: bool) {
        self.connect_immediately.store(immediate, Ordering::SeqCst);
    }

    /// Make connection attempts to this seed fail.
    pub fn refuse(&self, identity: NodeIdentity) {
        self.refused.lock().insert(identity);
    }

    /// Put a seed straight into the connected set.
    pub fn add_connected(&self, seed: SeedNode) {
        self.connected.lock().push(seed);
    }

    /// Complete all pending connection attempts.
    pub fn connect_pending(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending.lock());
        let count = pending.len();
        self.connected.lock().extend(pending);
        count
    }

    pub fn connected_identities(&self) -> Vec<NodeIdentity> {
        self.connected.lock().iter().map(|s| s.identity).collect()
    }

    /// Every seed a connection attempt was started for, in order.
    pub fn connect_attempts(&self) -> Vec<NodeIdentity> {
        self.connect_attempts.lock().clone()
    }

    /// Every seed that was disconnected, in order.
    pub fn disconnected(&self) -> Vec<NodeIdentity> {
        self.disconnected.lock().clone()
    }

    fn is_known(&self, identity: &NodeIdentity) -> bool {
        self.connected.lock().iter().any(|s| s.identity == *identity)
            || self.pending.lock().iter().any(|s| s.identity == *identity)
    }
}

impl SeedDirectory for MockSeedNetwork {
    fn load_candidates(&self) -> Vec<SeedRecord> {
        if self.unreadable.load(Ordering::SeqCst) {
            return Vec::new();
        }
        self.records.lock().clone()
    }

    fn connected_seeds(&self, exclude: &HashSet<NodeIdentity>) -> Vec<SeedNode> {
        self.connected
            .lock()
            .iter()
            .filter(|seed| !exclude.contains(&seed.identity))
            .cloned()
            .collect()
    }

    fn seed_counts(&self) -> SeedCounts {
        SeedCounts {
            connected: self.connected.lock().len(),
            disconnected: self.pending.lock().len(),
        }
    }
}

impl PeerAdmission for MockSeedNetwork {
    fn parse_seed(&self, record: &SeedRecord) -> Result<SeedNode, SeedRecordError> {
        if record.get("signature") == Some("invalid") {
            return Err(SeedRecordError::SignatureVerification);
        }

        let identity = record
            .get("identity")
            .ok_or(SeedRecordError::MissingField("identity"))?;
        let identity = B256::from_str(identity).map_err(|e| SeedRecordError::Parse {
            field: "identity",
            reason: e.to_string(),
        })?;

        let addrs = record
            .get("addrs")
            .ok_or(SeedRecordError::MissingField("addrs"))?;
        let addrs = addrs
            .split(',')
            .filter(|a| !a.is_empty())
            .map(|a| {
                a.parse::<Multiaddr>()
                    .map_err(|_| SeedRecordError::InvalidAddress(a.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if addrs.is_empty() {
            return Err(SeedRecordError::InvalidAddress(String::new()));
        }

        let seed = SeedNode::new(identity.into(), addrs);
        Ok(match record.get("name") {
            Some(name) => seed.with_name(name),
            None => seed,
        })
    }

    fn try_connect(&self, seed: &SeedNode) -> bool {
        if self.refused.lock().contains(&seed.identity) || self.is_known(&seed.identity) {
            return false;
        }
        self.connect_attempts.lock().push(seed.identity);
        if self.connect_immediately.load(Ordering::SeqCst) {
            self.connected.lock().push(seed.clone());
        } else {
            self.pending.lock().push(seed.clone());
        }
        true
    }

    fn disconnect_seed(&self, identity: &NodeIdentity) {
        self.connected.lock().retain(|s| s.identity != *identity);
        self.pending.lock().retain(|s| s.identity != *identity);
        self.disconnected.lock().push(*identity);
    }
}
