//! Value types shared between the announcer and its collaborators.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use alloy_primitives::B256;
use libp2p::Multiaddr;
use serde::{Deserialize, Serialize};

use crate::address::extract_ip;

/// Cryptographic identity of a node (hash of its public key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdentity(B256);

impl NodeIdentity {
    pub const fn new(identity: B256) -> Self {
        Self(identity)
    }

    pub fn as_b256(&self) -> &B256 {
        &self.0
    }
}

impl From<B256> for NodeIdentity {
    fn from(identity: B256) -> Self {
        Self(identity)
    }
}

impl From<[u8; 32]> for NodeIdentity {
    fn from(bytes: [u8; 32]) -> Self {
        Self(B256::from(bytes))
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Abbreviated 0x1234…abcd form.
        write!(f, "{:#}", self.0)
    }
}

/// An unparsed seed node reference as read from the seed list.
///
/// Records are opaque key/value field sets; turning one into a [`SeedNode`]
/// (including signature verification) is the job of the
/// [`PeerAdmission`](crate::PeerAdmission) collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedRecord(BTreeMap<String, String>);

impl SeedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A validated seed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedNode {
    /// Identity of the seed node.
    pub identity: NodeIdentity,
    /// Transport addresses the seed is reachable on.
    pub addrs: Vec<Multiaddr>,
    /// Human readable name, if the reference carried one.
    pub name: Option<String>,
}

impl SeedNode {
    pub fn new(identity: NodeIdentity, addrs: Vec<Multiaddr>) -> Self {
        Self {
            identity,
            addrs,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// IP addresses contained in the seed's multiaddrs, in order, deduplicated.
    pub fn ip_addrs(&self) -> Vec<IpAddr> {
        let mut ips: Vec<IpAddr> = Vec::with_capacity(self.addrs.len());
        for ip in self.addrs.iter().filter_map(extract_ip) {
            if !ips.contains(&ip) {
                ips.push(ip);
            }
        }
        ips
    }
}

impl fmt::Display for SeedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({})", self.identity),
            None => write!(f, "{}", self.identity),
        }
    }
}

/// Seed peers currently known to the peer manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedCounts {
    pub connected: usize,
    pub disconnected: usize,
}

/// State of the node's auto-updater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum UpdaterState {
    /// No updater is configured.
    Absent,
    /// The updater exists but is switched off.
    Disabled,
    /// An update is ready but waits for the user to confirm it.
    AwaitingUser,
    /// The updater will install mandatory updates on its own.
    #[default]
    Active,
}

impl UpdaterState {
    /// Whether the node can get itself out of a too-old state without the user.
    pub fn can_self_update(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Progress of external address detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum IpDetection {
    /// A valid external address is known.
    #[default]
    Detected,
    /// No valid address yet, but detectors are still running.
    Detecting,
    /// No valid address and no detectors that could find one.
    Undetectable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_addrs_deduplicated() {
        let seed = SeedNode::new(
            NodeIdentity::from([1u8; 32]),
            vec![
                "/ip4/1.2.3.4/udp/1000".parse().unwrap(),
                "/ip4/1.2.3.4/tcp/1000".parse().unwrap(),
                "/ip6/2001:db8::1/udp/1000".parse().unwrap(),
                "/dns4/seed.example.org/udp/1000".parse().unwrap(),
            ],
        );

        let ips = seed.ip_addrs();
        assert_eq!(ips.len(), 2);
        assert_eq!(ips[0], "1.2.3.4".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_seed_record_fields() {
        let record = SeedRecord::new()
            .with("identity", "abc")
            .with("physical.udp", "1.2.3.4:1000");
        assert_eq!(record.get("identity"), Some("abc"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.fields().count(), 2);
        assert!(!record.is_empty());
    }

    #[test]
    fn test_updater_can_self_update() {
        assert!(UpdaterState::Active.can_self_update());
        assert!(!UpdaterState::Absent.can_self_update());
        assert!(!UpdaterState::Disabled.can_self_update());
        assert!(!UpdaterState::AwaitingUser.can_self_update());
    }
}
