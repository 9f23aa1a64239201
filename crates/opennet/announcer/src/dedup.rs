//! Per-cycle announcement deduplication.

use std::collections::HashSet;
use std::net::IpAddr;

use crate::address::AddressClassifier;
use crate::types::NodeIdentity;

/// Identities and addresses used during the current dedup cycle.
///
/// All three sets are cleared together and only by [`clear_all`](Self::clear_all);
/// the scheduler only calls it while no announcement is in flight.
#[derive(Debug, Default)]
pub struct DedupTracker {
    /// Seeds we already sent an announcement to.
    announced_identities: HashSet<NodeIdentity>,
    /// Addresses already used as an announcement target.
    announced_ips: HashSet<IpAddr>,
    /// Seeds we already attempted to connect to.
    connected_identities: HashSet<NodeIdentity>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful connection attempt to a seed.
    pub fn record_connected(&mut self, identity: NodeIdentity) {
        self.connected_identities.insert(identity);
    }

    /// Record an announcement sent to `identity` over `ips`.
    pub fn record_announced(&mut self, identity: NodeIdentity, ips: &[IpAddr]) {
        self.announced_identities.insert(identity);
        self.announced_ips.extend(ips.iter().copied());
    }

    /// Whether at least one routable address in `ips` has not been used yet.
    pub fn has_new_address(&self, ips: &[IpAddr], classifier: &dyn AddressClassifier) -> bool {
        ips.iter()
            .any(|ip| classifier.is_routable(ip) && !self.announced_ips.contains(ip))
    }

    pub fn is_announced(&self, identity: &NodeIdentity) -> bool {
        self.announced_identities.contains(identity)
    }

    pub fn announced_identities(&self) -> &HashSet<NodeIdentity> {
        &self.announced_identities
    }

    pub fn announced_ips(&self) -> &HashSet<IpAddr> {
        &self.announced_ips
    }

    pub fn connected_identities(&self) -> &HashSet<NodeIdentity> {
        &self.connected_identities
    }

    pub fn announced_count(&self) -> usize {
        self.announced_identities.len()
    }

    pub fn connected_count(&self) -> usize {
        self.connected_identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.announced_identities.is_empty()
            && self.announced_ips.is_empty()
            && self.connected_identities.is_empty()
    }

    /// Start a new dedup cycle.
    pub fn clear_all(&mut self) {
        self.announced_identities.clear();
        self.announced_ips.clear();
        self.connected_identities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{PermissiveAddressClassifier, PublicAddressClassifier};
    use proptest::prelude::*;

    fn id(n: u8) -> NodeIdentity {
        NodeIdentity::from([n; 32])
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_fresh_public_address_is_new() {
        let dedup = DedupTracker::new();
        assert!(dedup.has_new_address(&[ip("8.8.8.8")], &PublicAddressClassifier));
    }

    #[test]
    fn test_used_address_is_not_new() {
        let mut dedup = DedupTracker::new();
        dedup.record_announced(id(1), &[ip("8.8.8.8")]);

        assert!(!dedup.has_new_address(&[ip("8.8.8.8")], &PublicAddressClassifier));
        assert!(dedup.has_new_address(
            &[ip("8.8.8.8"), ip("1.1.1.1")],
            &PublicAddressClassifier
        ));
    }

    #[test]
    fn test_private_address_is_never_new_for_public_classifier() {
        let dedup = DedupTracker::new();
        let ips = [ip("192.168.1.1"), ip("127.0.0.1"), ip("fe80::1")];
        assert!(!dedup.has_new_address(&ips, &PublicAddressClassifier));
        assert!(dedup.has_new_address(&ips, &PermissiveAddressClassifier));
        assert!(!dedup.has_new_address(&[], &PermissiveAddressClassifier));
    }

    #[test]
    fn test_clear_all() {
        let mut dedup = DedupTracker::new();
        dedup.record_connected(id(1));
        dedup.record_connected(id(2));
        dedup.record_announced(id(1), &[ip("8.8.8.8")]);

        assert_eq!(dedup.connected_count(), 2);
        assert_eq!(dedup.announced_count(), 1);
        assert!(dedup.is_announced(&id(1)));
        assert!(!dedup.is_announced(&id(2)));

        dedup.clear_all();
        assert!(dedup.is_empty());
        assert!(dedup.has_new_address(&[ip("8.8.8.8")], &PublicAddressClassifier));
    }

    proptest! {
        #[test]
        fn prop_recorded_addresses_are_never_new(
            used in prop::collection::vec(any::<[u8; 4]>(), 1..16),
            subset in prop::collection::vec(any::<prop::sample::Index>(), 1..8),
        ) {
            let used: Vec<IpAddr> = used.into_iter().map(IpAddr::from).collect();
            let mut dedup = DedupTracker::new();
            dedup.record_announced(id(1), &used);

            let candidate: Vec<IpAddr> = subset.iter().map(|i| *i.get(&used)).collect();
            prop_assert!(!dedup.has_new_address(&candidate, &PermissiveAddressClassifier));
        }

        #[test]
        fn prop_new_address_requires_unused_routable(
            used in prop::collection::vec(any::<[u8; 4]>(), 0..16),
            candidate in prop::collection::vec(any::<[u8; 4]>(), 0..8),
        ) {
            let used: Vec<IpAddr> = used.into_iter().map(IpAddr::from).collect();
            let candidate: Vec<IpAddr> = candidate.into_iter().map(IpAddr::from).collect();
            let mut dedup = DedupTracker::new();
            dedup.record_announced(id(1), &used);

            let expected = candidate
                .iter()
                .any(|c| PublicAddressClassifier.is_routable(c) && !used.contains(c));
            prop_assert_eq!(dedup.has_new_address(&candidate, &PublicAddressClassifier), expected);
        }
    }
}
