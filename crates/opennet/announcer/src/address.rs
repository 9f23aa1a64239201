//! IP address scope classification.
//!
//! Announcements are only worth spreading across addresses that other nodes
//! can actually reach. Seeds are compared by the IPs found in their multiaddrs,
//! and only addresses the [`AddressClassifier`] deems routable count as a
//! distinct network location.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use libp2p::Multiaddr;
use libp2p::multiaddr::Protocol;

/// Classification of IP address scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressScope {
    /// Loopback addresses (127.0.0.0/8, ::1)
    Loopback,
    /// Private addresses (RFC 1918: 10/8, 172.16/12, 192.168/16; RFC 4193: fc00::/7)
    Private,
    /// Link-local addresses (169.254.0.0/16, fe80::/10)
    LinkLocal,
    /// Public/global addresses (everything else)
    Public,
}

/// Decides whether an address identifies a reachable network location.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait AddressClassifier: Send + Sync {
    fn is_routable(&self, addr: &IpAddr) -> bool;
}

/// Accepts only public-scope addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicAddressClassifier;

impl AddressClassifier for PublicAddressClassifier {
    fn is_routable(&self, addr: &IpAddr) -> bool {
        classify_ip(*addr) == Some(AddressScope::Public)
    }
}

/// Accepts every specified address. Useful on private test networks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveAddressClassifier;

impl AddressClassifier for PermissiveAddressClassifier {
    fn is_routable(&self, addr: &IpAddr) -> bool {
        classify_ip(*addr).is_some()
    }
}

/// Extract the IP address from a multiaddr.
///
/// Returns `None` if the multiaddr doesn't contain an IP protocol.
pub fn extract_ip(addr: &Multiaddr) -> Option<IpAddr> {
    addr.iter().find_map(|proto| match proto {
        Protocol::Ip4(ip) => Some(IpAddr::V4(ip)),
        Protocol::Ip6(ip) => Some(IpAddr::V6(ip)),
        _ => None,
    })
}

/// Classify the scope of an IP address.
///
/// Returns `None` for unspecified and broadcast addresses, which are never routable.
pub fn classify_ip(ip: IpAddr) -> Option<AddressScope> {
    match ip {
        IpAddr::V4(ipv4) => classify_ipv4(ipv4),
        IpAddr::V6(ipv6) => classify_ipv6(ipv6),
    }
}

fn classify_ipv4(ip: Ipv4Addr) -> Option<AddressScope> {
    if ip.is_unspecified() || ip.is_broadcast() {
        None
    } else if ip.is_loopback() {
        Some(AddressScope::Loopback)
    } else if ip.is_private() {
        Some(AddressScope::Private)
    } else if ip.is_link_local() {
        Some(AddressScope::LinkLocal)
    } else {
        Some(AddressScope::Public)
    }
}

fn classify_ipv6(ip: Ipv6Addr) -> Option<AddressScope> {
    if ip.is_unspecified() {
        None
    } else if ip.is_loopback() {
        Some(AddressScope::Loopback)
    } else if ip.is_unique_local() {
        Some(AddressScope::Private)
    } else if ip.is_unicast_link_local() {
        Some(AddressScope::LinkLocal)
    } else if let Some(v4) = ip.to_ipv4_mapped() {
        classify_ipv4(v4)
    } else {
        Some(AddressScope::Public)
    }
}
