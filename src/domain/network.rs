// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects and Address-Plan Validators
//!
//! Everything in here is a pure function of its arguments: CIDR parsing,
//! containment, usable-capacity and the derived public subnet used for the
//! per-VPC bastion host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0} (expected a.b.c.d/n)")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("CIDR {0} has host bits set")]
    HostBitsSet(String),
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - No host bits set (`192.168.1.5/24` is rejected, as it is for the
///   network types of most IPAM tools)
///
/// # Examples
///
/// ```rust
/// use cim_range::domain::Ipv4Cidr;
///
/// let vpc: Ipv4Cidr = "192.168.0.0/16".parse().unwrap();
/// let subnet: Ipv4Cidr = "192.168.1.0/24".parse().unwrap();
/// assert!(vpc.contains(&subnet));
/// assert_eq!(subnet.num_addresses(), 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// Longest valid IPv4 prefix
    pub const MAX_PREFIX_LEN: u8 = 32;

    /// Create a CIDR block from its parts
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Result<Self, NetworkError> {
        if prefix_len > Self::MAX_PREFIX_LEN {
            return Err(NetworkError::InvalidPrefixLength(prefix_len));
        }

        let cidr = Self { network, prefix_len };
        if u32::from(network) & !cidr.mask() != 0 {
            return Err(NetworkError::HostBitsSet(cidr.to_string()));
        }

        Ok(cidr)
    }

    /// Network address
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Netmask as an integer
    pub fn mask(&self) -> u32 {
        match self.prefix_len {
            0 => 0,
            n => u32::MAX << (32 - u32::from(n)),
        }
    }

    /// Total number of addresses in the block, reserved ones included
    pub fn num_addresses(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len))
    }

    /// Last address of the block
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !self.mask())
    }

    /// Whether an address falls inside the block
    pub fn contains_addr(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & self.mask() == u32::from(self.network)
    }

    /// Subnet-of-supernet check: every address of `child` lies in `self`
    pub fn contains(&self, child: &Ipv4Cidr) -> bool {
        child.prefix_len >= self.prefix_len && self.contains_addr(child.network)
    }

    /// Whether the two blocks share at least one address
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(s.to_string()))?;

        let network = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(s.to_string()))?;

        Self::new(network, prefix_len)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ipv4Cidr> for String {
    fn from(value: Ipv4Cidr) -> Self {
        value.to_string()
    }
}

/// How many addresses of a subnet are usable by hosts
///
/// Cloud providers reserve a handful of addresses per subnet and refuse
/// subnets below a minimum size. The defaults follow AWS: five reserved
/// addresses (network, router, DNS, future use, broadcast) and no subnets
/// longer than `/28`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPolicy {
    /// Addresses subtracted from every subnet
    pub reserved_addresses: u32,

    /// Longest prefix that still hosts machines; longer prefixes have capacity 0
    pub max_prefix_len: u8,
}

impl CapacityPolicy {
    /// AWS VPC subnet rules
    pub const AWS: Self = Self {
        reserved_addresses: 5,
        max_prefix_len: 28,
    };

    /// Classic network + broadcast reservation
    pub const CLASSIC: Self = Self {
        reserved_addresses: 2,
        max_prefix_len: 30,
    };
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self::AWS
    }
}

/// Number of hosts that can be placed in `cidr` under `policy`
pub fn usable_host_capacity(cidr: &Ipv4Cidr, policy: &CapacityPolicy) -> u64 {
    if cidr.prefix_len() > policy.max_prefix_len {
        return 0;
    }

    cidr.num_addresses()
        .saturating_sub(u64::from(policy.reserved_addresses))
}

/// Standard subnet-of-supernet check
pub fn cidr_contains(parent: &Ipv4Cidr, child: &Ipv4Cidr) -> bool {
    parent.contains(child)
}

/// Third octet reserved in every VPC for the public (bastion) subnet
pub const PUBLIC_SUBNET_THIRD_OCTET: u8 = 99;

/// Derive the public `/24` of a VPC by rewriting its third octet to
/// [`PUBLIC_SUBNET_THIRD_OCTET`] and its fourth octet to 0
///
/// The result is only meaningful when it is contained in `vpc_cidr`; VPC
/// construction checks that, together with non-overlap with declared subnets.
pub fn public_subnet_cidr(vpc_cidr: &Ipv4Cidr) -> Ipv4Cidr {
    let [a, b, _, _] = vpc_cidr.network().octets();
    Ipv4Cidr {
        network: Ipv4Addr::new(a, b, PUBLIC_SUBNET_THIRD_OCTET, 0),
        prefix_len: 24,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn cidr(s: &str) -> Ipv4Cidr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let block = cidr("192.168.1.0/24");
        assert_eq!(block.network(), Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(block.prefix_len(), 24);
        assert_eq!(block.to_string(), "192.168.1.0/24");
        assert_eq!(block.broadcast(), Ipv4Addr::new(192, 168, 1, 255));
    }

    #[test]
    fn test_invalid_cidrs() {
        assert!(matches!(
            "192.168.1.0".parse::<Ipv4Cidr>(),
            Err(NetworkError::InvalidCidr(_))
        ));
        assert!(matches!(
            "999.168.1.0/24".parse::<Ipv4Cidr>(),
            Err(NetworkError::InvalidIpAddress(_))
        ));
        assert!(matches!(
            "192.168.1.0/33".parse::<Ipv4Cidr>(),
            Err(NetworkError::InvalidPrefixLength(33))
        ));
        assert!(matches!(
            "192.168.1.5/24".parse::<Ipv4Cidr>(),
            Err(NetworkError::HostBitsSet(_))
        ));
    }

    #[test]
    fn test_containment() {
        let vpc = cidr("192.168.0.0/16");
        assert!(cidr_contains(&vpc, &cidr("192.168.1.0/24")));
        assert!(cidr_contains(&vpc, &vpc));
        assert!(!cidr_contains(&vpc, &cidr("172.16.1.0/24")));
        assert!(!cidr_contains(&cidr("192.168.1.0/24"), &vpc));
        assert!(cidr_contains(&cidr("0.0.0.0/0"), &vpc));
    }

    #[test]
    fn test_overlap() {
        assert!(cidr("10.0.0.0/16").overlaps(&cidr("10.0.99.0/24")));
        assert!(cidr("10.0.99.0/24").overlaps(&cidr("10.0.99.128/25")));
        assert!(!cidr("10.0.98.0/24").overlaps(&cidr("10.0.99.0/24")));
    }

    #[test_case("192.168.1.0/24", 251 ; "slash 24")]
    #[test_case("192.168.1.0/25", 123 ; "slash 25")]
    #[test_case("192.168.1.0/28", 11 ; "smallest aws subnet")]
    #[test_case("192.168.1.0/29", 0 ; "below aws minimum")]
    #[test_case("192.168.1.0/31", 0 ; "point to point")]
    #[test_case("192.168.1.0/32", 0 ; "single address")]
    fn test_aws_capacity(block: &str, expected: u64) {
        assert_eq!(usable_host_capacity(&cidr(block), &CapacityPolicy::AWS), expected);
    }

    #[test_case("192.168.1.0/24", 254 ; "slash 24")]
    #[test_case("192.168.1.0/30", 2 ; "slash 30")]
    #[test_case("192.168.1.0/31", 0 ; "slash 31")]
    fn test_classic_capacity(block: &str, expected: u64) {
        assert_eq!(
            usable_host_capacity(&cidr(block), &CapacityPolicy::CLASSIC),
            expected
        );
    }

    #[test]
    fn test_public_subnet_derivation() {
        assert_eq!(
            public_subnet_cidr(&cidr("192.168.0.0/16")),
            cidr("192.168.99.0/24")
        );
        assert_eq!(public_subnet_cidr(&cidr("10.0.0.0/8")), cidr("10.0.99.0/24"));

        // Derived block falls outside a VPC that is too small to hold it
        let small = cidr("10.1.0.0/20");
        assert!(!small.contains(&public_subnet_cidr(&small)));
    }

    #[test]
    fn test_serde_round_trip() {
        let block = cidr("10.0.0.0/16");
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, "\"10.0.0.0/16\"");
        let back: Ipv4Cidr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
        assert!(serde_json::from_str::<Ipv4Cidr>("\"10.0.0.1/16\"").is_err());
    }
}
