// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Network Validators
//!
//! Capacity, containment and public subnet derivation over arbitrary
//! IPv4 blocks.

use std::net::Ipv4Addr;

use cim_range::domain::{
    cidr_contains, public_subnet_cidr, usable_host_capacity, CapacityPolicy, Ipv4Cidr,
    PUBLIC_SUBNET_THIRD_OCTET,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Block with the host bits of `addr` cleared
fn block(addr: u32, prefix_len: u8) -> Ipv4Cidr {
    let mask = if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len))
    };
    Ipv4Cidr::new(Ipv4Addr::from(addr & mask), prefix_len).unwrap()
}

fn arb_cidr() -> impl Strategy<Value = Ipv4Cidr> {
    (any::<u32>(), 0u8..=32).prop_map(|(addr, prefix_len)| block(addr, prefix_len))
}

fn arb_policy() -> impl Strategy<Value = CapacityPolicy> {
    (0u32..16, 16u8..=32).prop_map(|(reserved_addresses, max_prefix_len)| CapacityPolicy {
        reserved_addresses,
        max_prefix_len,
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Shrinking a block never adds capacity
    #[test]
    fn prop_capacity_is_monotonic(
        addr in any::<u32>(),
        a in 0u8..=32,
        b in 0u8..=32,
        policy in arb_policy(),
    ) {
        let (wide, narrow) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            usable_host_capacity(&block(addr, wide), &policy)
                >= usable_host_capacity(&block(addr, narrow), &policy)
        );
    }

    /// Capacity never exceeds the block size
    #[test]
    fn prop_capacity_bounded_by_size(cidr in arb_cidr(), policy in arb_policy()) {
        prop_assert!(usable_host_capacity(&cidr, &policy) <= cidr.num_addresses());
    }

    /// /31 and /32 hold no hosts under the default policy
    #[test]
    fn prop_tiny_blocks_are_empty(addr in any::<u32>(), prefix_len in 31u8..=32) {
        prop_assert_eq!(usable_host_capacity(&block(addr, prefix_len), &CapacityPolicy::default()), 0);
    }

    /// Every block contains itself and its sub-blocks
    #[test]
    fn prop_containment_of_sub_blocks(addr in any::<u32>(), a in 0u8..=32, b in 0u8..=32) {
        let (wide, narrow) = if a <= b { (a, b) } else { (b, a) };
        let parent = block(addr, wide);
        let child = block(addr, narrow);

        prop_assert!(cidr_contains(&parent, &parent));
        prop_assert!(cidr_contains(&parent, &child));
        prop_assert_eq!(cidr_contains(&child, &parent), wide == narrow);
    }

    /// Containment implies overlap and is antisymmetric
    #[test]
    fn prop_containment_consistency(x in arb_cidr(), y in arb_cidr()) {
        if cidr_contains(&x, &y) {
            prop_assert!(x.overlaps(&y));
            prop_assert!(x.prefix_len() <= y.prefix_len());
            if cidr_contains(&y, &x) {
                prop_assert_eq!(x, y);
            }
        }
    }

    /// /24 siblings in a /16 are contained exactly when they share its first two octets
    #[test]
    fn prop_vpc_subnet_containment(vpc in any::<[u8; 2]>(), subnet in any::<[u8; 3]>()) {
        let vpc_cidr = Ipv4Cidr::new(Ipv4Addr::new(vpc[0], vpc[1], 0, 0), 16).unwrap();
        let subnet_cidr =
            Ipv4Cidr::new(Ipv4Addr::new(subnet[0], subnet[1], subnet[2], 0), 24).unwrap();

        prop_assert_eq!(
            cidr_contains(&vpc_cidr, &subnet_cidr),
            vpc == [subnet[0], subnet[1]]
        );
    }

    /// The public subnet of any /16 is its x.y.99.0/24
    #[test]
    fn prop_public_subnet_of_slash_16(a in any::<u8>(), b in any::<u8>()) {
        let vpc = Ipv4Cidr::new(Ipv4Addr::new(a, b, 0, 0), 16).unwrap();
        let public = public_subnet_cidr(&vpc);

        prop_assert_eq!(public.network(), Ipv4Addr::new(a, b, PUBLIC_SUBNET_THIRD_OCTET, 0));
        prop_assert_eq!(public.prefix_len(), 24);
        prop_assert!(cidr_contains(&vpc, &public));
    }
}
