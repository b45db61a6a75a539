// Copyright (c) 2025 - Cowboy AI, Inc.
//! Range Domain Models
//!
//! Leaf value objects and pure validators every range template is built from.
//!
//! # Value Objects with Invariants
//!
//! - [`Hostname`] - DNS-validated hostnames (RFC 1035)
//! - [`Ipv4Cidr`] - IPv4 network block with containment and capacity checks
//! - [`OperatingSystem`], [`InstanceSpec`], [`Provider`], [`Region`] - catalog tags
//!
//! # Validators
//!
//! - [`hostname_valid`], [`usable_host_capacity`], [`disk_size_valid`],
//!   [`cidr_contains`] - predicates used by template construction
//! - [`invariants`] - the template rules, each returning a [`ValidationError`]

pub mod catalog;
pub mod hostname;
pub mod invariants;
pub mod network;

pub use catalog::{disk_size_valid, InstanceSpec, OperatingSystem, Provider, Region, UnknownTag};
pub use hostname::{hostname_valid, Hostname, HostnameError};
pub use invariants::{ValidationError, ValidationResult};
pub use network::{
    cidr_contains, public_subnet_cidr, usable_host_capacity, CapacityPolicy, Ipv4Cidr,
    NetworkError, PUBLIC_SUBNET_THIRD_OCTET,
};
