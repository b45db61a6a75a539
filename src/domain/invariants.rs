// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Template Invariants
//!
//! Every rule a range template must satisfy before it may be stored. All
//! functions are pure and fail fast with a [`ValidationError`] that names
//! the offending field and values, so callers never re-derive context.
//!
//! # Invariant Categories
//!
//! 1. **Host rules**: hostname, disk size, tags
//! 2. **Subnet rules**: unique hostnames, address capacity
//! 3. **VPC rules**: unique subnet names, containment, public subnet reservation
//! 4. **Range rules**: unique VPC names

use std::collections::HashSet;

use super::catalog::{disk_size_valid, OperatingSystem};
use super::hostname::{Hostname, HostnameError};
use super::network::{
    public_subnet_cidr, usable_host_capacity, CapacityPolicy, Ipv4Cidr, NetworkError,
};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Template validation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Hostname does not conform to RFC 1035
    #[error("Invalid hostname {hostname:?}: {reason}")]
    InvalidHostname {
        hostname: String,
        reason: HostnameError,
    },

    /// CIDR could not be parsed
    #[error("Invalid CIDR for {entity} {name:?}: {reason}")]
    InvalidCidr {
        entity: &'static str,
        name: String,
        reason: NetworkError,
    },

    /// Name field left blank
    #[error("{entity} name must not be empty")]
    EmptyName { entity: &'static str },

    /// Disk size of zero
    #[error("Disk size of host {hostname} must be greater than 0GB")]
    ZeroDiskSize { hostname: String },

    /// Disk too small for the OS image
    #[error("Disk size {size_gb}GB too small for OS: {os}. Minimum disk size: {minimum_gb}GB")]
    DiskTooSmall {
        os: OperatingSystem,
        size_gb: u32,
        minimum_gb: u32,
    },

    /// Blank tag on a host
    #[error("Tags of host {hostname} must not be empty")]
    EmptyTag { hostname: String },

    /// Two hosts of one subnet share a hostname
    #[error("All hostnames must be unique: {hostname} appears twice in subnet {subnet}")]
    DuplicateHostname { subnet: String, hostname: String },

    /// More hosts than the subnet can address
    #[error("Too many hosts in subnet {cidr}! Max: {capacity}, Requested: {requested}")]
    CapacityExceeded {
        cidr: Ipv4Cidr,
        capacity: u64,
        requested: usize,
    },

    /// Two subnets of one VPC share a name
    #[error("All subnet names must be unique: {name} appears twice in VPC {vpc}")]
    DuplicateSubnetName { vpc: String, name: String },

    /// Subnet CIDR outside its VPC CIDR
    #[error("The following subnet is not contained in the VPC subnet {vpc_cidr}: {subnet_cidr}")]
    SubnetNotContained {
        vpc_cidr: Ipv4Cidr,
        subnet_cidr: Ipv4Cidr,
    },

    /// The VPC cannot hold the reserved public subnet
    #[error("VPC {vpc_cidr} cannot hold the reserved public subnet {public_cidr}")]
    PublicSubnetUnavailable {
        vpc_cidr: Ipv4Cidr,
        public_cidr: Ipv4Cidr,
    },

    /// A declared subnet claims addresses of the reserved public subnet
    #[error("Subnet {subnet_cidr} overlaps the reserved public subnet {public_cidr}")]
    PublicSubnetOverlap {
        public_cidr: Ipv4Cidr,
        subnet_cidr: Ipv4Cidr,
    },

    /// Two VPCs of one range share a name
    #[error("All VPC names must be unique: {name} appears twice in range {range}")]
    DuplicateVpcName { range: String, name: String },
}

/// Validate and wrap a hostname
pub fn validate_hostname(hostname: &str) -> Result<Hostname, ValidationError> {
    Hostname::new(hostname).map_err(|reason| ValidationError::InvalidHostname {
        hostname: hostname.to_string(),
        reason,
    })
}

/// Validate that a name is not blank
pub fn validate_name(entity: &'static str, name: &str) -> ValidationResult {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName { entity });
    }
    Ok(())
}

/// Validate the disk size of a host against its OS minimum
///
/// # Rules
/// - Size must be greater than zero
/// - Size must be at least the OS image minimum
pub fn validate_disk_size(hostname: &str, os: OperatingSystem, size_gb: u32) -> ValidationResult {
    if size_gb == 0 {
        return Err(ValidationError::ZeroDiskSize {
            hostname: hostname.to_string(),
        });
    }

    if !disk_size_valid(os, size_gb) {
        return Err(ValidationError::DiskTooSmall {
            os,
            size_gb,
            minimum_gb: os.min_disk_size_gb(),
        });
    }

    Ok(())
}

/// Validate that no tag is blank
pub fn validate_tags(hostname: &str, tags: &[String]) -> ValidationResult {
    if tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(ValidationError::EmptyTag {
            hostname: hostname.to_string(),
        });
    }
    Ok(())
}

/// First name that occurs twice, if any
fn first_duplicate<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}

/// Validate hostnames are unique within a subnet
pub fn validate_unique_hostnames<'a>(
    subnet: &str,
    hostnames: impl IntoIterator<Item = &'a str>,
) -> ValidationResult {
    match first_duplicate(hostnames) {
        Some(hostname) => Err(ValidationError::DuplicateHostname {
            subnet: subnet.to_string(),
            hostname: hostname.to_string(),
        }),
        None => Ok(()),
    }
}

/// Validate the host count fits the usable capacity of the subnet
pub fn validate_capacity(
    cidr: &Ipv4Cidr,
    requested: usize,
    policy: &CapacityPolicy,
) -> ValidationResult {
    let capacity = usable_host_capacity(cidr, policy);
    if requested as u64 > capacity {
        return Err(ValidationError::CapacityExceeded {
            cidr: *cidr,
            capacity,
            requested,
        });
    }
    Ok(())
}

/// Validate subnet names are unique within a VPC
pub fn validate_unique_subnet_names<'a>(
    vpc: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> ValidationResult {
    match first_duplicate(names) {
        Some(name) => Err(ValidationError::DuplicateSubnetName {
            vpc: vpc.to_string(),
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}

/// Validate every subnet CIDR is contained in the VPC CIDR
///
/// Stops at the first subnet that is not contained.
pub fn validate_subnets_contained<'a>(
    vpc_cidr: &Ipv4Cidr,
    subnet_cidrs: impl IntoIterator<Item = &'a Ipv4Cidr>,
) -> ValidationResult {
    for subnet_cidr in subnet_cidrs {
        if !vpc_cidr.contains(subnet_cidr) {
            return Err(ValidationError::SubnetNotContained {
                vpc_cidr: *vpc_cidr,
                subnet_cidr: *subnet_cidr,
            });
        }
    }
    Ok(())
}

/// Validate the reserved public subnet fits in the VPC and is not claimed
///
/// # Rules
/// - The derived public `/24` lies inside the VPC CIDR
/// - No declared subnet overlaps the derived public `/24`
pub fn validate_public_subnet_reservation<'a>(
    vpc_cidr: &Ipv4Cidr,
    subnet_cidrs: impl IntoIterator<Item = &'a Ipv4Cidr>,
) -> ValidationResult {
    let public_cidr = public_subnet_cidr(vpc_cidr);

    if !vpc_cidr.contains(&public_cidr) {
        return Err(ValidationError::PublicSubnetUnavailable {
            vpc_cidr: *vpc_cidr,
            public_cidr,
        });
    }

    if let Some(subnet_cidr) = subnet_cidrs
        .into_iter()
        .find(|cidr| cidr.overlaps(&public_cidr))
    {
        return Err(ValidationError::PublicSubnetOverlap {
            public_cidr,
            subnet_cidr: *subnet_cidr,
        });
    }

    Ok(())
}

/// Validate VPC names are unique within a range
pub fn validate_unique_vpc_names<'a>(
    range: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> ValidationResult {
    match first_duplicate(names) {
        Some(name) => Err(ValidationError::DuplicateVpcName {
            range: range.to_string(),
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}
