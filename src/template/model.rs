// Copyright (c) 2025 - Cowboy AI, Inc.
//! Validated Templates
//!
//! Immutable template values. A template can only be obtained through its
//! checked constructor, so holding a [`RangeTemplate`] means every rule of
//! [`crate::domain::invariants`] holds for the whole tree.
//!
//! ```text
//! RangeTemplate
//!   └── VpcTemplate*      (unique names, subnets ⊆ VPC, public /24 free)
//!         └── SubnetTemplate*   (unique hostnames, capacity)
//!               └── HostTemplate*     (hostname, disk, tags)
//! ```

use serde::Serialize;

use crate::domain::invariants::{
    validate_capacity, validate_disk_size, validate_hostname, validate_name,
    validate_public_subnet_reservation, validate_subnets_contained, validate_tags,
    validate_unique_hostnames, validate_unique_subnet_names, validate_unique_vpc_names,
};
use crate::domain::{
    CapacityPolicy, Hostname, InstanceSpec, Ipv4Cidr, OperatingSystem, Provider,
    ValidationError,
};

use super::draft::{HostDraft, RangeDraft, SubnetDraft, VpcDraft};

/// Validated host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostTemplate {
    hostname: Hostname,
    os: OperatingSystem,
    spec: InstanceSpec,
    size_gb: u32,
    tags: Vec<String>,
}

impl HostTemplate {
    /// Create a host, checking hostname, disk size and tags
    pub fn new(
        hostname: &str,
        os: OperatingSystem,
        spec: InstanceSpec,
        size_gb: u32,
        tags: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let hostname = validate_hostname(hostname)?;
        validate_disk_size(hostname.as_str(), os, size_gb)?;
        validate_tags(hostname.as_str(), &tags)?;

        Ok(Self {
            hostname,
            os,
            spec,
            size_gb,
            tags,
        })
    }

    pub fn hostname(&self) -> &Hostname {
        &self.hostname
    }

    pub fn os(&self) -> OperatingSystem {
        self.os
    }

    pub fn spec(&self) -> InstanceSpec {
        self.spec
    }

    /// Disk size in GB
    pub fn size_gb(&self) -> u32 {
        self.size_gb
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn to_draft(&self) -> HostDraft {
        HostDraft {
            hostname: self.hostname.to_string(),
            os: self.os,
            spec: self.spec,
            size: self.size_gb,
            tags: self.tags.clone(),
        }
    }
}

/// Validated subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetTemplate {
    name: String,
    cidr: Ipv4Cidr,
    hosts: Vec<HostTemplate>,
}

impl SubnetTemplate {
    /// Create a subnet under the default (AWS) capacity policy
    pub fn new(
        name: impl Into<String>,
        cidr: Ipv4Cidr,
        hosts: Vec<HostTemplate>,
    ) -> Result<Self, ValidationError> {
        Self::with_policy(name, cidr, hosts, &CapacityPolicy::default())
    }

    /// Create a subnet, checking name, hostname uniqueness and capacity
    pub fn with_policy(
        name: impl Into<String>,
        cidr: Ipv4Cidr,
        hosts: Vec<HostTemplate>,
        policy: &CapacityPolicy,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_name("Subnet", &name)?;
        validate_unique_hostnames(&name, hosts.iter().map(|h| h.hostname.as_str()))?;
        validate_capacity(&cidr, hosts.len(), policy)?;

        Ok(Self { name, cidr, hosts })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cidr(&self) -> Ipv4Cidr {
        self.cidr
    }

    pub fn hosts(&self) -> &[HostTemplate] {
        &self.hosts
    }

    pub fn to_draft(&self) -> SubnetDraft {
        SubnetDraft {
            name: self.name.clone(),
            cidr: self.cidr.to_string(),
            hosts: self.hosts.iter().map(HostTemplate::to_draft).collect(),
        }
    }
}

/// Validated VPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VpcTemplate {
    name: String,
    cidr: Ipv4Cidr,
    subnets: Vec<SubnetTemplate>,
}

impl VpcTemplate {
    /// Create a VPC
    ///
    /// # Rules
    /// - Name is not blank
    /// - Subnet names are unique
    /// - Every subnet lies inside the VPC block
    /// - The reserved public `/24` lies inside the VPC block and no subnet
    ///   overlaps it
    pub fn new(
        name: impl Into<String>,
        cidr: Ipv4Cidr,
        subnets: Vec<SubnetTemplate>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_name("VPC", &name)?;
        validate_unique_subnet_names(&name, subnets.iter().map(|s| s.name.as_str()))?;
        validate_subnets_contained(&cidr, subnets.iter().map(|s| &s.cidr))?;
        validate_public_subnet_reservation(&cidr, subnets.iter().map(|s| &s.cidr))?;

        Ok(Self {
            name,
            cidr,
            subnets,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cidr(&self) -> Ipv4Cidr {
        self.cidr
    }

    pub fn subnets(&self) -> &[SubnetTemplate] {
        &self.subnets
    }

    pub fn to_draft(&self) -> VpcDraft {
        VpcDraft {
            name: self.name.clone(),
            cidr: self.cidr.to_string(),
            subnets: self.subnets.iter().map(SubnetTemplate::to_draft).collect(),
        }
    }
}

/// Validated range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeTemplate {
    name: String,
    provider: Provider,
    vnc: bool,
    vpn: bool,
    vpcs: Vec<VpcTemplate>,
}

impl RangeTemplate {
    /// Create a range, checking name and VPC name uniqueness
    pub fn new(
        name: impl Into<String>,
        provider: Provider,
        vnc: bool,
        vpn: bool,
        vpcs: Vec<VpcTemplate>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_name("Range", &name)?;
        validate_unique_vpc_names(&name, vpcs.iter().map(|v| v.name.as_str()))?;

        Ok(Self {
            name,
            provider,
            vnc,
            vpn,
            vpcs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn vnc(&self) -> bool {
        self.vnc
    }

    pub fn vpn(&self) -> bool {
        self.vpn
    }

    pub fn vpcs(&self) -> &[VpcTemplate] {
        &self.vpcs
    }

    /// Number of hosts across all VPCs and subnets
    pub fn host_count(&self) -> usize {
        self.vpcs
            .iter()
            .flat_map(|v| &v.subnets)
            .map(|s| s.hosts.len())
            .sum()
    }

    pub fn to_draft(&self) -> RangeDraft {
        RangeDraft {
            name: self.name.clone(),
            provider: self.provider,
            vnc: self.vnc,
            vpn: self.vpn,
            vpcs: self.vpcs.iter().map(VpcTemplate::to_draft).collect(),
        }
    }
}
