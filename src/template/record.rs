// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stored Records and Headers
//!
//! A header is one stored row: id, owner, optional parent link and the
//! entity's own attributes, without descendants. A record is a header plus
//! its ordered children, i.e. a full stored subtree.
//!
//! A `None` parent link marks a **standalone** template. Ranges are always
//! standalone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Hostname, InstanceSpec, Ipv4Cidr, OperatingSystem, Provider};

use super::draft::{HostDraft, RangeDraft, SubnetDraft, VpcDraft};
use super::ids::{HostId, OwnerId, RangeId, SubnetId, VpcId};
use super::model::{HostTemplate, RangeTemplate, SubnetTemplate, VpcTemplate};

/// Stored Range row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeHeader {
    pub id: RangeId,
    pub owner_id: OwnerId,
    pub name: String,
    pub provider: Provider,
    pub vnc: bool,
    pub vpn: bool,
    pub created_at: DateTime<Utc>,
}

/// Stored VPC row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcHeader {
    pub id: VpcId,
    pub owner_id: OwnerId,
    pub range_id: Option<RangeId>,
    pub name: String,
    pub cidr: Ipv4Cidr,
    pub created_at: DateTime<Utc>,
}

/// Stored Subnet row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetHeader {
    pub id: SubnetId,
    pub owner_id: OwnerId,
    pub vpc_id: Option<VpcId>,
    pub name: String,
    pub cidr: Ipv4Cidr,
    pub created_at: DateTime<Utc>,
}

/// Stored Host row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostHeader {
    pub id: HostId,
    pub owner_id: OwnerId,
    pub subnet_id: Option<SubnetId>,
    pub hostname: Hostname,
    pub os: OperatingSystem,
    pub spec: InstanceSpec,
    pub size_gb: u32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Hosts have no children, so the row is the whole record
pub type HostRecord = HostHeader;

/// Subnet with its hosts in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRecord {
    pub header: SubnetHeader,
    pub hosts: Vec<HostRecord>,
}

/// VPC with its subnets in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcRecord {
    pub header: VpcHeader,
    pub subnets: Vec<SubnetRecord>,
}

/// Range with its VPCs in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRecord {
    pub header: RangeHeader,
    pub vpcs: Vec<VpcRecord>,
}

impl HostHeader {
    /// Assign a fresh id to a validated host
    pub fn materialize(
        template: &HostTemplate,
        owner_id: OwnerId,
        subnet_id: Option<SubnetId>,
    ) -> Self {
        Self::materialize_at(template, owner_id, subnet_id, Utc::now())
    }

    pub(crate) fn materialize_at(
        template: &HostTemplate,
        owner_id: OwnerId,
        subnet_id: Option<SubnetId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: HostId::new(),
            owner_id,
            subnet_id,
            hostname: template.hostname().clone(),
            os: template.os(),
            spec: template.spec(),
            size_gb: template.size_gb(),
            tags: template.tags().to_vec(),
            created_at,
        }
    }

    pub fn is_standalone(&self) -> bool {
        self.subnet_id.is_none()
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

impl SubnetHeader {
    pub fn is_standalone(&self) -> bool {
        self.vpc_id.is_none()
    }
}

impl VpcHeader {
    pub fn is_standalone(&self) -> bool {
        self.range_id.is_none()
    }
}

impl SubnetRecord {
    /// Assign fresh ids to a validated subnet and its hosts
    pub fn materialize(
        template: &SubnetTemplate,
        owner_id: OwnerId,
        vpc_id: Option<VpcId>,
    ) -> Self {
        Self::materialize_at(template, owner_id, vpc_id, Utc::now())
    }

    pub(crate) fn materialize_at(
        template: &SubnetTemplate,
        owner_id: OwnerId,
        vpc_id: Option<VpcId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let header = SubnetHeader {
            id: SubnetId::new(),
            owner_id,
            vpc_id,
            name: template.name().to_string(),
            cidr: template.cidr(),
            created_at,
        };
        let hosts = template
            .hosts()
            .iter()
            .map(|host| HostHeader::materialize_at(host, owner_id, Some(header.id), created_at))
            .collect();

        Self { header, hosts }
    }

    pub fn to_draft(&self) -> SubnetDraft {
        SubnetDraft {
            name: self.header.name.clone(),
            cidr: self.header.cidr.to_string(),
            hosts: self.hosts.iter().map(HostHeader::to_draft).collect(),
        }
    }
}

impl VpcRecord {
    /// Assign fresh ids to a validated VPC and its descendants
    pub fn materialize(template: &VpcTemplate, owner_id: OwnerId, range_id: Option<RangeId>) -> Self {
        Self::materialize_at(template, owner_id, range_id, Utc::now())
    }

    pub(crate) fn materialize_at(
        template: &VpcTemplate,
        owner_id: OwnerId,
        range_id: Option<RangeId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let header = VpcHeader {
            id: VpcId::new(),
            owner_id,
            range_id,
            name: template.name().to_string(),
            cidr: template.cidr(),
            created_at,
        };
        let subnets = template
            .subnets()
            .iter()
            .map(|subnet| {
                SubnetRecord::materialize_at(subnet, owner_id, Some(header.id), created_at)
            })
            .collect();

        Self { header, subnets }
    }

    pub fn to_draft(&self) -> VpcDraft {
        VpcDraft {
            name: self.header.name.clone(),
            cidr: self.header.cidr.to_string(),
            subnets: self.subnets.iter().map(SubnetRecord::to_draft).collect(),
        }
    }
}

impl RangeRecord {
    /// Assign fresh ids to a validated range and its descendants
    pub fn materialize(template: &RangeTemplate, owner_id: OwnerId) -> Self {
        let created_at = Utc::now();
        let header = RangeHeader {
            id: RangeId::new(),
            owner_id,
            name: template.name().to_string(),
            provider: template.provider(),
            vnc: template.vnc(),
            vpn: template.vpn(),
            created_at,
        };
        let vpcs = template
            .vpcs()
            .iter()
            .map(|vpc| VpcRecord::materialize_at(vpc, owner_id, Some(header.id), created_at))
            .collect();

        Self { header, vpcs }
    }

    /// Every declared subnet of the range, VPC by VPC
    pub fn subnets(&self) -> impl Iterator<Item = &SubnetRecord> {
        self.vpcs.iter().flat_map(|vpc| vpc.subnets.iter())
    }

    /// Number of hosts across the range
    pub fn host_count(&self) -> usize {
        self.subnets().map(|subnet| subnet.hosts.len()).sum()
    }

    pub fn to_draft(&self) -> RangeDraft {
        RangeDraft {
            name: self.header.name.clone(),
            provider: self.header.provider,
            vnc: self.header.vnc,
            vpn: self.header.vpn,
            vpcs: self.vpcs.iter().map(VpcRecord::to_draft).collect(),
        }
    }
}
