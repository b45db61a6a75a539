// Copyright (c) 2025 - Cowboy AI, Inc.
//! Template Drafts
//!
//! Unvalidated, serde-friendly form of a template as it arrives over the
//! wire. Drafts are turned into templates by
//! [`TemplateValidator`](super::TemplateValidator); stored records convert
//! back with `to_draft()`.

use serde::{Deserialize, Serialize};

use crate::domain::{InstanceSpec, OperatingSystem, Provider};

/// Host as submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDraft {
    pub hostname: String,
    pub os: OperatingSystem,
    pub spec: InstanceSpec,
    /// Disk size in GB
    pub size: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Subnet as submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetDraft {
    pub name: String,
    pub cidr: String,
    #[serde(default)]
    pub hosts: Vec<HostDraft>,
}

/// VPC as submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcDraft {
    pub name: String,
    pub cidr: String,
    #[serde(default)]
    pub subnets: Vec<SubnetDraft>,
}

/// Range as submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDraft {
    pub name: String,
    pub provider: Provider,
    #[serde(default)]
    pub vnc: bool,
    #[serde(default)]
    pub vpn: bool,
    #[serde(default)]
    pub vpcs: Vec<VpcDraft>,
}
