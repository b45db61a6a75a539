// Copyright (c) 2025 - Cowboy AI, Inc.
//! Draft → Template conversion
//!
//! Runs every construction rule bottom-up and stops at the first violation.

use tracing::debug;

use crate::domain::{CapacityPolicy, Ipv4Cidr, ValidationError};

use super::draft::{HostDraft, RangeDraft, SubnetDraft, VpcDraft};
use super::model::{HostTemplate, RangeTemplate, SubnetTemplate, VpcTemplate};

/// Converts drafts into validated templates under a capacity policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateValidator {
    pub policy: CapacityPolicy,
}

impl TemplateValidator {
    pub fn new(policy: CapacityPolicy) -> Self {
        Self { policy }
    }

    pub fn host(&self, draft: &HostDraft) -> Result<HostTemplate, ValidationError> {
        HostTemplate::new(
            &draft.hostname,
            draft.os,
            draft.spec,
            draft.size,
            draft.tags.clone(),
        )
    }

    pub fn subnet(&self, draft: &SubnetDraft) -> Result<SubnetTemplate, ValidationError> {
        let cidr = parse_cidr("Subnet", &draft.name, &draft.cidr)?;
        let hosts = draft
            .hosts
            .iter()
            .map(|host| self.host(host))
            .collect::<Result<Vec<_>, _>>()?;

        SubnetTemplate::with_policy(draft.name.clone(), cidr, hosts, &self.policy)
    }

    pub fn vpc(&self, draft: &VpcDraft) -> Result<VpcTemplate, ValidationError> {
        let cidr = parse_cidr("VPC", &draft.name, &draft.cidr)?;
        let subnets = draft
            .subnets
            .iter()
            .map(|subnet| self.subnet(subnet))
            .collect::<Result<Vec<_>, _>>()?;

        VpcTemplate::new(draft.name.clone(), cidr, subnets)
    }

    pub fn range(&self, draft: &RangeDraft) -> Result<RangeTemplate, ValidationError> {
        let vpcs = draft
            .vpcs
            .iter()
            .map(|vpc| self.vpc(vpc))
            .collect::<Result<Vec<_>, _>>()?;

        let range = RangeTemplate::new(draft.name.clone(), draft.provider, draft.vnc, draft.vpn, vpcs)?;
        debug!(
            range = %range.name(),
            vpcs = range.vpcs().len(),
            hosts = range.host_count(),
            "Range template validated"
        );
        Ok(range)
    }
}

fn parse_cidr(entity: &'static str, name: &str, cidr: &str) -> Result<Ipv4Cidr, ValidationError> {
    cidr.parse().map_err(|reason| ValidationError::InvalidCidr {
        entity,
        name: name.to_string(),
        reason,
    })
}
