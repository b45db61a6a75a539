// Copyright (c) 2025 - Cowboy AI, Inc.
//! Staged writes
//!
//! A [`Transaction`] collects rows until it is handed to
//! [`TemplateStore::commit`](super::TemplateStore::commit). Trees are staged
//! bottom-up: children before their parent. Dropping an uncommitted
//! transaction discards it.

use crate::template::{HostRecord, RangeRecord, SubnetRecord, VpcRecord};

use super::EntityHeader;

/// Unit of work for the template store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    rows: Vec<EntityHeader>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a single row
    pub fn stage(&mut self, row: EntityHeader) {
        self.rows.push(row);
    }

    pub fn stage_host(&mut self, host: &HostRecord) {
        self.stage(EntityHeader::Host(host.clone()));
    }

    pub fn stage_subnet(&mut self, subnet: &SubnetRecord) {
        for host in &subnet.hosts {
            self.stage_host(host);
        }
        self.stage(EntityHeader::Subnet(subnet.header.clone()));
    }

    pub fn stage_vpc(&mut self, vpc: &VpcRecord) {
        for subnet in &vpc.subnets {
            self.stage_subnet(subnet);
        }
        self.stage(EntityHeader::Vpc(vpc.header.clone()));
    }

    pub fn stage_range(&mut self, range: &RangeRecord) {
        for vpc in &range.vpcs {
            self.stage_vpc(vpc);
        }
        self.stage(EntityHeader::Range(range.header.clone()));
    }

    pub fn rows(&self) -> &[EntityHeader] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<EntityHeader> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EntityKind;
    use crate::template::{OwnerId, RangeDraft, TemplateValidator};

    #[test]
    fn test_stage_range_is_bottom_up() {
        let draft: RangeDraft = serde_json::from_value(serde_json::json!({
            "name": "lab",
            "provider": "aws",
            "vpcs": [{"name": "v", "cidr": "10.0.0.0/16", "subnets": [
                {"name": "s", "cidr": "10.0.1.0/24", "hosts": [
                    {"hostname": "h1", "os": "debian_11", "spec": "tiny", "size": 8},
                    {"hostname": "h2", "os": "debian_11", "spec": "tiny", "size": 8}
                ]}
            ]}]
        }))
        .unwrap();
        let template = TemplateValidator::default().range(&draft).unwrap();
        let record = RangeRecord::materialize(&template, OwnerId::new());

        let mut tx = Transaction::new();
        tx.stage_range(&record);

        let kinds: Vec<_> = tx.rows().iter().map(EntityHeader::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntityKind::Host,
                EntityKind::Host,
                EntityKind::Subnet,
                EntityKind::Vpc,
                EntityKind::Range
            ]
        );
        assert_eq!(tx.rows()[0].name(), "h1");
    }
}
