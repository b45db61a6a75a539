// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed mapping between templates and store rows
//!
//! Lets the repository offer one generic `create`/`get`/`list`/`delete`
//! surface over all four template kinds while the store itself works with
//! untyped [`EntityHeader`] rows.

use uuid::Uuid;

use crate::errors::EntityKind;
use crate::template::{
    EntityId, HostHeader, HostRecord, HostTemplate, OwnerId, RangeHeader, RangeRecord,
    RangeTemplate, SubnetHeader, SubnetRecord, SubnetTemplate, VpcHeader, VpcRecord,
    VpcTemplate,
};

use super::{EntityHeader, TemplateTree, Transaction};

/// A validated template that can be stored
pub trait TemplatePayload: Send + Sync + Sized + 'static {
    /// Table the root row lands in
    const KIND: EntityKind;

    /// Stored tree
    type Record: Clone + Send + Sync;

    /// Stored row without descendants
    type Header: Clone + Send + Sync;

    /// Assign fresh ids to the template and its descendants
    ///
    /// `parent` is the raw id of the composition parent; ranges have none.
    fn materialize(&self, owner: OwnerId, parent: Option<Uuid>) -> Self::Record;

    /// Id of the record's root row
    fn record_id(record: &Self::Record) -> EntityId<Self>;

    /// Stage the record's rows, children first
    fn stage(record: &Self::Record, tx: &mut Transaction);

    fn record_from_tree(tree: TemplateTree) -> Option<Self::Record>;

    fn header_from_row(row: EntityHeader) -> Option<Self::Header>;

    fn header_id(header: &Self::Header) -> EntityId<Self>;
}

/// A template that may also live inside a parent
pub trait NestedPayload: TemplatePayload {
    type Parent: TemplatePayload;
}

impl TemplatePayload for RangeTemplate {
    const KIND: EntityKind = EntityKind::Range;
    type Record = RangeRecord;
    type Header = RangeHeader;

    fn materialize(&self, owner: OwnerId, _parent: Option<Uuid>) -> RangeRecord {
        RangeRecord::materialize(self, owner)
    }

    fn record_id(record: &RangeRecord) -> EntityId<Self> {
        record.header.id
    }

    fn stage(record: &RangeRecord, tx: &mut Transaction) {
        tx.stage_range(record);
    }

    fn record_from_tree(tree: TemplateTree) -> Option<RangeRecord> {
        match tree {
            TemplateTree::Range(record) => Some(record),
            _ => None,
        }
    }

    fn header_from_row(row: EntityHeader) -> Option<RangeHeader> {
        match row {
            EntityHeader::Range(header) => Some(header),
            _ => None,
        }
    }

    fn header_id(header: &RangeHeader) -> EntityId<Self> {
        header.id
    }
}

impl TemplatePayload for VpcTemplate {
    const KIND: EntityKind = EntityKind::Vpc;
    type Record = VpcRecord;
    type Header = VpcHeader;

    fn materialize(&self, owner: OwnerId, parent: Option<Uuid>) -> VpcRecord {
        VpcRecord::materialize(self, owner, parent.map(EntityId::from_uuid))
    }

    fn record_id(record: &VpcRecord) -> EntityId<Self> {
        record.header.id
    }

    fn stage(record: &VpcRecord, tx: &mut Transaction) {
        tx.stage_vpc(record);
    }

    fn record_from_tree(tree: TemplateTree) -> Option<VpcRecord> {
        match tree {
            TemplateTree::Vpc(record) => Some(record),
            _ => None,
        }
    }

    fn header_from_row(row: EntityHeader) -> Option<VpcHeader> {
        match row {
            EntityHeader::Vpc(header) => Some(header),
            _ => None,
        }
    }

    fn header_id(header: &VpcHeader) -> EntityId<Self> {
        header.id
    }
}

impl NestedPayload for VpcTemplate {
    type Parent = RangeTemplate;
}

impl TemplatePayload for SubnetTemplate {
    const KIND: EntityKind = EntityKind::Subnet;
    type Record = SubnetRecord;
    type Header = SubnetHeader;

    fn materialize(&self, owner: OwnerId, parent: Option<Uuid>) -> SubnetRecord {
        SubnetRecord::materialize(self, owner, parent.map(EntityId::from_uuid))
    }

    fn record_id(record: &SubnetRecord) -> EntityId<Self> {
        record.header.id
    }

    fn stage(record: &SubnetRecord, tx: &mut Transaction) {
        tx.stage_subnet(record);
    }

    fn record_from_tree(tree: TemplateTree) -> Option<SubnetRecord> {
        match tree {
            TemplateTree::Subnet(record) => Some(record),
            _ => None,
        }
    }

    fn header_from_row(row: EntityHeader) -> Option<SubnetHeader> {
        match row {
            EntityHeader::Subnet(header) => Some(header),
            _ => None,
        }
    }

    fn header_id(header: &SubnetHeader) -> EntityId<Self> {
        header.id
    }
}

impl NestedPayload for SubnetTemplate {
    type Parent = VpcTemplate;
}

impl TemplatePayload for HostTemplate {
    const KIND: EntityKind = EntityKind::Host;
    type Record = HostRecord;
    type Header = HostHeader;

    fn materialize(&self, owner: OwnerId, parent: Option<Uuid>) -> HostRecord {
        HostHeader::materialize(self, owner, parent.map(EntityId::from_uuid))
    }

    fn record_id(record: &HostRecord) -> EntityId<Self> {
        record.id
    }

    fn stage(record: &HostRecord, tx: &mut Transaction) {
        tx.stage_host(record);
    }

    fn record_from_tree(tree: TemplateTree) -> Option<HostRecord> {
        match tree {
            TemplateTree::Host(record) => Some(record),
            _ => None,
        }
    }

    fn header_from_row(row: EntityHeader) -> Option<HostHeader> {
        match row {
            EntityHeader::Host(header) => Some(header),
            _ => None,
        }
    }

    fn header_id(header: &HostHeader) -> EntityId<Self> {
        header.id
    }
}

impl NestedPayload for HostTemplate {
    type Parent = SubnetTemplate;
}
