// Copyright (c) 2025 - Cowboy AI, Inc.
//! Template Store Abstraction
//!
//! Persistence seam for template trees. A store keeps four tables
//! (`ranges`, `vpcs`, `subnets`, `hosts`) whose rows carry an owner and an
//! optional parent link; a tree is written in one [`Transaction`] and read
//! back whole.
//!
//! # Architecture
//!
//! ```text
//! Template → Repository ─stage→ Transaction ─commit→ TemplateStore → Tables
//!                                                          ↓
//!                                                  load → TemplateTree
//! ```
//!
//! # Store Requirements
//!
//! 1. **Atomic**: a commit applies every staged row or none
//! 2. **Ordered**: children load back in insertion order
//! 3. **Owned**: a child row has the same owner as its parent
//! 4. **Cascading**: deleting a standalone root removes all descendants
//! 5. **Guarded**: deleting a non-standalone row is refused without mutation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{EntityKind, RangeResult};
use crate::template::{
    HostHeader, HostRecord, OwnerId, RangeHeader, RangeRecord, SubnetHeader, SubnetRecord,
    VpcHeader, VpcRecord,
};

pub mod memory;
pub mod payload;
pub mod transaction;

pub use memory::InMemoryTemplateStore;
pub use payload::{NestedPayload, TemplatePayload};
pub use transaction::Transaction;

/// One stored row of any kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "row", rename_all = "snake_case")]
pub enum EntityHeader {
    Range(RangeHeader),
    Vpc(VpcHeader),
    Subnet(SubnetHeader),
    Host(HostHeader),
}

impl EntityHeader {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityHeader::Range(_) => EntityKind::Range,
            EntityHeader::Vpc(_) => EntityKind::Vpc,
            EntityHeader::Subnet(_) => EntityKind::Subnet,
            EntityHeader::Host(_) => EntityKind::Host,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            EntityHeader::Range(h) => h.id.as_uuid(),
            EntityHeader::Vpc(h) => h.id.as_uuid(),
            EntityHeader::Subnet(h) => h.id.as_uuid(),
            EntityHeader::Host(h) => h.id.as_uuid(),
        }
    }

    pub fn owner_id(&self) -> OwnerId {
        match self {
            EntityHeader::Range(h) => h.owner_id,
            EntityHeader::Vpc(h) => h.owner_id,
            EntityHeader::Subnet(h) => h.owner_id,
            EntityHeader::Host(h) => h.owner_id,
        }
    }

    /// Parent link; `None` for ranges and standalone templates
    pub fn parent_id(&self) -> Option<Uuid> {
        match self {
            EntityHeader::Range(_) => None,
            EntityHeader::Vpc(h) => h.range_id.map(|id| id.as_uuid()),
            EntityHeader::Subnet(h) => h.vpc_id.map(|id| id.as_uuid()),
            EntityHeader::Host(h) => h.subnet_id.map(|id| id.as_uuid()),
        }
    }

    /// Name that must be unique among siblings (hostname for hosts)
    pub fn name(&self) -> &str {
        match self {
            EntityHeader::Range(h) => &h.name,
            EntityHeader::Vpc(h) => &h.name,
            EntityHeader::Subnet(h) => &h.name,
            EntityHeader::Host(h) => h.hostname.as_str(),
        }
    }

    pub fn is_standalone(&self) -> bool {
        self.parent_id().is_none()
    }
}

/// Fully loaded subtree rooted at an entity of any kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tree", rename_all = "snake_case")]
pub enum TemplateTree {
    Range(RangeRecord),
    Vpc(VpcRecord),
    Subnet(SubnetRecord),
    Host(HostRecord),
}

impl TemplateTree {
    pub fn kind(&self) -> EntityKind {
        match self {
            TemplateTree::Range(_) => EntityKind::Range,
            TemplateTree::Vpc(_) => EntityKind::Vpc,
            TemplateTree::Subnet(_) => EntityKind::Subnet,
            TemplateTree::Host(_) => EntityKind::Host,
        }
    }
}

/// Rows written by a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CommitReceipt {
    pub rows: usize,
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No row with that id
    NotFound,
    /// Row has a parent; nothing was removed
    NotStandalone,
    /// Row and all descendants removed
    Deleted { removed: usize },
}

/// Storage trait for template trees
///
/// Implementations must make [`commit`](TemplateStore::commit) and
/// [`delete`](TemplateStore::delete) atomic: concurrent readers see either
/// the state before or after, never a partial tree.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Apply every staged row, or none of them
    ///
    /// # Errors
    ///
    /// - `Conflict` if an id already exists, a parent row is missing, a
    ///   child's owner differs from its parent's, or a sibling name repeats
    /// - `Validation` if a parent VPC or subnet would break its containment,
    ///   public subnet or capacity rules with the staged children
    async fn commit(&self, tx: Transaction) -> RangeResult<CommitReceipt>;

    /// Load the full subtree rooted at `id`
    ///
    /// With `owner_filter` set, rows of other owners are invisible.
    async fn load(
        &self,
        kind: EntityKind,
        id: Uuid,
        owner_filter: Option<OwnerId>,
    ) -> RangeResult<Option<TemplateTree>>;

    /// List rows of one kind, without descendants, in insertion order
    async fn headers(
        &self,
        kind: EntityKind,
        owner_filter: Option<OwnerId>,
        standalone_only: bool,
    ) -> RangeResult<Vec<EntityHeader>>;

    /// Owner of a row
    async fn owner_of(&self, kind: EntityKind, id: Uuid) -> RangeResult<Option<OwnerId>>;

    /// Delete a standalone row and cascade to its descendants
    async fn delete(&self, kind: EntityKind, id: Uuid) -> RangeResult<DeleteOutcome>;
}
