// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Template Store
//!
//! Arena of four tables keyed by id. Each table keeps its rows in insertion
//! order and a parent → children index, which drives both tree loading and
//! cascade deletes. One `tokio::sync::RwLock` guards all four tables, so a
//! commit or delete is a single critical section.
//!
//! A commit also re-checks the network rules of every VPC and subnet that
//! gains children in the batch, against stored and staged rows together:
//! subnet containment, the reserved public `/24`, and subnet capacity.
//!
//! Optionally backed by a JSON snapshot file that is rewritten after every
//! successful mutation (write to a temp file, then rename).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::invariants::{
    validate_capacity, validate_public_subnet_reservation, validate_subnets_contained,
};
use crate::domain::{CapacityPolicy, Ipv4Cidr};
use crate::errors::{EntityKind, RangeError, RangeResult};
use crate::template::{
    HostHeader, HostRecord, OwnerId, RangeHeader, RangeRecord, SubnetHeader, SubnetRecord,
    VpcHeader, VpcRecord,
};

use super::{CommitReceipt, DeleteOutcome, EntityHeader, TemplateStore, TemplateTree, Transaction};

trait Row: Clone {
    fn id(&self) -> Uuid;
    fn parent(&self) -> Option<Uuid>;
    fn owner(&self) -> OwnerId;
}

impl Row for RangeHeader {
    fn id(&self) -> Uuid {
        self.id.as_uuid()
    }
    fn parent(&self) -> Option<Uuid> {
        None
    }
    fn owner(&self) -> OwnerId {
        self.owner_id
    }
}

impl Row for VpcHeader {
    fn id(&self) -> Uuid {
        self.id.as_uuid()
    }
    fn parent(&self) -> Option<Uuid> {
        self.range_id.map(|id| id.as_uuid())
    }
    fn owner(&self) -> OwnerId {
        self.owner_id
    }
}

impl Row for SubnetHeader {
    fn id(&self) -> Uuid {
        self.id.as_uuid()
    }
    fn parent(&self) -> Option<Uuid> {
        self.vpc_id.map(|id| id.as_uuid())
    }
    fn owner(&self) -> OwnerId {
        self.owner_id
    }
}

impl Row for HostHeader {
    fn id(&self) -> Uuid {
        self.id.as_uuid()
    }
    fn parent(&self) -> Option<Uuid> {
        self.subnet_id.map(|id| id.as_uuid())
    }
    fn owner(&self) -> OwnerId {
        self.owner_id
    }
}

#[derive(Debug, Clone)]
struct Table<R> {
    rows: HashMap<Uuid, R>,
    order: Vec<Uuid>,
    children: HashMap<Uuid, Vec<Uuid>>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
            children: HashMap::new(),
        }
    }
}

impl<R: Row> Table<R> {
    fn get(&self, id: Uuid) -> Option<&R> {
        self.rows.get(&id)
    }

    fn insert(&mut self, row: R) {
        let id = row.id();
        if let Some(parent) = row.parent() {
            self.children.entry(parent).or_default().push(id);
        }
        self.order.push(id);
        self.rows.insert(id, row);
    }

    fn remove(&mut self, id: Uuid) -> Option<R> {
        let row = self.rows.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        if let Some(parent) = row.parent() {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|existing| *existing != id);
                if siblings.is_empty() {
                    self.children.remove(&parent);
                }
            }
        }
        Some(row)
    }

    fn child_ids(&self, parent: Uuid) -> Vec<Uuid> {
        self.children.get(&parent).cloned().unwrap_or_default()
    }

    fn children_of(&self, parent: Uuid) -> impl Iterator<Item = &R> {
        self.children
            .get(&parent)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.rows.get(id))
    }

    fn iter(&self) -> impl Iterator<Item = &R> {
        self.order.iter().filter_map(move |id| self.rows.get(id))
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Serialized form of the store: one array of rows per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub ranges: Vec<RangeHeader>,
    pub vpcs: Vec<VpcHeader>,
    pub subnets: Vec<SubnetHeader>,
    pub hosts: Vec<HostHeader>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    ranges: Table<RangeHeader>,
    vpcs: Table<VpcHeader>,
    subnets: Table<SubnetHeader>,
    hosts: Table<HostHeader>,
}

impl Tables {
    fn owner_of(&self, kind: EntityKind, id: Uuid) -> Option<OwnerId> {
        match kind {
            EntityKind::Range => self.ranges.get(id).map(Row::owner),
            EntityKind::Vpc => self.vpcs.get(id).map(Row::owner),
            EntityKind::Subnet => self.subnets.get(id).map(Row::owner),
            EntityKind::Host => self.hosts.get(id).map(Row::owner),
        }
    }

    fn parent_of(&self, kind: EntityKind, id: Uuid) -> Option<Option<Uuid>> {
        match kind {
            EntityKind::Range => self.ranges.get(id).map(Row::parent),
            EntityKind::Vpc => self.vpcs.get(id).map(Row::parent),
            EntityKind::Subnet => self.subnets.get(id).map(Row::parent),
            EntityKind::Host => self.hosts.get(id).map(Row::parent),
        }
    }

    fn contains(&self, kind: EntityKind, id: Uuid) -> bool {
        self.owner_of(kind, id).is_some()
    }

    /// Names of the `kind` rows stored under `parent`
    fn sibling_names(&self, kind: EntityKind, parent: Uuid) -> Vec<&str> {
        match kind {
            EntityKind::Range => Vec::new(),
            EntityKind::Vpc => self.vpcs.children_of(parent).map(|h| h.name.as_str()).collect(),
            EntityKind::Subnet => self
                .subnets
                .children_of(parent)
                .map(|h| h.name.as_str())
                .collect(),
            EntityKind::Host => self
                .hosts
                .children_of(parent)
                .map(|h| h.hostname.as_str())
                .collect(),
        }
    }

    fn child_ids(&self, child_kind: EntityKind, parent: Uuid) -> Vec<Uuid> {
        match child_kind {
            EntityKind::Range => Vec::new(),
            EntityKind::Vpc => self.vpcs.child_ids(parent),
            EntityKind::Subnet => self.subnets.child_ids(parent),
            EntityKind::Host => self.hosts.child_ids(parent),
        }
    }

    /// Check storage-level constraints of a batch without touching anything
    fn check(&self, rows: &[EntityHeader]) -> RangeResult<()> {
        let mut staged: HashMap<(EntityKind, Uuid), &EntityHeader> = HashMap::new();
        for row in rows {
            if self.contains(row.kind(), row.id())
                || staged.insert((row.kind(), row.id()), row).is_some()
            {
                return Err(RangeError::Conflict(format!(
                    "{} {} already exists",
                    row.kind(),
                    row.id()
                )));
            }
        }

        let mut names: HashSet<(EntityKind, Uuid, &str)> = HashSet::new();
        for row in rows {
            let (Some(parent_id), Some(parent_kind)) = (row.parent_id(), row.kind().parent())
            else {
                continue;
            };

            let parent_owner = staged
                .get(&(parent_kind, parent_id))
                .map(|parent| parent.owner_id())
                .or_else(|| self.owner_of(parent_kind, parent_id))
                .ok_or_else(|| {
                    RangeError::Conflict(format!(
                        "{} {} references missing {} {}",
                        row.kind(),
                        row.id(),
                        parent_kind,
                        parent_id
                    ))
                })?;

            if parent_owner != row.owner_id() {
                return Err(RangeError::Conflict(format!(
                    "{} {} must have the same owner as {} {}",
                    row.kind(),
                    row.id(),
                    parent_kind,
                    parent_id
                )));
            }

            let name = row.name();
            if !names.insert((row.kind(), parent_id, name))
                || self.sibling_names(row.kind(), parent_id).contains(&name)
            {
                return Err(RangeError::Conflict(format!(
                    "{} name {:?} is already used in {} {}",
                    row.kind(),
                    name,
                    parent_kind,
                    parent_id
                )));
            }
        }

        Ok(())
    }

    /// Check the network rules of every parent that gains children in a batch
    ///
    /// Runs after [`Tables::check`], so every parent referenced by a staged
    /// row exists either in the batch or in the tables.
    fn check_network(&self, rows: &[EntityHeader], policy: &CapacityPolicy) -> RangeResult<()> {
        let staged_vpcs: Vec<&VpcHeader> = rows
            .iter()
            .filter_map(|row| match row {
                EntityHeader::Vpc(h) => Some(h),
                _ => None,
            })
            .collect();
        let staged_subnets: Vec<&SubnetHeader> = rows
            .iter()
            .filter_map(|row| match row {
                EntityHeader::Subnet(h) => Some(h),
                _ => None,
            })
            .collect();
        let staged_hosts: Vec<&HostHeader> = rows
            .iter()
            .filter_map(|row| match row {
                EntityHeader::Host(h) => Some(h),
                _ => None,
            })
            .collect();

        let mut vpc_ids: Vec<Uuid> = staged_vpcs.iter().map(|h| h.id()).collect();
        vpc_ids.extend(staged_subnets.iter().filter_map(|h| h.parent()));
        dedup_in_order(&mut vpc_ids);

        for vpc_id in vpc_ids {
            let Some(vpc_cidr) = staged_vpcs
                .iter()
                .find(|h| h.id() == vpc_id)
                .map(|h| h.cidr)
                .or_else(|| self.vpcs.get(vpc_id).map(|h| h.cidr))
            else {
                continue;
            };

            let subnet_cidrs: Vec<Ipv4Cidr> = self
                .subnets
                .children_of(vpc_id)
                .map(|h| h.cidr)
                .chain(
                    staged_subnets
                        .iter()
                        .filter(|h| h.parent() == Some(vpc_id))
                        .map(|h| h.cidr),
                )
                .collect();

            validate_subnets_contained(&vpc_cidr, &subnet_cidrs)?;
            validate_public_subnet_reservation(&vpc_cidr, &subnet_cidrs)?;
        }

        let mut subnet_ids: Vec<Uuid> = staged_subnets.iter().map(|h| h.id()).collect();
        subnet_ids.extend(staged_hosts.iter().filter_map(|h| h.parent()));
        dedup_in_order(&mut subnet_ids);

        for subnet_id in subnet_ids {
            let Some(cidr) = staged_subnets
                .iter()
                .find(|h| h.id() == subnet_id)
                .map(|h| h.cidr)
                .or_else(|| self.subnets.get(subnet_id).map(|h| h.cidr))
            else {
                continue;
            };

            let hosts = self.hosts.children_of(subnet_id).count()
                + staged_hosts
                    .iter()
                    .filter(|h| h.parent() == Some(subnet_id))
                    .count();

            validate_capacity(&cidr, hosts, policy)?;
        }

        Ok(())
    }

    fn apply(&mut self, rows: Vec<EntityHeader>) {
        for row in rows {
            match row {
                EntityHeader::Range(h) => self.ranges.insert(h),
                EntityHeader::Vpc(h) => self.vpcs.insert(h),
                EntityHeader::Subnet(h) => self.subnets.insert(h),
                EntityHeader::Host(h) => self.hosts.insert(h),
            }
        }
    }

    fn host_records(&self, subnet_id: Uuid) -> Vec<HostRecord> {
        self.hosts.children_of(subnet_id).cloned().collect()
    }

    fn subnet_record(&self, header: &SubnetHeader) -> SubnetRecord {
        SubnetRecord {
            header: header.clone(),
            hosts: self.host_records(header.id.as_uuid()),
        }
    }

    fn vpc_record(&self, header: &VpcHeader) -> VpcRecord {
        VpcRecord {
            header: header.clone(),
            subnets: self
                .subnets
                .children_of(header.id.as_uuid())
                .map(|subnet| self.subnet_record(subnet))
                .collect(),
        }
    }

    fn range_record(&self, header: &RangeHeader) -> RangeRecord {
        RangeRecord {
            header: header.clone(),
            vpcs: self
                .vpcs
                .children_of(header.id.as_uuid())
                .map(|vpc| self.vpc_record(vpc))
                .collect(),
        }
    }

    fn tree(&self, kind: EntityKind, id: Uuid) -> Option<TemplateTree> {
        match kind {
            EntityKind::Range => self
                .ranges
                .get(id)
                .map(|h| TemplateTree::Range(self.range_record(h))),
            EntityKind::Vpc => self.vpcs.get(id).map(|h| TemplateTree::Vpc(self.vpc_record(h))),
            EntityKind::Subnet => self
                .subnets
                .get(id)
                .map(|h| TemplateTree::Subnet(self.subnet_record(h))),
            EntityKind::Host => self.hosts.get(id).cloned().map(TemplateTree::Host),
        }
    }

    fn headers(&self, kind: EntityKind) -> Vec<EntityHeader> {
        match kind {
            EntityKind::Range => self.ranges.iter().cloned().map(EntityHeader::Range).collect(),
            EntityKind::Vpc => self.vpcs.iter().cloned().map(EntityHeader::Vpc).collect(),
            EntityKind::Subnet => self.subnets.iter().cloned().map(EntityHeader::Subnet).collect(),
            EntityKind::Host => self.hosts.iter().cloned().map(EntityHeader::Host).collect(),
        }
    }

    /// `(kind, id)` of a row and all of its descendants, parents first
    fn cascade(&self, kind: EntityKind, id: Uuid) -> Vec<(EntityKind, Uuid)> {
        let mut out = vec![(kind, id)];
        let mut next = 0;
        while next < out.len() {
            let (parent_kind, parent_id) = out[next];
            if let Some(child_kind) = parent_kind.child() {
                out.extend(
                    self.child_ids(child_kind, parent_id)
                        .into_iter()
                        .map(|child| (child_kind, child)),
                );
            }
            next += 1;
        }
        out
    }

    fn remove(&mut self, kind: EntityKind, id: Uuid) {
        match kind {
            EntityKind::Range => {
                self.ranges.remove(id);
            }
            EntityKind::Vpc => {
                self.vpcs.remove(id);
            }
            EntityKind::Subnet => {
                self.subnets.remove(id);
            }
            EntityKind::Host => {
                self.hosts.remove(id);
            }
        }
    }

    fn row_count(&self) -> usize {
        self.ranges.len() + self.vpcs.len() + self.subnets.len() + self.hosts.len()
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            ranges: self.ranges.iter().cloned().collect(),
            vpcs: self.vpcs.iter().cloned().collect(),
            subnets: self.subnets.iter().cloned().collect(),
            hosts: self.hosts.iter().cloned().collect(),
        }
    }

    fn from_snapshot(snapshot: StoreSnapshot) -> RangeResult<Self> {
        let rows: Vec<EntityHeader> = snapshot
            .ranges
            .into_iter()
            .map(EntityHeader::Range)
            .chain(snapshot.vpcs.into_iter().map(EntityHeader::Vpc))
            .chain(snapshot.subnets.into_iter().map(EntityHeader::Subnet))
            .chain(snapshot.hosts.into_iter().map(EntityHeader::Host))
            .collect();

        let mut tables = Tables::default();
        tables.check(&rows)?;
        tables.apply(rows);
        Ok(tables)
    }
}

fn dedup_in_order(ids: &mut Vec<Uuid>) {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

async fn write_snapshot(path: &Path, tables: &Tables) -> RangeResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let data = serde_json::to_vec_pretty(&tables.snapshot())?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await?;

    debug!(path = %path.display(), rows = tables.row_count(), "Store snapshot written");
    Ok(())
}

async fn read_snapshot(path: &Path) -> RangeResult<Tables> {
    let data = tokio::fs::read(path).await?;
    let snapshot: StoreSnapshot = serde_json::from_slice(&data)?;
    let tables = Tables::from_snapshot(snapshot)
        .map_err(|e| RangeError::Storage(format!("Corrupt snapshot {}: {e}", path.display())))?;

    info!(path = %path.display(), rows = tables.row_count(), "Loaded store snapshot");
    Ok(tables)
}

/// In-memory [`TemplateStore`] with optional JSON persistence
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateStore {
    tables: Arc<RwLock<Tables>>,
    snapshot_path: Option<PathBuf>,
    policy: CapacityPolicy,
}

impl InMemoryTemplateStore {
    /// Create an empty, purely in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`
    ///
    /// Existing state is loaded; every later commit or delete rewrites the
    /// file before it becomes visible.
    pub async fn open(path: impl Into<PathBuf>) -> RangeResult<Self> {
        let path = path.into();
        let tables = if tokio::fs::try_exists(&path).await? {
            read_snapshot(&path).await?
        } else {
            debug!(path = %path.display(), "No existing store snapshot");
            Tables::default()
        };

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
            snapshot_path: Some(path),
            policy: CapacityPolicy::default(),
        })
    }

    /// Use `policy` for the subnet capacity check on commit
    pub fn with_capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load a snapshot into a new in-memory store
    pub async fn load_snapshot(path: &Path) -> RangeResult<Self> {
        let tables = read_snapshot(path).await?;
        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
            snapshot_path: None,
            policy: CapacityPolicy::default(),
        })
    }

    /// Write the current state to `path`
    pub async fn save_snapshot(&self, path: &Path) -> RangeResult<()> {
        let tables = self.tables.read().await;
        write_snapshot(path, &tables).await
    }

    /// Current state as a snapshot value
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.tables.read().await.snapshot()
    }

    /// Total number of stored rows
    pub async fn row_count(&self) -> usize {
        self.tables.read().await.row_count()
    }

    /// Apply `mutate` to the tables, persisting first when file-backed
    async fn mutate<F>(&self, tables: &mut Tables, mutate: F) -> RangeResult<()>
    where
        F: FnOnce(&mut Tables) + Send,
    {
        match &self.snapshot_path {
            Some(path) => {
                let mut next = tables.clone();
                mutate(&mut next);
                write_snapshot(path, &next).await?;
                *tables = next;
            }
            None => mutate(tables),
        }
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn commit(&self, tx: Transaction) -> RangeResult<CommitReceipt> {
        let rows = tx.into_rows();
        let receipt = CommitReceipt { rows: rows.len() };

        let mut tables = self.tables.write().await;
        tables.check(&rows)?;
        tables.check_network(&rows, &self.policy)?;
        self.mutate(&mut tables, move |t| t.apply(rows)).await?;

        debug!(rows = receipt.rows, "Transaction committed");
        Ok(receipt)
    }

    async fn load(
        &self,
        kind: EntityKind,
        id: Uuid,
        owner_filter: Option<OwnerId>,
    ) -> RangeResult<Option<TemplateTree>> {
        let tables = self.tables.read().await;
        match (tables.owner_of(kind, id), owner_filter) {
            (None, _) => Ok(None),
            (Some(owner), Some(filter)) if owner != filter => Ok(None),
            _ => Ok(tables.tree(kind, id)),
        }
    }

    async fn headers(
        &self,
        kind: EntityKind,
        owner_filter: Option<OwnerId>,
        standalone_only: bool,
    ) -> RangeResult<Vec<EntityHeader>> {
        let tables = self.tables.read().await;
        Ok(tables
            .headers(kind)
            .into_iter()
            .filter(|h| owner_filter.map_or(true, |owner| h.owner_id() == owner))
            .filter(|h| !standalone_only || h.is_standalone())
            .collect())
    }

    async fn owner_of(&self, kind: EntityKind, id: Uuid) -> RangeResult<Option<OwnerId>> {
        Ok(self.tables.read().await.owner_of(kind, id))
    }

    async fn delete(&self, kind: EntityKind, id: Uuid) -> RangeResult<DeleteOutcome> {
        let mut tables = self.tables.write().await;

        match tables.parent_of(kind, id) {
            None => return Ok(DeleteOutcome::NotFound),
            Some(Some(parent)) => {
                debug!(%kind, %id, %parent, "Refusing to delete non-standalone row");
                return Ok(DeleteOutcome::NotStandalone);
            }
            Some(None) => {}
        }

        let doomed = tables.cascade(kind, id);
        let removed = doomed.len();
        self.mutate(&mut tables, move |t| {
            for (kind, id) in doomed.into_iter().rev() {
                t.remove(kind, id);
            }
        })
        .await?;

        info!(%kind, %id, removed, "Deleted template tree");
        Ok(DeleteOutcome::Deleted { removed })
    }
}
