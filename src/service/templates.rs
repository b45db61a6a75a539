// Copyright (c) 2025 - Cowboy AI, Inc.
//! Template Repository
//!
//! Typed operations over a [`TemplateStore`]: create, read, list and delete
//! template trees of any of the four kinds.
//!
//! # Transaction Semantics
//!
//! - [`create_standalone`](TemplateRepository::create_standalone) stages the
//!   root and every descendant and commits once.
//! - [`create_nested`](TemplateRepository::create_nested) only stages; the
//!   caller decides when to [`commit`](TemplateRepository::commit).
//!
//! Templates are validated before they reach the repository. A nested tree
//! is only checked against its stored parent at commit: a failed commit is
//! either a storage-level `Conflict` or a `Validation` error for the parent's
//! network rules, and in both cases leaves storage as it was.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{RangeError, RangeResult};
use crate::store::{
    CommitReceipt, DeleteOutcome, NestedPayload, TemplatePayload, TemplateStore, Transaction,
};
use crate::template::{EntityId, OwnerId};

/// Repository for template trees
pub struct TemplateRepository<S: TemplateStore> {
    store: Arc<S>,
}

impl<S: TemplateStore> Clone for TemplateRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TemplateStore> TemplateRepository<S> {
    /// Create a repository over a shared store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Start a new unit of work for [`create_nested`](Self::create_nested)
    pub fn begin(&self) -> Transaction {
        Transaction::new()
    }

    /// Store a template tree with no parent
    ///
    /// # Returns
    /// - Id of the new root row
    pub async fn create_standalone<T: TemplatePayload>(
        &self,
        payload: &T,
        owner: OwnerId,
    ) -> RangeResult<EntityId<T>> {
        let record = payload.materialize(owner, None);
        let id = T::record_id(&record);

        let mut tx = self.begin();
        T::stage(&record, &mut tx);
        let receipt = self.store.commit(tx).await?;

        info!(kind = %T::KIND, %id, %owner, rows = receipt.rows, "Created standalone template");
        Ok(id)
    }

    /// Stage a template tree under an existing or staged parent
    ///
    /// Nothing is written until the transaction is committed.
    pub fn create_nested<T: NestedPayload>(
        &self,
        tx: &mut Transaction,
        payload: &T,
        owner: OwnerId,
        parent: EntityId<T::Parent>,
    ) -> EntityId<T> {
        let record = payload.materialize(owner, Some(parent.as_uuid()));
        let id = T::record_id(&record);
        T::stage(&record, tx);

        debug!(kind = %T::KIND, %id, %parent, "Staged nested template");
        id
    }

    /// Commit a transaction built with [`create_nested`](Self::create_nested)
    pub async fn commit(&self, tx: Transaction) -> RangeResult<CommitReceipt> {
        self.store.commit(tx).await
    }

    /// Load a full tree
    ///
    /// With `owner_filter` set, trees of other owners are reported as not
    /// found. Admin callers pass `None`.
    pub async fn get<T: TemplatePayload>(
        &self,
        id: EntityId<T>,
        owner_filter: Option<OwnerId>,
    ) -> RangeResult<T::Record> {
        let not_found = || RangeError::NotFound {
            kind: T::KIND,
            id: id.as_uuid(),
        };

        let tree = self
            .store
            .load(T::KIND, id.as_uuid(), owner_filter)
            .await?
            .ok_or_else(not_found)?;

        T::record_from_tree(tree).ok_or_else(|| {
            RangeError::Storage(format!("{} {} loaded as a different kind", T::KIND, id))
        })
    }

    /// List rows of one kind without descendants
    pub async fn list_headers<T: TemplatePayload>(
        &self,
        owner_filter: Option<OwnerId>,
        standalone_only: bool,
    ) -> RangeResult<Vec<T::Header>> {
        let rows = self
            .store
            .headers(T::KIND, owner_filter, standalone_only)
            .await?;
        Ok(rows.into_iter().filter_map(T::header_from_row).collect())
    }

    /// Delete the tree rooted at `header`
    ///
    /// # Returns
    /// - `true` when the tree was removed
    /// - `false` when the row is not standalone; nothing was removed
    ///
    /// # Errors
    /// - `NotFound` when the row no longer exists
    pub async fn delete<T: TemplatePayload>(&self, header: &T::Header) -> RangeResult<bool> {
        let id = T::header_id(header);
        match self.store.delete(T::KIND, id.as_uuid()).await? {
            DeleteOutcome::Deleted { .. } => Ok(true),
            DeleteOutcome::NotStandalone => {
                warn!(kind = %T::KIND, %id, "Delete refused: template is not standalone");
                Ok(false)
            }
            DeleteOutcome::NotFound => Err(RangeError::NotFound {
                kind: T::KIND,
                id: id.as_uuid(),
            }),
        }
    }

    /// Delete by id on behalf of `owner_filter`
    ///
    /// # Returns
    /// - Number of removed rows
    ///
    /// # Errors
    /// - `NotFound` when missing or owned by someone else
    /// - `Conflict` when the row is not standalone
    pub async fn delete_by_id<T: TemplatePayload>(
        &self,
        id: EntityId<T>,
        owner_filter: Option<OwnerId>,
    ) -> RangeResult<usize> {
        let not_found = || RangeError::NotFound {
            kind: T::KIND,
            id: id.as_uuid(),
        };

        let owner = self
            .store
            .owner_of(T::KIND, id.as_uuid())
            .await?
            .ok_or_else(not_found)?;
        if owner_filter.is_some_and(|filter| filter != owner) {
            return Err(not_found());
        }

        match self.store.delete(T::KIND, id.as_uuid()).await? {
            DeleteOutcome::Deleted { removed } => Ok(removed),
            DeleteOutcome::NotStandalone => Err(RangeError::Conflict(format!(
                "Cannot delete {} {id}: it belongs to a parent template",
                T::KIND
            ))),
            DeleteOutcome::NotFound => Err(not_found()),
        }
    }

    /// Whether `user` owns the row
    ///
    /// A missing row is owned by nobody.
    pub async fn is_owner<T: TemplatePayload>(
        &self,
        id: EntityId<T>,
        user: OwnerId,
    ) -> RangeResult<bool> {
        let owner = self.store.owner_of(T::KIND, id.as_uuid()).await?;
        Ok(owner == Some(user))
    }
}
