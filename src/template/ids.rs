// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed Entity Identifiers
//!
//! Every stored entity gets a UUID v7 that is independent of its content.
//! The phantom parameter keeps ids of different tree levels apart at
//! compile time: a [`VpcId`] cannot be passed where a [`SubnetId`] is
//! expected.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::model::{HostTemplate, RangeTemplate, SubnetTemplate, VpcTemplate};

/// Identifier of an entity of type `T`
pub struct EntityId<T> {
    uuid: Uuid,
    _marker: PhantomData<fn() -> T>,
}

impl<T> EntityId<T> {
    /// Generate a fresh time-ordered id
    pub fn new() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _marker: PhantomData,
        }
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.uuid
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uuid.cmp(&other.uuid)
    }
}

impl<T> Hash for EntityId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.uuid)
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.uuid, f)
    }
}

impl<T> From<Uuid> for EntityId<T> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.uuid
    }
}

impl<T> Serialize for EntityId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.uuid.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for EntityId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

/// Marker for the user owning a template tree
#[derive(Debug)]
pub enum Owner {}

/// Owning user
pub type OwnerId = EntityId<Owner>;
/// Stored Range
pub type RangeId = EntityId<RangeTemplate>;
/// Stored VPC
pub type VpcId = EntityId<VpcTemplate>;
/// Stored Subnet
pub type SubnetId = EntityId<SubnetTemplate>;
/// Stored Host
pub type HostId = EntityId<HostTemplate>;
