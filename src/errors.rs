//! Error types for range template operations

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::ValidationError;

/// Errors that can occur in range template operations
#[derive(Debug, Error)]
pub enum RangeError {
    /// Template rejected during construction
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Entity not found (or not visible to the requesting owner)
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: Uuid },

    /// Storage-level constraint violated; nothing was written
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Compiled topology is not deployable
    #[error("Compilation error: {0}")]
    Compilation(String),

    /// Provisioning driver failure
    #[error("Provisioning error: {0}")]
    Provisioning(#[from] ProvisioningError),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for range template operations
pub type RangeResult<T> = Result<T, RangeError>;

impl From<serde_json::Error> for RangeError {
    fn from(err: serde_json::Error) -> Self {
        RangeError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for RangeError {
    fn from(err: std::io::Error) -> Self {
        RangeError::Io(err.to_string())
    }
}

/// Errors raised while driving the external provisioning engine
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Command exited with a non-zero status
    #[error("Command `{command}` failed with exit code {code:?}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Command could not be started
    #[error("Failed to spawn `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    /// Apply succeeded but left no state file behind
    #[error("State file missing after apply: {}", .0.display())]
    MissingState(PathBuf),

    /// Workspace directory does not exist
    #[error("Workspace directory missing: {}", .0.display())]
    WorkspaceMissing(PathBuf),
}

/// The four stored entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Range,
    Vpc,
    Subnet,
    Host,
}

impl EntityKind {
    /// Storage table of the kind
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Range => "ranges",
            EntityKind::Vpc => "vpcs",
            EntityKind::Subnet => "subnets",
            EntityKind::Host => "hosts",
        }
    }

    /// Kind of the direct children, if any
    pub fn child(&self) -> Option<EntityKind> {
        match self {
            EntityKind::Range => Some(EntityKind::Vpc),
            EntityKind::Vpc => Some(EntityKind::Subnet),
            EntityKind::Subnet => Some(EntityKind::Host),
            EntityKind::Host => None,
        }
    }

    /// Kind of the parent, if any
    pub fn parent(&self) -> Option<EntityKind> {
        match self {
            EntityKind::Range => None,
            EntityKind::Vpc => Some(EntityKind::Range),
            EntityKind::Subnet => Some(EntityKind::Vpc),
            EntityKind::Host => Some(EntityKind::Subnet),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Range => "Range",
            EntityKind::Vpc => "VPC",
            EntityKind::Subnet => "Subnet",
            EntityKind::Host => "Host",
        };
        f.write_str(name)
    }
}
