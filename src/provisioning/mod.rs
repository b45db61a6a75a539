// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Driver
//!
//! Glue between a compiled [`ResourceGraph`](crate::topology::ResourceGraph)
//! and an external provisioning engine.
//!
//! # Lifecycle
//!
//! ```text
//! synthesize(range, region) → workspace dir (main.tf.json)
//!     ↓
//! apply(workspace)          → init + apply → StateBlob
//!     ↓
//! destroy(workspace)        → destroy → workspace removed
//! ```
//!
//! The exit code of each command is the only success signal; its output is
//! logged and otherwise ignored. Nothing is retried.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Region;
use crate::errors::RangeResult;
use crate::template::RangeRecord;

pub mod terraform;
pub mod workspace;

pub use terraform::{
    render_configuration, resource_label, terraform_type, TerraformDriver, CONFIG_FILE, STATE_FILE,
};
pub use workspace::ScratchDir;

/// State artifact left behind by a successful apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBlob {
    /// Where the state was read from
    pub path: PathBuf,
    /// Raw state document
    pub contents: String,
}

impl StateBlob {
    /// Parse the state document as JSON
    pub fn json(&self) -> RangeResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.contents)?)
    }
}

/// Drives an external provisioning engine for one range at a time
#[async_trait]
pub trait ProvisioningDriver: Send + Sync {
    /// Write the engine configuration of a range
    ///
    /// # Returns
    /// - Workspace directory holding the configuration
    async fn synthesize(&self, range: &RangeRecord, region: Region) -> RangeResult<PathBuf>;

    /// Create the infrastructure described in a workspace
    ///
    /// # Errors
    /// - `ProvisioningError::CommandFailed` on a non-zero exit
    /// - `ProvisioningError::MissingState` when apply left no state
    async fn apply(&self, workspace: &Path) -> RangeResult<StateBlob>;

    /// Tear down the infrastructure of a workspace
    ///
    /// # Returns
    /// - `true` when the engine succeeded and the workspace was removed
    /// - `false` when the engine exited non-zero
    async fn destroy(&self, workspace: &Path) -> RangeResult<bool>;
}
