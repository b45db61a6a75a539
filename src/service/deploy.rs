// Copyright (c) 2025 - Cowboy AI, Inc.
//! Range Deployment
//!
//! Loads a stored range and hands it to a [`ProvisioningDriver`]:
//!
//! ```text
//! RangeId → TemplateRepository::get → driver.synthesize → driver.apply → Deployment
//! ```
//!
//! A failed apply leaves the workspace in place so the caller can inspect
//! it or tear it down.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::domain::Region;
use crate::errors::RangeResult;
use crate::provisioning::{ProvisioningDriver, StateBlob};
use crate::store::TemplateStore;
use crate::template::{OwnerId, RangeId, RangeTemplate};

use super::templates::TemplateRepository;

/// A range that was applied successfully
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub range_id: RangeId,
    pub region: Region,
    pub workspace: PathBuf,
    pub state: StateBlob,
}

/// Deploys stored ranges through a provisioning driver
pub struct RangeDeployer<S: TemplateStore, D: ProvisioningDriver> {
    repository: TemplateRepository<S>,
    driver: Arc<D>,
}

impl<S: TemplateStore, D: ProvisioningDriver> RangeDeployer<S, D> {
    pub fn new(repository: TemplateRepository<S>, driver: Arc<D>) -> Self {
        Self { repository, driver }
    }

    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Load, synthesize and apply a range
    ///
    /// # Errors
    /// - `NotFound` when the range is missing or hidden by `owner_filter`
    /// - `Provisioning` when the engine fails
    pub async fn deploy(
        &self,
        range_id: RangeId,
        owner_filter: Option<OwnerId>,
        region: Region,
    ) -> RangeResult<Deployment> {
        let range = self
            .repository
            .get::<RangeTemplate>(range_id, owner_filter)
            .await?;

        info!(range = %range.header.name, %range_id, %region, "Deploying range");
        let workspace = self.driver.synthesize(&range, region).await?;
        let state = match self.driver.apply(&workspace).await {
            Ok(state) => state,
            Err(e) => {
                error!(range = %range.header.name, %range_id, error = %e, "Range deployment failed");
                return Err(e);
            }
        };

        info!(range = %range.header.name, %range_id, workspace = %workspace.display(), "Range deployed");
        Ok(Deployment {
            range_id,
            region,
            workspace,
            state,
        })
    }

    /// Destroy a deployed range
    ///
    /// # Returns
    /// - `false` when the engine refused; the workspace is kept
    pub async fn teardown(&self, deployment: &Deployment) -> RangeResult<bool> {
        let destroyed = self.driver.destroy(&deployment.workspace).await?;
        if destroyed {
            info!(range_id = %deployment.range_id, "Range torn down");
        } else {
            error!(
                range_id = %deployment.range_id,
                workspace = %deployment.workspace.display(),
                "Range teardown failed"
            );
        }
        Ok(destroyed)
    }
}
