// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Range Templates
//!
//! Application services that tie validation, persistence, compilation and
//! provisioning together.
//!
//! # Architecture
//!
//! ```text
//! RangeDraft
//!     ↓
//! TemplateValidator → RangeTemplate
//!     ↓
//! TemplateRepository (this module) → TemplateStore
//!     ↓
//! RangeDeployer (this module) → ProvisioningDriver
//!     ↓
//! CompilerRegistry → ResourceGraph → provisioning engine
//! ```
//!
//! # Design Principles
//!
//! 1. **Transaction Boundaries**: one commit per template tree
//! 2. **Validated Input**: services only accept validated templates
//! 3. **Owner Scoping**: reads and deletes take an optional owner filter
//! 4. **Async by Default**: all I/O is asynchronous
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cim_range::service::{RangeDeployer, TemplateRepository};
//! use cim_range::store::InMemoryTemplateStore;
//!
//! let repository = TemplateRepository::new(Arc::new(InMemoryTemplateStore::new()));
//! let range_id = repository.create_standalone(&range, owner).await?;
//!
//! let deployer = RangeDeployer::new(repository, Arc::new(driver));
//! let deployment = deployer.deploy(range_id, Some(owner), Region::UsEast1).await?;
//! ```

pub mod deploy;
pub mod templates;

pub use deploy::{Deployment, RangeDeployer};
pub use templates::TemplateRepository;
