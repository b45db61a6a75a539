//! Cyber range template compiler
//!
//! Validates declarative range templates (Range → VPC → Subnet → Host),
//! stores them as owned trees, and lowers them into provider resource
//! graphs that an external provisioning engine can apply.

pub mod config;
pub mod domain;
pub mod errors;
pub mod provisioning;
pub mod service;
pub mod store;
pub mod template;
pub mod topology;

// Re-export commonly used types
pub use config::RangeConfig;
pub use domain::{InstanceSpec, Ipv4Cidr, OperatingSystem, Provider, Region};
pub use errors::{EntityKind, ProvisioningError, RangeError, RangeResult};
pub use provisioning::{ProvisioningDriver, ScratchDir, StateBlob, TerraformDriver};
pub use service::{Deployment, RangeDeployer, TemplateRepository};
pub use store::{InMemoryTemplateStore, TemplateStore};
pub use template::{RangeDraft, RangeRecord, RangeTemplate, TemplateValidator};
pub use topology::{CompilerRegistry, ProviderCatalog, ResourceGraph, TopologyCompiler};
