// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Compiler
//!
//! Lowers a stored [`RangeRecord`](crate::template::RangeRecord) into a
//! provider-specific [`ResourceGraph`]. Compilation is pure: no I/O, no
//! clock, no randomness, and the same range always yields the same JSON.
//!
//! ```text
//! RangeRecord ─→ CompilerRegistry ─provider tag→ AwsCompiler   ─→ ResourceGraph
//!                                               └→ AzureCompiler ┘
//!                      ↑
//!               ProviderCatalog (regions, images, instance types)
//! ```

pub mod aws;
pub mod azure;
pub mod catalog;
pub mod compiler;
pub mod graph;
pub mod naming;

pub use aws::AwsCompiler;
pub use azure::AzureCompiler;
pub use catalog::{BastionSpec, ImageTable, InstanceTypes, ProviderCatalog, RegionTable};
pub use compiler::{CompilerRegistry, TopologyCompiler};
pub use graph::{PropertyValue, ResourceDescriptor, ResourceGraph, ResourceKind, ResourceRef};
