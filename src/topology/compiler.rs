// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compiler trait and provider registry

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{Provider, Region};
use crate::errors::{RangeError, RangeResult};
use crate::template::RangeRecord;

use super::aws::AwsCompiler;
use super::azure::AzureCompiler;
use super::catalog::ProviderCatalog;
use super::graph::ResourceGraph;

/// Lowers a stored range into a provider resource graph
///
/// `compile` is total: the tree was validated when it was stored, so every
/// range compiles. The output depends only on the inputs, and names are
/// unique per resource kind.
pub trait TopologyCompiler: Send + Sync {
    /// Provider this compiler targets
    fn provider(&self) -> Provider;

    fn compile(&self, range: &RangeRecord, region: Region) -> ResourceGraph;
}

/// Compilers keyed by provider tag
#[derive(Clone, Default)]
pub struct CompilerRegistry {
    compilers: HashMap<Provider, Arc<dyn TopologyCompiler>>,
}

impl CompilerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the AWS and Azure compilers over the given tables
    pub fn with_catalogs(aws: ProviderCatalog, azure: ProviderCatalog) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AwsCompiler::new(aws)));
        registry.register(Arc::new(AzureCompiler::new(azure)));
        registry
    }

    /// Registry with the AWS and Azure compilers over built-in tables
    pub fn builtin() -> Self {
        Self::with_catalogs(ProviderCatalog::aws(), ProviderCatalog::azure())
    }

    /// Add or replace the compiler of its provider
    pub fn register(&mut self, compiler: Arc<dyn TopologyCompiler>) {
        debug!(provider = %compiler.provider(), "Registered topology compiler");
        self.compilers.insert(compiler.provider(), compiler);
    }

    pub fn get(&self, provider: Provider) -> RangeResult<Arc<dyn TopologyCompiler>> {
        self.compilers.get(&provider).cloned().ok_or_else(|| {
            RangeError::Configuration(format!("No topology compiler registered for {provider}"))
        })
    }

    /// Compile with the compiler matching the range's provider tag
    pub fn compile(&self, range: &RangeRecord, region: Region) -> RangeResult<ResourceGraph> {
        let compiler = self.get(range.header.provider)?;
        let graph = compiler.compile(range, region);

        let duplicates = graph.duplicate_names();
        if !duplicates.is_empty() {
            return Err(RangeError::Compilation(format!(
                "Range {} yields duplicate resource names: {duplicates:?}",
                range.header.name
            )));
        }
        debug!(
            range = %range.header.name,
            provider = %graph.provider,
            region = %graph.region,
            resources = graph.len(),
            "Compiled range topology"
        );
        Ok(graph)
    }
}

impl std::fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<_> = self.compilers.keys().collect();
        providers.sort();
        f.debug_struct("CompilerRegistry")
            .field("providers", &providers)
            .finish()
    }
}
