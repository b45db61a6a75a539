// Copyright (c) 2025 - Cowboy AI, Inc.
//! Range Compiler
//!
//! Reads a JSON range draft, validates it, stores it and prints the compiled
//! resource graph. With `--deploy` the range is also applied with terraform.
//!
//! Run with: cargo run --bin range-compiler -- range.json [--region us_east_1] [--owner <uuid>] [--deploy]
//!
//! Environment:
//! - RANGE_STORE_PATH: JSON snapshot of the template store (in-memory when unset)
//! - RANGE_CATALOG_PATH: provider catalog overriding the built-in tables
//! - RANGE_OWNER: owner id used when `--owner` is not given
//! - RANGE_SCRATCH_DIR: root of terraform workspaces (temp dir when unset)
//! - RANGE_TERRAFORM_CMD: terraform command line (default: terraform)
//! - RANGE_RESERVED_ADDRESSES / RANGE_MAX_PREFIX_LEN: subnet capacity policy

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cim_range::{
    domain::{Provider, Region},
    service::{RangeDeployer, TemplateRepository},
    store::InMemoryTemplateStore,
    template::{OwnerId, RangeDraft, RangeTemplate, TemplateValidator},
    topology::{AwsCompiler, AzureCompiler, CompilerRegistry, ProviderCatalog, TopologyCompiler},
    RangeConfig, TerraformDriver,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Compile a cyber range draft into provider resources
#[derive(Parser, Debug)]
#[command(name = "range-compiler", version, about)]
struct Cli {
    /// JSON range draft to compile
    draft_path: PathBuf,

    /// Region the range is compiled for
    #[arg(short, long, default_value = "us_east_1", value_parser = Region::from_str)]
    region: Region,

    /// Owner of the stored template (a fresh id when unset)
    #[arg(long, env = "RANGE_OWNER", value_parser = parse_owner)]
    owner: Option<OwnerId>,

    /// Apply the compiled range with terraform
    #[arg(long)]
    deploy: bool,

    /// Template store snapshot (in-memory when unset)
    #[arg(long, env = "RANGE_STORE_PATH")]
    store: Option<PathBuf>,

    /// Provider catalog overriding the built-in tables
    #[arg(long, env = "RANGE_CATALOG_PATH")]
    catalog: Option<PathBuf>,
}

fn parse_owner(value: &str) -> Result<OwnerId, uuid::Error> {
    Uuid::parse_str(value).map(OwnerId::from_uuid)
}

impl Cli {
    /// Environment configuration with the command line paths applied on top
    fn config(&self) -> Result<RangeConfig> {
        let mut config = RangeConfig::from_env()?;
        if let Some(path) = &self.store {
            config.store_path = Some(path.clone());
        }
        if let Some(path) = &self.catalog {
            config.catalog_path = Some(path.clone());
        }
        Ok(config)
    }
}

async fn build_registry(config: &RangeConfig) -> Result<CompilerRegistry> {
    let mut registry = CompilerRegistry::builtin();
    if let Some(path) = &config.catalog_path {
        let catalog = ProviderCatalog::load(path).await?;
        let compiler: Arc<dyn TopologyCompiler> = match catalog.provider {
            Provider::Aws => Arc::new(AwsCompiler::new(catalog)),
            Provider::Azure => Arc::new(AzureCompiler::new(catalog)),
        };
        registry.register(compiler);
    }
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config()?;
    let owner = cli.owner.unwrap_or_default();
    info!(
        draft = %cli.draft_path.display(),
        region = %cli.region,
        owner = %owner,
        "🚀 Starting range compiler"
    );

    // Validate
    let raw = tokio::fs::read_to_string(&cli.draft_path)
        .await
        .with_context(|| format!("Failed to read {}", cli.draft_path.display()))?;
    let draft: RangeDraft = serde_json::from_str(&raw).context("Failed to parse range draft")?;
    let template = TemplateValidator::new(config.capacity)
        .range(&draft)
        .context("Range template is invalid")?;
    info!(range = %template.name(), hosts = template.host_count(), "✅ Range template validated");

    // Store
    let store = match &config.store_path {
        Some(path) => InMemoryTemplateStore::open(path).await?,
        None => InMemoryTemplateStore::new(),
    }
    .with_capacity_policy(config.capacity);
    let repository = TemplateRepository::new(Arc::new(store));
    let range_id = repository
        .create_standalone(&template, owner)
        .await
        .context("Failed to store range template")?;

    // Compile
    let registry = build_registry(&config).await?;
    let record = repository
        .get::<RangeTemplate>(range_id, Some(owner))
        .await?;
    let graph = registry.compile(&record, cli.region)?;
    println!("{}", graph.to_json()?);

    if !cli.deploy {
        return Ok(());
    }

    // Deploy
    if config.scratch_dir.is_none() {
        warn!("RANGE_SCRATCH_DIR not set: the terraform workspace is removed on exit");
    }
    let driver = TerraformDriver::from_config(&config, registry)?;
    let deployer = RangeDeployer::new(repository, Arc::new(driver));
    let deployment = deployer
        .deploy(range_id, Some(owner), cli.region)
        .await
        .context("Range deployment failed")?;

    info!(
        range_id = %deployment.range_id,
        workspace = %deployment.workspace.display(),
        state = %deployment.state.path.display(),
        "✅ Range deployed"
    );
    Ok(())
}
