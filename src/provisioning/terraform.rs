// Copyright (c) 2025 - Cowboy AI, Inc.
//! Terraform Driver
//!
//! Renders a resource graph as Terraform JSON configuration and runs the
//! terraform CLI against it.
//!
//! # Workspace Layout
//!
//! ```text
//! <scratch>/stacks/<range-name>-<range-id>/
//!     main.tf.json        provider block, local backend, resources
//!     terraform.tfstate   written by `apply`
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::process::Command;
use tracing::{debug, info, trace, warn};

use crate::config::RangeConfig;
use crate::domain::{Provider, Region};
use crate::errors::{ProvisioningError, RangeError, RangeResult};
use crate::template::RangeRecord;
use crate::topology::{CompilerRegistry, PropertyValue, ResourceGraph, ResourceKind};

use super::workspace::ScratchDir;
use super::{ProvisioningDriver, StateBlob};

/// Configuration file written into every workspace
pub const CONFIG_FILE: &str = "main.tf.json";
/// State file of the local backend
pub const STATE_FILE: &str = "terraform.tfstate";

/// Terraform resource type of a graph resource kind
pub fn terraform_type(provider: Provider, kind: ResourceKind) -> Option<&'static str> {
    use ResourceKind::*;

    let name = match (provider, kind) {
        (Provider::Aws, KeyPair) => "aws_key_pair",
        (Provider::Aws, VirtualNetwork) => "aws_vpc",
        (Provider::Aws, Subnet) => "aws_subnet",
        (Provider::Aws, InternetGateway) => "aws_internet_gateway",
        (Provider::Aws, PublicAddress) => "aws_eip",
        (Provider::Aws, NatGateway) => "aws_nat_gateway",
        (Provider::Aws, RouteTable) => "aws_route_table",
        (Provider::Aws, Route) => "aws_route",
        (Provider::Aws, RouteTableAssociation) => "aws_route_table_association",
        (Provider::Aws, SecurityGroup) => "aws_security_group",
        (Provider::Aws, SecurityRule) => "aws_security_group_rule",
        (Provider::Aws, Instance | WindowsInstance) => "aws_instance",

        (Provider::Azure, ResourceGroup) => "azurerm_resource_group",
        (Provider::Azure, VirtualNetwork) => "azurerm_virtual_network",
        (Provider::Azure, Subnet) => "azurerm_subnet",
        (Provider::Azure, PublicAddress) => "azurerm_public_ip",
        (Provider::Azure, NatGateway) => "azurerm_nat_gateway",
        (Provider::Azure, NatGatewayAddressAssociation) => {
            "azurerm_nat_gateway_public_ip_association"
        }
        (Provider::Azure, SubnetNatAssociation) => "azurerm_subnet_nat_gateway_association",
        (Provider::Azure, SecurityGroup) => "azurerm_network_security_group",
        (Provider::Azure, SubnetSecurityAssociation) => {
            "azurerm_subnet_network_security_group_association"
        }
        (Provider::Azure, NetworkInterface) => "azurerm_network_interface",
        (Provider::Azure, Instance) => "azurerm_linux_virtual_machine",
        (Provider::Azure, WindowsInstance) => "azurerm_windows_virtual_machine",

        (_, GeneratedKey) => "tls_private_key",
        (_, GeneratedPassword) => "random_password",

        _ => return None,
    };
    Some(name)
}

/// Terraform-safe resource label
///
/// Labels may hold letters, digits, `_` and `-` and must not start with a
/// digit or dash. Compiled names are already valid labels and pass through
/// unchanged.
pub fn resource_label(name: &str) -> String {
    let mut label: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !label.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        label.insert(0, '_');
    }
    label
}

fn type_of(provider: Provider, kind: ResourceKind) -> RangeResult<&'static str> {
    terraform_type(provider, kind).ok_or_else(|| {
        RangeError::Configuration(format!("No terraform resource type for {kind:?} on {provider}"))
    })
}

fn render_value(provider: Provider, value: &PropertyValue) -> RangeResult<Value> {
    Ok(match value {
        PropertyValue::Ref { target, attribute } => Value::String(format!(
            "${{{}.{}.{attribute}}}",
            type_of(provider, target.kind)?,
            resource_label(&target.name)
        )),
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::Int(i) => Value::from(*i),
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| render_value(provider, item))
                .collect::<RangeResult<_>>()?,
        ),
        PropertyValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), render_value(provider, v)?)))
                .collect::<RangeResult<_>>()?,
        ),
    })
}

/// Terraform JSON configuration of a graph
pub fn render_configuration(graph: &ResourceGraph) -> RangeResult<Value> {
    let provider = graph.provider;
    let mut resources: BTreeMap<&'static str, Map<String, Value>> = BTreeMap::new();

    for (kind, descriptor) in graph.iter() {
        let mut body = Map::new();
        for (key, value) in &descriptor.properties {
            body.insert(key.clone(), render_value(provider, value)?);
        }
        if !descriptor.depends_on.is_empty() {
            let depends_on = descriptor
                .depends_on
                .iter()
                .map(|target| {
                    Ok(Value::String(format!(
                        "{}.{}",
                        type_of(provider, target.kind)?,
                        resource_label(&target.name)
                    )))
                })
                .collect::<RangeResult<Vec<_>>>()?;
            body.insert("depends_on".to_string(), Value::Array(depends_on));
        }

        let resource_type = type_of(provider, kind)?;
        let label = resource_label(&descriptor.name);
        if resources
            .entry(resource_type)
            .or_default()
            .insert(label.clone(), Value::Object(body))
            .is_some()
        {
            return Err(RangeError::Compilation(format!(
                "Duplicate terraform resource {resource_type}.{label}"
            )));
        }
    }

    let (provider_key, provider_block, source) = match provider {
        Provider::Aws => ("aws", json!({"region": graph.region}), "hashicorp/aws"),
        Provider::Azure => ("azurerm", json!({"features": {}}), "hashicorp/azurerm"),
    };
    let mut required_providers = Map::new();
    required_providers.insert(provider_key.to_string(), json!({"source": source}));
    if graph.count(ResourceKind::GeneratedKey) > 0 {
        required_providers.insert("tls".to_string(), json!({"source": "hashicorp/tls"}));
    }
    if graph.count(ResourceKind::GeneratedPassword) > 0 {
        required_providers.insert("random".to_string(), json!({"source": "hashicorp/random"}));
    }

    Ok(json!({
        "terraform": {
            "required_providers": required_providers,
            "backend": {"local": {"path": STATE_FILE}},
        },
        "provider": {provider_key: provider_block},
        "resource": resources,
    }))
}

/// Runs the terraform CLI in per-range workspaces
#[derive(Debug)]
pub struct TerraformDriver {
    registry: CompilerRegistry,
    scratch: ScratchDir,
    command: Vec<String>,
}

impl TerraformDriver {
    pub fn new(registry: CompilerRegistry, scratch: ScratchDir, command: Vec<String>) -> Self {
        Self {
            registry,
            scratch,
            command,
        }
    }

    /// Driver over the configured scratch dir and command line
    pub fn from_config(config: &RangeConfig, registry: CompilerRegistry) -> RangeResult<Self> {
        let scratch = ScratchDir::from_config(config)?;
        Ok(Self::new(registry, scratch, config.terraform_command.clone()))
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Workspace of a range: `<scratch>/stacks/<range-name>-<range-id>`
    pub fn workspace_for(&self, range: &RangeRecord) -> PathBuf {
        self.scratch.stacks_dir().join(resource_label(&format!(
            "{}-{}",
            range.header.name, range.header.id
        )))
    }

    /// Release the scratch directory
    pub fn close(self) -> RangeResult<()> {
        self.scratch.close()
    }

    async fn run(&self, workspace: &Path, args: &[&str]) -> RangeResult<()> {
        let (program, leading) = self.command.split_first().ok_or_else(|| {
            RangeError::Configuration("Provisioning command is empty".to_string())
        })?;
        let command_line = self
            .command
            .iter()
            .map(String::as_str)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");

        debug!(command = %command_line, workspace = %workspace.display(), "Running provisioning command");
        let output = Command::new(program)
            .args(leading)
            .args(args)
            .current_dir(workspace)
            .output()
            .await
            .map_err(|e| ProvisioningError::Spawn {
                command: command_line.clone(),
                reason: e.to_string(),
            })?;

        trace!(
            stdout = %String::from_utf8_lossy(&output.stdout),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "Provisioning command output"
        );

        if !output.status.success() {
            warn!(
                command = %command_line,
                code = ?output.status.code(),
                "Provisioning command failed"
            );
            return Err(ProvisioningError::CommandFailed {
                command: command_line,
                code: output.status.code(),
            }
            .into());
        }
        Ok(())
    }

    async fn require_workspace(workspace: &Path) -> RangeResult<()> {
        if tokio::fs::metadata(workspace).await.is_err() {
            return Err(ProvisioningError::WorkspaceMissing(workspace.to_path_buf()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl ProvisioningDriver for TerraformDriver {
    async fn synthesize(&self, range: &RangeRecord, region: Region) -> RangeResult<PathBuf> {
        let graph = self.registry.compile(range, region)?;
        let configuration = render_configuration(&graph)?;

        let workspace = self.workspace_for(range);
        tokio::fs::create_dir_all(&workspace).await?;
        let path = workspace.join(CONFIG_FILE);
        tokio::fs::write(&path, serde_json::to_vec_pretty(&configuration)?).await?;

        info!(
            range = %range.header.name,
            resources = graph.len(),
            workspace = %workspace.display(),
            "Synthesized range configuration"
        );
        Ok(workspace)
    }

    async fn apply(&self, workspace: &Path) -> RangeResult<StateBlob> {
        Self::require_workspace(workspace).await?;
        self.run(workspace, &["init"]).await?;
        self.run(workspace, &["apply", "--auto-approve"]).await?;

        let path = workspace.join(STATE_FILE);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(_) => return Err(ProvisioningError::MissingState(path).into()),
        };

        info!(workspace = %workspace.display(), "Applied range configuration");
        Ok(StateBlob { path, contents })
    }

    async fn destroy(&self, workspace: &Path) -> RangeResult<bool> {
        Self::require_workspace(workspace).await?;
        match self.run(workspace, &["destroy", "--auto-approve"]).await {
            Ok(()) => {}
            Err(RangeError::Provisioning(ProvisioningError::CommandFailed { .. })) => {
                return Ok(false)
            }
            Err(e) => return Err(e),
        }

        tokio::fs::remove_dir_all(workspace).await?;
        info!(workspace = %workspace.display(), "Destroyed range infrastructure");
        Ok(true)
    }
}
