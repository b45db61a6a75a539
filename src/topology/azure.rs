// Copyright (c) 2025 - Cowboy AI, Inc.
//! Azure Lowering
//!
//! One resource group per range. Each VPC becomes a virtual network with a
//! public subnet holding the bastion; declared subnets egress through a NAT
//! gateway and are guarded by a private network security group. Security
//! rules are inline on the groups, as Azure models them.
//!
//! Every machine gets a login: Linux machines use the catalog SSH key, or a
//! key generated at apply time when the catalog has none. Windows machines
//! use the configured admin password, or a generated one.

use tracing::trace;

use crate::domain::{public_subnet_cidr, OperatingSystem, Provider, Region};
use crate::template::{HostRecord, RangeRecord, SubnetRecord, VpcRecord};

use super::catalog::ProviderCatalog;
use super::compiler::TopologyCompiler;
use super::graph::{PropertyValue, ResourceDescriptor, ResourceGraph, ResourceKind, ResourceRef};
use super::naming;

/// Longest Windows computer name
const WINDOWS_COMPUTER_NAME_MAX: usize = 15;

/// Name of the range-wide generated SSH key
pub const GENERATED_KEY_NAME: &str = "admin-ssh-key";
/// Name of the range-wide generated Windows password
pub const GENERATED_PASSWORD_NAME: &str = "admin-password";

const GENERATED_PASSWORD_LENGTH: u32 = 24;

/// Compiles ranges into azurerm resources
#[derive(Debug, Clone)]
pub struct AzureCompiler {
    catalog: ProviderCatalog,
    admin_password: Option<String>,
}

impl AzureCompiler {
    pub fn new(catalog: ProviderCatalog) -> Self {
        Self {
            catalog,
            admin_password: None,
        }
    }

    /// Password of the admin user on Windows machines
    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = Some(password.into());
        self
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }
}

impl Default for AzureCompiler {
    fn default() -> Self {
        Self::new(ProviderCatalog::azure())
    }
}

/// `Publisher:Offer:Sku:Version` as a source image reference
fn image_reference(urn: &str) -> (&'static str, PropertyValue) {
    match urn.split(':').collect::<Vec<_>>().as_slice() {
        [publisher, offer, sku, version] => (
            "source_image_reference",
            PropertyValue::map([
                ("publisher", *publisher),
                ("offer", *offer),
                ("sku", *sku),
                ("version", *version),
            ]),
        ),
        _ => ("source_image_id", PropertyValue::from(urn)),
    }
}

fn computer_name(host: &HostRecord) -> String {
    let name = host.hostname.short_name();
    if host.os.is_windows() {
        name.chars().take(WINDOWS_COMPUTER_NAME_MAX).collect()
    } else {
        name.to_string()
    }
}

fn machine_kind(os: OperatingSystem) -> ResourceKind {
    if os.is_windows() {
        ResourceKind::WindowsInstance
    } else {
        ResourceKind::Instance
    }
}

fn inbound_rule(name: &str, priority: u32) -> Vec<(&'static str, PropertyValue)> {
    vec![
        ("name", name.into()),
        ("priority", priority.into()),
        ("direction", "Inbound".into()),
        ("access", "Allow".into()),
        ("source_port_range", "*".into()),
        ("destination_address_prefix", "*".into()),
    ]
}

struct Lowering<'a> {
    compiler: &'a AzureCompiler,
    region: Region,
    location: String,
    range_cidrs: Vec<String>,
    resource_group: ResourceRef,
    generated_key: Option<ResourceRef>,
    generated_password: Option<ResourceRef>,
    graph: ResourceGraph,
}

impl<'a> Lowering<'a> {
    fn new(compiler: &'a AzureCompiler, range: &RangeRecord, region: Region) -> Self {
        let location = compiler.catalog.region(region).to_string();
        let mut graph = ResourceGraph::new(Provider::Azure, location.clone());

        let group_name = naming::derived("resource-group", &range.header.name);
        let resource_group = graph.add(
            ResourceKind::ResourceGroup,
            ResourceDescriptor::new(&group_name)
                .with("name", &group_name)
                .with("location", &location),
        );

        Self {
            compiler,
            region,
            location,
            range_cidrs: range
                .subnets()
                .map(|subnet| subnet.header.cidr.to_string())
                .collect(),
            resource_group,
            generated_key: None,
            generated_password: None,
            graph,
        }
    }

    fn catalog(&self) -> &'a ProviderCatalog {
        &self.compiler.catalog
    }

    /// Descriptor placed in the range's resource group
    fn placed(&self, name: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(name)
            .with("name", name)
            .with("location", &self.location)
            .with("resource_group_name", self.resource_group.attr("name"))
    }

    fn vpc(&mut self, vpc: &VpcRecord) {
        let vpc_name = vpc.header.name.as_str();
        let scoped = |logical: &str| naming::derived(logical, vpc_name);

        let network = self.graph.add(
            ResourceKind::VirtualNetwork,
            self.placed(&naming::network(vpc_name))
                .with("address_space", vec![vpc.header.cidr.to_string()]),
        );

        let public_cidr = public_subnet_cidr(&vpc.header.cidr).to_string();
        let public_subnet_name = scoped("public-subnet");
        let public_subnet = self.graph.add(
            ResourceKind::Subnet,
            ResourceDescriptor::new(&public_subnet_name)
                .with("name", &public_subnet_name)
                .with("resource_group_name", self.resource_group.attr("name"))
                .with("virtual_network_name", network.attr("name"))
                .with("address_prefixes", vec![public_cidr.clone()]),
        );

        // NAT egress for declared subnets
        let nat_ip = self.graph.add(
            ResourceKind::PublicAddress,
            self.placed(&scoped("nat-public-ip"))
                .with("allocation_method", "Static")
                .with("sku", "Standard"),
        );
        let nat = self.graph.add(
            ResourceKind::NatGateway,
            self.placed(&scoped("nat-gateway")).with("sku_name", "Standard"),
        );
        self.graph.add(
            ResourceKind::NatGatewayAddressAssociation,
            ResourceDescriptor::new(scoped("nat-public-ip-association"))
                .with("nat_gateway_id", nat.id())
                .with("public_ip_address_id", nat_ip.id()),
        );

        // Bastion access
        let mut ssh = inbound_rule("allow-ssh", 100);
        ssh.push(("protocol", "Tcp".into()));
        ssh.push(("source_address_prefix", "*".into()));
        ssh.push(("destination_port_range", "22".into()));
        let jumpbox_nsg = self.graph.add(
            ResourceKind::SecurityGroup,
            self.placed(&scoped("jumpbox-security-group"))
                .with("security_rule", vec![PropertyValue::map(ssh)]),
        );
        self.graph.add(
            ResourceKind::SubnetSecurityAssociation,
            ResourceDescriptor::new(scoped("public-security-association"))
                .with("subnet_id", public_subnet.id())
                .with("network_security_group_id", jumpbox_nsg.id()),
        );
        self.jumpbox(vpc_name, &public_subnet);

        // Private isolation policy
        let mut rules = Vec::new();
        let mut from_jumpbox = inbound_rule("allow-jumpbox", 100);
        from_jumpbox.push(("protocol", "*".into()));
        from_jumpbox.push(("source_address_prefix", public_cidr.into()));
        from_jumpbox.push(("destination_port_range", "*".into()));
        rules.push(PropertyValue::map(from_jumpbox));
        if !self.range_cidrs.is_empty() {
            let mut internal = inbound_rule("allow-internal", 110);
            internal.push(("protocol", "*".into()));
            internal.push(("source_address_prefixes", self.range_cidrs.clone().into()));
            internal.push(("destination_port_range", "*".into()));
            rules.push(PropertyValue::map(internal));
        }
        let private_nsg = self.graph.add(
            ResourceKind::SecurityGroup,
            self.placed(&scoped("private-security-group"))
                .with("security_rule", rules),
        );

        for subnet in &vpc.subnets {
            self.subnet(vpc, &network, &nat, &private_nsg, subnet);
        }
    }

    fn jumpbox(&mut self, vpc_name: &str, public_subnet: &ResourceRef) {
        let name = naming::derived("jumpbox", vpc_name);
        let public_ip = self.graph.add(
            ResourceKind::PublicAddress,
            self.placed(&naming::derived("jumpbox-public-ip", vpc_name))
                .with("allocation_method", "Static")
                .with("sku", "Standard"),
        );
        let nic = self.graph.add(
            ResourceKind::NetworkInterface,
            self.placed(&naming::derived("jumpbox-nic", vpc_name)).with(
                "ip_configuration",
                PropertyValue::map([
                    ("name", PropertyValue::from("internal")),
                    ("subnet_id", public_subnet.id()),
                    ("private_ip_address_allocation", "Dynamic".into()),
                    ("public_ip_address_id", public_ip.id()),
                ]),
            ),
        );

        let bastion = &self.catalog().bastion;
        let descriptor = self.machine(&name, bastion.os, &bastion.instance_type, &nic, None);
        let descriptor = descriptor.with("computer_name", "jumpbox");
        self.graph.add(machine_kind(bastion.os), descriptor);
    }

    fn subnet(
        &mut self,
        vpc: &VpcRecord,
        network: &ResourceRef,
        nat: &ResourceRef,
        private_nsg: &ResourceRef,
        subnet: &SubnetRecord,
    ) {
        let vpc_name = vpc.header.name.as_str();
        let subnet_name = naming::subnet_scoped("subnet", &subnet.header.name, vpc_name);
        let declared = self.graph.add(
            ResourceKind::Subnet,
            ResourceDescriptor::new(&subnet_name)
                .with("name", &subnet_name)
                .with("resource_group_name", self.resource_group.attr("name"))
                .with("virtual_network_name", network.attr("name"))
                .with("address_prefixes", vec![subnet.header.cidr.to_string()]),
        );
        self.graph.add(
            ResourceKind::SubnetNatAssociation,
            ResourceDescriptor::new(naming::subnet_scoped(
                "nat-association",
                &subnet.header.name,
                vpc_name,
            ))
                .with("subnet_id", declared.id())
                .with("nat_gateway_id", nat.id()),
        );
        self.graph.add(
            ResourceKind::SubnetSecurityAssociation,
            ResourceDescriptor::new(naming::subnet_scoped(
                "security-association",
                &subnet.header.name,
                vpc_name,
            ))
            .with("subnet_id", declared.id())
            .with("network_security_group_id", private_nsg.id()),
        );

        for host in &subnet.hosts {
            let hostname = host.hostname.as_str();
            let name = naming::host_scoped("host", hostname, &subnet.header.name, vpc_name);
            trace!(%name, os = %host.os, spec = %host.spec, "Lowering host");

            let nic = self.graph.add(
                ResourceKind::NetworkInterface,
                self.placed(&naming::host_scoped("nic", hostname, &subnet.header.name, vpc_name))
                    .with(
                        "ip_configuration",
                        PropertyValue::map([
                            ("name", PropertyValue::from("internal")),
                            ("subnet_id", declared.id()),
                            ("private_ip_address_allocation", "Dynamic".into()),
                        ]),
                    ),
            );

            let size = self.catalog().instance_type(host.spec);
            let descriptor = self
                .machine(&name, host.os, size, &nic, Some(host.size_gb))
                .with("computer_name", computer_name(host));
            let descriptor = if host.tags.is_empty() {
                descriptor
            } else {
                descriptor.with("tags", PropertyValue::map([("Tags", host.tags.join(","))]))
            };

            self.graph.add(machine_kind(host.os), descriptor);
        }
    }

    /// Public key of the generated key pair, created on first use
    fn generated_public_key(&mut self) -> PropertyValue {
        let graph = &mut self.graph;
        let key = self.generated_key.get_or_insert_with(|| {
            graph.add(
                ResourceKind::GeneratedKey,
                ResourceDescriptor::new(GENERATED_KEY_NAME)
                    .with("algorithm", "RSA")
                    .with("rsa_bits", 4096u32),
            )
        });
        key.attr("public_key_openssh")
    }

    /// Value of the generated password, created on first use
    fn generated_password(&mut self) -> PropertyValue {
        let graph = &mut self.graph;
        let password = self.generated_password.get_or_insert_with(|| {
            graph.add(
                ResourceKind::GeneratedPassword,
                ResourceDescriptor::new(GENERATED_PASSWORD_NAME)
                    .with("length", GENERATED_PASSWORD_LENGTH)
                    .with("special", true)
                    .with("min_lower", 1u32)
                    .with("min_upper", 1u32)
                    .with("min_numeric", 1u32),
            )
        });
        password.attr("result")
    }

    /// Virtual machine attached to one NIC
    fn machine(
        &mut self,
        name: &str,
        os: OperatingSystem,
        size: &str,
        nic: &ResourceRef,
        disk_size_gb: Option<u32>,
    ) -> ResourceDescriptor {
        let catalog = self.catalog();
        let username = catalog.bastion.admin_username.as_str();

        let mut os_disk = vec![
            ("caching", PropertyValue::from("ReadWrite")),
            ("storage_account_type", "Standard_LRS".into()),
        ];
        if let Some(size_gb) = disk_size_gb {
            os_disk.push(("disk_size_gb", size_gb.into()));
        }

        let (image_key, image) = image_reference(catalog.image(self.region, os));
        let descriptor = self
            .placed(name)
            .with("size", size)
            .with("admin_username", username)
            .with("network_interface_ids", vec![nic.id()])
            .with("os_disk", PropertyValue::map(os_disk))
            .with(image_key, image);

        let compiler = self.compiler;
        if os.is_windows() {
            let password = match &compiler.admin_password {
                Some(password) => PropertyValue::from(password),
                None => self.generated_password(),
            };
            return descriptor.with("admin_password", password);
        }

        let public_key = match &catalog.ssh_public_key {
            Some(key) => PropertyValue::from(key),
            None => self.generated_public_key(),
        };
        descriptor
            .with("disable_password_authentication", true)
            .with(
                "admin_ssh_key",
                PropertyValue::map([
                    ("username", PropertyValue::from(username)),
                    ("public_key", public_key),
                ]),
            )
    }
}

impl TopologyCompiler for AzureCompiler {
    fn provider(&self) -> Provider {
        Provider::Azure
    }

    fn compile(&self, range: &RangeRecord, region: Region) -> ResourceGraph {
        let mut lowering = Lowering::new(self, range, region);
        for vpc in &range.vpcs {
            lowering.vpc(vpc);
        }
        lowering.graph
    }
}
