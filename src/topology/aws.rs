// Copyright (c) 2025 - Cowboy AI, Inc.
//! AWS Lowering
//!
//! Per VPC:
//!
//! ```text
//! VPC ─┬─ public subnet (x.y.99.0/24) ── IGW, EIP + NAT, public route table
//!      │       └── jumpbox (jumpbox SG: ssh in, all out)
//!      ├─ private route table → NAT
//!      ├─ private SG: all from jumpbox SG, all from range subnets, all out
//!      └─ declared subnet* ── private route table
//!              └── host instance* (private SG)
//! ```
//!
//! Names follow [`naming`](super::naming): `<logical>--<vpc>` for derived
//! resources, `subnet-<subnet>--<vpc>` for declared subnets and
//! `host-<hostname>--<subnet>--<vpc>` for hosts, since hostnames are only
//! unique per subnet.

use tracing::trace;

use crate::domain::{public_subnet_cidr, Provider, Region};
use crate::template::{HostRecord, RangeRecord, SubnetRecord, VpcRecord};

use super::catalog::ProviderCatalog;
use super::compiler::TopologyCompiler;
use super::graph::{PropertyValue, ResourceDescriptor, ResourceGraph, ResourceKind, ResourceRef};
use super::naming;

const ANYWHERE: &str = "0.0.0.0/0";
const SSH_PORT: u32 = 22;
const ALL_PROTOCOLS: &str = "-1";

/// Name of the range-wide key pair resource
pub const KEY_PAIR_NAME: &str = "jumpbox-key-pair";

/// Compiles ranges into EC2/VPC resources
#[derive(Debug, Clone)]
pub struct AwsCompiler {
    catalog: ProviderCatalog,
}

impl AwsCompiler {
    pub fn new(catalog: ProviderCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }
}

impl Default for AwsCompiler {
    fn default() -> Self {
        Self::new(ProviderCatalog::aws())
    }
}

fn name_tags(name: &str) -> PropertyValue {
    PropertyValue::map([("Name", name)])
}

fn host_tags(name: &str, host: &HostRecord) -> PropertyValue {
    let mut tags = vec![("Name", name.to_string())];
    if !host.tags.is_empty() {
        tags.push(("Tags", host.tags.join(",")));
    }
    PropertyValue::map(tags)
}

/// Resources shared by everything inside one VPC
struct VpcScope<'a> {
    vpc: &'a VpcRecord,
    network: ResourceRef,
    private_route_table: ResourceRef,
    private_security_group: ResourceRef,
}

impl VpcScope<'_> {
    fn subnet_name(&self, role: &str, subnet: &SubnetRecord) -> String {
        naming::subnet_scoped(role, &subnet.header.name, &self.vpc.header.name)
    }

    fn host_name(&self, subnet: &SubnetRecord, host: &HostRecord) -> String {
        naming::host_scoped(
            "host",
            host.hostname.as_str(),
            &subnet.header.name,
            &self.vpc.header.name,
        )
    }
}

struct Lowering<'a> {
    catalog: &'a ProviderCatalog,
    region: Region,
    availability_zone: String,
    range_cidrs: Vec<String>,
    key_pair: Option<ResourceRef>,
    graph: ResourceGraph,
}

impl<'a> Lowering<'a> {
    fn new(catalog: &'a ProviderCatalog, range: &RangeRecord, region: Region) -> Self {
        let native_region = catalog.region(region).to_string();
        Self {
            catalog,
            region,
            availability_zone: format!("{native_region}a"),
            range_cidrs: range
                .subnets()
                .map(|subnet| subnet.header.cidr.to_string())
                .collect(),
            key_pair: None,
            graph: ResourceGraph::new(Provider::Aws, native_region),
        }
    }

    fn key_pair(&mut self, range: &RangeRecord) {
        if let Some(public_key) = &self.catalog.ssh_public_key {
            let key_name = format!("{}-jumpbox-key", naming::name_part(&range.header.name));
            self.key_pair = Some(self.graph.add(
                ResourceKind::KeyPair,
                ResourceDescriptor::new(KEY_PAIR_NAME)
                    .with("key_name", key_name)
                    .with("public_key", public_key)
                    .with("tags", name_tags(KEY_PAIR_NAME)),
            ));
        }
    }

    fn with_key(&self, descriptor: ResourceDescriptor) -> ResourceDescriptor {
        match &self.key_pair {
            Some(key_pair) => descriptor.with("key_name", key_pair.attr("key_name")),
            None => descriptor,
        }
    }

    fn vpc(&mut self, vpc: &VpcRecord) {
        let vpc_name = vpc.header.name.as_str();
        let scoped = |logical: &str| naming::derived(logical, vpc_name);

        let network = self.graph.add(
            ResourceKind::VirtualNetwork,
            ResourceDescriptor::new(naming::network(vpc_name))
                .with("cidr_block", vpc.header.cidr.to_string())
                .with("enable_dns_support", true)
                .with("enable_dns_hostnames", true)
                .with("tags", name_tags(vpc_name)),
        );

        // Public side: bastion subnet, internet and NAT gateways
        let public_subnet_name = scoped("public-subnet");
        let public_subnet = self.graph.add(
            ResourceKind::Subnet,
            ResourceDescriptor::new(&public_subnet_name)
                .with("vpc_id", network.id())
                .with("cidr_block", public_subnet_cidr(&vpc.header.cidr).to_string())
                .with("map_public_ip_on_launch", true)
                .with("availability_zone", &self.availability_zone)
                .with("tags", name_tags(&public_subnet_name)),
        );

        let igw_name = scoped("internet-gateway");
        let igw = self.graph.add(
            ResourceKind::InternetGateway,
            ResourceDescriptor::new(&igw_name)
                .with("vpc_id", network.id())
                .with("tags", name_tags(&igw_name)),
        );

        let eip_name = scoped("nat-eip");
        let eip = self.graph.add(
            ResourceKind::PublicAddress,
            ResourceDescriptor::new(&eip_name)
                .with("domain", "vpc")
                .with("tags", name_tags(&eip_name)),
        );

        let nat_name = scoped("nat-gateway");
        let nat = self.graph.add(
            ResourceKind::NatGateway,
            ResourceDescriptor::new(&nat_name)
                .with("subnet_id", public_subnet.id())
                .with("allocation_id", eip.id())
                .with("tags", name_tags(&nat_name))
                .after(&igw),
        );

        // Routing
        let public_table_name = scoped("public-route-table");
        let public_route_table = self.graph.add(
            ResourceKind::RouteTable,
            ResourceDescriptor::new(&public_table_name)
                .with("vpc_id", network.id())
                .with("tags", name_tags(&public_table_name)),
        );
        self.graph.add(
            ResourceKind::Route,
            ResourceDescriptor::new(scoped("public-internet-route"))
                .with("route_table_id", public_route_table.id())
                .with("destination_cidr_block", ANYWHERE)
                .with("gateway_id", igw.id()),
        );
        self.graph.add(
            ResourceKind::RouteTableAssociation,
            ResourceDescriptor::new(scoped("public-route-association"))
                .with("subnet_id", public_subnet.id())
                .with("route_table_id", public_route_table.id()),
        );

        let private_table_name = scoped("private-route-table");
        let private_route_table = self.graph.add(
            ResourceKind::RouteTable,
            ResourceDescriptor::new(&private_table_name)
                .with("vpc_id", network.id())
                .with("tags", name_tags(&private_table_name)),
        );
        self.graph.add(
            ResourceKind::Route,
            ResourceDescriptor::new(scoped("private-nat-route"))
                .with("route_table_id", private_route_table.id())
                .with("destination_cidr_block", ANYWHERE)
                .with("nat_gateway_id", nat.id()),
        );

        // Bastion access
        let jumpbox_sg_name = scoped("jumpbox-security-group");
        let jumpbox_sg = self.graph.add(
            ResourceKind::SecurityGroup,
            ResourceDescriptor::new(&jumpbox_sg_name)
                .with("vpc_id", network.id())
                .with("tags", name_tags(&jumpbox_sg_name)),
        );
        self.graph.add(
            ResourceKind::SecurityRule,
            ResourceDescriptor::new(scoped("jumpbox-allow-ssh"))
                .with("type", "ingress")
                .with("from_port", SSH_PORT)
                .with("to_port", SSH_PORT)
                .with("protocol", "tcp")
                .with("cidr_blocks", vec![ANYWHERE])
                .with("security_group_id", jumpbox_sg.id()),
        );
        self.graph.add(
            ResourceKind::SecurityRule,
            ResourceDescriptor::new(scoped("jumpbox-allow-outbound"))
                .with("type", "egress")
                .with("from_port", 0u32)
                .with("to_port", 0u32)
                .with("protocol", ALL_PROTOCOLS)
                .with("cidr_blocks", vec![ANYWHERE])
                .with("security_group_id", jumpbox_sg.id()),
        );

        let jumpbox_name = scoped("jumpbox");
        let jumpbox = ResourceDescriptor::new(&jumpbox_name)
            .with("ami", self.catalog.image(self.region, self.catalog.bastion.os))
            .with("instance_type", &self.catalog.bastion.instance_type)
            .with("subnet_id", public_subnet.id())
            .with("vpc_security_group_ids", vec![jumpbox_sg.id()])
            .with("associate_public_ip_address", true)
            .with("tags", name_tags(&jumpbox_name));
        let jumpbox = self.with_key(jumpbox);
        self.graph.add(ResourceKind::Instance, jumpbox);

        // Private isolation policy
        let private_sg_name = scoped("private-security-group");
        let private_sg = self.graph.add(
            ResourceKind::SecurityGroup,
            ResourceDescriptor::new(&private_sg_name)
                .with("vpc_id", network.id())
                .with("tags", name_tags(&private_sg_name)),
        );
        self.graph.add(
            ResourceKind::SecurityRule,
            ResourceDescriptor::new(scoped("private-allow-jumpbox"))
                .with("type", "ingress")
                .with("from_port", 0u32)
                .with("to_port", 0u32)
                .with("protocol", ALL_PROTOCOLS)
                .with("source_security_group_id", jumpbox_sg.id())
                .with("security_group_id", private_sg.id()),
        );
        if !self.range_cidrs.is_empty() {
            self.graph.add(
                ResourceKind::SecurityRule,
                ResourceDescriptor::new(scoped("private-allow-internal"))
                    .with("type", "ingress")
                    .with("from_port", 0u32)
                    .with("to_port", 0u32)
                    .with("protocol", ALL_PROTOCOLS)
                    .with("cidr_blocks", self.range_cidrs.clone())
                    .with("security_group_id", private_sg.id()),
            );
        }
        self.graph.add(
            ResourceKind::SecurityRule,
            ResourceDescriptor::new(scoped("private-allow-outbound"))
                .with("type", "egress")
                .with("from_port", 0u32)
                .with("to_port", 0u32)
                .with("protocol", ALL_PROTOCOLS)
                .with("cidr_blocks", vec![ANYWHERE])
                .with("security_group_id", private_sg.id()),
        );

        let scope = VpcScope {
            vpc,
            network,
            private_route_table,
            private_security_group: private_sg,
        };
        for subnet in &vpc.subnets {
            self.subnet(&scope, subnet);
        }
    }

    fn subnet(&mut self, scope: &VpcScope<'_>, subnet: &SubnetRecord) {
        let subnet_name = scope.subnet_name("subnet", subnet);
        let declared = self.graph.add(
            ResourceKind::Subnet,
            ResourceDescriptor::new(&subnet_name)
                .with("vpc_id", scope.network.id())
                .with("cidr_block", subnet.header.cidr.to_string())
                .with("availability_zone", &self.availability_zone)
                .with("tags", name_tags(&subnet_name)),
        );
        self.graph.add(
            ResourceKind::RouteTableAssociation,
            ResourceDescriptor::new(scope.subnet_name("route-association", subnet))
                .with("subnet_id", declared.id())
                .with("route_table_id", scope.private_route_table.id()),
        );

        for host in &subnet.hosts {
            let name = scope.host_name(subnet, host);
            trace!(%name, os = %host.os, spec = %host.spec, "Lowering host");

            let instance = ResourceDescriptor::new(&name)
                .with("ami", self.catalog.image(self.region, host.os))
                .with("instance_type", self.catalog.instance_type(host.spec))
                .with("subnet_id", declared.id())
                .with("vpc_security_group_ids", vec![scope.private_security_group.id()])
                .with(
                    "root_block_device",
                    PropertyValue::map([("volume_size", host.size_gb)]),
                )
                .with("tags", host_tags(&name, host));
            let instance = self.with_key(instance);
            self.graph.add(ResourceKind::Instance, instance);
        }
    }
}

impl TopologyCompiler for AwsCompiler {
    fn provider(&self) -> Provider {
        Provider::Aws
    }

    fn compile(&self, range: &RangeRecord, region: Region) -> ResourceGraph {
        let mut lowering = Lowering::new(&self.catalog, range, region);
        lowering.key_pair(range);
        for vpc in &range.vpcs {
            lowering.vpc(vpc);
        }
        lowering.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{OwnerId, RangeDraft, TemplateValidator};
    use pretty_assertions::assert_eq;

    fn compile(json: serde_json::Value, catalog: ProviderCatalog) -> ResourceGraph {
        let draft: RangeDraft = serde_json::from_value(json).unwrap();
        let template = TemplateValidator::default().range(&draft).unwrap();
        let record = RangeRecord::materialize(&template, OwnerId::new());
        AwsCompiler::new(catalog).compile(&record, Region::UsEast1)
    }

    fn two_vpcs() -> serde_json::Value {
        serde_json::json!({
            "name": "lab",
            "provider": "aws",
            "vpcs": [
                {"name": "corp", "cidr": "10.0.0.0/16", "subnets": [
                    {"name": "users", "cidr": "10.0.1.0/24", "hosts": [
                        {"hostname": "ws-01", "os": "windows_2019", "spec": "medium", "size": 64, "tags": ["win", "user"]}
                    ]}
                ]},
                {"name": "dmz", "cidr": "10.1.0.0/16", "subnets": [
                    {"name": "users", "cidr": "10.1.1.0/24", "hosts": [
                        {"hostname": "ws-01", "os": "ubuntu_22", "spec": "tiny", "size": 10}
                    ]}
                ]}
            ]
        })
    }

    #[test]
    fn test_names_are_scoped_by_vpc() {
        let graph = compile(two_vpcs(), ProviderCatalog::aws());

        assert!(graph.duplicate_names().is_empty());
        assert!(graph.get(ResourceKind::Instance, "host-ws-01--users--corp").is_some());
        assert!(graph.get(ResourceKind::Instance, "host-ws-01--users--dmz").is_some());
        assert!(graph.get(ResourceKind::Instance, "jumpbox--dmz").is_some());
        assert!(graph.get(ResourceKind::Subnet, "public-subnet--corp").is_some());
        assert!(graph.dangling_references().is_empty());
    }

    #[test]
    fn test_public_subnet_and_zone() {
        let graph = compile(two_vpcs(), ProviderCatalog::aws());
        let public = graph.get(ResourceKind::Subnet, "public-subnet--dmz").unwrap();

        assert_eq!(
            public.property("cidr_block").and_then(PropertyValue::as_str),
            Some("10.1.99.0/24")
        );
        assert_eq!(
            public.property("availability_zone").and_then(PropertyValue::as_str),
            Some("us-east-1a")
        );
        assert_eq!(
            public.property("map_public_ip_on_launch").and_then(PropertyValue::as_bool),
            Some(true)
        );
    }

    #[test]
    fn test_internal_rule_covers_whole_range() {
        let graph = compile(two_vpcs(), ProviderCatalog::aws());
        let rule = graph
            .get(ResourceKind::SecurityRule, "private-allow-internal--corp")
            .unwrap();

        assert_eq!(
            rule.property("cidr_blocks"),
            Some(&PropertyValue::from(vec!["10.0.1.0/24", "10.1.1.0/24"]))
        );
    }

    #[test]
    fn test_host_lookup_and_disk() {
        let graph = compile(two_vpcs(), ProviderCatalog::aws());
        let host = graph.get(ResourceKind::Instance, "host-ws-01--users--corp").unwrap();

        assert_eq!(
            host.property("ami").and_then(PropertyValue::as_str),
            Some("ami-049dd04cca2dc5594")
        );
        assert_eq!(
            host.property("instance_type").and_then(PropertyValue::as_str),
            Some("t2.medium")
        );
        assert_eq!(
            host.property("root_block_device"),
            Some(&PropertyValue::map([("volume_size", 64u32)]))
        );
        assert_eq!(
            host.property("tags"),
            Some(&PropertyValue::map([("Name", "host-ws-01--users--corp"), ("Tags", "win,user")]))
        );
        assert!(host.property("key_name").is_none());
    }

    #[test]
    fn test_key_pair_is_range_singleton() {
        let graph = compile(
            two_vpcs(),
            ProviderCatalog::aws().with_ssh_public_key("ssh-ed25519 AAAA test"),
        );

        assert_eq!(graph.count(ResourceKind::KeyPair), 1);
        let key = ResourceRef::new(ResourceKind::KeyPair, KEY_PAIR_NAME);
        for instance in graph.of_kind(ResourceKind::Instance) {
            assert_eq!(instance.property("key_name"), Some(&key.attr("key_name")));
            assert!(instance.depends_on.contains(&key));
        }
    }

    #[test]
    fn test_nat_waits_for_internet_gateway() {
        let graph = compile(two_vpcs(), ProviderCatalog::aws());
        let nat = graph.get(ResourceKind::NatGateway, "nat-gateway--corp").unwrap();

        assert!(nat
            .depends_on
            .contains(&ResourceRef::new(ResourceKind::InternetGateway, "internet-gateway--corp")));
        assert!(nat
            .depends_on
            .contains(&ResourceRef::new(ResourceKind::PublicAddress, "nat-eip--corp")));
    }

    #[test]
    fn test_subnet_named_like_derived_resources() {
        let graph = compile(
            serde_json::json!({
                "name": "lab",
                "provider": "aws",
                "vpcs": [{"name": "corp", "cidr": "10.0.0.0/16", "subnets": [
                    {"name": "public", "cidr": "10.0.1.0/24"},
                    {"name": "public-subnet", "cidr": "10.0.2.0/24"}
                ]}]
            }),
            ProviderCatalog::aws(),
        );

        assert!(graph.duplicate_names().is_empty());
        assert_eq!(graph.count(ResourceKind::Subnet), 3);
        assert_eq!(graph.count(ResourceKind::RouteTableAssociation), 3);
        assert!(graph
            .get(ResourceKind::RouteTableAssociation, "public-route-association--corp")
            .is_some());
        assert!(graph
            .get(ResourceKind::RouteTableAssociation, "route-association-public--corp")
            .is_some());
        assert!(graph.get(ResourceKind::Subnet, "subnet-public-subnet--corp").is_some());
    }

    #[test]
    fn test_hyphenated_host_and_subnet_names() {
        let graph = compile(
            serde_json::json!({
                "name": "lab",
                "provider": "aws",
                "vpcs": [{"name": "corp", "cidr": "10.0.0.0/16", "subnets": [
                    {"name": "b", "cidr": "10.0.1.0/24", "hosts": [
                        {"hostname": "a-b", "os": "debian_12", "spec": "tiny", "size": 8}
                    ]},
                    {"name": "b-b", "cidr": "10.0.2.0/24", "hosts": [
                        {"hostname": "a", "os": "debian_12", "spec": "tiny", "size": 8}
                    ]}
                ]}]
            }),
            ProviderCatalog::aws(),
        );

        assert!(graph.duplicate_names().is_empty());
        assert_eq!(graph.count(ResourceKind::Instance), 3);
        assert!(graph.get(ResourceKind::Instance, "host-a-b--b--corp").is_some());
        assert!(graph.get(ResourceKind::Instance, "host-a--b-b--corp").is_some());
    }
}
