// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Topology Compiler
//!
//! Arbitrary valid ranges, names with hyphens, spaces and the compilers'
//! own logical words included, must compile deterministically into closed
//! graphs with one uniquely named resource per rendered terraform entry.

use cim_range::domain::{InstanceSpec, OperatingSystem, Provider, Region};
use cim_range::provisioning::render_configuration;
use cim_range::template::{
    HostDraft, OwnerId, RangeDraft, RangeRecord, SubnetDraft, TemplateValidator, VpcDraft,
};
use cim_range::topology::{CompilerRegistry, ResourceKind};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Names the compilers also use for derived resources
const RESERVED: &[&str] = &[
    "public",
    "private",
    "jumpbox",
    "public-subnet",
    "route-association",
    "nat-gateway",
    "subnet",
    "host",
];

/// RFC 1035 label, hyphens included
fn arb_hostname() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(RESERVED).prop_map(str::to_string),
        "[a-zA-Z]([a-zA-Z0-9-]{0,8}[a-zA-Z0-9])?",
    ]
}

/// Free-form subnet or VPC name
fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(RESERVED).prop_map(str::to_string),
        "[a-z0-9][a-z0-9 _-]{0,8}",
        "[a-z]{1,3}(-[a-z]{1,3}){1,2}",
    ]
}

/// Distinct names, first occurrence kept
fn distinct<T>(items: Vec<T>, key: impl Fn(&T) -> String) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

fn arb_host() -> impl Strategy<Value = HostDraft> {
    (
        arb_hostname(),
        prop::sample::select(OperatingSystem::ALL),
        prop::sample::select(InstanceSpec::ALL),
        0u32..64,
    )
        .prop_map(|(hostname, os, spec, extra)| HostDraft {
            hostname,
            os,
            spec,
            size: os.min_disk_size_gb() + extra,
            tags: vec![],
        })
}

/// Hosts with distinct hostnames
fn arb_hosts() -> impl Strategy<Value = Vec<HostDraft>> {
    prop::collection::vec(arb_host(), 0..4).prop_map(|hosts| distinct(hosts, |h| h.hostname.clone()))
}

/// VPC on `10.<index>.0.0/16` with distinct subnet names on third octets 1, 2, ...
fn arb_vpc(index: usize) -> impl Strategy<Value = (String, VpcDraft)> {
    (
        arb_name(),
        prop::collection::vec((arb_name(), arb_hosts()), 0..4),
    )
        .prop_map(move |(name, subnets)| {
            let subnets = distinct(subnets, |(subnet, _)| subnet.clone());
            let vpc = VpcDraft {
                name: name.clone(),
                cidr: format!("10.{index}.0.0/16"),
                subnets: subnets
                    .into_iter()
                    .enumerate()
                    .map(|(i, (subnet, hosts))| SubnetDraft {
                        name: subnet,
                        cidr: format!("10.{index}.{}.0/24", i + 1),
                        hosts,
                    })
                    .collect(),
            };
            (name, vpc)
        })
}

fn arb_range() -> impl Strategy<Value = RangeDraft> {
    (
        prop::sample::select(Provider::ALL),
        (1usize..4).prop_flat_map(|count| (0..count).map(arb_vpc).collect::<Vec<_>>()),
    )
        .prop_map(|(provider, vpcs)| RangeDraft {
            name: "prop".to_string(),
            provider,
            vnc: false,
            vpn: false,
            vpcs: distinct(vpcs, |(name, _)| name.clone())
                .into_iter()
                .map(|(_, vpc)| vpc)
                .collect(),
        })
}

/// Resources present in a rendered terraform document
fn rendered_resources(config: &serde_json::Value) -> usize {
    config["resource"]
        .as_object()
        .map(|types| {
            types
                .values()
                .filter_map(serde_json::Value::as_object)
                .map(|labels| labels.len())
                .sum()
        })
        .unwrap_or(0)
}

fn record(draft: &RangeDraft) -> RangeRecord {
    let template = TemplateValidator::default().range(draft).unwrap();
    RangeRecord::materialize(&template, OwnerId::new())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Generated drafts are valid and keep their shape through storage form
    #[test]
    fn prop_generated_drafts_validate(draft in arb_range()) {
        prop_assert_eq!(record(&draft).to_draft(), draft);
    }

    /// Same input, same bytes
    #[test]
    fn prop_compile_is_deterministic(draft in arb_range(), east2 in any::<bool>()) {
        let region = if east2 { Region::UsEast2 } else { Region::UsEast1 };
        let registry = CompilerRegistry::builtin();

        let first = registry.compile(&record(&draft), region).unwrap().to_json().unwrap();
        let second = registry.compile(&record(&draft), region).unwrap().to_json().unwrap();
        prop_assert_eq!(first, second);
    }

    /// Every dependency resolves and names are unique per kind
    #[test]
    fn prop_graph_is_closed(draft in arb_range()) {
        let graph = CompilerRegistry::builtin()
            .compile(&record(&draft), Region::UsEast1)
            .unwrap();

        prop_assert!(graph.dangling_references().is_empty());
        prop_assert!(graph.duplicate_names().is_empty());
    }

    /// No resource is lost when rendering for terraform
    #[test]
    fn prop_every_resource_is_rendered(draft in arb_range()) {
        let graph = CompilerRegistry::builtin()
            .compile(&record(&draft), Region::UsEast1)
            .unwrap();
        let config = render_configuration(&graph).unwrap();

        prop_assert_eq!(rendered_resources(&config), graph.len());
    }

    /// One machine per host plus one bastion per VPC
    #[test]
    fn prop_one_machine_per_host(draft in arb_range()) {
        let range = record(&draft);
        let graph = CompilerRegistry::builtin().compile(&range, Region::UsEast1).unwrap();

        let machines = graph.count(ResourceKind::Instance) + graph.count(ResourceKind::WindowsInstance);
        prop_assert_eq!(machines, range.host_count() + range.vpcs.len());
        prop_assert_eq!(graph.count(ResourceKind::VirtualNetwork), range.vpcs.len());
        prop_assert_eq!(graph.count(ResourceKind::NatGateway), range.vpcs.len());
        prop_assert_eq!(
            graph.count(ResourceKind::Subnet),
            range.subnets().count() + range.vpcs.len()
        );
    }
}
