// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-range
//!
//! Provides deterministic range drafts and owners for integration tests.
//!
//! # Design Principles
//! - Owners use fixed UUIDs so failures are reproducible
//! - Drafts are built here and validated by the tests, never hand-assembled
//!   as templates

#![allow(dead_code)]

use serde_json::json;
use uuid::Uuid;

use cim_range::domain::Region;
use cim_range::template::{OwnerId, RangeDraft, RangeRecord, RangeTemplate, TemplateValidator};
use cim_range::topology::{CompilerRegistry, ResourceGraph};

// Fixed test UUIDs (UUID v7 format, but deterministic for testing)
pub const OWNER_ID_1: &str = "01934f4a-0001-7000-8000-000000000001";
pub const OWNER_ID_2: &str = "01934f4a-0002-7000-8000-000000000002";

/// Parse a fixed UUID from a constant string
pub fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("Invalid UUID in test fixture")
}

pub fn owner_1() -> OwnerId {
    OwnerId::from_uuid(parse_uuid(OWNER_ID_1))
}

pub fn owner_2() -> OwnerId {
    OwnerId::from_uuid(parse_uuid(OWNER_ID_2))
}

/// One VPC, one subnet, one Debian host
pub fn minimal_range_draft() -> RangeDraft {
    serde_json::from_value(json!({
        "name": "minimal",
        "provider": "aws",
        "vpcs": [{
            "name": "corp",
            "cidr": "10.0.0.0/16",
            "subnets": [{
                "name": "users",
                "cidr": "10.0.1.0/24",
                "hosts": [
                    {"hostname": "ws-01", "os": "debian_12", "spec": "small", "size": 8}
                ]
            }]
        }]
    }))
    .expect("Invalid minimal range fixture")
}

/// The documented minimal range: one /16, one /24, one Debian 11 host
pub fn example_range_draft() -> RangeDraft {
    serde_json::from_value(json!({
        "name": "example-range",
        "provider": "aws",
        "vnc": false,
        "vpn": false,
        "vpcs": [{
            "name": "example-vpc",
            "cidr": "192.168.0.0/16",
            "subnets": [{
                "name": "example-subnet",
                "cidr": "192.168.1.0/24",
                "hosts": [
                    {"hostname": "example-host-1", "os": "debian_11", "spec": "tiny", "size": 8}
                ]
            }]
        }]
    }))
    .expect("Invalid example range fixture")
}

/// Two VPCs with Linux and Windows hosts
pub fn training_range_draft(provider: &str) -> RangeDraft {
    serde_json::from_value(json!({
        "name": "training",
        "provider": provider,
        "vnc": true,
        "vpn": false,
        "vpcs": [
            {
                "name": "blue",
                "cidr": "10.0.0.0/16",
                "subnets": [
                    {
                        "name": "servers",
                        "cidr": "10.0.1.0/24",
                        "hosts": [
                            {"hostname": "dc-01", "os": "windows_2022", "spec": "large", "size": 64, "tags": ["ad", "dns"]},
                            {"hostname": "files", "os": "ubuntu_22", "spec": "medium", "size": 32}
                        ]
                    },
                    {
                        "name": "users",
                        "cidr": "10.0.2.0/24",
                        "hosts": [
                            {"hostname": "ws-01", "os": "windows_2019", "spec": "small", "size": 40}
                        ]
                    }
                ]
            },
            {
                "name": "red",
                "cidr": "10.1.0.0/16",
                "subnets": [{
                    "name": "attack",
                    "cidr": "10.1.5.0/24",
                    "hosts": [
                        {"hostname": "kali", "os": "kali", "spec": "large", "size": 80, "tags": ["red-team"]}
                    ]
                }]
            }
        ]
    }))
    .expect("Invalid training range fixture")
}

/// Validate a draft with the default capacity policy
pub fn validate(draft: &RangeDraft) -> RangeTemplate {
    TemplateValidator::default()
        .range(draft)
        .expect("Fixture draft failed validation")
}

/// Validated, materialized record owned by [`owner_1`]
pub fn record(draft: &RangeDraft) -> RangeRecord {
    RangeRecord::materialize(&validate(draft), owner_1())
}

/// Compile a draft with the built-in catalogs
pub fn compile(draft: &RangeDraft, region: Region) -> ResourceGraph {
    CompilerRegistry::builtin()
        .compile(&record(draft), region)
        .expect("Fixture range failed to compile")
}
