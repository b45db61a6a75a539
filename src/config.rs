// Copyright (c) 2025 - Cowboy AI, Inc.
//! Runtime Configuration
//!
//! Explicit configuration handed to the store, validator and provisioning
//! driver constructors. Loaded from `RANGE_*` environment variables with
//! defaults for everything.

use std::path::PathBuf;

use crate::domain::CapacityPolicy;
use crate::errors::{RangeError, RangeResult};

/// Scratch directory root; a fresh temp dir is used when unset
pub const ENV_SCRATCH_DIR: &str = "RANGE_SCRATCH_DIR";
/// Addresses reserved per subnet
pub const ENV_RESERVED_ADDRESSES: &str = "RANGE_RESERVED_ADDRESSES";
/// Longest subnet prefix that can still host machines
pub const ENV_MAX_PREFIX_LEN: &str = "RANGE_MAX_PREFIX_LEN";
/// Provisioning command line, whitespace separated
pub const ENV_TERRAFORM_CMD: &str = "RANGE_TERRAFORM_CMD";
/// JSON provider catalog overriding the built-in lookup tables
pub const ENV_CATALOG_PATH: &str = "RANGE_CATALOG_PATH";
/// JSON snapshot file of the template store
pub const ENV_STORE_PATH: &str = "RANGE_STORE_PATH";

/// Configuration for range compilation and provisioning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeConfig {
    /// Root of the provisioning workspaces (`None` = temp dir)
    pub scratch_dir: Option<PathBuf>,

    /// Subnet capacity rules applied during validation
    pub capacity: CapacityPolicy,

    /// Program and leading arguments of the provisioning engine
    pub terraform_command: Vec<String>,

    /// Provider catalog override
    pub catalog_path: Option<PathBuf>,

    /// Store snapshot location
    pub store_path: Option<PathBuf>,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            capacity: CapacityPolicy::default(),
            terraform_command: vec!["terraform".to_string()],
            catalog_path: None,
            store_path: None,
        }
    }
}

impl RangeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> RangeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> RangeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let reserved_addresses = match lookup(ENV_RESERVED_ADDRESSES) {
            Some(value) => parse_number(ENV_RESERVED_ADDRESSES, &value)?,
            None => defaults.capacity.reserved_addresses,
        };

        let max_prefix_len: u8 = match lookup(ENV_MAX_PREFIX_LEN) {
            Some(value) => parse_number(ENV_MAX_PREFIX_LEN, &value)?,
            None => defaults.capacity.max_prefix_len,
        };
        if max_prefix_len > 32 {
            return Err(RangeError::Configuration(format!(
                "{ENV_MAX_PREFIX_LEN} must be 0-32, got {max_prefix_len}"
            )));
        }

        let terraform_command = match lookup(ENV_TERRAFORM_CMD) {
            Some(value) => {
                let parts: Vec<String> = value.split_whitespace().map(str::to_string).collect();
                if parts.is_empty() {
                    return Err(RangeError::Configuration(format!(
                        "{ENV_TERRAFORM_CMD} must not be blank"
                    )));
                }
                parts
            }
            None => defaults.terraform_command,
        };

        Ok(Self {
            scratch_dir: lookup(ENV_SCRATCH_DIR).map(PathBuf::from),
            capacity: CapacityPolicy {
                reserved_addresses,
                max_prefix_len,
            },
            terraform_command,
            catalog_path: lookup(ENV_CATALOG_PATH).map(PathBuf::from),
            store_path: lookup(ENV_STORE_PATH).map(PathBuf::from),
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> RangeResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RangeError::Configuration(format!("{key} is not a valid number: {value}")))
}
