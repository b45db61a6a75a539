// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provider Lookup Tables
//!
//! Translation of catalog tags into provider vocabulary: native region
//! names, machine images per region, instance types. Tables are plain
//! structs with one field per tag, so every lookup is total and a JSON file
//! missing an entry fails to load instead of failing mid-compile.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{InstanceSpec, OperatingSystem, Provider, Region};
use crate::errors::{RangeError, RangeResult};

/// One value per region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTable<T> {
    pub us_east_1: T,
    pub us_east_2: T,
}

impl<T> RegionTable<T> {
    pub fn get(&self, region: Region) -> &T {
        match region {
            Region::UsEast1 => &self.us_east_1,
            Region::UsEast2 => &self.us_east_2,
        }
    }
}

impl<T: Clone> RegionTable<T> {
    /// Same value in every region
    pub fn uniform(value: T) -> Self {
        Self {
            us_east_1: value.clone(),
            us_east_2: value,
        }
    }
}

/// Machine image per operating system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTable {
    pub debian_11: String,
    pub debian_12: String,
    pub ubuntu_20: String,
    pub ubuntu_22: String,
    pub ubuntu_24: String,
    pub suse_12: String,
    pub suse_15: String,
    pub kali: String,
    pub windows_2016: String,
    pub windows_2019: String,
    pub windows_2022: String,
}

impl ImageTable {
    pub fn get(&self, os: OperatingSystem) -> &str {
        match os {
            OperatingSystem::Debian11 => &self.debian_11,
            OperatingSystem::Debian12 => &self.debian_12,
            OperatingSystem::Ubuntu20 => &self.ubuntu_20,
            OperatingSystem::Ubuntu22 => &self.ubuntu_22,
            OperatingSystem::Ubuntu24 => &self.ubuntu_24,
            OperatingSystem::Suse12 => &self.suse_12,
            OperatingSystem::Suse15 => &self.suse_15,
            OperatingSystem::Kali => &self.kali,
            OperatingSystem::Windows2016 => &self.windows_2016,
            OperatingSystem::Windows2019 => &self.windows_2019,
            OperatingSystem::Windows2022 => &self.windows_2022,
        }
    }
}

/// Instance type per hardware size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceTypes {
    pub tiny: String,
    pub small: String,
    pub medium: String,
    pub large: String,
    pub huge: String,
}

impl InstanceTypes {
    pub fn get(&self, spec: InstanceSpec) -> &str {
        match spec {
            InstanceSpec::Tiny => &self.tiny,
            InstanceSpec::Small => &self.small,
            InstanceSpec::Medium => &self.medium,
            InstanceSpec::Large => &self.large,
            InstanceSpec::Huge => &self.huge,
        }
    }
}

/// Jump host placed in every VPC's public subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BastionSpec {
    pub os: OperatingSystem,
    pub instance_type: String,
    /// Login user created on the bastion (Azure only)
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
}

fn default_admin_username() -> String {
    "rangeadmin".to_string()
}

/// Lookup tables of one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCatalog {
    pub provider: Provider,
    pub regions: RegionTable<String>,
    pub images: RegionTable<ImageTable>,
    pub instance_types: InstanceTypes,
    pub bastion: BastionSpec,
    /// Public key installed on every instance, if any
    #[serde(default)]
    pub ssh_public_key: Option<String>,
}

impl ProviderCatalog {
    /// AWS EC2: us-east AMIs and burstable `t2` instance types
    pub fn aws() -> Self {
        let images = ImageTable {
            debian_11: "ami-053413bdacb39d8dc".to_string(),
            debian_12: "ami-0e8087266e36fe754".to_string(),
            ubuntu_20: "ami-014f7ab33242ea43c".to_string(),
            ubuntu_22: "ami-0e1bed4f06a3b463d".to_string(),
            ubuntu_24: "ami-04b4f1a9cf54c11d0".to_string(),
            suse_12: "ami-0d6a3fb3bfdd87b52".to_string(),
            suse_15: "ami-0d9f9dbae7b9a241d".to_string(),
            kali: "ami-02be3d7604aff56a7".to_string(),
            windows_2016: "ami-032ec7a32b7fb247c".to_string(),
            windows_2019: "ami-049dd04cca2dc5594".to_string(),
            windows_2022: "ami-0a0ebee827a585d06".to_string(),
        };

        Self {
            provider: Provider::Aws,
            regions: RegionTable {
                us_east_1: "us-east-1".to_string(),
                us_east_2: "us-east-2".to_string(),
            },
            images: RegionTable::uniform(images),
            instance_types: InstanceTypes {
                tiny: "t2.nano".to_string(),
                small: "t2.small".to_string(),
                medium: "t2.medium".to_string(),
                large: "t2.large".to_string(),
                huge: "t2.xlarge".to_string(),
            },
            bastion: BastionSpec {
                os: OperatingSystem::Ubuntu20,
                instance_type: "t2.micro".to_string(),
                admin_username: default_admin_username(),
            },
            ssh_public_key: None,
        }
    }

    /// Azure: marketplace image URNs and `B`-series sizes
    pub fn azure() -> Self {
        let images = ImageTable {
            debian_11: "Debian:debian-11:11-backports-gen2:latest".to_string(),
            debian_12: "Debian:debian-12:12-gen2:latest".to_string(),
            ubuntu_20: "Canonical:0001-com-ubuntu-server-focal:20_04-lts-gen2:latest".to_string(),
            ubuntu_22: "Canonical:0001-com-ubuntu-server-jammy:22_04-lts-gen2:latest".to_string(),
            ubuntu_24: "Canonical:ubuntu-24_04-lts:server:latest".to_string(),
            suse_12: "SUSE:sles-12-sp5:gen2:latest".to_string(),
            suse_15: "SUSE:sles-15-sp5:gen2:latest".to_string(),
            kali: "kali-linux:kali:kali-2024-4:2024.4.1".to_string(),
            windows_2016: "MicrosoftWindowsServer:WindowsServer:2016-datacenter-gensecond:latest"
                .to_string(),
            windows_2019: "MicrosoftWindowsServer:WindowsServer:2019-datacenter-gensecond:latest"
                .to_string(),
            windows_2022: "MicrosoftWindowsServer:WindowsServer:2022-datacenter-g2:latest"
                .to_string(),
        };

        Self {
            provider: Provider::Azure,
            regions: RegionTable {
                us_east_1: "eastus".to_string(),
                us_east_2: "eastus2".to_string(),
            },
            images: RegionTable::uniform(images),
            instance_types: InstanceTypes {
                tiny: "Standard_B1ls2".to_string(),
                small: "Standard_B1ms".to_string(),
                medium: "Standard_B2s".to_string(),
                large: "Standard_B2ms".to_string(),
                huge: "Standard_B4ms".to_string(),
            },
            bastion: BastionSpec {
                os: OperatingSystem::Ubuntu22,
                instance_type: "Standard_B1ms".to_string(),
                admin_username: default_admin_username(),
            },
            ssh_public_key: None,
        }
    }

    /// Built-in tables of a provider
    pub fn for_provider(provider: Provider) -> Self {
        match provider {
            Provider::Aws => Self::aws(),
            Provider::Azure => Self::azure(),
        }
    }

    /// Load tables from a JSON file
    pub async fn load(path: &Path) -> RangeResult<Self> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            RangeError::Configuration(format!("Cannot read catalog {}: {e}", path.display()))
        })?;
        let catalog: Self = serde_json::from_slice(&data).map_err(|e| {
            RangeError::Configuration(format!("Invalid catalog {}: {e}", path.display()))
        })?;

        info!(provider = %catalog.provider, path = %path.display(), "Loaded provider catalog");
        Ok(catalog)
    }

    /// Replace the SSH key installed on instances
    pub fn with_ssh_public_key(mut self, key: impl Into<String>) -> Self {
        self.ssh_public_key = Some(key.into());
        self
    }

    /// Provider-native region name
    pub fn region(&self, region: Region) -> &str {
        self.regions.get(region)
    }

    /// Machine image for an OS in a region
    pub fn image(&self, region: Region, os: OperatingSystem) -> &str {
        self.images.get(region).get(os)
    }

    /// Instance type for a size class
    pub fn instance_type(&self, spec: InstanceSpec) -> &str {
        self.instance_types.get(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Region::UsEast1, "us-east-1", "eastus" ; "us east 1")]
    #[test_case(Region::UsEast2, "us-east-2", "eastus2" ; "us east 2")]
    fn test_region_names(region: Region, aws: &str, azure: &str) {
        assert_eq!(ProviderCatalog::aws().region(region), aws);
        assert_eq!(ProviderCatalog::azure().region(region), azure);
    }

    #[test]
    fn test_every_tag_resolves() {
        for provider in Provider::ALL {
            let catalog = ProviderCatalog::for_provider(*provider);
            assert_eq!(catalog.provider, *provider);
            for region in Region::ALL {
                for os in OperatingSystem::ALL {
                    assert!(!catalog.image(*region, *os).is_empty());
                }
            }
            for spec in InstanceSpec::ALL {
                assert!(!catalog.instance_type(*spec).is_empty());
            }
        }
    }

    #[test]
    fn test_aws_values() {
        let aws = ProviderCatalog::aws();
        assert_eq!(aws.instance_type(InstanceSpec::Tiny), "t2.nano");
        assert_eq!(aws.image(Region::UsEast1, OperatingSystem::Debian11), "ami-053413bdacb39d8dc");
        assert_eq!(aws.image(Region::UsEast1, aws.bastion.os), "ami-014f7ab33242ea43c");
    }

    #[tokio::test]
    async fn test_load_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aws.json");
        let custom = ProviderCatalog::aws().with_ssh_public_key("ssh-ed25519 AAAA test");
        tokio::fs::write(&path, serde_json::to_vec(&custom).unwrap())
            .await
            .unwrap();

        let loaded = ProviderCatalog::load(&path).await.unwrap();
        assert_eq!(loaded, custom);

        tokio::fs::write(&path, br#"{"provider": "aws"}"#).await.unwrap();
        assert!(matches!(
            ProviderCatalog::load(&path).await,
            Err(RangeError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = tokio_test::block_on(ProviderCatalog::load(&dir.path().join("none.json")));

        let err = result.unwrap_err();
        assert!(matches!(err, RangeError::Configuration(_)));
        assert!(err.to_string().contains("none.json"));
    }
}
