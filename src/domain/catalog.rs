// Copyright (c) 2025 - Cowboy AI, Inc.
//! Catalog Tags
//!
//! The closed vocabularies a template is written in: operating systems,
//! hardware sizes, cloud providers and regions. Provider-specific meaning of
//! each tag (image ids, instance types, native region names) lives in
//! [`crate::topology::catalog`], not here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unknown catalog tag
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown {vocabulary} tag: {value}")]
pub struct UnknownTag {
    pub vocabulary: &'static str,
    pub value: String,
}

macro_rules! catalog_tag {
    (
        $(#[$meta:meta])*
        $name:ident, $vocabulary:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Every tag, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Get the canonical string representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownTag;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownTag {
                        vocabulary: $vocabulary,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

catalog_tag! {
    /// Operating system of a range host
    OperatingSystem, "operating system" {
        /// Debian 11
        Debian11 => "debian_11",
        /// Debian 12
        Debian12 => "debian_12",
        /// Ubuntu 20.04
        Ubuntu20 => "ubuntu_20",
        /// Ubuntu 22.04
        Ubuntu22 => "ubuntu_22",
        /// Ubuntu 24.04
        Ubuntu24 => "ubuntu_24",
        /// SUSE Linux Enterprise 12
        Suse12 => "suse_12",
        /// SUSE Linux Enterprise 15
        Suse15 => "suse_15",
        /// Kali Linux
        Kali => "kali",
        /// Windows Server 2016
        Windows2016 => "windows_2016",
        /// Windows Server 2019
        Windows2019 => "windows_2019",
        /// Windows Server 2022
        Windows2022 => "windows_2022",
    }
}

catalog_tag! {
    /// CPU/RAM size class of a range host
    InstanceSpec, "instance spec" {
        /// 1 vCPU, 0.5 GiB
        Tiny => "tiny",
        /// 1 vCPU, 2 GiB
        Small => "small",
        /// 2 vCPU, 4 GiB
        Medium => "medium",
        /// 2 vCPU, 8 GiB
        Large => "large",
        /// 4 vCPU, 16 GiB
        Huge => "huge",
    }
}

catalog_tag! {
    /// Cloud provider a range is lowered for
    Provider, "provider" {
        Aws => "aws",
        Azure => "azure",
    }
}

catalog_tag! {
    /// Provider-neutral deployment region
    Region, "region" {
        UsEast1 => "us_east_1",
        UsEast2 => "us_east_2",
    }
}

impl OperatingSystem {
    /// Smallest disk (GB) the OS image boots from
    ///
    /// Desktop and security distributions ship far larger images than the
    /// minimal server images.
    pub fn min_disk_size_gb(&self) -> u32 {
        match self {
            Self::Debian11
            | Self::Debian12
            | Self::Ubuntu20
            | Self::Ubuntu22
            | Self::Ubuntu24
            | Self::Suse12
            | Self::Suse15 => 8,
            Self::Kali | Self::Windows2016 | Self::Windows2019 | Self::Windows2022 => 32,
        }
    }

    /// Whether the OS is a Windows Server release
    pub fn is_windows(&self) -> bool {
        matches!(
            self,
            Self::Windows2016 | Self::Windows2019 | Self::Windows2022
        )
    }
}

/// Whether `size_gb` satisfies the minimum disk size of `os`
pub fn disk_size_valid(os: OperatingSystem, size_gb: u32) -> bool {
    size_gb >= os.min_disk_size_gb()
}
