// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Names
//!
//! Every name the compilers emit is built here, so distinct template
//! entities always get distinct names.
//!
//! # Shape
//!
//! ```text
//! <logical>--<vpc>                     derived per-VPC resources
//! <role>-<subnet>--<vpc>               resources of a declared subnet
//! <role>-<hostname>--<subnet>--<vpc>   resources of a declared host
//! ```
//!
//! Names taken from the template are escaped by [`name_part`]: an escaped
//! part never contains `--` and never starts or ends with `-`, so `--`
//! only ever separates parts. Logical names are fixed and never begin with
//! a role prefix of the same resource kind. Every name is a valid
//! Terraform label.

use std::fmt::Write;

/// Separator between name parts
pub const SEPARATOR: &str = "--";

/// Escape one template-supplied name
///
/// ASCII letters and digits are kept, as is a `-` that is neither first,
/// last, nor followed by another `-`. Everything else, and a leading digit,
/// becomes `_xx` per UTF-8 byte.
pub fn name_part(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len());

    for (i, &c) in chars.iter().enumerate() {
        let keep = match c {
            '0'..='9' => i > 0,
            'a'..='z' | 'A'..='Z' => true,
            '-' => i > 0 && i + 1 < chars.len() && chars[i + 1] != '-',
            _ => false,
        };
        if keep {
            out.push(c);
        } else {
            let mut bytes = [0u8; 4];
            for byte in c.encode_utf8(&mut bytes).bytes() {
                let _ = write!(out, "_{byte:02x}");
            }
        }
    }
    out
}

/// `<logical>--<scope>` for a resource derived once per VPC
pub fn derived(logical: &str, vpc: &str) -> String {
    format!("{logical}{SEPARATOR}{}", name_part(vpc))
}

/// Name of the resource of one declared VPC
pub fn network(vpc: &str) -> String {
    name_part(vpc)
}

/// `<role>-<subnet>--<vpc>`
pub fn subnet_scoped(role: &str, subnet: &str, vpc: &str) -> String {
    format!("{role}-{}{SEPARATOR}{}", name_part(subnet), name_part(vpc))
}

/// `<role>-<hostname>--<subnet>--<vpc>`
pub fn host_scoped(role: &str, hostname: &str, subnet: &str, vpc: &str) -> String {
    format!(
        "{role}-{}{SEPARATOR}{}{SEPARATOR}{}",
        name_part(hostname),
        name_part(subnet),
        name_part(vpc)
    )
}
