// Copyright (c) 2025 - Cowboy AI, Inc.
//! Hostname Value Object with RFC 1035 Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Hostname validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostnameError {
    #[error("Hostname is empty")]
    Empty,

    #[error("Hostname exceeds maximum length of 253 characters: {0}")]
    TooLong(usize),

    #[error("Hostname contains an empty label")]
    EmptyLabel,

    #[error("Label exceeds maximum length of 63 characters: {0}")]
    LabelTooLong(String),

    #[error("Invalid character {character:?} in label: {label}")]
    InvalidCharacter { label: String, character: char },

    #[error("Label cannot start or end with hyphen: {0}")]
    InvalidLabelFormat(String),

    #[error("Top-level label cannot be all numeric: {0}")]
    NumericTopLevelLabel(String),
}

/// Hostname of a range host
///
/// Represents a DNS hostname following RFC 1035 with invariants:
/// - Non-empty
/// - Exactly one trailing dot is tolerated and ignored for the checks
/// - Total length ≤ 253 characters (after stripping the trailing dot)
/// - Each label 1–63 characters of `[A-Za-z0-9-]`
/// - Labels cannot start or end with hyphens
/// - The top-level (last) label cannot be all numeric
///
/// The original spelling is preserved; nothing is lowercased.
///
/// # Examples
///
/// ```rust
/// use cim_range::domain::Hostname;
///
/// let host = Hostname::new("example-host-1").unwrap();
/// assert_eq!(host.as_str(), "example-host-1");
///
/// assert!(Hostname::new("example.com.").is_ok());
/// assert!(Hostname::new("-invalid").is_err());
/// assert!(Hostname::new("example.123").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hostname(String);

impl Hostname {
    /// Maximum total length (RFC 1035)
    pub const MAX_LENGTH: usize = 253;

    /// Maximum length for a single label (RFC 1035)
    pub const MAX_LABEL_LENGTH: usize = 63;

    /// Create a new hostname with validation
    pub fn new(hostname: impl Into<String>) -> Result<Self, HostnameError> {
        let hostname = hostname.into();
        Self::validate(&hostname)?;
        Ok(Self(hostname))
    }

    /// Check a candidate hostname, reporting the first violated rule
    pub fn validate(hostname: &str) -> Result<(), HostnameError> {
        if hostname.is_empty() {
            return Err(HostnameError::Empty);
        }

        let trimmed = hostname.strip_suffix('.').unwrap_or(hostname);

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(HostnameError::TooLong(trimmed.len()));
        }

        let labels: Vec<&str> = trimmed.split('.').collect();

        if let Some(top) = labels.last() {
            if !top.is_empty() && top.chars().all(|c| c.is_ascii_digit()) {
                return Err(HostnameError::NumericTopLevelLabel((*top).to_string()));
            }
        }

        for label in labels {
            Self::validate_label(label)?;
        }

        Ok(())
    }

    fn validate_label(label: &str) -> Result<(), HostnameError> {
        if label.is_empty() {
            return Err(HostnameError::EmptyLabel);
        }

        if label.len() > Self::MAX_LABEL_LENGTH {
            return Err(HostnameError::LabelTooLong(label.to_string()));
        }

        if let Some(character) = label
            .chars()
            .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '-')
        {
            return Err(HostnameError::InvalidCharacter {
                label: label.to_string(),
                character,
            });
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(HostnameError::InvalidLabelFormat(label.to_string()));
        }

        Ok(())
    }

    /// Get the hostname as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the short name (first label before first dot)
    pub fn short_name(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

/// Predicate form of [`Hostname::validate`]
pub fn hostname_valid(name: &str) -> bool {
    Hostname::validate(name).is_ok()
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Hostname {
    type Error = HostnameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Hostname {
    type Error = HostnameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Hostname> for String {
    fn from(value: Hostname) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("example.com" ; "two labels")]
    #[test_case("sub.example.com" ; "three labels")]
    #[test_case("localhost" ; "single label")]
    #[test_case("my-site123.org" ; "hyphen and digits")]
    #[test_case("a.co" ; "short labels")]
    #[test_case("example.co.uk" ; "country code")]
    #[test_case("example.com." ; "trailing dot")]
    #[test_case("xn--d1acpjx3f.xn--p1ai" ; "punycode")]
    #[test_case("example-host-1" ; "range host")]
    #[test_case("123.example" ; "numeric first label")]
    fn test_valid_hostnames(name: &str) {
        assert!(hostname_valid(name), "{name} should be valid");
    }

    #[test_case("" ; "empty")]
    #[test_case("-example.com" ; "leading hyphen")]
    #[test_case("example-.com" ; "trailing hyphen")]
    #[test_case("exa_mple.com" ; "underscore")]
    #[test_case("example..com" ; "double dot")]
    #[test_case("example..com." ; "double dot with trailing dot")]
    #[test_case("123.456.789.0" ; "numeric address")]
    #[test_case("example.123" ; "numeric tld")]
    #[test_case("example!.com" ; "bang")]
    #[test_case("." ; "only a dot")]
    fn test_invalid_hostnames(name: &str) {
        assert!(!hostname_valid(name), "{name} should be invalid");
    }

    #[test]
    fn test_length_limits() {
        let long_label = "a".repeat(64);
        assert_eq!(
            Hostname::new(format!("{long_label}.com")),
            Err(HostnameError::LabelTooLong(long_label))
        );

        let max_label = "a".repeat(63);
        assert!(Hostname::new(format!("{max_label}.com")).is_ok());

        // 4 * 63 + 3 dots = 255 characters
        let four_labels = [max_label.as_str(); 4].join(".");
        assert!(hostname_valid(&four_labels[..four_labels.len() - 2]));
        assert!(!hostname_valid(&format!("{four_labels}a")));
        assert!(!hostname_valid(&format!("{}.com", "a".repeat(254))));
    }

    #[test]
    fn test_trailing_dot_is_stripped_once() {
        let at_limit = format!("{}.{}.{}.{}", "a".repeat(63), "b".repeat(63), "c".repeat(63), "d".repeat(61));
        assert_eq!(at_limit.len(), 253);
        assert!(hostname_valid(&format!("{at_limit}.")));
        assert!(!hostname_valid(&format!("{at_limit}..")));
    }

    #[test]
    fn test_hostname_accessors() {
        let host = Hostname::new("web01.prod.example.com").unwrap();
        assert_eq!(host.short_name(), "web01");
        assert_eq!(format!("{}", host), "web01.prod.example.com");

        let short = Hostname::new("kali-attacker").unwrap();
        assert_eq!(short.short_name(), "kali-attacker");
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let parsed: Result<Hostname, _> = serde_json::from_str("\"bad_name\"");
        assert!(parsed.is_err());

        let parsed: Hostname = serde_json::from_str("\"good-name\"").unwrap();
        assert_eq!(parsed.as_str(), "good-name");
    }
}
