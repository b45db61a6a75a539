// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provider Resource Graph
//!
//! Output of the topology compiler: resource kind → ordered list of named
//! descriptors. Every reference to another resource is an explicit
//! [`PropertyValue::Ref`] and is also recorded in `depends_on`, so a
//! provisioning engine can order creation without inspecting properties.
//!
//! All maps are `BTreeMap`s, so serializing the same graph twice yields the
//! same bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Provider;
use crate::errors::RangeResult;

/// Provider-neutral resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    KeyPair,
    /// SSH key pair generated at apply time
    GeneratedKey,
    /// Password generated at apply time
    GeneratedPassword,
    ResourceGroup,
    VirtualNetwork,
    Subnet,
    InternetGateway,
    PublicAddress,
    NatGateway,
    NatGatewayAddressAssociation,
    SubnetNatAssociation,
    RouteTable,
    Route,
    RouteTableAssociation,
    SecurityGroup,
    SecurityRule,
    SubnetSecurityAssociation,
    NetworkInterface,
    Instance,
    WindowsInstance,
}

/// Address of a resource inside a graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Reference to an attribute of the resource
    pub fn attr(&self, attribute: &str) -> PropertyValue {
        PropertyValue::Ref {
            target: self.clone(),
            attribute: attribute.to_string(),
        }
    }

    /// Reference to the resource's provider id
    pub fn id(&self) -> PropertyValue {
        self.attr("id")
    }
}

/// Typed property of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Ref {
        #[serde(rename = "ref")]
        target: ResourceRef,
        attribute: String,
    },
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Build a map value from key/value pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<PropertyValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        PropertyValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Every resource referenced anywhere inside the value
    pub fn references(&self) -> Vec<&ResourceRef> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a ResourceRef>) {
        match self {
            PropertyValue::Ref { target, .. } => out.push(target),
            PropertyValue::List(items) => items.iter().for_each(|v| v.collect_references(out)),
            PropertyValue::Map(entries) => {
                entries.values().for_each(|v| v.collect_references(out))
            }
            PropertyValue::String(_) | PropertyValue::Int(_) | PropertyValue::Bool(_) => {}
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<&String> for PropertyValue {
    fn from(value: &String) -> Self {
        PropertyValue::String(value.clone())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Int(i64::from(value))
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(values: Vec<T>) -> Self {
        PropertyValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// One named resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<ResourceRef>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    /// Set a property; referenced resources become dependencies
    pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        let value = value.into();
        for target in value.references() {
            if !self.depends_on.contains(target) {
                self.depends_on.push(target.clone());
            }
        }
        self.properties.insert(key.to_string(), value);
        self
    }

    /// Add an ordering edge not expressed by any property
    pub fn after(mut self, target: &ResourceRef) -> Self {
        if !self.depends_on.contains(target) {
            self.depends_on.push(target.clone());
        }
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// Provider-specific deployable topology of one range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGraph {
    pub provider: Provider,
    /// Provider-native region name
    pub region: String,
    pub resources: BTreeMap<ResourceKind, Vec<ResourceDescriptor>>,
}

impl ResourceGraph {
    pub fn new(provider: Provider, region: impl Into<String>) -> Self {
        Self {
            provider,
            region: region.into(),
            resources: BTreeMap::new(),
        }
    }

    /// Append a resource and return its address
    pub fn add(&mut self, kind: ResourceKind, descriptor: ResourceDescriptor) -> ResourceRef {
        let address = ResourceRef::new(kind, descriptor.name.clone());
        self.resources.entry(kind).or_default().push(descriptor);
        address
    }

    pub fn of_kind(&self, kind: ResourceKind) -> &[ResourceDescriptor] {
        self.resources.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.of_kind(kind).len()
    }

    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<&ResourceDescriptor> {
        self.of_kind(kind).iter().find(|d| d.name == name)
    }

    /// All resources, kind by kind
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &ResourceDescriptor)> {
        self.resources
            .iter()
            .flat_map(|(kind, descriptors)| descriptors.iter().map(move |d| (*kind, d)))
    }

    /// Total number of resources
    pub fn len(&self) -> usize {
        self.resources.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dependencies that name no resource of the graph
    pub fn dangling_references(&self) -> Vec<&ResourceRef> {
        self.iter()
            .flat_map(|(_, d)| d.depends_on.iter())
            .filter(|target| self.get(target.kind, &target.name).is_none())
            .collect()
    }

    /// Resource names that occur more than once within a kind
    pub fn duplicate_names(&self) -> Vec<(ResourceKind, &str)> {
        let mut out = Vec::new();
        for (kind, descriptors) in &self.resources {
            for (i, d) in descriptors.iter().enumerate() {
                if descriptors[..i].iter().any(|earlier| earlier.name == d.name) {
                    out.push((*kind, d.name.as_str()));
                }
            }
        }
        out
    }

    /// Pretty JSON document of the graph
    pub fn to_json(&self) -> RangeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
