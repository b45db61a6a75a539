// Copyright (c) 2025 - Cowboy AI, Inc.
//! Range Template Model
//!
//! A cyber range is a strict four-level tree:
//!
//! ```text
//! Range ──< VPC ──< Subnet ──< Host
//! ```
//!
//! Each level exists in three shapes:
//!
//! - **Draft** ([`RangeDraft`], ...) - the unvalidated JSON form
//! - **Template** ([`RangeTemplate`], ...) - validated, immutable
//! - **Record** ([`RangeRecord`], ...) - stored tree with ids, owner and
//!   parent links; its row without children is a **Header**
//!
//! # Example
//!
//! ```rust
//! use cim_range::template::{RangeDraft, TemplateValidator};
//!
//! let draft: RangeDraft = serde_json::from_str(r#"{
//!     "name": "demo",
//!     "provider": "aws",
//!     "vpcs": [{"name": "corp", "cidr": "10.0.0.0/16", "subnets": [
//!         {"name": "users", "cidr": "10.0.1.0/24", "hosts": [
//!             {"hostname": "ws-01", "os": "debian_12", "spec": "small", "size": 8}
//!         ]}
//!     ]}]
//! }"#).unwrap();
//!
//! let range = TemplateValidator::default().range(&draft).unwrap();
//! assert_eq!(range.host_count(), 1);
//! ```

pub mod draft;
pub mod ids;
pub mod model;
pub mod record;
pub mod validator;

pub use draft::{HostDraft, RangeDraft, SubnetDraft, VpcDraft};
pub use ids::{EntityId, HostId, Owner, OwnerId, RangeId, SubnetId, VpcId};
pub use model::{HostTemplate, RangeTemplate, SubnetTemplate, VpcTemplate};
pub use record::{
    HostHeader, HostRecord, RangeHeader, RangeRecord, SubnetHeader, SubnetRecord, VpcHeader,
    VpcRecord,
};
pub use validator::TemplateValidator;
