//! Account and discovered-resource records

use crate::resource_kind::ResourceKind;
use serde::{Deserialize, Serialize};

/// One account targeted for decommissioning
///
/// Supplied at run start and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Numeric account id
    pub id: String,
    /// Credential profile used to reach the account
    pub profile: String,
}

impl Account {
    pub fn new(id: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile: profile.into(),
        }
    }
}

/// One resource discovered by the inventory collaborator
///
/// Read-only to the engine. `(kind, id, region)` is unique within an
/// account snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Resource kind
    pub kind: ResourceKind,
    /// Provider identifier (instance id, bucket name, stack name, ...)
    pub id: String,
    /// Full ARN where the inventory could resolve one
    pub arn: Option<String>,
    /// Region, or `None` for global resources
    pub region: Option<String>,
    /// Tags captured at scan time; `None` means the scan could not
    /// retrieve them and a lookup is still required
    pub tags: Option<Vec<(String, String)>>,
    /// Opaque provider metadata carried through for delete primitives
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ResourceRecord {
    /// Minimal record with no ARN, tags, or metadata
    pub fn new(kind: ResourceKind, id: impl Into<String>, region: Option<&str>) -> Self {
        Self {
            kind,
            id: id.into(),
            arn: None,
            region: region.map(str::to_string),
            tags: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// Same record with tags attached
    pub fn with_tags(mut self, tags: Vec<(String, String)>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Region for partitioning and persistence; global resources map to
    /// the `global` sentinel.
    pub fn region_key(&self) -> &str {
        self.region.as_deref().unwrap_or("global")
    }
}
