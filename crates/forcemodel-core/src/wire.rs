//! Request and response bodies of the sObject Tree API.
//!
//! A request nests records under their wire relationship names:
//!
//! ```json
//! {"records": [{
//!   "attributes": {"type": "Account", "referenceId": "ref1"},
//!   "Name": "Acme",
//!   "Contacts": {"records": [
//!     {"attributes": {"type": "Contact", "referenceId": "ref2"}, "LastName": "Smith"}
//!   ]}
//! }]}
//! ```
//!
//! The response is flat and correlated by reference id, not by position.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `attributes` envelope of a subrequest node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// Wire table name.
    #[serde(rename = "type")]
    pub sobject_type: String,
    /// Correlation token echoed back in the response.
    #[serde(rename = "referenceId")]
    pub reference_id: String,
}

/// Nested child nodes under one wire relationship name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildRecords {
    /// The child nodes.
    pub records: Vec<SubrequestNode>,
}

/// Wire form of one not-yet-persisted record plus its nested children.
///
/// `fields` and `children` are flattened into the same JSON object, so an
/// attribute and a relationship must never share a wire name. Add children
/// through `attach_children`, which checks this in debug builds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubrequestNode {
    /// Type and reference id.
    pub attributes: NodeAttributes,
    /// Changed attribute values keyed by wire attribute name.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Child nodes keyed by wire relationship name.
    #[serde(flatten)]
    pub children: BTreeMap<String, ChildRecords>,
}

impl SubrequestNode {
    /// Create a node without children.
    pub fn new(
        sobject_type: impl Into<String>,
        reference_id: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            attributes: NodeAttributes {
                sobject_type: sobject_type.into(),
                reference_id: reference_id.into(),
            },
            fields,
            children: BTreeMap::new(),
        }
    }

    /// Nest `records` under the wire relationship name `wire_name`.
    pub fn attach_children(&mut self, wire_name: impl Into<String>, records: Vec<SubrequestNode>) {
        let wire_name = wire_name.into();
        debug_assert!(
            !self.fields.contains_key(&wire_name),
            "relationship {wire_name} collides with an attribute of {}",
            self.attributes.sobject_type
        );
        self.children.insert(wire_name, ChildRecords { records });
    }

    /// Reference id of this node.
    pub fn reference_id(&self) -> &str {
        &self.attributes.reference_id
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .values()
            .flat_map(|child| &child.records)
            .map(SubrequestNode::node_count)
            .sum::<usize>()
    }

    /// Maximum nesting depth of this subtree (a lone node has depth 1).
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .values()
            .flat_map(|child| &child.records)
            .map(SubrequestNode::depth)
            .max()
            .unwrap_or(0)
    }
}

/// A full sObject Tree request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeRequest {
    /// Top-level nodes, one per tree in the batch.
    pub records: Vec<SubrequestNode>,
}

impl TreeRequest {
    /// Total number of nodes across all trees.
    pub fn node_count(&self) -> usize {
        self.records.iter().map(SubrequestNode::node_count).sum()
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// One error reported for a rejected record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Error code such as `REQUIRED_FIELD_MISSING`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Fields the error applies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status_code {
            Some(code) => write!(f, "{}: {}", code, self.message)?,
            None => f.write_str(&self.message)?,
        }
        if !self.fields.is_empty() {
            write!(f, " [{}]", self.fields.join(", "))?;
        }
        Ok(())
    }
}

/// Outcome for one submitted node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    /// Reference id of the submitted node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    /// Server-issued identifier, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Errors, present on failure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiError>,
}

impl ResultEntry {
    /// A successful entry.
    pub fn created(reference_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            reference_id: Some(reference_id.into()),
            id: Some(id.into()),
            errors: Vec::new(),
        }
    }

    /// A failed entry.
    pub fn failed(reference_id: impl Into<String>, errors: Vec<ApiError>) -> Self {
        Self {
            reference_id: Some(reference_id.into()),
            id: None,
            errors,
        }
    }
}

/// A full sObject Tree response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResponse {
    /// Whether any record was rejected.
    #[serde(default)]
    pub has_errors: bool,
    /// Per-node outcomes, in no particular order; entries may be missing.
    #[serde(default)]
    pub results: Vec<ResultEntry>,
}

impl CompositeResponse {
    /// A response where every listed entry succeeded.
    pub fn success(results: Vec<ResultEntry>) -> Self {
        Self {
            has_errors: false,
            results,
        }
    }

    /// A response reporting application-level errors.
    pub fn with_errors(results: Vec<ResultEntry>) -> Self {
        Self {
            has_errors: true,
            results,
        }
    }

    /// Error response for a request the server rejected without a usable body.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::with_errors(vec![ResultEntry {
            reference_id: None,
            id: None,
            errors: vec![ApiError {
                status_code: None,
                message: message.into(),
                fields: Vec::new(),
            }],
        }])
    }

    /// Parse a response body.
    pub fn from_json(body: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Entries that carry errors.
    pub fn failures(&self) -> impl Iterator<Item = &ResultEntry> {
        self.results.iter().filter(|entry| !entry.errors.is_empty())
    }
}
