//! Content node representation.
//!
//! A node is a typed, uniquely identified record in the in-memory content
//! graph. Every node carries a content digest: a blake3 hash of its
//! serialized body, hex-encoded. The digest is a pure function of the node's
//! content and is used for change detection, not cryptographic guarantees.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parent marker for nodes sourced from outside the content directory.
pub const SOURCE_PARENT: &str = "__SOURCE__";

/// A typed record in the content graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentNode {
    /// Unique identifier, unique across all nodes of the same type
    pub id: String,

    /// Type tag, e.g. `document` or `public-project`
    #[serde(rename = "type")]
    pub node_type: String,

    /// Parent node id, or a source sentinel for externally sourced nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Child node ids (empty for leaf nodes)
    pub children: Vec<String>,

    /// Node payload. `BTreeMap` keeps serialization order deterministic,
    /// which the digest depends on.
    pub fields: BTreeMap<String, Value>,

    /// Hex-encoded blake3 digest of the serialized node body
    pub content_digest: String,
}

/// The digest covers everything except the digest itself.
#[derive(Serialize)]
struct NodeBody<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    node_type: &'a str,
    parent: &'a Option<String>,
    children: &'a [String],
    fields: &'a BTreeMap<String, Value>,
}

impl ContentNode {
    /// Create a node and compute its content digest.
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
        parent: Option<String>,
        fields: BTreeMap<String, Value>,
    ) -> Self {
        let mut node = Self {
            id: id.into(),
            node_type: node_type.into(),
            parent,
            children: Vec::new(),
            fields,
            content_digest: String::new(),
        };
        node.content_digest = node.compute_digest();
        node
    }

    /// Set or replace a field and refresh the content digest.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
        self.content_digest = self.compute_digest();
    }

    /// Get a field value by name.
    #[allow(dead_code)]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a field as a string slice, if present and a string.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Hash the serialized node body.
    fn compute_digest(&self) -> String {
        let body = NodeBody {
            id: &self.id,
            node_type: &self.node_type,
            parent: &self.parent,
            children: &self.children,
            fields: &self.fields,
        };
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        hex::encode(blake3::hash(&bytes).as_bytes())
    }
}
