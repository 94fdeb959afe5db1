//! In-memory indexed content graph.
//!
//! The graph is the single store all build phases read and write: the source
//! phase registers nodes, the transform phase attaches derived fields, and
//! the render phase queries them back.
//!
//! # Thread Safety
//!
//! Uses `RwLock` to allow concurrent reads during parallel rendering while
//! keeping registration exclusive.

use super::node::ContentNode;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use thiserror::Error;

/// Graph-level errors surfaced to the build pipeline.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("duplicate node id `{id}` for type `{node_type}`")]
    DuplicateId { id: String, node_type: String },

    #[error("node `{id}` not found")]
    NodeNotFound { id: String },

    #[error("node `{id}` is missing required field `{field}`")]
    MissingField { id: String, field: String },
}

#[derive(Debug, Default)]
struct GraphInner {
    /// Primary index: node id -> node
    nodes: BTreeMap<String, ContentNode>,
    /// Secondary index: type tag -> node ids, in registration order
    by_type: BTreeMap<String, Vec<String>>,
}

/// Thread-safe indexed store of content nodes.
#[derive(Debug, Default)]
pub struct ContentGraph {
    inner: RwLock<GraphInner>,
}

impl ContentGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node.
    ///
    /// Identifiers must be unique across all nodes of the same type; the id
    /// index is global, so a duplicate id is rejected regardless of type
    /// rather than silently overwriting.
    pub fn insert(&self, node: ContentNode) -> Result<(), GraphError> {
        let mut inner = self.inner.write();
        if inner.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateId {
                id: node.id,
                node_type: node.node_type,
            });
        }
        inner
            .by_type
            .entry(node.node_type.clone())
            .or_default()
            .push(node.id.clone());
        inner.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Get a node by id.
    #[allow(dead_code)]
    pub fn get(&self, id: &str) -> Option<ContentNode> {
        self.inner.read().nodes.get(id).cloned()
    }

    /// All nodes with the given type tag, in registration order.
    pub fn nodes_of_type(&self, node_type: &str) -> Vec<ContentNode> {
        let inner = self.inner.read();
        inner
            .by_type
            .get(node_type)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.nodes.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Node ids with the given type tag, in registration order.
    pub fn ids_of_type(&self, node_type: &str) -> Vec<String> {
        self.inner
            .read()
            .by_type
            .get(node_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Set a field on an existing node, refreshing its content digest.
    pub fn set_field(
        &self,
        id: &str,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), GraphError> {
        let mut inner = self.inner.write();
        let node = inner
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_owned() })?;
        node.set_field(name, value);
        Ok(())
    }

    /// Read a required string field from a node.
    pub fn require_str_field(&self, id: &str, field: &str) -> Result<String, GraphError> {
        let inner = self.inner.read();
        let node = inner
            .nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_owned() })?;
        node.field_str(field)
            .map(str::to_owned)
            .ok_or_else(|| GraphError::MissingField {
                id: id.to_owned(),
                field: field.to_owned(),
            })
    }

    /// Number of nodes with the given type tag.
    pub fn count_of_type(&self, node_type: &str) -> usize {
        self.inner
            .read()
            .by_type
            .get(node_type)
            .map_or(0, Vec::len)
    }

    /// Total number of nodes.
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Check if the graph has any nodes.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.inner.read().nodes.is_empty()
    }
}
