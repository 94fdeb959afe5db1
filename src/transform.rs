//! Transform phase: derived fields.
//!
//! Runs after sourcing, before rendering. The only derived field today is
//! the `slug` every document node gets from its file-system location.

use crate::{
    graph::{ContentGraph, GraphError},
    source::documents::DOCUMENT_TYPE,
    utils::slug::slug_from_relative,
};
use serde_json::json;
use std::path::Path;

/// Attach a `slug` field to every document node.
///
/// The slug is deterministic given the document's source path and always
/// begins with `/`. Returns the number of transformed nodes.
pub fn derive_slugs(graph: &ContentGraph) -> Result<usize, GraphError> {
    let ids = graph.ids_of_type(DOCUMENT_TYPE);
    for id in &ids {
        let relative = graph.require_str_field(id, "relative_path")?;
        let slug = slug_from_relative(Path::new(&relative));
        graph.set_field(id, "slug", json!(slug))?;
    }
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ContentNode;
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn document(id: &str, relative: &str) -> ContentNode {
        let mut fields: BTreeMap<String, Value> = BTreeMap::new();
        fields.insert("relative_path".into(), json!(relative));
        ContentNode::new(id, DOCUMENT_TYPE, None, fields)
    }

    #[test]
    fn test_derive_slugs_attaches_field() {
        let graph = ContentGraph::new();
        graph.insert(document("docs/setup", "docs/setup")).unwrap();
        graph.insert(document("index", "index")).unwrap();

        let count = derive_slugs(&graph).unwrap();
        assert_eq!(count, 2);

        assert_eq!(
            graph.require_str_field("docs/setup", "slug").unwrap(),
            "/docs/setup"
        );
        assert_eq!(graph.require_str_field("index", "slug").unwrap(), "/");
    }

    #[test]
    fn test_all_slugs_start_with_separator() {
        let graph = ContentGraph::new();
        for rel in ["a", "b/c", "Deep/Nested/Page", "index"] {
            graph.insert(document(rel, rel)).unwrap();
        }

        derive_slugs(&graph).unwrap();

        for node in graph.nodes_of_type(DOCUMENT_TYPE) {
            let slug = node.field_str("slug").unwrap();
            assert!(!slug.is_empty());
            assert!(slug.starts_with('/'));
        }
    }

    #[test]
    fn test_derive_slugs_refreshes_digest() {
        let graph = ContentGraph::new();
        let node = document("a", "a");
        let digest_before = node.content_digest.clone();
        graph.insert(node).unwrap();

        derive_slugs(&graph).unwrap();

        assert_ne!(graph.get("a").unwrap().content_digest, digest_before);
    }

    #[test]
    fn test_derive_slugs_missing_source_path() {
        let graph = ContentGraph::new();
        graph
            .insert(ContentNode::new("broken", DOCUMENT_TYPE, None, BTreeMap::new()))
            .unwrap();

        let err = derive_slugs(&graph).unwrap_err();
        assert!(matches!(err, GraphError::MissingField { .. }));
    }

    #[test]
    fn test_derive_slugs_ignores_other_types() {
        let graph = ContentGraph::new();
        graph
            .insert(ContentNode::new("p0", "public-project", None, BTreeMap::new()))
            .unwrap();

        let count = derive_slugs(&graph).unwrap();
        assert_eq!(count, 0);
        assert!(graph.get("p0").unwrap().field("slug").is_none());
    }
}
