//! Source phase: populate the content graph.
//!
//! Two sources feed the graph: content documents from the content directory
//! and public project records from the showcase REST API.

pub mod documents;
pub mod projects;
