//! In-memory content graph.
//!
//! The graph replaces an external plugin contract with an explicit store:
//! typed nodes with unique identifiers, a content digest for change
//! detection, and an indexed query surface.
//!
//! ```text
//! source phase ──► ContentGraph::insert ──┐
//!                                         │
//! transform phase ──► set_field("slug") ──┤
//!                                         ▼
//! render phase ──► nodes_of_type / require_str_field ──► pages
//! ```

mod node;
mod store;

pub use node::{ContentNode, SOURCE_PARENT};
pub use store::{ContentGraph, GraphError};
