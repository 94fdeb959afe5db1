//! External project ingestion.
//!
//! Fetches public project records from the showcase REST API and registers
//! one `public-project` node per record. Groups are independent, so they are
//! fetched concurrently and joined before registration; registration itself
//! runs in config order, then record order, so identifiers stay
//! deterministic.
//!
//! There is no retry, backoff, or partial-success handling: a failed fetch
//! or decode for any group fails the whole ingestion and, transitively, the
//! build.

use crate::{
    config::ApiSection,
    graph::{ContentGraph, ContentNode, SOURCE_PARENT},
};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};

/// Type tag for ingested project nodes
pub const PROJECT_TYPE: &str = "public-project";

/// Fixed route segment between the API base and the group name
const PROJECT_ROUTE: &str = "projects/projectgroups/";

/// Fixed route suffix after the group name
const PROJECT_ROUTE_SUFFIX: &str = "/public";

/// A project record as served by the endpoint.
///
/// Field names are the wire format, copied verbatim onto the node. Absent
/// fields stay absent so the content digest only covers what the endpoint
/// actually sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_production_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_group_name: Option<String>,
}

/// HTTP source for public project records.
pub struct ProjectSource {
    base_url: String,
    client: reqwest::Client,
}

impl ProjectSource {
    /// Create a source for the given API base URL.
    ///
    /// The base must end with `/`; the group route is concatenated onto it.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base_url: base_url.into(), client })
    }

    /// Request URL for a project group.
    pub fn group_url(&self, group: &str) -> String {
        format!(
            "{}{PROJECT_ROUTE}{group}{PROJECT_ROUTE_SUFFIX}",
            self.base_url
        )
    }

    /// Fetch all records of a project group.
    pub async fn fetch_group(&self, group: &str) -> Result<Vec<ProjectRecord>> {
        let url = self.group_url(group);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch project group `{group}` from {url}"))?
            .error_for_status()
            .with_context(|| format!("Project group `{group}` request failed"))?;

        response
            .json()
            .await
            .with_context(|| format!("Invalid project JSON from {url}"))
    }
}

/// Ingest all configured project groups into the graph.
///
/// Returns the total number of registered nodes. An empty response for a
/// group registers zero nodes and is not an error.
pub fn ingest_projects(graph: &ContentGraph, api: &ApiSection) -> Result<usize> {
    let base_url = api
        .base_url
        .as_deref()
        .ok_or_else(|| anyhow!("[api.base_url] is not configured"))?;
    let source = ProjectSource::new(base_url, Duration::from_secs(api.timeout_secs))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start ingestion runtime")?;

    let groups = &api.project_groups;
    let fetched: Vec<Vec<ProjectRecord>> = runtime.block_on(futures::future::try_join_all(
        groups.iter().map(|group| source.fetch_group(group)),
    ))?;

    let mut total = 0;
    for (group, records) in groups.iter().zip(&fetched) {
        total += register_group(graph, group, records)?;
    }
    Ok(total)
}

/// Register one node per record of a fetched group.
pub fn register_group(
    graph: &ContentGraph,
    group: &str,
    records: &[ProjectRecord],
) -> Result<usize> {
    for (index, record) in records.iter().enumerate() {
        let node = project_node(group, index, record)?;
        graph
            .insert(node)
            .with_context(|| format!("Failed to register project from group `{group}`"))?;
    }
    Ok(records.len())
}

/// Build a `public-project` node for one record.
///
/// The identifier keeps the original order-dependent scheme: group name
/// concatenated with the record's positional index.
fn project_node(group: &str, index: usize, record: &ProjectRecord) -> Result<ContentNode> {
    let id = format!("{group}{index}");
    let value = serde_json::to_value(record).context("Failed to serialize project record")?;
    let fields: BTreeMap<String, serde_json::Value> = value
        .as_object()
        .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    Ok(ContentNode::new(
        id,
        PROJECT_TYPE,
        Some(SOURCE_PARENT.to_owned()),
        fields,
    ))
}
