//! Content document sourcing.
//!
//! Walks the content directory and registers one `document` node per content
//! file. Documents are HTML fragments with an optional TOML front matter
//! block fenced by `+++` lines:
//!
//! ```text
//! +++
//! title = "About"
//! date = "2024-01-15"
//! +++
//! <p>Hello.</p>
//! ```

use crate::{
    config::SiteConfig,
    graph::{ContentGraph, ContentNode},
    log,
};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Type tag for content document nodes
pub const DOCUMENT_TYPE: &str = "document";

/// Content file extension
const DOCUMENT_EXT: &str = "html";

/// Front matter fence
const FENCE: &str = "+++";

/// Front matter block of a content document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Publication date as `YYYY-MM-DD`
    pub date: Option<String>,
    #[serde(default)]
    pub draft: bool,
    /// Template file name under the templates dir
    pub template: Option<String>,
}

/// Register one `document` node per content file.
///
/// Drafts are skipped entirely. Returns the number of registered nodes.
pub fn source_documents(graph: &ContentGraph, config: &SiteConfig) -> Result<usize> {
    let content_dir = &config.build.content;
    let mut registered = 0usize;
    let mut drafts = 0usize;

    for path in collect_content_files(content_dir) {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let (meta, body) = parse_document(&raw)
            .with_context(|| format!("Invalid front matter in {}", path.display()))?;

        if meta.draft {
            drafts += 1;
            continue;
        }

        let node = document_node(&path, content_dir, &meta, body)?;
        graph
            .insert(node)
            .with_context(|| format!("Failed to register {}", path.display()))?;
        registered += 1;
    }

    if drafts > 0 {
        log!("source"; "skipped {drafts} draft documents");
    }

    Ok(registered)
}

/// Collect content files, sorted for deterministic registration order.
fn collect_content_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == DOCUMENT_EXT))
        .collect();
    files.sort();
    files
}

/// Split a raw document into front matter and body.
///
/// A document without a leading fence is all body with default metadata.
pub fn parse_document(raw: &str) -> Result<(DocumentMeta, &str)> {
    let Some(rest) = raw.strip_prefix(FENCE) else {
        return Ok((DocumentMeta::default(), raw));
    };
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .ok_or_else(|| anyhow!("Opening `{FENCE}` fence must be on its own line"))?;

    let close = rest
        .find(&format!("\n{FENCE}"))
        .ok_or_else(|| anyhow!("Unclosed `{FENCE}` front matter fence"))?;
    let meta_str = rest[..close].trim_end_matches('\r');

    let after = &rest[close + 1 + FENCE.len()..];
    let body = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after);

    let meta: DocumentMeta = toml::from_str(meta_str)?;
    if let Some(date) = &meta.date {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| anyhow!("Invalid date `{date}`, expected YYYY-MM-DD"))?;
    }

    Ok((meta, body))
}

/// Build a `document` node for a content file.
fn document_node(
    path: &Path,
    content_dir: &Path,
    meta: &DocumentMeta,
    body: &str,
) -> Result<ContentNode> {
    let source_path = path
        .strip_prefix(content_dir)
        .map_err(|_| anyhow!("File is not in content directory: {}", path.display()))?;
    let relative = source_path
        .with_extension("")
        .to_str()
        .ok_or_else(|| anyhow!("Invalid path encoding: {}", path.display()))?
        .replace('\\', "/");

    let title = meta.title.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let mut fields: BTreeMap<String, Value> = BTreeMap::new();
    fields.insert("title".into(), json!(title));
    fields.insert("body".into(), json!(body));
    fields.insert("relative_path".into(), json!(relative));
    fields.insert(
        "source_path".into(),
        json!(source_path.to_string_lossy().replace('\\', "/")),
    );
    if let Some(description) = &meta.description {
        fields.insert("description".into(), json!(description));
    }
    if let Some(date) = &meta.date {
        fields.insert("date".into(), json!(date));
    }
    if let Some(template) = &meta.template {
        fields.insert("template".into(), json!(template));
    }

    Ok(ContentNode::new(relative.clone(), DOCUMENT_TYPE, None, fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_content(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config_with_content(content: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.content = content.to_path_buf();
        config
    }

    #[test]
    fn test_parse_document_with_front_matter() {
        let raw = "+++\ntitle = \"About\"\ndate = \"2024-01-15\"\n+++\n<p>hi</p>";
        let (meta, body) = parse_document(raw).unwrap();

        assert_eq!(meta.title.as_deref(), Some("About"));
        assert_eq!(meta.date.as_deref(), Some("2024-01-15"));
        assert_eq!(body, "<p>hi</p>");
    }

    #[test]
    fn test_parse_document_without_front_matter() {
        let raw = "<p>plain body</p>";
        let (meta, body) = parse_document(raw).unwrap();

        assert_eq!(meta.title, None);
        assert!(!meta.draft);
        assert_eq!(body, "<p>plain body</p>");
    }

    #[test]
    fn test_parse_document_empty_body() {
        let raw = "+++\ntitle = \"T\"\n+++";
        let (meta, body) = parse_document(raw).unwrap();

        assert_eq!(meta.title.as_deref(), Some("T"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_parse_document_unclosed_fence() {
        let raw = "+++\ntitle = \"T\"\n<p>no close</p>";
        assert!(parse_document(raw).is_err());
    }

    #[test]
    fn test_parse_document_invalid_date() {
        let raw = "+++\ndate = \"15/01/2024\"\n+++\nbody";
        let err = format!("{:#}", parse_document(raw).unwrap_err());
        assert!(err.contains("Invalid date"));
    }

    #[test]
    fn test_parse_document_unknown_meta_key() {
        let raw = "+++\nttile = \"typo\"\n+++\nbody";
        assert!(parse_document(raw).is_err());
    }

    #[test]
    fn test_source_documents_registers_nodes() {
        let tmp = tempfile::tempdir().unwrap();
        write_content(tmp.path(), "index.html", "+++\ntitle = \"Home\"\n+++\n<h1>Home</h1>");
        write_content(tmp.path(), "docs/setup.html", "<p>setup</p>");
        let config = config_with_content(tmp.path());

        let graph = ContentGraph::new();
        let count = source_documents(&graph, &config).unwrap();

        assert_eq!(count, 2);
        assert_eq!(graph.count_of_type(DOCUMENT_TYPE), 2);

        let home = graph.get("index").unwrap();
        assert_eq!(home.field_str("title"), Some("Home"));
        assert_eq!(home.field_str("body"), Some("<h1>Home</h1>"));

        let setup = graph.get("docs/setup").unwrap();
        // Title falls back to the file stem
        assert_eq!(setup.field_str("title"), Some("setup"));
        assert_eq!(setup.field_str("relative_path"), Some("docs/setup"));
        assert_eq!(setup.field_str("source_path"), Some("docs/setup.html"));
    }

    #[test]
    fn test_source_documents_skips_drafts() {
        let tmp = tempfile::tempdir().unwrap();
        write_content(tmp.path(), "wip.html", "+++\ndraft = true\n+++\n<p>wip</p>");
        write_content(tmp.path(), "done.html", "<p>done</p>");
        let config = config_with_content(tmp.path());

        let graph = ContentGraph::new();
        let count = source_documents(&graph, &config).unwrap();

        assert_eq!(count, 1);
        assert!(graph.get("wip").is_none());
        assert!(graph.get("done").is_some());
    }

    #[test]
    fn test_source_documents_ignores_other_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        write_content(tmp.path(), "page.html", "<p>page</p>");
        write_content(tmp.path(), "style.css", "body {}");
        write_content(tmp.path(), "notes.txt", "notes");
        let config = config_with_content(tmp.path());

        let graph = ContentGraph::new();
        let count = source_documents(&graph, &config).unwrap();

        assert_eq!(count, 1);
    }

    #[test]
    fn test_source_documents_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_with_content(tmp.path());

        let graph = ContentGraph::new();
        let count = source_documents(&graph, &config).unwrap();

        assert_eq!(count, 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_source_documents_bad_front_matter_fails() {
        let tmp = tempfile::tempdir().unwrap();
        write_content(tmp.path(), "bad.html", "+++\ntitle = \n+++\nbody");
        let config = config_with_content(tmp.path());

        let graph = ContentGraph::new();
        assert!(source_documents(&graph, &config).is_err());
    }
}
