//! Site building orchestration.
//!
//! Runs the pipeline phases in fixed order over a fresh content graph:
//!
//! ```text
//! build_site()
//!     │
//!     ├── source ──► documents from the content dir
//!     │          └─► project records from the REST API
//!     │
//!     ├── transform ──► derive slug fields
//!     │
//!     ├── schema ──► resolve menu links (defaults filled)
//!     │
//!     └── render ──► collect pages (fatal on query failure)
//!                └─► write pages + export project data
//! ```
//!
//! Any phase error aborts the build; there is no partial-success mode.

use crate::{
    config::SiteConfig,
    graph::ContentGraph,
    log, render, schema, source, transform,
};
use anyhow::{Context, Result, anyhow};
use std::{fs, path::Path};

/// Counts reported by a completed build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub documents: usize,
    pub projects: usize,
    pub pages: usize,
}

/// Build the entire site.
pub fn build_site(config: &SiteConfig) -> Result<BuildSummary> {
    let graph = ContentGraph::new();

    // ========================================================================
    // Source
    // ========================================================================
    let documents = source::documents::source_documents(&graph, config)?;
    log!("source"; "registered {documents} documents");

    let projects = if config.ingest_enabled() {
        match source::projects::ingest_projects(&graph, &config.api) {
            Ok(count) => {
                log!("ingest"; "registered {count} projects from {} groups", config.api.project_groups.len());
                count
            }
            Err(e) => {
                log!("error"; "project ingestion failed: {e:#}");
                return Err(anyhow!("Build failed"));
            }
        }
    } else {
        0
    };

    // ========================================================================
    // Transform
    // ========================================================================
    let slugged = transform::derive_slugs(&graph).context("Slug derivation failed")?;
    log!("transform"; "derived {slugged} slugs");

    // ========================================================================
    // Schema
    // ========================================================================
    let menu = schema::resolve_menu_links(&config.site.menu_links)?;

    // ========================================================================
    // Render
    // ========================================================================
    // Pages are fully collected before anything touches the output dir, so a
    // failed query writes nothing.
    let pages = match render::collect_pages(&graph) {
        Ok(pages) => pages,
        Err(e) => {
            log!("error"; "page query failed: {e}");
            return Err(anyhow!("Build failed"));
        }
    };
    if pages.is_empty() {
        log!("warn"; "no pages to render, check if content has .html documents");
    }

    prepare_output(&config.build.output, config.build.clean)?;
    render::render_pages(&pages, &menu, config)?;
    let exported = render::export_projects(&graph, config)?;

    let summary = BuildSummary { documents, projects, pages: pages.len() };
    log!(
        "build";
        "{} pages from {} documents and {} projects, {exported} entries exported",
        summary.pages, summary.documents, summary.projects
    );

    Ok(summary)
}

/// Ensure the output directory exists, clearing it first when requested.
fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_content(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn offline_config(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.content = root.join("content");
        config.build.templates = root.join("templates");
        config.build.output = root.join("public");
        config.build.minify = false;
        config.api.enable = false;
        fs::create_dir_all(&config.build.content).unwrap();
        config
    }

    #[test]
    fn test_build_site_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let config = offline_config(tmp.path());
        write_content(&config.build.content, "a.html", "+++\ntitle = \"A\"\n+++\n<p>a</p>");
        write_content(&config.build.content, "b.html", "<p>b</p>");
        write_content(&config.build.content, "c.html", "<p>c</p>");

        let summary = build_site(&config).unwrap();

        assert_eq!(summary, BuildSummary { documents: 3, projects: 0, pages: 3 });
        for route in ["a", "b", "c"] {
            let path = config.build.output.join(route).join("index.html");
            let html = fs::read_to_string(&path).unwrap();
            // The slug is bound into the page context
            assert!(html.contains(&format!(r#"data-slug="/{route}""#)));
        }
        assert!(config.build.output.join("_data/projects.json").exists());
    }

    #[test]
    fn test_build_site_empty_content_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = offline_config(tmp.path());

        let summary = build_site(&config).unwrap();

        assert_eq!(summary.pages, 0);
        assert!(config.build.output.exists());
    }

    #[test]
    fn test_build_site_invalid_menu_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = offline_config(tmp.path());
        write_content(&config.build.content, "a.html", "<p>a</p>");

        let broken: toml::Value = toml::from_str("name = \"Broken\"").unwrap();
        config.site.menu_links = vec![broken];

        assert!(build_site(&config).is_err());
        assert!(!config.build.output.exists());
    }

    #[test]
    fn test_build_site_invalid_front_matter_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let config = offline_config(tmp.path());
        write_content(&config.build.content, "bad.html", "+++\ndate = \"nope\"\n+++\nbody");

        assert!(build_site(&config).is_err());
    }

    #[test]
    fn test_build_site_clean_clears_stale_output() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = offline_config(tmp.path());
        config.build.clean = true;
        write_content(&config.build.content, "a.html", "<p>a</p>");

        let stale = config.build.output.join("stale/index.html");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        build_site(&config).unwrap();

        assert!(!stale.exists());
        assert!(config.build.output.join("a/index.html").exists());
    }

    #[test]
    fn test_build_site_ingests_projects() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/projects/projectgroups/Web2%202020/public")
            .with_status(200)
            .with_body(r#"[{"name": "A", "projectGroupName": "Web2 2020"}]"#)
            .create();

        let tmp = tempfile::tempdir().unwrap();
        let mut config = offline_config(tmp.path());
        write_content(&config.build.content, "index.html", "<h1>home</h1>");
        config.api.enable = true;
        config.api.base_url = Some(format!("{}/", server.url()));
        config.api.project_groups = vec!["Web2 2020".into()];

        let summary = build_site(&config).unwrap();

        assert_eq!(summary.projects, 1);
        let raw =
            fs::read_to_string(config.build.output.join("_data/projects.json")).unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["id"], serde_json::json!("Web2 20200"));
    }

    #[test]
    fn test_build_site_failed_ingestion_fails_build() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/projects/projectgroups/web2/public")
            .with_status(500)
            .create();

        let tmp = tempfile::tempdir().unwrap();
        let mut config = offline_config(tmp.path());
        write_content(&config.build.content, "index.html", "<h1>home</h1>");
        config.api.enable = true;
        config.api.base_url = Some(format!("{}/", server.url()));
        config.api.project_groups = vec!["web2".into()];

        assert!(build_site(&config).is_err());
        // Failure happened before the render phase touched the output
        assert!(!config.build.output.join("index.html").exists());
    }

    #[test]
    fn test_prepare_output_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("nested/public");

        prepare_output(&output, false).unwrap();
        assert!(output.is_dir());

        // Idempotent
        prepare_output(&output, false).unwrap();
        assert!(output.is_dir());
    }
}
