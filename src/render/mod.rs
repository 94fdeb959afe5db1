//! Render phase: pages out of the graph.
//!
//! Queries the content graph for every document node and its derived slug,
//! registers one routable page per node, then writes the pages in parallel.
//! A query failure is fatal: pages are fully collected before anything is
//! written, so a failed query produces zero output files.
//!
//! The phase also exports the graph's project nodes as
//! `<output>/_data/projects.json` for client-side consumption.

pub mod template;

use crate::{
    config::SiteConfig,
    graph::{ContentGraph, GraphError},
    schema::MenuLink,
    source::{documents::DOCUMENT_TYPE, projects::PROJECT_TYPE},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde_json::{Map, Value, json};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use template::{DEFAULT_TEMPLATE_NAME, Template};

/// Data directory name under the output root
const DATA_DIR: &str = "_data";

/// Context available to a page's template.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
}

/// A routable page: the slug is both the route and a context parameter.
#[derive(Debug, Clone)]
pub struct Page {
    pub route: String,
    pub template: String,
    pub context: PageContext,
}

/// Query the graph for all documents and build one page per node.
///
/// Fails if any document is missing its derived slug; nothing is written
/// here, so a failure leaves the output untouched.
pub fn collect_pages(graph: &ContentGraph) -> Result<Vec<Page>, GraphError> {
    graph
        .nodes_of_type(DOCUMENT_TYPE)
        .into_iter()
        .map(|node| {
            let slug = node
                .field_str("slug")
                .ok_or_else(|| GraphError::MissingField {
                    id: node.id.clone(),
                    field: "slug".to_owned(),
                })?
                .to_owned();
            Ok(Page {
                route: slug.clone(),
                template: node
                    .field_str("template")
                    .unwrap_or(DEFAULT_TEMPLATE_NAME)
                    .to_owned(),
                context: PageContext {
                    slug,
                    title: node.field_str("title").unwrap_or_default().to_owned(),
                    description: node.field_str("description").unwrap_or_default().to_owned(),
                    body: node.field_str("body").unwrap_or_default().to_owned(),
                },
            })
        })
        .collect()
}

/// Output file for a route. The slug already starts with `/`, so the route
/// maps straight under the output root: `/a` becomes `<output>/a/index.html`
/// and `/` becomes `<output>/index.html`.
pub fn route_to_output_path(output: &Path, route: &str) -> PathBuf {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        output.join("index.html")
    } else {
        output.join(trimmed).join("index.html")
    }
}

/// Render navigation HTML from resolved menu links.
///
/// Sub-menus are always lists here (the schema fills the default), so there
/// is no null-handling.
pub fn menu_html(links: &[MenuLink]) -> String {
    let mut out = String::from("<nav><ul>");
    for link in links {
        out.push_str("<li><a href=\"");
        out.push_str(&link.link);
        out.push_str("\">");
        out.push_str(&link.name);
        out.push_str("</a>");
        if !link.sub_menu.is_empty() {
            out.push_str("<ul>");
            for sub in &link.sub_menu {
                out.push_str("<li><a href=\"");
                out.push_str(sub.link.as_deref().unwrap_or("#"));
                out.push_str("\">");
                out.push_str(sub.name.as_deref().unwrap_or(""));
                out.push_str("</a></li>");
            }
            out.push_str("</ul>");
        }
        out.push_str("</li>");
    }
    out.push_str("</ul></nav>");
    out
}

/// Write all pages to the output directory in parallel.
pub fn render_pages(pages: &[Page], menu: &[MenuLink], config: &SiteConfig) -> Result<usize> {
    let menu = menu_html(menu);

    // Load each distinct template once
    let mut templates: BTreeMap<&str, Template> = BTreeMap::new();
    for page in pages {
        if !templates.contains_key(page.template.as_str()) {
            templates.insert(
                &page.template,
                Template::load(&config.build.templates, &page.template)?,
            );
        }
    }

    pages.par_iter().try_for_each(|page| {
        let template = &templates[page.template.as_str()];
        write_page(page, template, &menu, config)
            .with_context(|| format!("Failed to render page {}", page.route))
    })?;

    Ok(pages.len())
}

/// Render one page and write it to disk.
fn write_page(page: &Page, template: &Template, menu: &str, config: &SiteConfig) -> Result<()> {
    let html = template.render(&[
        ("slug", &page.context.slug),
        ("title", &page.context.title),
        ("description", &page.context.description),
        ("content", &page.context.body),
        ("menu", menu),
        ("site_title", &config.site.title),
        ("site_description", &config.site.description),
    ]);

    let bytes = if config.build.minify {
        minify_page(html.as_bytes())
    } else {
        html.into_bytes()
    };

    let path = route_to_output_path(&config.build.output, &page.route);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Minify HTML output.
fn minify_page(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    minify_html::minify(html, &cfg)
}

/// Export all project nodes as `<output>/_data/projects.json`.
///
/// Entries are sorted by id and carry the node's digest alongside the copied
/// record fields. Returns the number of exported entries.
pub fn export_projects(graph: &ContentGraph, config: &SiteConfig) -> Result<usize> {
    let mut nodes = graph.nodes_of_type(PROJECT_TYPE);
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let entries: Vec<Value> = nodes
        .iter()
        .map(|node| {
            let mut entry = Map::new();
            entry.insert("id".to_owned(), json!(node.id));
            entry.insert("contentDigest".to_owned(), json!(node.content_digest));
            for (key, value) in &node.fields {
                entry.insert(key.clone(), value.clone());
            }
            Value::Object(entry)
        })
        .collect();

    let data_dir = config.build.output.join(DATA_DIR);
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    let path = data_dir.join("projects.json");
    let json = serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_owned());
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(entries.len())
}
