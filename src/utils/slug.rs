//! URL slug computation for content documents.
//!
//! Maps a document's file-system location to the URL path fragment used as
//! its route. The computed slug always begins with `/`, so callers must not
//! prepend another separator when composing routes.

use std::path::Path;

/// Characters stripped from slug components
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '(', ')', '[', ']', '\'', '"', '\t', '\r', '\n',
];

/// Compute the URL slug for a content file path relative to the content dir.
///
/// The path must already have its extension stripped. A trailing `index`
/// component collapses into its parent route:
///
/// | relative | slug |
/// |----------|------|
/// | `index` | `/` |
/// | `about` | `/about` |
/// | `docs/setup` | `/docs/setup` |
/// | `docs/index` | `/docs` |
pub fn slug_from_relative(relative: &Path) -> String {
    let components: Vec<String> = relative
        .components()
        .map(|c| sanitize_component(&c.as_os_str().to_string_lossy()))
        .filter(|c| !c.is_empty())
        .collect();

    // Trailing "index" maps to the directory route
    let components = match components.last().map(String::as_str) {
        Some("index") => &components[..components.len() - 1],
        _ => &components[..],
    };

    if components.is_empty() {
        return "/".to_owned();
    }

    let mut slug = String::new();
    for component in components {
        slug.push('/');
        slug.push_str(component);
    }
    slug
}

/// Sanitize a single path component for use in a URL.
///
/// Removes forbidden characters, replaces whitespace runs with `-`, and
/// lowercases the result.
fn sanitize_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_dash = false;
    for c in text.trim().chars() {
        if FORBIDDEN_CHARS.contains(&c) {
            continue;
        }
        if c.is_whitespace() {
            if !last_was_dash {
                out.push('-');
                last_was_dash = true;
            }
            continue;
        }
        last_was_dash = false;
        for lower in c.to_lowercase() {
            out.push(lower);
        }
    }
    out.trim_matches('-').to_owned()
}
