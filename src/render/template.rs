//! Page templates.
//!
//! Templates are plain HTML files with `{{ key }}` placeholders. There is no
//! conditional or loop syntax; everything dynamic is prepared by the render
//! phase and substituted as a string. A built-in layout is used when the
//! site does not provide the default template file.

use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Template file used when a document does not pick one
pub const DEFAULT_TEMPLATE_NAME: &str = "page.html";

/// Built-in fallback layout
const BUILTIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }} - {{ site_title }}</title>
<meta name="description" content="{{ description }}">
</head>
<body>
<header>
{{ menu }}
</header>
<main data-slug="{{ slug }}">
{{ content }}
</main>
<footer>
<p>{{ site_title }}</p>
</footer>
</body>
</html>
"#;

/// A loaded page template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    /// The built-in fallback layout.
    pub fn builtin() -> Self {
        Self { source: BUILTIN_TEMPLATE.to_owned() }
    }

    /// Load a template by file name from the templates directory.
    ///
    /// The default template name falls back to the built-in layout when the
    /// file does not exist; any other missing name is an error.
    pub fn load(templates_dir: &Path, name: &str) -> Result<Self> {
        let path = templates_dir.join(name);
        if path.is_file() {
            let source = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            return Ok(Self { source });
        }
        if name == DEFAULT_TEMPLATE_NAME {
            return Ok(Self::builtin());
        }
        bail!("Template not found: {}", path.display());
    }

    /// Substitute `{{ key }}` placeholders.
    ///
    /// Unknown placeholders are left in place so a typo is visible in the
    /// output instead of silently disappearing.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let mut out = self.source.clone();
        for (key, value) in vars {
            out = out.replace(&format!("{{{{ {key} }}}}"), value);
        }
        out
    }
}
