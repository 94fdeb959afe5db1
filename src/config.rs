//! Site configuration management.
//!
//! Handles loading, parsing, and validating the `vitrin.toml` configuration
//! file, including environment layering: `--env staging` (or `VITRIN_ENV`)
//! selects `vitrin.staging.toml` when present, and `VITRIN_API_URL`
//! overrides the API base URL. Both are resolved once at load time; every
//! component receives an explicit config struct afterwards.

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Environment variable selecting the environment-specific config file
pub const ENV_VAR_ENVIRONMENT: &str = "VITRIN_ENV";

/// Environment variable overriding `[api] base_url`
pub const ENV_VAR_API_URL: &str = "VITRIN_API_URL";

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Default values for serde deserialization
pub mod config_defaults {
    pub fn r#true() -> bool {
        true
    }

    pub fn r#false() -> bool {
        false
    }

    pub mod site {
        pub fn title() -> String {
            "<YOUR_SITE>".into()
        }
    }

    pub mod build {
        use std::path::PathBuf;

        pub fn root() -> Option<PathBuf> {
            None
        }
        pub fn content() -> PathBuf {
            "content".into()
        }
        pub fn templates() -> PathBuf {
            "templates".into()
        }
        pub fn output() -> PathBuf {
            "public".into()
        }
    }

    pub mod api {
        pub fn timeout_secs() -> u64 {
            30
        }
    }
}

/// `[site]` section in vitrin.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Site title
    #[serde(default = "config_defaults::site::title")]
    #[educe(Default = config_defaults::site::title())]
    pub title: String,

    /// Site description
    #[serde(default)]
    pub description: String,

    /// Canonical base URL, e.g.: "https://example.com"
    #[serde(default)]
    pub url: Option<String>,

    /// Navigation entries, resolved against the menu schema at build time.
    /// Kept as raw values so schema resolution sees exactly what the file
    /// contains.
    #[serde(default)]
    pub menu_links: Vec<toml::Value>,
}

/// `[build]` section in vitrin.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    /// Root directory path
    #[serde(default = "config_defaults::build::root")]
    #[educe(Default = config_defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content directory path (relative to root)
    #[serde(default = "config_defaults::build::content")]
    #[educe(Default = config_defaults::build::content())]
    pub content: PathBuf,

    /// Templates directory path (relative to root)
    #[serde(default = "config_defaults::build::templates")]
    #[educe(Default = config_defaults::build::templates())]
    pub templates: PathBuf,

    /// Output directory path (relative to root)
    #[serde(default = "config_defaults::build::output")]
    #[educe(Default = config_defaults::build::output())]
    pub output: PathBuf,

    /// Minify HTML output
    #[serde(default = "config_defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Clear output directory before building
    #[serde(default = "config_defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,
}

/// `[api]` section in vitrin.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSection {
    /// Ingest project records during the source phase
    #[serde(default = "config_defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// API base URL the project route is concatenated onto.
    /// Must end with a slash, e.g.: "https://api.example.com/"
    #[serde(default)]
    pub base_url: Option<String>,

    /// Project group names to ingest, e.g.: ["Web2 2020", "Web2 2021"]
    #[serde(default)]
    pub project_groups: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "config_defaults::api::timeout_secs")]
    #[educe(Default = config_defaults::api::timeout_secs())]
    pub timeout_secs: u64,
}

/// Root configuration structure representing vitrin.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Basic site information
    #[serde(default)]
    pub site: SiteSection,

    /// Build settings
    #[serde(default)]
    pub build: BuildSection,

    /// External project API settings
    #[serde(default)]
    pub api: ApiSection,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.set_root(&root);

        self.build.content = root.join(&self.build.content);
        self.build.templates = root.join(&self.build.templates);
        self.build.output = root.join(&self.build.output);

        match &cli.command {
            Commands::Build { clean, minify, offline } => {
                if *clean {
                    self.build.clean = true;
                }
                if let Some(minify) = minify {
                    self.build.minify = *minify;
                }
                if *offline {
                    self.api.enable = false;
                }
            }
        }

        // The ingestion route is concatenated onto the base, so a missing
        // trailing slash would silently corrupt the URL.
        if let Some(base_url) = &mut self.api.base_url
            && !base_url.ends_with('/')
        {
            base_url.push('/');
        }
    }

    /// Whether project ingestion should run
    pub fn ingest_enabled(&self) -> bool {
        self.api.enable && !self.api.project_groups.is_empty()
    }

    /// Validate configuration for a build
    pub fn validate(&self) -> Result<()> {
        if !self.build.content.exists() {
            bail!(ConfigError::Validation(format!(
                "[build.content] directory not found: {}",
                self.build.content.display()
            )));
        }

        if let Some(base_url) = &self.site.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[site.url] must start with http:// or https://".into()
            ));
        }

        if self.ingest_enabled() {
            match &self.api.base_url {
                None => bail!(ConfigError::Validation(
                    "[api.project_groups] is set but [api.base_url] is missing".into()
                )),
                Some(url) if !url.starts_with("http") => {
                    bail!(ConfigError::Validation(
                        "[api.base_url] must start with http:// or https://".into()
                    ))
                }
                _ => {}
            }

            if self.api.timeout_secs == 0 {
                bail!(ConfigError::Validation(
                    "[api.timeout_secs] must be greater than zero".into()
                ));
            }
        }

        Ok(())
    }
}

/// Candidate config paths, most specific first.
///
/// With an environment name, `vitrin.toml` becomes `vitrin.<env>.toml`
/// ahead of the plain file; the loader picks the first that exists.
pub fn candidate_config_paths(root: &Path, config: &Path, env: Option<&str>) -> Vec<PathBuf> {
    let base = root.join(config);
    let Some(env) = env.filter(|e| !e.is_empty()) else {
        return vec![base];
    };

    let stem = config
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let ext = config
        .extension()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let env_name = if ext.is_empty() {
        format!("{stem}.{env}")
    } else {
        format!("{stem}.{env}.{ext}")
    };
    let env_path = match config.parent() {
        Some(parent) => root.join(parent).join(env_name),
        None => root.join(env_name),
    };

    vec![env_path, base]
}

#[test]
fn validate_site_section() {
    let config = r#"
        [site]
        title = "Student Showcase"
        description = "Projects from the web cohorts"
        url = "https://showcase.example.com"
    "#;
    let config: SiteConfig = SiteConfig::from_str(config).unwrap();

    assert_eq!(config.site.title, "Student Showcase");
    assert_eq!(config.site.description, "Projects from the web cohorts");
    assert_eq!(
        config.site.url,
        Some("https://showcase.example.com".to_string())
    );
    assert!(config.site.menu_links.is_empty());
}

#[test]
fn test_site_section_defaults() {
    let config: SiteConfig = SiteConfig::from_str("").unwrap();

    assert_eq!(config.site.title, "<YOUR_SITE>");
    assert_eq!(config.site.description, "");
    assert_eq!(config.site.url, None);
}

#[test]
fn test_build_section_defaults() {
    let config: SiteConfig = SiteConfig::from_str("").unwrap();

    assert_eq!(config.build.content, PathBuf::from("content"));
    assert_eq!(config.build.templates, PathBuf::from("templates"));
    assert_eq!(config.build.output, PathBuf::from("public"));
    assert!(config.build.minify);
    assert!(!config.build.clean);
}

#[test]
fn test_api_section_defaults() {
    let config: SiteConfig = SiteConfig::from_str("").unwrap();

    assert!(config.api.enable);
    assert_eq!(config.api.base_url, None);
    assert!(config.api.project_groups.is_empty());
    assert_eq!(config.api.timeout_secs, 30);
    // No groups configured means nothing to ingest
    assert!(!config.ingest_enabled());
}

#[test]
fn test_api_section_parsing() {
    let config = r#"
        [api]
        base_url = "https://api.example.com/"
        project_groups = ["Web2 2020", "Web2 2021"]
        timeout_secs = 10
    "#;
    let config: SiteConfig = SiteConfig::from_str(config).unwrap();

    assert_eq!(
        config.api.base_url,
        Some("https://api.example.com/".to_string())
    );
    assert_eq!(config.api.project_groups, vec!["Web2 2020", "Web2 2021"]);
    assert_eq!(config.api.timeout_secs, 10);
    assert!(config.ingest_enabled());
}

#[test]
fn test_menu_links_stay_raw() {
    let config = r#"
        [[site.menu_links]]
        name = "Home"
        link = "/"
    "#;
    let config: SiteConfig = SiteConfig::from_str(config).unwrap();

    assert_eq!(config.site.menu_links.len(), 1);
    let entry = config.site.menu_links[0].as_table().unwrap();
    assert_eq!(entry["name"].as_str(), Some("Home"));
    // No sub_menu key until schema resolution fills the default
    assert!(!entry.contains_key("sub_menu"));
}

#[test]
fn test_unknown_field_rejection_in_site() {
    let config = r#"
        [site]
        title = "Test"
        unknown_field = "should_fail"
    "#;
    let result = SiteConfig::from_str(config);

    assert!(result.is_err());
    let err = format!("{:#}", result.unwrap_err());
    assert!(err.contains("parsing error"));
}

#[test]
fn test_unknown_field_rejection_in_api() {
    let config = r#"
        [api]
        unknown_field = "should_fail"
    "#;
    assert!(SiteConfig::from_str(config).is_err());
}

#[test]
fn test_candidate_config_paths_no_env() {
    let paths = candidate_config_paths(Path::new("/site"), Path::new("vitrin.toml"), None);
    assert_eq!(paths, vec![PathBuf::from("/site/vitrin.toml")]);
}

#[test]
fn test_candidate_config_paths_with_env() {
    let paths = candidate_config_paths(
        Path::new("/site"),
        Path::new("vitrin.toml"),
        Some("production"),
    );
    assert_eq!(
        paths,
        vec![
            PathBuf::from("/site/vitrin.production.toml"),
            PathBuf::from("/site/vitrin.toml"),
        ]
    );
}

#[test]
fn test_candidate_config_paths_empty_env() {
    let paths = candidate_config_paths(Path::new("."), Path::new("vitrin.toml"), Some(""));
    assert_eq!(paths, vec![PathBuf::from("./vitrin.toml")]);
}

#[test]
fn test_validate_requires_base_url_for_groups() {
    let mut config = SiteConfig::default();
    config.build.content = PathBuf::from(".");
    config.api.project_groups = vec!["Web2 2020".into()];

    let err = format!("{:#}", config.validate().unwrap_err());
    assert!(err.contains("[api.base_url]"));
}

#[test]
fn test_validate_rejects_non_http_base_url() {
    let mut config = SiteConfig::default();
    config.build.content = PathBuf::from(".");
    config.api.project_groups = vec!["Web2 2020".into()];
    config.api.base_url = Some("ftp://api.example.com/".into());

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_timeout() {
    let mut config = SiteConfig::default();
    config.build.content = PathBuf::from(".");
    config.api.project_groups = vec!["Web2 2020".into()];
    config.api.base_url = Some("https://api.example.com/".into());
    config.api.timeout_secs = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_offline_skips_api_checks() {
    let mut config = SiteConfig::default();
    config.build.content = PathBuf::from(".");
    config.api.project_groups = vec!["Web2 2020".into()];
    config.api.enable = false;

    assert!(config.validate().is_ok());
}
