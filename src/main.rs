//! Vitrin - a static site generator for project-showcase sites.

mod build;
mod cli;
mod config;
mod graph;
mod render;
mod schema;
mod source;
mod transform;
mod utils;

use anyhow::{Result, bail};
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Build { .. } => build_site(&config).map(|_| ()),
    }
}

/// Load and validate configuration from CLI arguments.
///
/// Environment handling happens here and nowhere else: `--env` (or
/// `VITRIN_ENV`) picks the environment-specific config file, and
/// `VITRIN_API_URL` overrides the API base URL. Components downstream only
/// ever see the explicit config struct.
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let env = cli
        .env
        .clone()
        .or_else(|| std::env::var(config::ENV_VAR_ENVIRONMENT).ok());

    let candidates = config::candidate_config_paths(root, &cli.config, env.as_deref());
    let Some(path) = candidates.iter().find(|p| p.exists()) else {
        bail!("Config file not found.");
    };

    let mut config = SiteConfig::from_path(path)?;
    config.update_with_cli(cli);

    if let Ok(url) = std::env::var(config::ENV_VAR_API_URL) {
        let url = if url.ends_with('/') { url } else { format!("{url}/") };
        config.api.base_url = Some(url);
    }

    config.validate()?;
    Ok(config)
}
