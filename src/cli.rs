//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vitrin static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: vitrin.toml)
    #[arg(short = 'C', long, default_value = "vitrin.toml")]
    pub config: PathBuf,

    /// Environment name, selects vitrin.<env>.toml when present
    #[arg(short, long)]
    pub env: Option<String>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the site: source content and remote projects, derive slugs,
    /// resolve the schema, render pages
    Build {
        /// Clean output directory completely before building
        #[arg(long)]
        clean: bool,

        /// Minify the html content
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        minify: Option<bool>,

        /// Skip remote project ingestion
        #[arg(long)]
        offline: bool,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_build(&self) -> bool {
        matches!(self.command, Commands::Build { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["vitrin", "build"]);
        assert!(cli.is_build());
        assert_eq!(cli.config, PathBuf::from("vitrin.toml"));
        assert_eq!(cli.env, None);
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::parse_from(["vitrin", "--env", "production", "build", "--clean", "--offline"]);
        assert_eq!(cli.env.as_deref(), Some("production"));
        let Commands::Build { clean, minify, offline } = cli.command;
        assert!(clean);
        assert!(offline);
        assert_eq!(minify, None);
    }

    #[test]
    fn test_parse_minify_toggle() {
        let cli = Cli::parse_from(["vitrin", "build", "--minify", "false"]);
        let Commands::Build { minify, .. } = cli.command;
        assert_eq!(minify, Some(false));
    }
}
