//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use folio_core::MissingPathPolicy;
use std::path::PathBuf;

/// Folio page manifest builder CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Root directory path
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file name (default: folio.toml)
    #[arg(short = 'C', long, default_value = "folio.toml", global = true)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared arguments for Build and Check commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Fail the build when a page has no usable path
    #[arg(long, conflicts_with = "skip_missing")]
    pub strict: bool,

    /// Skip pages without a usable path, logging a warning for each
    #[arg(long)]
    pub skip_missing: bool,
}

impl BuildArgs {
    /// Policy override, `None` when neither flag is given.
    pub const fn missing_path_policy(&self) -> Option<MissingPathPolicy> {
        match (self.strict, self.skip_missing) {
            (true, _) => Some(MissingPathPolicy::Strict),
            (false, true) => Some(MissingPathPolicy::Skip),
            (false, false) => None,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run every collection pipeline and write the page manifest
    Build {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Output directory path (relative to root)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run every collection pipeline and validate, without writing anything
    Check {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Print the ordered query result of one collection
    Query {
        /// Collection name as configured in folio.toml
        collection: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["folio", "build", "-o", "dist"]);
        let Commands::Build { build_args, output } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(output, Some(PathBuf::from("dist")));
        assert_eq!(build_args.missing_path_policy(), None);
        assert_eq!(cli.config, PathBuf::from("folio.toml"));
    }

    #[test]
    fn test_parse_policy_flags() {
        let cli = Cli::parse_from(["folio", "check", "--skip-missing"]);
        let Commands::Check { build_args } = cli.command else {
            panic!("expected check");
        };
        assert_eq!(build_args.missing_path_policy(), Some(MissingPathPolicy::Skip));

        let conflict = Cli::try_parse_from(["folio", "check", "--strict", "--skip-missing"]);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_parse_query_with_global_args() {
        let cli = Cli::parse_from(["folio", "query", "blog", "-C", "site.toml"]);
        assert!(matches!(cli.command, Commands::Query { ref collection } if collection == "blog"));
        assert_eq!(cli.config, PathBuf::from("site.toml"));
    }
}
