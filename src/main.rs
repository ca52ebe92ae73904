//! Folio - builds a validated page manifest from markdown collections.

mod build;
mod cli;
mod config;
mod context;
mod listing;
mod logger;
mod render;
mod source;

use anyhow::{Context, Result, bail};
use build::{build_site, query_site_collection};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use folio_core::{CancelFlag, ContentNode};
use render::{ManifestWriter, Renderer};
use std::io::{Write, stdout};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let cancel = install_cancel_handler()?;

    match &cli.command {
        Commands::Build { .. } => {
            let manifest = build_site(&config, &cancel)?;
            ManifestWriter::new(config.manifest_path()).render(manifest)
        }
        Commands::Check { .. } => {
            let manifest = build_site(&config, &cancel)?;
            log!("check"; "{} pages ok", manifest.len());
            Ok(())
        }
        Commands::Query { collection } => {
            let Some(collection) = config.collection(collection) else {
                bail!("Unknown collection `{collection}`");
            };
            let nodes = query_site_collection(&config, collection, &cancel)?;
            print_nodes(&nodes)
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(std::path::Path::new("./"));
    let config_path = root.join(&cli.config);
    if !config_path.exists() {
        bail!("Config file not found: {}", config_path.display());
    }

    let mut config = SiteConfig::from_path(&config_path)?;
    config.update_with_cli(cli);
    config.validate()?;
    Ok(config)
}

/// Ctrl+C cancels the build at its next fetch.
fn install_cancel_handler() -> Result<CancelFlag> {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    ctrlc::set_handler(move || {
        log!("build"; "cancelling...");
        flag.cancel();
    })
    .context("Failed to set Ctrl+C handler")?;
    Ok(cancel)
}

/// One tab-separated line per node: id, path, date, title.
fn print_nodes(nodes: &[ContentNode]) -> Result<()> {
    let mut out = stdout().lock();
    for node in nodes {
        let fm = &node.frontmatter;
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            node.id,
            fm.path.as_deref().unwrap_or("-"),
            fm.date.map_or_else(|| "-".into(), |date| date.to_rfc3339()),
            fm.title.as_deref().unwrap_or(""),
        )?;
    }
    out.flush()?;
    Ok(())
}
