//! Site configuration management for `folio.toml`.
//!
//! # Sections
//!
//! | Section            | Purpose                                       |
//! |--------------------|-----------------------------------------------|
//! | `[site]`           | Site metadata (title)                         |
//! | `[build]`          | Content/output paths, missing-path policy     |
//! | `[[collections]]`  | One entry per content collection and query    |
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "Development Blog"
//!
//! [build]
//! content = "content"
//! output = "public"
//!
//! [[collections]]
//! name = "blog"
//! template = "templates/post"
//! limit = 1000
//! sort = { field = "date", order = "desc" }
//! ```

mod build;
mod collection;
pub mod defaults;
mod error;
mod site;

pub use collection::{CollectionConfig, IndexConfig};

use build::BuildConfig;
use error::ConfigError;
use site::SiteInfo;

use crate::cli::{Cli, Commands};
use anyhow::Result;
use educe::Educe;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub site: SiteInfo,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path.
    ///
    /// The root defaults to the directory holding the config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        if config.build.root.is_none() {
            config.build.root = path.parent().map(Path::to_path_buf);
        }
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    pub fn content_dir(&self) -> PathBuf {
        self.get_root().join(&self.build.content)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.get_root().join(&self.build.output)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir().join(&self.build.manifest)
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        if let Some(root) = &cli.root {
            self.build.root = Some(root.clone());
        }

        let build_args = match &cli.command {
            Commands::Build { build_args, output } => {
                if let Some(output) = output {
                    self.build.output = output.clone();
                }
                Some(build_args)
            }
            Commands::Check { build_args } => Some(build_args),
            Commands::Query { .. } => None,
        };

        if let Some(policy) = build_args.and_then(|args| args.missing_path_policy()) {
            self.build.missing_path = policy;
        }
    }

    /// Validate configuration state.
    pub fn validate(&self) -> Result<()> {
        if self.collections.is_empty() {
            return Err(ConfigError::Validation(format!(
                "at least one [[collections]] entry is required in `{}`",
                self.config_path.display()
            ))
            .into());
        }

        let mut names = FxHashSet::default();
        for collection in &self.collections {
            collection
                .validate()
                .map_err(|reason| ConfigError::Collection {
                    name: collection.name.clone(),
                    reason,
                })?;
            if !names.insert(collection.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate collection `{}`",
                    collection.name
                ))
                .into());
            }
        }

        let content = self.content_dir();
        if !content.is_dir() {
            return Err(ConfigError::Validation(format!(
                "content directory `{}` not found",
                content.display()
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use folio_core::MissingPathPolicy;
    use std::fs;
    use tempfile::TempDir;

    const BLOG: &str = r#"
        [[collections]]
        name = "blog"
        template = "templates/post"
    "#;

    fn site_with_content(config: &str) -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("content/blog")).unwrap();
        let path = dir.path().join("folio.toml");
        fs::write(&path, config).unwrap();
        let config = SiteConfig::from_path(&path).unwrap();
        (dir, config)
    }

    #[test]
    fn test_from_path_sets_root() {
        let (dir, config) = site_with_content(BLOG);
        assert_eq!(config.get_root(), dir.path());
        assert_eq!(config.content_dir(), dir.path().join("content"));
        assert_eq!(
            config.manifest_path(),
            dir.path().join("public").join("manifest.json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SiteConfig::from_path(Path::new("/definitely/not/here/folio.toml")).unwrap_err();
        assert!(format!("{err}").contains("failed to read"));
    }

    #[test]
    fn test_validate_requires_collections() {
        let (_dir, config) = site_with_content("[site]\ntitle = \"x\"");
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("at least one"));
    }

    #[test]
    fn test_validate_duplicate_collections() {
        let (_dir, config) = site_with_content(&format!("{BLOG}\n{BLOG}"));
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("duplicate collection `blog`"));
    }

    #[test]
    fn test_validate_missing_content_dir() {
        let mut config = SiteConfig::from_str(BLOG).unwrap();
        config.build.root = Some(PathBuf::from("/definitely/not/here"));
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("content directory"));
    }

    #[test]
    fn test_update_with_cli() {
        let mut config = SiteConfig::from_str(BLOG).unwrap();
        let cli = Cli::parse_from([
            "folio",
            "--root",
            "site",
            "build",
            "--output",
            "dist",
            "--skip-missing",
        ]);
        config.update_with_cli(&cli);

        assert_eq!(config.get_root(), Path::new("site"));
        assert_eq!(config.output_dir(), Path::new("site").join("dist"));
        assert_eq!(config.build.missing_path, MissingPathPolicy::Skip);
    }

    #[test]
    fn test_cli_strict_overrides_file() {
        let mut config =
            SiteConfig::from_str(&format!("[build]\nmissing_path = \"skip\"\n{BLOG}")).unwrap();
        let cli = Cli::parse_from(["folio", "check", "--strict"]);
        config.update_with_cli(&cli);
        assert_eq!(config.build.missing_path, MissingPathPolicy::Strict);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(SiteConfig::from_str("[serve]\nport = 1").is_err());
    }
}
