//! `[build]` section configuration.
//!
//! Paths of the content store and the manifest, plus the missing-path policy.

use super::defaults;
use educe::Educe;
use folio_core::MissingPathPolicy;
use serde::Deserialize;
use std::path::PathBuf;

/// `[build]` section in folio.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"          # Collections live beneath this directory
/// output = "public"            # Renderer output directory
/// manifest = "manifest.json"   # Written inside `output`
/// missing_path = "skip"        # "strict" (default) or "skip"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content store directory.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Manifest file name, relative to `output`.
    #[serde(default = "defaults::build::manifest")]
    #[educe(Default = defaults::build::manifest())]
    pub manifest: PathBuf,

    /// Whether a node without a usable path fails the build or is skipped.
    pub missing_path: MissingPathPolicy,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use folio_core::MissingPathPolicy;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("[build]").unwrap();
        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.manifest, PathBuf::from("manifest.json"));
        assert_eq!(config.build.missing_path, MissingPathPolicy::Strict);
        assert!(config.build.root.is_none());
    }

    #[test]
    fn test_build_config_custom() {
        let config: SiteConfig = toml::from_str(
            r#"
            [build]
            content = "src/posts"
            output = "dist"
            manifest = "pages.json"
            missing_path = "skip"
        "#,
        )
        .unwrap();
        assert_eq!(config.build.content, PathBuf::from("src/posts"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.build.manifest, PathBuf::from("pages.json"));
        assert_eq!(config.build.missing_path, MissingPathPolicy::Skip);
    }

    #[test]
    fn test_build_config_unknown_field() {
        let result: Result<SiteConfig, _> = toml::from_str("[build]\nminify = true");
        assert!(result.is_err());
    }
}
