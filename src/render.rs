//! Renderer boundary.
//!
//! The manifest leaves the pipeline here. Turning directives into markup is
//! a renderer's job; the shipped [`ManifestWriter`] only persists them.

use crate::log;
use anyhow::{Context, Result};
use folio_core::Manifest;
use std::{fs, path::PathBuf};

/// Consumer of a validated manifest.
pub trait Renderer {
    fn render(&self, manifest: Manifest) -> Result<()>;
}

/// Writes the manifest as pretty JSON.
///
/// The file is written next to its target and renamed into place, so readers
/// never observe a partial manifest.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    path: PathBuf,
}

impl ManifestWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "manifest.json".into());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

impl Renderer for ManifestWriter {
    fn render(&self, manifest: Manifest) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = manifest.to_json().context("Failed to serialize manifest")?;
        let temp = self.temp_path();
        fs::write(&temp, json).with_context(|| format!("Failed to write {}", temp.display()))?;
        fs::rename(&temp, &self.path)
            .with_context(|| format!("Failed to move manifest to {}", self.path.display()))?;

        log!("emit"; "{} pages -> {}", manifest.len(), self.path.display());
        Ok(())
    }
}
