//! `[[collections]]` configuration.
//!
//! Each entry describes one content collection and the query that selects
//! its pages.

use super::defaults;
use crate::context::{self, ContextMode};
use folio_core::{
    CollectionId, Filter, MissingPathPolicy, PageBinder, QuerySpec, SortKey, TemplateRef,
    normalize_route,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One `[[collections]]` entry in folio.toml.
///
/// # Example
/// ```toml
/// [[collections]]
/// name = "blog"
/// template = "templates/post"
/// limit = 1000
/// sort = { field = "date", order = "desc" }
/// filter = { ne = { field = "draft", value = true } }
///
/// [collections.index]
/// path = "/blog"
/// template = "templates/blog"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// Collection name, unique per site.
    pub name: String,

    /// Directory relative to `[build].content`; defaults to `name`.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Template identifier bound to every page of the collection.
    pub template: String,

    /// Which context each page directive carries.
    #[serde(default)]
    pub context: ContextMode,

    /// Extra front-matter keys parsed as dates (`date` always is).
    #[serde(default)]
    pub date_fields: Vec<String>,

    /// Maximum number of pages; unbounded when omitted.
    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default = "defaults::collection::sort")]
    pub sort: SortKey,

    #[serde(default)]
    pub filter: Filter,

    /// Optional listing page for the whole collection.
    #[serde(default)]
    pub index: Option<IndexConfig>,
}

/// `[collections.index]` - a listing page over the collection's query result.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    pub path: String,
    pub template: String,
    /// Page title; falls back to `[site].title`.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "defaults::collection::excerpt_length")]
    pub excerpt_length: usize,
}

impl CollectionConfig {
    pub fn id(&self) -> CollectionId {
        CollectionId::new(self.name.as_str())
    }

    /// Directory of the collection relative to the content root.
    pub fn dir(&self) -> &Path {
        self.dir.as_deref().unwrap_or(Path::new(&self.name))
    }

    pub fn query_spec(&self) -> QuerySpec {
        QuerySpec::from_sort(self.sort.clone())
            .with_limit_opt(self.limit)
            .with_filter(self.filter.clone())
    }

    pub fn binder(&self, policy: MissingPathPolicy) -> PageBinder {
        let binder = PageBinder::new(self.id(), TemplateRef::new(self.template.as_str()))
            .with_policy(policy);
        match self.context {
            ContextMode::Identity => binder,
            ContextMode::Frontmatter => binder.with_context(context::frontmatter_context),
        }
    }

    /// Check the parts serde cannot.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.template.trim().is_empty() {
            return Err("template must not be empty".into());
        }
        if self.limit == Some(0) {
            return Err("limit must be a positive integer".into());
        }
        if self.sort.field.trim().is_empty() {
            return Err("sort field must not be empty".into());
        }
        if let Some(index) = &self.index {
            normalize_route(&index.path)
                .map_err(|err| format!("index {err}"))?;
            if index.template.trim().is_empty() {
                return Err("index template must not be empty".into());
            }
            if index.excerpt_length == 0 {
                return Err("index excerpt_length must be positive".into());
            }
        }
        Ok(())
    }
}
