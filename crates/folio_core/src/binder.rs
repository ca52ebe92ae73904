//! Binding content nodes to page directives.
//!
//! A [`PageBinder`] is configured once per collection with a template and a
//! context function, then maps each queried node to a [`PageDirective`].
//! Binding is pure: the binder never touches the filesystem or any shared
//! state.
//!
//! # Routes
//!
//! | Input          | Result                        |
//! |----------------|-------------------------------|
//! | `/blog/a`      | `/blog/a`                     |
//! | `/blog/a/`     | `/blog/a` (trailing slash)    |
//! | `/`            | `/`                           |
//! | `blog/a`       | error: not absolute           |
//! | `/blog//a`     | error: empty segment          |
//! | `/blog/../a`   | error: dot segment            |
//! | `/blog/a?x=1`  | error: forbidden character    |

use crate::emitter::CollectionBatch;
use crate::error::{PipelineError, Result};
use crate::node::{CollectionId, ContentNode, NodeId};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, sync::Arc};
use thiserror::Error;

/// Characters that cannot appear in a route.
const FORBIDDEN_CHARS: &[char] = &['?', '#', '\\', '<', '>', '|', '"', '*'];

/// Template context handed to the renderer. Ordered for stable output.
pub type Context = BTreeMap<String, serde_json::Value>;

/// Identifier of the template that renders a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateRef(String);

impl TemplateRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TemplateRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Where a directive came from, for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub collection: CollectionId,
    /// `None` for pages generated for the collection as a whole.
    pub node: Option<NodeId>,
}

impl Provenance {
    pub fn node(collection: impl Into<CollectionId>, node: impl Into<NodeId>) -> Self {
        Self {
            collection: collection.into(),
            node: Some(node.into()),
        }
    }

    pub fn collection(collection: impl Into<CollectionId>) -> Self {
        Self {
            collection: collection.into(),
            node: None,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "`{}/{}`", self.collection, node),
            None => write!(f, "`{}` (collection page)", self.collection),
        }
    }
}

/// A resolved binding of a unique path to a template and context.
///
/// Only `path`, `template` and `context` are part of the manifest; the
/// provenance is kept for error reporting. The path can only be set through
/// [`PageDirective::new`], so it is always normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageDirective {
    pub(crate) path: String,
    pub template: TemplateRef,
    pub context: Context,
    #[serde(skip)]
    pub origin: Provenance,
}

impl PageDirective {
    /// Create a directive, validating and normalizing `path`.
    pub fn new(
        path: &str,
        template: TemplateRef,
        context: Context,
        origin: Provenance,
    ) -> Result<Self, RouteError> {
        Ok(Self {
            path: normalize_route(path)?,
            template,
            context,
            origin,
        })
    }

    /// The normalized route.
    pub fn path(&self) -> &str {
        &self.path
    }
}

// ============================================================================
// Route validation
// ============================================================================

/// Why a front-matter path is not a usable route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("path is empty")]
    Empty,
    #[error("path must start with `/`")]
    NotAbsolute,
    #[error("path contains forbidden character {0:?}")]
    ForbiddenChar(char),
    #[error("path contains an empty segment")]
    EmptySegment,
    #[error("path contains a `.` or `..` segment")]
    DotSegment,
}

/// Validate a route and strip a single trailing slash.
pub fn normalize_route(raw: &str) -> Result<String, RouteError> {
    if raw.is_empty() {
        return Err(RouteError::Empty);
    }
    if !raw.starts_with('/') {
        return Err(RouteError::NotAbsolute);
    }
    if let Some(c) = raw
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(RouteError::ForbiddenChar(c));
    }
    if raw == "/" {
        return Ok(raw.to_owned());
    }

    let trimmed = raw.strip_suffix('/').unwrap_or(raw);
    for segment in trimmed[1..].split('/') {
        match segment {
            "" => return Err(RouteError::EmptySegment),
            "." | ".." => return Err(RouteError::DotSegment),
            _ => {}
        }
    }
    Ok(trimmed.to_owned())
}

// ============================================================================
// PageBinder
// ============================================================================

/// Function producing the template context for a node.
pub type ContextFn = Arc<dyn Fn(&ContentNode) -> Context + Send + Sync>;

/// Default context: the node's identity only.
///
/// Templates look up further fields by id themselves.
pub fn identity_context(node: &ContentNode) -> Context {
    let mut context = Context::new();
    context.insert("id".to_owned(), node.id.as_str().into());
    context
}

/// What to do with a node whose path is missing or malformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPathPolicy {
    /// Fail the build on the first such node.
    #[default]
    Strict,
    /// Leave the node out and report it as skipped.
    Skip,
}

/// Result of binding a whole query result.
#[derive(Debug)]
pub struct BindOutcome {
    pub batch: CollectionBatch,
    /// `MissingPath` errors for nodes left out under [`MissingPathPolicy::Skip`].
    pub skipped: Vec<PipelineError>,
}

/// Maps nodes of one collection to page directives.
#[derive(Clone)]
pub struct PageBinder {
    collection: CollectionId,
    template: TemplateRef,
    context: ContextFn,
    policy: MissingPathPolicy,
}

impl fmt::Debug for PageBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageBinder")
            .field("collection", &self.collection)
            .field("template", &self.template)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl PageBinder {
    pub fn new(collection: impl Into<CollectionId>, template: impl Into<TemplateRef>) -> Self {
        Self {
            collection: collection.into(),
            template: template.into(),
            context: Arc::new(identity_context),
            policy: MissingPathPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_context(
        mut self,
        context: impl Fn(&ContentNode) -> Context + Send + Sync + 'static,
    ) -> Self {
        self.context = Arc::new(context);
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: MissingPathPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn collection(&self) -> &CollectionId {
        &self.collection
    }

    /// Bind a single node.
    ///
    /// Fails with [`PipelineError::MissingPath`] for this node only when its
    /// path is absent or not a well-formed route.
    pub fn bind(&self, node: &ContentNode) -> Result<PageDirective> {
        let raw = node.frontmatter.path.as_deref().unwrap_or_default();
        let origin = Provenance::node(self.collection.clone(), node.id.clone());

        PageDirective::new(raw, self.template.clone(), (self.context)(node), origin).map_err(
            |err| PipelineError::MissingPath {
                collection: self.collection.clone(),
                node: node.id.clone(),
                path: node.frontmatter.path.clone(),
                reason: err.to_string(),
            },
        )
    }

    /// Bind every node in order, applying the missing-path policy.
    pub fn bind_all<'a, I>(&self, nodes: I) -> Result<BindOutcome>
    where
        I: IntoIterator<Item = &'a ContentNode>,
    {
        let mut batch = CollectionBatch::new(self.collection.clone());
        let mut skipped = Vec::new();

        for node in nodes {
            match self.bind(node) {
                Ok(directive) => batch.push(directive),
                Err(err @ PipelineError::MissingPath { .. })
                    if self.policy == MissingPathPolicy::Skip =>
                {
                    skipped.push(err);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(BindOutcome { batch, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("/blog/a").unwrap(), "/blog/a");
        assert_eq!(normalize_route("/blog/a/").unwrap(), "/blog/a");
        assert_eq!(normalize_route("/").unwrap(), "/");
        assert_eq!(normalize_route("").unwrap_err(), RouteError::Empty);
        assert_eq!(normalize_route("blog/a").unwrap_err(), RouteError::NotAbsolute);
        assert_eq!(normalize_route("/blog//a").unwrap_err(), RouteError::EmptySegment);
        assert_eq!(normalize_route("//").unwrap_err(), RouteError::EmptySegment);
        assert_eq!(normalize_route("/blog/../a").unwrap_err(), RouteError::DotSegment);
        assert_eq!(
            normalize_route("/blog/a?x=1").unwrap_err(),
            RouteError::ForbiddenChar('?')
        );
        assert_eq!(
            normalize_route("/blog/a b").unwrap_err(),
            RouteError::ForbiddenChar(' ')
        );
    }

    #[test]
    fn test_bind_uses_path_template_and_identity_context() {
        let binder = PageBinder::new("blog", "templates/post");
        let node = ContentNode::new("hello.md").with_path("/blog/hello/");

        let directive = binder.bind(&node).unwrap();
        assert_eq!(directive.path(), "/blog/hello");
        assert_eq!(directive.template.as_str(), "templates/post");
        assert_eq!(directive.context.len(), 1);
        assert_eq!(directive.context["id"], "hello.md");
        assert_eq!(directive.origin, Provenance::node("blog", "hello.md"));
    }

    #[test]
    fn test_bind_custom_context() {
        let binder = PageBinder::new("blog", "post").with_context(|node| {
            let mut context = Context::new();
            context.insert(
                "title".into(),
                node.frontmatter.title.clone().unwrap_or_default().into(),
            );
            context
        });
        let node = ContentNode::new("a").with_path("/a").with_title("Hello");
        let directive = binder.bind(&node).unwrap();
        assert_eq!(directive.context["title"], "Hello");
        assert!(!directive.context.contains_key("id"));
    }

    #[test]
    fn test_bind_missing_path() {
        let binder = PageBinder::new("blog", "post");

        let err = binder.bind(&ContentNode::new("no-path")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingPath);

        let err = binder
            .bind(&ContentNode::new("relative").with_path("blog/x"))
            .unwrap_err();
        let PipelineError::MissingPath { node, path, reason, .. } = err else {
            panic!("expected MissingPath");
        };
        assert_eq!(node.as_str(), "relative");
        assert_eq!(path.as_deref(), Some("blog/x"));
        assert!(reason.contains("start with"));
    }

    #[test]
    fn test_bind_all_strict_fails() {
        let nodes = [
            ContentNode::new("a").with_path("/a"),
            ContentNode::new("b"),
            ContentNode::new("c").with_path("/c"),
        ];
        let err = PageBinder::new("blog", "post").bind_all(&nodes).unwrap_err();
        assert!(matches!(err, PipelineError::MissingPath { ref node, .. } if node.as_str() == "b"));
    }

    #[test]
    fn test_bind_all_skip_excludes_only_offender() {
        let nodes = [
            ContentNode::new("a").with_path("/a"),
            ContentNode::new("b").with_path(""),
            ContentNode::new("c").with_path("/c"),
        ];
        let outcome = PageBinder::new("blog", "post")
            .with_policy(MissingPathPolicy::Skip)
            .bind_all(&nodes)
            .unwrap();

        let paths: Vec<_> = outcome.batch.iter().map(PageDirective::path).collect();
        assert_eq!(paths, ["/a", "/c"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].kind(), ErrorKind::MissingPath);
    }

    #[test]
    fn test_directive_serializes_without_origin() {
        let directive = PageBinder::new("blog", "post")
            .bind(&ContentNode::new("a").with_path("/a"))
            .unwrap();
        let json = serde_json::to_value(&directive).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "path": "/a", "template": "post", "context": { "id": "a" } })
        );
    }
}
