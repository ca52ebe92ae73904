//! Collection index pages.
//!
//! A collection with `[collections.index]` gets one extra directive listing
//! its query result:
//!
//! ```json
//! {
//!   "collection": "blog",
//!   "title": "Development Blog",
//!   "posts": [
//!     { "id": "hello.md", "path": "/blog/hello", "title": "Hello",
//!       "date": "2020-01-03T00:00:00+00:00", "date_display": "January 03, 2020",
//!       "excerpt": "First paragraph of the post…" }
//!   ]
//! }
//! ```

use crate::config::{CollectionConfig, IndexConfig, SiteConfig};
use crate::context::format_date;
use folio_core::{
    Context, ContentNode, NodeId, PageDirective, PipelineError, Provenance, Result, TemplateRef,
    normalize_route,
};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::sync::LazyLock;

/// Build the listing directive of a collection, `None` without an index.
///
/// `nodes` must be the collection's query result; posts keep its order and
/// nodes without a valid route are left out.
pub fn index_directive(
    collection: &CollectionConfig,
    site: &SiteConfig,
    nodes: &[ContentNode],
) -> Result<Option<PageDirective>> {
    let Some(index) = &collection.index else {
        return Ok(None);
    };

    let posts = nodes
        .iter()
        .filter_map(|node| post_entry(node, index))
        .collect::<Vec<_>>();

    let title = index.title.as_deref().unwrap_or(&site.site.title);
    let mut context = Context::new();
    context.insert("collection".into(), collection.name.as_str().into());
    context.insert("title".into(), title.into());
    context.insert("posts".into(), Value::Array(posts));

    let directive = PageDirective::new(
        &index.path,
        TemplateRef::new(index.template.as_str()),
        context,
        Provenance::collection(collection.id()),
    )
    .map_err(|err| PipelineError::MissingPath {
        collection: collection.id(),
        node: NodeId::new("index"),
        path: Some(index.path.clone()),
        reason: err.to_string(),
    })?;

    Ok(Some(directive))
}

fn post_entry(node: &ContentNode, index: &IndexConfig) -> Option<Value> {
    let fm = &node.frontmatter;
    let path = normalize_route(fm.path.as_deref()?).ok()?;

    let mut entry = Map::new();
    entry.insert("id".into(), node.id.as_str().into());
    entry.insert("path".into(), path.into());
    entry.insert("title".into(), json!(fm.title));
    entry.insert("date".into(), json!(fm.date.map(|d| d.to_rfc3339())));
    entry.insert("date_display".into(), json!(fm.date.as_ref().map(format_date)));
    entry.insert("excerpt".into(), excerpt(&node.body, index.excerpt_length).into());
    Some(Value::Object(entry))
}

// ============================================================================
// Excerpts
// ============================================================================

static RE_CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^(```|~~~).*?^(```|~~~)[^\n]*$").unwrap());
static RE_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap());
static RE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static RE_HTML: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>").unwrap());
static RE_LINE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]{0,3}(#{1,6}[ \t]+|>[ \t]?|[-*+][ \t]+|\d+\.[ \t]+)").unwrap()
});
// `_` only at word edges, so `snake_case` keeps its underscore.
static RE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*~`]+|\b_+|_+\b").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Plain-text excerpt of a markdown body.
///
/// Markup is stripped and whitespace collapsed. Longer text is cut at the
/// last word boundary within `max_chars` and ends with `…`.
pub fn excerpt(markdown: &str, max_chars: usize) -> String {
    let text = RE_CODE_BLOCK.replace_all(markdown, " ");
    let text = RE_IMAGE.replace_all(&text, "$1");
    let text = RE_LINK.replace_all(&text, "$1");
    let text = RE_HTML.replace_all(&text, " ");
    let text = RE_LINE_MARKER.replace_all(&text, "");
    let text = RE_EMPHASIS.replace_all(&text, "");
    let text = RE_WHITESPACE.replace_all(text.trim(), " ");
    prune(&text, max_chars)
}

fn prune(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_owned();
    };

    let head = &text[..cut];
    // Cutting right before a space keeps the whole last word.
    let head = if text[cut..].starts_with(' ') {
        head
    } else {
        head.rfind(' ').map_or(head, |space| &head[..space])
    };
    format!("{}…", head.trim_end())
}
