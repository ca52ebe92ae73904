//! Markdown content store.
//!
//! Each collection is a directory below the content root; every markdown file
//! in it (recursively) is one content node.
//!
//! ```text
//! content/
//! └── blog/                     collection "blog"
//!     ├── hello.md              node id "hello.md"
//!     └── 2020/recap.markdown   node id "2020/recap.markdown"
//! ```
//!
//! # Front Matter
//!
//! | Fence | Format |
//! |-------|--------|
//! | `---` | YAML   |
//! | `+++` | TOML   |
//!
//! `path`, `title` and `date` fill the typed front-matter fields, everything
//! else is kept as extra fields. Files without a fence have empty front
//! matter and the whole file as body.

use crate::config::{CollectionConfig, SiteConfig};
use chrono::{DateTime, FixedOffset};
use folio_core::{
    CollectionId, ContentNode, ContentSource, FieldValue, FrontMatter, PipelineError, Result,
    Snapshot, parse_date,
};
use rustc_hash::FxHashMap;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

/// File extensions treated as markdown content.
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Where and how to read one collection.
#[derive(Debug, Clone)]
struct CollectionDir {
    dir: PathBuf,
    date_fields: Vec<String>,
}

/// [`ContentSource`] over markdown files on disk.
#[derive(Debug, Clone, Default)]
pub struct MarkdownSource {
    collections: FxHashMap<CollectionId, CollectionDir>,
}

impl MarkdownSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every configured collection below the content root.
    pub fn from_config(config: &SiteConfig) -> Self {
        let content = config.content_dir();
        config
            .collections
            .iter()
            .fold(Self::new(), |source, collection| {
                source.with_collection(&content, collection)
            })
    }

    pub fn with_collection(mut self, content_root: &Path, collection: &CollectionConfig) -> Self {
        self.collections.insert(
            collection.id(),
            CollectionDir {
                dir: content_root.join(collection.dir()),
                date_fields: collection.date_fields.clone(),
            },
        );
        self
    }
}

impl ContentSource for MarkdownSource {
    fn enumerate(&self, collection: &CollectionId) -> Result<Snapshot> {
        let entry = self.collections.get(collection).ok_or_else(|| {
            PipelineError::source_unavailable(collection, "collection is not configured")
        })?;
        if !entry.dir.is_dir() {
            return Err(PipelineError::source_unavailable(
                collection,
                format!("directory `{}` not found", entry.dir.display()),
            ));
        }

        let nodes = collect_markdown_files(collection, &entry.dir)?
            .iter()
            .map(|path| read_node(collection, entry, path))
            .collect::<Result<Vec<_>>>()?;

        Snapshot::from_nodes(collection, nodes)
    }
}

/// Collect markdown files in a stable (file name) order.
fn collect_markdown_files(collection: &CollectionId, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let reason = format!("failed to walk `{}`: {err}", dir.display());
            PipelineError::source_unavailable(collection, reason)
        })?;
        let is_markdown = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext));
        if entry.file_type().is_file() && is_markdown {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_node(collection: &CollectionId, entry: &CollectionDir, path: &Path) -> Result<ContentNode> {
    let fail = |reason: String| {
        PipelineError::source_unavailable(collection, format!("`{}`: {reason}", path.display()))
    };

    let text = fs::read_to_string(path).map_err(|err| fail(format!("failed to read: {err}")))?;
    let id = node_id(&entry.dir, path).ok_or_else(|| fail("path is not valid UTF-8".into()))?;
    let (fields, body) = split_front_matter(&text).map_err(fail)?;
    let frontmatter = into_front_matter(fields, &entry.date_fields).map_err(fail)?;

    Ok(ContentNode {
        id: id.into(),
        frontmatter,
        body: Arc::from(body),
    })
}

/// Collection-relative path with forward slashes.
fn node_id(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?;
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

// ============================================================================
// Front matter
// ============================================================================

type Fields = BTreeMap<String, FieldValue>;

/// Split a document into parsed front-matter fields and body.
fn split_front_matter(text: &str) -> std::result::Result<(Fields, &str), String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for (fence, parse) in [
        ("---", parse_yaml as fn(&str) -> std::result::Result<Fields, String>),
        ("+++", parse_toml),
    ] {
        let Some((block, body)) = fenced_block(text, fence) else {
            continue;
        };
        return Ok((parse(block)?, body));
    }

    Ok((Fields::new(), text))
}

/// Find a block opened by `fence` on the first line and closed by `fence` on
/// a line of its own.
fn fenced_block<'a>(text: &'a str, fence: &str) -> Option<(&'a str, &'a str)> {
    let rest = text.strip_prefix(fence)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == fence {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((block, body));
        }
        offset += line.len();
    }
    None
}

fn parse_yaml(block: &str) -> std::result::Result<Fields, String> {
    if block.trim().is_empty() {
        return Ok(Fields::new());
    }
    let value: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| format!("invalid YAML front matter: {err}"))?;
    match yaml_to_field(value) {
        Some(FieldValue::Map(map)) => Ok(map),
        None => Ok(Fields::new()),
        Some(_) => Err("YAML front matter must be a mapping".into()),
    }
}

fn parse_toml(block: &str) -> std::result::Result<Fields, String> {
    let table: toml::Table =
        toml::from_str(block).map_err(|err| format!("invalid TOML front matter: {err}"))?;
    Ok(table
        .into_iter()
        .map(|(key, value)| (key, toml_to_field(value)))
        .collect())
}

/// `None` for YAML null, which is treated as an absent field.
fn yaml_to_field(value: serde_yaml::Value) -> Option<FieldValue> {
    use serde_yaml::Value;
    Some(match value {
        Value::Null => return None,
        Value::Bool(b) => FieldValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => FieldValue::Float(n.as_f64()?),
        },
        Value::String(s) => FieldValue::Text(s),
        Value::Sequence(items) => {
            FieldValue::List(items.into_iter().filter_map(yaml_to_field).collect())
        }
        Value::Mapping(map) => FieldValue::Map(
            map.into_iter()
                .filter_map(|(key, value)| Some((yaml_key(key)?, yaml_to_field(value)?)))
                .collect(),
        ),
        Value::Tagged(tagged) => return yaml_to_field(tagged.value),
    })
}

fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;
    match key {
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn toml_to_field(value: toml::Value) -> FieldValue {
    use toml::Value;
    match value {
        Value::String(s) => FieldValue::Text(s),
        Value::Integer(i) => FieldValue::Integer(i),
        Value::Float(f) => FieldValue::Float(f),
        Value::Boolean(b) => FieldValue::Bool(b),
        Value::Datetime(dt) => {
            let text = dt.to_string();
            parse_date(&text).map_or(FieldValue::Text(text), FieldValue::Date)
        }
        Value::Array(items) => FieldValue::List(items.into_iter().map(toml_to_field).collect()),
        Value::Table(table) => FieldValue::Map(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_field(value)))
                .collect(),
        ),
    }
}

/// Move the known keys into typed fields and parse configured date fields.
fn into_front_matter(
    mut fields: Fields,
    date_fields: &[String],
) -> std::result::Result<FrontMatter, String> {
    let path = take_text(&mut fields, "path")?;
    let title = take_text(&mut fields, "title")?;
    let date = fields.remove("date").map(|v| to_date("date", v)).transpose()?;

    for key in date_fields {
        if let Some(value) = fields.remove(key.as_str()) {
            fields.insert(key.clone(), FieldValue::Date(to_date(key, value)?));
        }
    }

    Ok(FrontMatter {
        path,
        title,
        date,
        extra: fields,
    })
}

fn take_text(fields: &mut Fields, key: &str) -> std::result::Result<Option<String>, String> {
    match fields.remove(key) {
        None => Ok(None),
        Some(FieldValue::Text(s)) => Ok(Some(s)),
        Some(other) => Err(format!("`{key}` must be a string, found {}", other.kind())),
    }
}

fn to_date(key: &str, value: FieldValue) -> std::result::Result<DateTime<FixedOffset>, String> {
    match value {
        FieldValue::Date(date) => Ok(date),
        FieldValue::Text(s) => {
            parse_date(&s).ok_or_else(|| format!("`{key}` is not a valid date: {s:?}"))
        }
        other => Err(format!("`{key}` must be a date, found {}", other.kind())),
    }
}
