//! Template context builders.
//!
//! | Mode          | Context keys                                              |
//! |---------------|-----------------------------------------------------------|
//! | `identity`    | `id`                                                      |
//! | `frontmatter` | `id`, `path`, `title`, `date`, `date_display`, extras     |

use chrono::{DateTime, FixedOffset};
use folio_core::{Context, ContentNode, identity_context};
use serde::Deserialize;

/// Display format for dates in templates, e.g. `January 03, 2020`.
const DATE_DISPLAY_FORMAT: &str = "%B %d, %Y";

/// Which context a collection's page directives carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Node identity only; templates look up the rest themselves.
    #[default]
    Identity,
    /// Identity plus every front-matter field.
    Frontmatter,
}

pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.format(DATE_DISPLAY_FORMAT).to_string()
}

/// Full front-matter context.
///
/// Known fields win over extra fields of the same name.
pub fn frontmatter_context(node: &ContentNode) -> Context {
    let fm = &node.frontmatter;
    let mut context: Context = fm
        .extra
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect();

    if let Some(path) = &fm.path {
        context.insert("path".into(), path.as_str().into());
    }
    if let Some(title) = &fm.title {
        context.insert("title".into(), title.as_str().into());
    }
    if let Some(date) = &fm.date {
        context.insert("date".into(), date.to_rfc3339().into());
        context.insert("date_display".into(), format_date(date).into());
    }
    context.extend(identity_context(node));
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{FieldValue, parse_date};

    #[test]
    fn test_format_date() {
        let date = parse_date("2020-01-03").unwrap();
        assert_eq!(format_date(&date), "January 03, 2020");
    }

    #[test]
    fn test_frontmatter_context() {
        let node = ContentNode::new("hello.md")
            .with_path("/blog/hello")
            .with_title("Hello")
            .with_date(parse_date("2020-01-03").unwrap())
            .with_extra("tags", FieldValue::List(vec!["rust".into()]))
            .with_extra("id", "shadowed");

        let context = frontmatter_context(&node);
        assert_eq!(context["id"], "hello.md");
        assert_eq!(context["path"], "/blog/hello");
        assert_eq!(context["title"], "Hello");
        assert_eq!(context["date"], "2020-01-03T00:00:00+00:00");
        assert_eq!(context["date_display"], "January 03, 2020");
        assert_eq!(context["tags"], serde_json::json!(["rust"]));
    }

    #[test]
    fn test_frontmatter_context_sparse_node() {
        let context = frontmatter_context(&ContentNode::new("bare.md"));
        assert_eq!(context.len(), 1);
        assert_eq!(context["id"], "bare.md");
    }
}
