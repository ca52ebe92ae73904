//! Content records and their identifiers.

use crate::value::FieldValue;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Declares a string newtype identifier with the usual conversions.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id! {
    /// Identifier of a content node, unique within its collection.
    ///
    /// Ordering is plain string ordering; the query stage uses it as the
    /// final tie-breaker.
    NodeId
}

string_id! {
    /// Name of a content collection (e.g. `blog`).
    CollectionId
}

/// Structured metadata attached to a content record.
///
/// `path`, `title` and `date` are the fields every collection knows about;
/// anything else lives in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub path: Option<String>,
    pub title: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    pub extra: BTreeMap<String, FieldValue>,
}

impl FrontMatter {
    /// Look up a front-matter field by name.
    ///
    /// Known fields are returned as typed values, all other names are
    /// looked up in `extra`.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "path" => self.path.clone().map(FieldValue::Text),
            "title" => self.title.clone().map(FieldValue::Text),
            "date" => self.date.map(FieldValue::Date),
            _ => self.extra.get(name).cloned(),
        }
    }
}

/// A single read-only content record, e.g. one blog post.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    pub id: NodeId,
    pub frontmatter: FrontMatter,
    /// Raw content body, shared between snapshot copies.
    pub body: Arc<str>,
}

impl ContentNode {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            frontmatter: FrontMatter::default(),
            body: Arc::from(""),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.frontmatter.path = Some(path.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.frontmatter.title = Some(title.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.frontmatter.date = Some(date);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.frontmatter.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Arc::from(body);
        self
    }

    /// Resolve a field for querying.
    ///
    /// `id` resolves to the node id; everything else goes through
    /// [`FrontMatter::field`].
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Text(self.id.as_str().to_owned())),
            _ => self.frontmatter.field(name),
        }
    }
}
