//! Pipeline error types.

use crate::binder::Provenance;
use crate::node::{CollectionId, NodeId};
use crate::query::QueryError;
use crate::state::BuildState;
use std::fmt;
use thiserror::Error;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Errors raised while turning a collection into page directives.
///
/// Every variant except [`PipelineError::MissingPath`] is fatal to the build;
/// whether a missing path is fatal depends on the binder's
/// [`MissingPathPolicy`](crate::binder::MissingPathPolicy).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("collection `{collection}`: content source unavailable: {reason}")]
    SourceUnavailable {
        collection: CollectionId,
        reason: String,
    },

    #[error("collection `{collection}`: {source}")]
    Query {
        collection: CollectionId,
        #[source]
        source: QueryError,
    },

    #[error(
        "collection `{collection}`: node `{node}` has no usable path ({reason}): {}",
        .path.as_deref().unwrap_or("<none>")
    )]
    MissingPath {
        collection: CollectionId,
        node: NodeId,
        path: Option<String>,
        reason: String,
    },

    #[error("duplicate path `{path}` produced by {first} and {second}")]
    DuplicatePath {
        path: String,
        first: Provenance,
        second: Provenance,
    },

    #[error("build cancelled")]
    Cancelled,

    #[error("invalid build state transition: {from} -> {to}")]
    InvalidTransition { from: BuildState, to: BuildState },
}

/// Stable error kind names used in build diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SourceUnavailable,
    QueryError,
    MissingPath,
    DuplicatePath,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::SourceUnavailable => "SourceUnavailable",
            Self::QueryError => "QueryError",
            Self::MissingPath => "MissingPath",
            Self::DuplicatePath => "DuplicatePath",
            Self::Cancelled => "Cancelled",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PipelineError {
    pub fn source_unavailable(collection: &CollectionId, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            collection: collection.clone(),
            reason: reason.into(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            Self::Query { .. } => ErrorKind::QueryError,
            Self::MissingPath { .. } => ErrorKind::MissingPath,
            Self::DuplicatePath { .. } => ErrorKind::DuplicatePath,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::InvalidTransition { .. } => ErrorKind::Internal,
        }
    }

    /// The collection the error belongs to, if it is local to one.
    ///
    /// Duplicate paths span collections and report both sides in the message.
    pub const fn collection(&self) -> Option<&CollectionId> {
        match self {
            Self::SourceUnavailable { collection, .. }
            | Self::Query { collection, .. }
            | Self::MissingPath { collection, .. } => Some(collection),
            Self::DuplicatePath { .. } | Self::Cancelled | Self::InvalidTransition { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_collection_and_node() {
        let err = PipelineError::MissingPath {
            collection: "blog".into(),
            node: "posts/a.md".into(),
            path: None,
            reason: "path is empty".into(),
        };
        let display = format!("{err}");
        assert!(display.contains("`blog`"));
        assert!(display.contains("`posts/a.md`"));
        assert!(display.contains("<none>"));
        assert_eq!(err.kind(), ErrorKind::MissingPath);
        assert_eq!(err.collection().map(CollectionId::as_str), Some("blog"));
    }

    #[test]
    fn test_duplicate_path_display() {
        let err = PipelineError::DuplicatePath {
            path: "/blog/a".into(),
            first: Provenance::node("blog", "a.md"),
            second: Provenance::node("notes", "a.md"),
        };
        let display = format!("{err}");
        assert!(display.contains("/blog/a"));
        assert!(display.contains("blog/a.md"));
        assert!(display.contains("notes/a.md"));
        assert_eq!(err.kind().name(), "DuplicatePath");
        assert!(err.collection().is_none());
    }
}
