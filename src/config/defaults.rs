//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn title() -> String {
        "My Blog".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn manifest() -> PathBuf {
        "manifest.json".into()
    }
}

// ============================================================================
// [[collections]] Defaults
// ============================================================================

pub mod collection {
    use folio_core::{SortKey, SortOrder};

    /// Newest posts first.
    pub fn sort() -> SortKey {
        SortKey::new("date", SortOrder::Desc)
    }

    /// Excerpt length of listing entries, in characters.
    pub const fn excerpt_length() -> usize {
        250
    }
}
