//! Accumulating directives into a validated manifest.
//!
//! ```text
//!  blog pipeline ──► CollectionBatch ─┐
//!                                     ├─► BuildEmitter::accept ─► emit() ─► Manifest
//! notes pipeline ──► CollectionBatch ─┘                          (unique paths)
//! ```
//!
//! The emitter is a plain value: each collection pipeline produces its own
//! [`CollectionBatch`], and the batches are threaded into one
//! [`BuildEmitter`] after every pipeline has finished. Duplicate paths are
//! therefore detected across collections at a single point.

use crate::binder::PageDirective;
use crate::error::{PipelineError, Result};
use crate::node::CollectionId;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Directives produced by one collection pipeline, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionBatch {
    collection: CollectionId,
    directives: Vec<PageDirective>,
}

impl CollectionBatch {
    pub fn new(collection: CollectionId) -> Self {
        Self {
            collection,
            directives: Vec::new(),
        }
    }

    pub fn push(&mut self, directive: PageDirective) {
        self.directives.push(directive);
    }

    pub const fn collection(&self) -> &CollectionId {
        &self.collection
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageDirective> {
        self.directives.iter()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Accumulator for all directives of one build.
#[derive(Debug, Default)]
pub struct BuildEmitter {
    directives: Vec<PageDirective>,
}

impl BuildEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch, preserving its internal order.
    #[must_use]
    pub fn accept(mut self, batch: CollectionBatch) -> Self {
        self.directives.extend(batch.directives);
        self
    }

    /// Append loose directives, e.g. pages not tied to a collection.
    #[must_use]
    pub fn accept_directives(
        mut self,
        directives: impl IntoIterator<Item = PageDirective>,
    ) -> Self {
        self.directives.extend(directives);
        self
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Validate path uniqueness and produce the manifest.
    ///
    /// On a collision nothing is returned but the error, which names both
    /// competing directives.
    pub fn emit(self) -> Result<Manifest> {
        {
            let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
            for (index, directive) in self.directives.iter().enumerate() {
                if let Some(&first) = seen.get(directive.path.as_str()) {
                    return Err(PipelineError::DuplicatePath {
                        path: directive.path.clone(),
                        first: self.directives[first].origin.clone(),
                        second: directive.origin.clone(),
                    });
                }
                seen.insert(&directive.path, index);
            }
        }

        Ok(Manifest {
            pages: self.directives,
        })
    }
}

impl FromIterator<CollectionBatch> for BuildEmitter {
    fn from_iter<T: IntoIterator<Item = CollectionBatch>>(iter: T) -> Self {
        iter.into_iter().fold(Self::new(), Self::accept)
    }
}

/// Validate a single sequence of directives.
pub fn emit(directives: impl IntoIterator<Item = PageDirective>) -> Result<Manifest> {
    BuildEmitter::new().accept_directives(directives).emit()
}

// ============================================================================
// Manifest
// ============================================================================

/// The complete, validated, ordered set of page directives for a build.
///
/// There is no way to add, remove or reorder pages once emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    pages: Vec<PageDirective>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageDirective> {
        self.pages.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|page| page.path.as_str())
    }

    pub fn get(&self, path: &str) -> Option<&PageDirective> {
        self.pages.iter().find(|page| page.path == path)
    }

    /// Hand the directives over, consuming the manifest.
    pub fn into_directives(self) -> Vec<PageDirective> {
        self.pages
    }

    /// Pretty JSON, byte-identical for identical manifests.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// BLAKE3 hex digest of [`Manifest::to_json`].
    pub fn digest(&self) -> serde_json::Result<String> {
        let json = self.to_json()?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a PageDirective;
    type IntoIter = std::slice::Iter<'a, PageDirective>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{Context, PageBinder, Provenance, TemplateRef};
    use crate::node::ContentNode;

    fn batch(collection: &str, nodes: &[(&str, &str)]) -> CollectionBatch {
        let nodes: Vec<_> = nodes
            .iter()
            .map(|(id, path)| ContentNode::new(*id).with_path(*path))
            .collect();
        PageBinder::new(collection, "post")
            .bind_all(&nodes)
            .unwrap()
            .batch
    }

    #[test]
    fn test_emit_preserves_order_across_batches() {
        let manifest = BuildEmitter::new()
            .accept(batch("blog", &[("b", "/blog/b"), ("a", "/blog/a")]))
            .accept(batch("notes", &[("x", "/notes/x")]))
            .emit()
            .unwrap();

        let paths: Vec<_> = manifest.paths().collect();
        assert_eq!(paths, ["/blog/b", "/blog/a", "/notes/x"]);
        assert_eq!(manifest.get("/notes/x").unwrap().context["id"], "x");
    }

    #[test]
    fn test_duplicate_within_collection() {
        let err = BuildEmitter::new()
            .accept(batch("blog", &[("a", "/blog/a"), ("b", "/blog/a")]))
            .emit()
            .unwrap_err();

        let PipelineError::DuplicatePath { path, first, second } = err else {
            panic!("expected DuplicatePath");
        };
        assert_eq!(path, "/blog/a");
        assert_eq!(first, Provenance::node("blog", "a"));
        assert_eq!(second, Provenance::node("blog", "b"));
    }

    #[test]
    fn test_duplicate_across_collections() {
        let emitter: BuildEmitter = [
            batch("blog", &[("a", "/shared")]),
            batch("notes", &[("n", "/shared/")]),
        ]
        .into_iter()
        .collect();

        let err = emitter.emit().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DuplicatePath { ref first, ref second, .. }
                if first.collection.as_str() == "blog" && second.collection.as_str() == "notes"
        ));
    }

    #[test]
    fn test_trailing_slash_directives_collide() {
        let directive = |path: &str, node: &str| {
            PageDirective::new(
                path,
                TemplateRef::new("list"),
                Context::new(),
                Provenance::node("blog", node),
            )
            .unwrap()
        };

        let first = directive("/archive/", "a");
        assert_eq!(first.path(), "/archive");

        let err = BuildEmitter::new()
            .accept_directives([first, directive("/archive", "b")])
            .emit()
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DuplicatePath { ref path, .. } if path == "/archive"
        ));
    }

    #[test]
    fn test_empty_build_succeeds() {
        let manifest = BuildEmitter::new()
            .accept(CollectionBatch::new("blog".into()))
            .emit()
            .unwrap();
        assert!(manifest.is_empty());
        assert_eq!(manifest.to_json().unwrap(), "[]");
    }

    #[test]
    fn test_manifest_json_is_stable() {
        let build = || {
            emit(batch("blog", &[("a", "/a"), ("b", "/b")]).iter().cloned()).unwrap()
        };
        let first = build();
        let second = build();
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        assert_eq!(first.digest().unwrap(), second.digest().unwrap());
        assert_eq!(first.digest().unwrap().len(), 64);
    }
}
