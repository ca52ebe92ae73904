//! Content source boundary.
//!
//! A [`ContentSource`] hands out read-only [`Snapshot`]s of a collection.
//! Fetching is the only point where a build may wait on the outside world,
//! so it is also where cancellation is observed (see [`fetch`]).

use crate::error::{PipelineError, Result};
use crate::node::{CollectionId, ContentNode};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Enumerable view over content records, keyed by collection.
///
/// Implementations must return a fresh snapshot on every call and fail with
/// [`PipelineError::SourceUnavailable`] when the store cannot be read.
pub trait ContentSource: Sync {
    fn enumerate(&self, collection: &CollectionId) -> Result<Snapshot>;
}

/// An immutable batch of nodes fetched for one collection.
///
/// Cloning is cheap and iteration can be restarted at will.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    nodes: Arc<[ContentNode]>,
}

impl Snapshot {
    /// Build a snapshot, rejecting duplicate node ids.
    pub fn from_nodes(collection: &CollectionId, nodes: Vec<ContentNode>) -> Result<Self> {
        {
            let mut seen = FxHashSet::default();
            if let Some(dup) = nodes.iter().find(|node| !seen.insert(&node.id)) {
                return Err(PipelineError::source_unavailable(
                    collection,
                    format!("duplicate node id `{}`", dup.id),
                ));
            }
        }
        Ok(Self {
            nodes: nodes.into(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn as_slice(&self) -> &[ContentNode] {
        &self.nodes
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a ContentNode;
    type IntoIter = std::slice::Iter<'a, ContentNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-memory content store, mainly for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    collections: FxHashMap<CollectionId, Vec<ContentNode>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a collection.
    pub fn with_collection(
        mut self,
        collection: impl Into<CollectionId>,
        nodes: impl IntoIterator<Item = ContentNode>,
    ) -> Self {
        self.insert(collection, nodes);
        self
    }

    pub fn insert(
        &mut self,
        collection: impl Into<CollectionId>,
        nodes: impl IntoIterator<Item = ContentNode>,
    ) {
        self.collections
            .insert(collection.into(), nodes.into_iter().collect());
    }
}

impl ContentSource for MemorySource {
    fn enumerate(&self, collection: &CollectionId) -> Result<Snapshot> {
        let nodes = self.collections.get(collection).ok_or_else(|| {
            PipelineError::source_unavailable(collection, "collection is not indexed")
        })?;
        Snapshot::from_nodes(collection, nodes.clone())
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Shared cancellation flag for a build.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Fetch a snapshot, observing cancellation on both sides of the call.
pub fn fetch<S>(source: &S, collection: &CollectionId, cancel: &CancelFlag) -> Result<Snapshot>
where
    S: ContentSource + ?Sized,
{
    cancel.check()?;
    let snapshot = source.enumerate(collection)?;
    cancel.check()?;
    Ok(snapshot)
}
