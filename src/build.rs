//! Build orchestration.
//!
//! Runs one pipeline per configured collection and merges the results.
//!
//! # Architecture
//!
//! ```text
//! build_manifest()
//!     │
//!     ├── QUERYING    collections.par_iter()
//!     │                   └── fetch ──► query::run     (per collection)
//!     │
//!     ├── BINDING     collections.par_iter()
//!     │                   └── bind_all + index page    (per collection)
//!     │
//!     ├── VALIDATING  BuildEmitter ◄── every CollectionBatch, config order
//!     │
//!     └── EMITTED     Manifest
//! ```
//!
//! Any error moves the build to `FAILED` and no manifest is produced.

use crate::{
    config::{CollectionConfig, SiteConfig},
    listing, log,
    source::MarkdownSource,
};
use anyhow::{Result, anyhow};
use folio_core::{
    BuildEmitter, BuildState, CancelFlag, CollectionBatch, ContentNode, ContentSource, Manifest,
    PipelineError, fetch, query,
};
use rayon::prelude::*;

/// Build the manifest from the markdown content on disk.
///
/// Pipeline errors are logged with their kind; the returned error only
/// signals failure.
pub fn build_site(config: &SiteConfig, cancel: &CancelFlag) -> Result<Manifest> {
    let source = MarkdownSource::from_config(config);
    build_manifest(config, &source, cancel).map_err(|err| {
        report(&err);
        anyhow!("Build failed")
    })
}

/// Query a single collection from disk, for inspection.
pub fn query_site_collection(
    config: &SiteConfig,
    collection: &CollectionConfig,
    cancel: &CancelFlag,
) -> Result<Vec<ContentNode>> {
    let source = MarkdownSource::from_config(config);
    query_collection(collection, &source, cancel).map_err(|err| {
        report(&err);
        anyhow!("Query failed")
    })
}

fn report(err: &PipelineError) {
    log!("error"; "[{}] {}", err.kind(), err);
}

/// Run every collection pipeline against `source` and validate the union.
pub fn build_manifest<S>(
    config: &SiteConfig,
    source: &S,
    cancel: &CancelFlag,
) -> folio_core::Result<Manifest>
where
    S: ContentSource + ?Sized,
{
    let mut state = BuildState::default();

    state.advance(BuildState::Querying)?;
    let results = state.track(
        config
            .collections
            .par_iter()
            .map(|collection| query_collection(collection, source, cancel))
            .collect::<folio_core::Result<Vec<_>>>(),
    )?;

    state.advance(BuildState::Binding)?;
    let batches = state.track(
        config
            .collections
            .par_iter()
            .zip(results.par_iter())
            .map(|(collection, nodes)| bind_collection(config, collection, nodes))
            .collect::<folio_core::Result<Vec<_>>>(),
    )?;

    state.advance(BuildState::Validating)?;
    let manifest = state.track(batches.into_iter().collect::<BuildEmitter>().emit())?;

    state.advance(BuildState::Emitted)?;
    match manifest.digest() {
        Ok(digest) => log!("build"; "{} pages, digest {}", manifest.len(), &digest[..12]),
        Err(_) => log!("build"; "{} pages", manifest.len()),
    }
    Ok(manifest)
}

/// Fetch and query one collection.
fn query_collection<S>(
    collection: &CollectionConfig,
    source: &S,
    cancel: &CancelFlag,
) -> folio_core::Result<Vec<ContentNode>>
where
    S: ContentSource + ?Sized,
{
    let id = collection.id();
    let snapshot = fetch(source, &id, cancel)?;
    let nodes = query::run(snapshot.iter().cloned(), &collection.query_spec())
        .map_err(|source| PipelineError::Query {
            collection: id.clone(),
            source,
        })?;

    log!("query"; "{}: {} of {} nodes", id, nodes.len(), snapshot.len());
    Ok(nodes)
}

/// Bind a collection's query result and append its index page.
fn bind_collection(
    config: &SiteConfig,
    collection: &CollectionConfig,
    nodes: &[ContentNode],
) -> folio_core::Result<CollectionBatch> {
    let outcome = collection
        .binder(config.build.missing_path)
        .bind_all(nodes)?;
    for skipped in &outcome.skipped {
        log!("warn"; "skipped: {}", skipped);
    }

    let mut batch = outcome.batch;
    if let Some(index) = listing::index_directive(collection, config, nodes)? {
        batch.push(index);
    }
    Ok(batch)
}
