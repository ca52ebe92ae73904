//! Core stages of the content-to-page build pipeline.
//!
//! ```text
//! ContentSource ──► query::run ──► PageBinder ──► BuildEmitter ──► Manifest
//!   (snapshot)     (filter/sort/    (path +        (path            (renderer)
//!                    limit)          template +     uniqueness)
//!                                    context)
//! ```
//!
//! One pipeline runs per content collection. Each produces a
//! [`CollectionBatch`]; all batches meet in a single [`BuildEmitter`], which
//! either returns a complete [`Manifest`] or fails the build.
//!
//! # Example
//!
//! ```
//! use folio_core::{
//!     BuildEmitter, CancelFlag, ContentNode, MemorySource, PageBinder, QuerySpec, SortOrder,
//!     fetch, query, parse_date,
//! };
//!
//! let source = MemorySource::new().with_collection(
//!     "blog",
//!     [ContentNode::new("hello.md")
//!         .with_path("/blog/hello")
//!         .with_date(parse_date("2020-01-03").unwrap())],
//! );
//!
//! let snapshot = fetch(&source, &"blog".into(), &CancelFlag::new()).unwrap();
//! let spec = QuerySpec::new("date", SortOrder::Desc).with_limit(1000);
//! let nodes = query::run(snapshot.iter().cloned(), &spec).unwrap();
//! let outcome = PageBinder::new("blog", "templates/post").bind_all(&nodes).unwrap();
//! let manifest = BuildEmitter::new().accept(outcome.batch).emit().unwrap();
//!
//! assert_eq!(manifest.paths().collect::<Vec<_>>(), ["/blog/hello"]);
//! ```

pub mod binder;
pub mod emitter;
pub mod error;
pub mod node;
pub mod query;
pub mod source;
pub mod state;
pub mod value;

pub use binder::{
    BindOutcome, Context, ContextFn, MissingPathPolicy, PageBinder, PageDirective, Provenance,
    RouteError, TemplateRef, identity_context, normalize_route,
};
pub use emitter::{BuildEmitter, CollectionBatch, Manifest, emit};
pub use error::{ErrorKind, PipelineError, Result};
pub use node::{CollectionId, ContentNode, FrontMatter, NodeId};
pub use query::{Filter, QueryError, QuerySpec, SortKey, SortOrder};
pub use source::{CancelFlag, ContentSource, MemorySource, Snapshot, fetch};
pub use state::BuildState;
pub use value::{FieldValue, ValueKind, parse_date};
