//! # annopipe
//!
//! Typed annotation stores, pipeline orchestration, and dependency-graph
//! serialization for NLP documents.
//!
//! A document enters as an [`AnnotationStore`] holding its raw text, is
//! mutated in place by a validated [`Pipeline`] of [`Annotator`] stages, and
//! comes out carrying token boundaries, tags, entity mentions, dependency
//! graphs, and quotes. Read-only [views](crate::views) are built on top of
//! the finished store, and the whole record round-trips through a
//! deterministic JSON Lines [serializer](crate::serializer).
//!
//! - **Typed stores**: one heterogeneous container per document, sentence,
//!   token, and mention, keyed by a closed registry of typed keys
//!   ([`keys`]). Type mismatches are compile errors, not runtime casts.
//! - **Validated pipelines**: stage ordering is checked against declared
//!   `requires`/`produces` key sets at construction; a pipeline that builds
//!   never discovers a missing prerequisite mid-run.
//! - **Document-parallel execution**: a fixed-size worker pool processes
//!   batches with index-correlated, worker-count-independent results.
//! - **Graph IR**: dependency graphs with copy-node identity bookkeeping and
//!   a canonical, diffable serialization order.
//!
//! ## Quick Start
//!
//! ```rust
//! use annopipe::{AnnotationStore, AnnotatorRegistry, DocumentView, ExecutionConfig};
//!
//! let registry = AnnotatorRegistry::default();
//! let pipeline = registry
//!     .pipeline(&["tokenize", "ssplit", "quotes"], &serde_json::Value::Null)
//!     .unwrap();
//!
//! let docs = vec![
//!     AnnotationStore::document("d0", "\"It works,\" said Casey."),
//!     AnnotationStore::document("d1", "Casey is 21."),
//! ];
//! let results = pipeline.run_batch(docs, &ExecutionConfig::with_workers(2));
//!
//! let doc = results[1].as_ref().unwrap();
//! let view = DocumentView::new(doc);
//! assert_eq!(view.sentences()[0].words(), vec!["Casey", "is", "21", "."]);
//! ```
//!
//! ## Design Philosophy
//!
//! - **Closed registries over reflection**: keys are a sealed set of typed
//!   markers; stage names resolve through an explicit constructor registry,
//!   never signature probing.
//! - **Absence is `Option`**: an unattributed quote speaker or an untagged
//!   token is an absent value, never a sentinel.
//! - **Exclusive ownership**: a store belongs to one parent and one worker;
//!   nothing in the core shares mutable state across threads.

#![warn(missing_docs)]

mod annotator;
pub mod annotators;
mod error;
pub mod graph;
pub mod keys;
mod pipeline;
pub mod serializer;
mod store;
pub mod views;

pub use annotator::{Annotator, FnAnnotator};
pub use error::{Error, Result};
pub use graph::{DependencyGraph, GraphEdge, GraphNode, GraphRecord, NodeId};
pub use keys::{AnnotationKey, KeyId};
pub use pipeline::{
    AnnotatorCtor, AnnotatorRegistry, CancelToken, ExecutionConfig, Pipeline,
};
pub use serializer::{
    document_to_record, record_to_document, DocumentRecord, RecordReader, RecordWriter,
};
pub use store::{AnnotationStore, AnnotationValue, Value};
pub use views::{DocumentView, MentionView, QuoteView, SentenceView, TokenView};

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use annopipe::prelude::*;
    //!
    //! let mut doc = AnnotationStore::document("d", "Casey is 21.");
    //! let registry = AnnotatorRegistry::default();
    //! let pipeline = registry
    //!     .pipeline(&["tokenize", "ssplit"], &serde_json::Value::Null)
    //!     .unwrap();
    //! pipeline.run(&mut doc).unwrap();
    //! assert_eq!(doc.get(keys::Tokens).unwrap().len(), 4);
    //! ```
    pub use crate::annotators::{
        EntityMentionAnnotator, QuoteAnnotator, SentenceSplitterAnnotator, TokenizerAnnotator,
    };
    pub use crate::error::{Error, Result};
    pub use crate::graph::{DependencyGraph, NodeId};
    pub use crate::keys::{self, KeyId};
    pub use crate::pipeline::{AnnotatorRegistry, CancelToken, ExecutionConfig, Pipeline};
    pub use crate::serializer::{RecordReader, RecordWriter};
    pub use crate::store::AnnotationStore;
    pub use crate::views::DocumentView;
    pub use crate::{Annotator, FnAnnotator};
}
