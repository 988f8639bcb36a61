//! Annotator composition, validation, and batch execution.
//!
//! A [`Pipeline`] is an ordered stage list validated at construction: every
//! key a stage requires must be produced by some earlier stage. Validation
//! failures are [`Error::Configuration`]; a pipeline that constructs
//! successfully never raises a configuration error while executing.
//!
//! Batch execution runs documents across a fixed-size worker pool at document
//! granularity: each document is assigned to exactly one worker for its full,
//! in-order stage sequence, and no two workers ever touch the same store.
//! Results are correlated to input position, so batch output is deterministic
//! regardless of worker count. Per-document failures are caught at the worker
//! boundary and reported without aborting sibling documents.
//!
//! # Example
//!
//! ```rust
//! use annopipe::annotators::{SentenceSplitterAnnotator, TokenizerAnnotator};
//! use annopipe::{AnnotationStore, ExecutionConfig, Pipeline};
//!
//! let pipeline = Pipeline::new(vec![
//!     Box::new(TokenizerAnnotator::new()),
//!     Box::new(SentenceSplitterAnnotator::new()),
//! ])
//! .unwrap();
//!
//! let docs = vec![
//!     AnnotationStore::document("d0", "Casey is 21."),
//!     AnnotationStore::document("d1", "It rains. It pours."),
//! ];
//! let results = pipeline.run_batch(docs, &ExecutionConfig::with_workers(2));
//! assert!(results.iter().all(Result::is_ok));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::bounded;

use crate::annotator::Annotator;
use crate::error::{Error, Result};
use crate::keys::KeyId;
use crate::store::AnnotationStore;

/// Get the number of workers to default to (fallback to 4).
fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

// =============================================================================
// Cancellation
// =============================================================================

/// Cooperative cancellation handle for batch execution.
///
/// Cancelling drops queued-but-undispatched documents; a document already
/// dispatched to a worker runs to completion or failure. Dropped documents
/// are reported as [`Error::Cancelled`] in the batch output, never silently.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of undispatched work.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Execution Configuration
// =============================================================================

/// Configuration for batch execution.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Number of pool workers (at least 1).
    pub workers: usize,
    /// Stop dispatching remaining documents after the first failure.
    pub abort_on_error: bool,
    cancel: CancelToken,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: available_workers(),
            abort_on_error: false,
            cancel: CancelToken::new(),
        }
    }
}

impl ExecutionConfig {
    /// Create a config with a specific worker count.
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            ..Default::default()
        }
    }

    /// Short-circuit remaining undispatched work after the first per-document
    /// failure.
    #[must_use]
    pub fn abort_on_first_error(mut self) -> Self {
        self.abort_on_error = true;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle to this config's cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// A validated, ordered sequence of annotators.
pub struct Pipeline {
    stages: Vec<Box<dyn Annotator>>,
}

impl Pipeline {
    /// Validate `stages` and build a pipeline.
    ///
    /// Simulates the stage sequence: for each stage, every required key must
    /// already be in the union of keys produced by earlier stages. The first
    /// offending stage fails construction with [`Error::Configuration`]
    /// naming the stage and its missing keys. A cyclic requirement (a key
    /// required before any stage produces it, however the cycle is arranged)
    /// surfaces the same way, at the first stage of the cycle.
    pub fn new(stages: Vec<Box<dyn Annotator>>) -> Result<Self> {
        let mut satisfied: HashSet<KeyId> = HashSet::new();
        for stage in &stages {
            let mut missing: Vec<KeyId> = stage
                .requires()
                .iter()
                .copied()
                .filter(|key| !satisfied.contains(key))
                .collect();
            if !missing.is_empty() {
                missing.sort();
                return Err(Error::configuration(stage.name(), missing));
            }
            satisfied.extend(stage.produces().iter().copied());
        }
        Ok(Self { stages })
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|stage| stage.name())
    }

    /// The union of keys produced by all stages.
    #[must_use]
    pub fn produced_keys(&self) -> HashSet<KeyId> {
        self.stages
            .iter()
            .flat_map(|stage| stage.produces().iter().copied())
            .collect()
    }

    /// Run every stage, in order, against one document store.
    ///
    /// The store is mutated in place. A stage failure is wrapped with the
    /// failing stage's name and the document's identifier.
    pub fn run(&self, document: &mut AnnotationStore) -> Result<()> {
        for stage in &self.stages {
            let doc_id = document.doc_id_or_unknown().to_string();
            for key in stage.requires() {
                if !document.contains_id(*key) {
                    return Err(Error::annotation(
                        stage.name(),
                        doc_id.clone(),
                        format!("required key '{key}' is absent"),
                    ));
                }
            }
            stage.annotate(document).map_err(|err| match err {
                wrapped @ Error::Annotation { .. } => wrapped,
                other => Error::annotation(stage.name(), doc_id.clone(), other.to_string()),
            })?;
        }
        Ok(())
    }

    /// Run a batch of documents across a worker pool.
    ///
    /// Each document is processed whole by exactly one worker; completion
    /// order across documents is unspecified, but the returned vector is
    /// correlated to input position, so output is identical for any worker
    /// count. The call drains gracefully: it returns once every dispatched
    /// document has completed. Forced abandon is an explicit opt-in via the
    /// config's [`CancelToken`], which drops queued-but-undispatched
    /// documents (reported as [`Error::Cancelled`]).
    pub fn run_batch(
        &self,
        documents: Vec<AnnotationStore>,
        config: &ExecutionConfig,
    ) -> Vec<Result<AnnotationStore>> {
        let total = documents.len();
        if total == 0 {
            return Vec::new();
        }

        let workers = config.workers.max(1).min(total);
        if workers == 1 {
            return self.run_sequential(documents, config);
        }

        let (job_tx, job_rx) = bounded::<(usize, AnnotationStore)>(total);
        let (result_tx, result_rx) = bounded::<(usize, Result<AnnotationStore>)>(total);
        for job in documents.into_iter().enumerate() {
            // Capacity equals the batch size, so the send cannot block.
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let abort = AtomicBool::new(false);
        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let abort = &abort;
                scope.spawn(move || {
                    while let Ok((index, mut document)) = job_rx.recv() {
                        let doc_id = document.doc_id_or_unknown().to_string();
                        let outcome = if config.cancel.is_cancelled()
                            || abort.load(Ordering::SeqCst)
                        {
                            log::debug!("dropping undispatched document '{doc_id}'");
                            Err(Error::cancelled(doc_id))
                        } else {
                            match self.run(&mut document) {
                                Ok(()) => Ok(document),
                                Err(err) => {
                                    log::warn!("document '{doc_id}' failed: {err}");
                                    if config.abort_on_error {
                                        abort.store(true, Ordering::SeqCst);
                                    }
                                    Err(err)
                                }
                            }
                        };
                        let _ = result_tx.send((index, outcome));
                    }
                });
            }
        });
        drop(result_tx);

        let mut outcomes: Vec<Option<Result<AnnotationStore>>> =
            (0..total).map(|_| None).collect();
        for (index, outcome) in result_rx.iter() {
            outcomes[index] = Some(outcome);
        }
        outcomes
            .into_iter()
            .map(|slot| slot.expect("every document yields exactly one outcome"))
            .collect()
    }

    /// Single-worker execution; also the determinism oracle for the pool.
    fn run_sequential(
        &self,
        documents: Vec<AnnotationStore>,
        config: &ExecutionConfig,
    ) -> Vec<Result<AnnotationStore>> {
        let mut aborted = false;
        documents
            .into_iter()
            .map(|mut document| {
                let doc_id = document.doc_id_or_unknown().to_string();
                if aborted || config.cancel.is_cancelled() {
                    return Err(Error::cancelled(doc_id));
                }
                match self.run(&mut document) {
                    Ok(()) => Ok(document),
                    Err(err) => {
                        log::warn!("document '{doc_id}' failed: {err}");
                        if config.abort_on_error {
                            aborted = true;
                        }
                        Err(err)
                    }
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Annotator Registry
// =============================================================================

/// Constructor closure for a registered stage: one fixed configuration value
/// in, an annotator out.
pub type AnnotatorCtor =
    Box<dyn Fn(&serde_json::Value) -> Result<Box<dyn Annotator>> + Send + Sync>;

/// Explicit registry mapping stage names to annotator constructors.
///
/// Resolving a stage name to an implementation is a factory concern: each
/// entry is a closure taking one configuration value, so there is no runtime
/// signature probing. The default registry carries the crate's rule-based
/// stages.
///
/// # Example
///
/// ```rust
/// use annopipe::AnnotatorRegistry;
///
/// let registry = AnnotatorRegistry::default();
/// let pipeline = registry
///     .pipeline(&["tokenize", "ssplit", "quotes"], &serde_json::Value::Null)
///     .unwrap();
/// assert_eq!(pipeline.len(), 3);
/// ```
pub struct AnnotatorRegistry {
    ctors: HashMap<String, AnnotatorCtor>,
}

impl AnnotatorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctors: HashMap::new(),
        }
    }

    /// Register a constructor under a stage name, replacing any previous
    /// entry for that name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        ctor: impl Fn(&serde_json::Value) -> Result<Box<dyn Annotator>> + Send + Sync + 'static,
    ) {
        self.ctors.insert(name.into(), Box::new(ctor));
    }

    /// Register the crate's rule-based stages under their conventional names.
    pub fn register_defaults(&mut self) {
        use crate::annotators::{
            EntityMentionAnnotator, QuoteAnnotator, SentenceSplitterAnnotator, TokenizerAnnotator,
        };

        self.register("tokenize", |_config| Ok(Box::new(TokenizerAnnotator::new())));
        self.register("ssplit", |_config| {
            Ok(Box::new(SentenceSplitterAnnotator::new()))
        });
        self.register("mentions", |_config| {
            Ok(Box::new(EntityMentionAnnotator::new()))
        });
        self.register("quotes", |_config| Ok(Box::new(QuoteAnnotator::new())));
    }

    /// Construct the annotator registered under `name`.
    pub fn create(&self, name: &str, config: &serde_json::Value) -> Result<Box<dyn Annotator>> {
        let ctor = self.ctors.get(name).ok_or_else(|| {
            Error::invalid_input(format!("no annotator registered under name '{name}'"))
        })?;
        ctor(config)
    }

    /// Construct and validate a pipeline from registered stage names.
    pub fn pipeline(&self, names: &[&str], config: &serde_json::Value) -> Result<Pipeline> {
        let stages = names
            .iter()
            .map(|name| self.create(name, config))
            .collect::<Result<Vec<_>>>()?;
        Pipeline::new(stages)
    }

    /// Registered stage names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ctors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ctors.len()
    }

    /// True if no stage is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ctors.is_empty()
    }
}

impl Default for AnnotatorRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }
}

// =============================================================================
// Tests
// =============================================================================
