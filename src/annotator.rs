//! The annotator abstraction: one mutation stage of the pipeline.

use crate::error::Result;
use crate::keys::KeyId;
use crate::store::AnnotationStore;

/// A pipeline stage that reads and writes fields of an annotation store.
///
/// An annotator declares the keys it needs already populated (`requires`) and
/// the keys it populates (`produces`). Pipeline construction validates stage
/// ordering against these declarations, so a validated pipeline never
/// discovers a missing prerequisite at run time for a document that reached
/// the stage intact.
///
/// Annotators are shared read-only across worker threads; all per-document
/// state lives in the store being annotated.
pub trait Annotator: Send + Sync {
    /// Stage name, used in configuration and error reporting.
    fn name(&self) -> &str;

    /// Keys that must be populated before this stage runs.
    fn requires(&self) -> &[KeyId];

    /// Keys this stage populates.
    fn produces(&self) -> &[KeyId];

    /// Mutate `document` in place.
    ///
    /// Fails when a required key is absent or its value is structurally
    /// invalid for this stage's needs. Runs to completion or fails; there is
    /// no partial checkpointable state.
    fn annotate(&self, document: &mut AnnotationStore) -> Result<()>;
}

/// A closure-backed annotator with declared key sets.
///
/// Useful for tests and for registering small transformation stages without
/// a dedicated type.
///
/// # Example
///
/// ```rust
/// use annopipe::{keys, AnnotationStore, Annotator, FnAnnotator, KeyId};
///
/// let upcase = FnAnnotator::new("upcase", |doc: &mut AnnotationStore| {
///     let text = doc.get(keys::Text).cloned().unwrap_or_default();
///     doc.set(keys::Text, text.to_uppercase());
///     Ok(())
/// })
/// .with_requires(vec![KeyId::Text])
/// .with_produces(vec![KeyId::Text]);
///
/// let mut doc = AnnotationStore::document("d1", "hi");
/// upcase.annotate(&mut doc).unwrap();
/// assert_eq!(doc.get(keys::Text).map(String::as_str), Some("HI"));
/// ```
pub struct FnAnnotator {
    name: String,
    requires: Vec<KeyId>,
    produces: Vec<KeyId>,
    func: Box<dyn Fn(&mut AnnotationStore) -> Result<()> + Send + Sync>,
}

impl FnAnnotator {
    /// Create an annotator from a closure, with empty key sets.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&mut AnnotationStore) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            produces: Vec::new(),
            func: Box::new(func),
        }
    }

    /// Declare the keys this stage requires.
    #[must_use]
    pub fn with_requires(mut self, requires: Vec<KeyId>) -> Self {
        self.requires = requires;
        self
    }

    /// Declare the keys this stage produces.
    #[must_use]
    pub fn with_produces(mut self, produces: Vec<KeyId>) -> Self {
        self.produces = produces;
        self
    }
}

impl Annotator for FnAnnotator {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires(&self) -> &[KeyId] {
        &self.requires
    }

    fn produces(&self) -> &[KeyId] {
        &self.produces
    }

    fn annotate(&self, document: &mut AnnotationStore) -> Result<()> {
        (self.func)(document)
    }
}

impl std::fmt::Debug for FnAnnotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAnnotator")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    #[test]
    fn fn_annotator_declares_key_sets() {
        let stage = FnAnnotator::new("noop", |_| Ok(()))
            .with_requires(vec![KeyId::Tokens])
            .with_produces(vec![KeyId::Sentences]);
        assert_eq!(stage.name(), "noop");
        assert_eq!(stage.requires(), &[KeyId::Tokens]);
        assert_eq!(stage.produces(), &[KeyId::Sentences]);
    }

    #[test]
    fn fn_annotator_mutates_store() {
        let stage = FnAnnotator::new("mark", |doc: &mut AnnotationStore| {
            doc.set(keys::SentenceIndex, 7usize);
            Ok(())
        });
        let mut doc = AnnotationStore::new();
        stage.annotate(&mut doc).unwrap();
        assert_eq!(doc.get(keys::SentenceIndex), Some(&7));
    }
}
