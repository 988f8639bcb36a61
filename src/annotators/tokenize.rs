//! Rule-based tokenizer.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::annotator::Annotator;
use crate::error::{Error, Result};
use crate::keys::{self, KeyId};
use crate::store::AnnotationStore;

/// Word characters with an optional internal apostrophe ("don't"), or a
/// single non-space symbol. Offsets fall on UTF-8 boundaries because the
/// match positions do.
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\w+(?:'\w+)?|[^\w\s]").expect("token pattern is valid")
});

/// Splits document text into token stores.
///
/// Each token store carries the surface form ([`keys::Word`]), its byte
/// offsets into the document text ([`keys::CharBegin`]/[`keys::CharEnd`]),
/// and its document-level index ([`keys::TokenIndex`]).
///
/// # Example
///
/// ```rust
/// use annopipe::annotators::TokenizerAnnotator;
/// use annopipe::{keys, AnnotationStore, Annotator};
///
/// let mut doc = AnnotationStore::document("d", "Casey is 21.");
/// TokenizerAnnotator::new().annotate(&mut doc).unwrap();
/// assert_eq!(doc.get(keys::Tokens).unwrap().len(), 4);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenizerAnnotator;

impl TokenizerAnnotator {
    /// Create a tokenizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Annotator for TokenizerAnnotator {
    fn name(&self) -> &str {
        "tokenize"
    }

    fn requires(&self) -> &[KeyId] {
        // Text is an intake field, present from document creation; the
        // tokenizer is a pipeline's entry stage and requires nothing
        // produced.
        &[]
    }

    fn produces(&self) -> &[KeyId] {
        &[KeyId::Tokens]
    }

    fn annotate(&self, document: &mut AnnotationStore) -> Result<()> {
        let text = document
            .get(keys::Text)
            .cloned()
            .ok_or_else(|| Error::invalid_input("document store has no text"))?;

        let mut tokens = Vec::new();
        for (index, m) in TOKEN.find_iter(&text).enumerate() {
            let mut token = AnnotationStore::new();
            token.set(keys::Word, m.as_str().to_string());
            token.set(keys::CharBegin, m.start());
            token.set(keys::CharEnd, m.end());
            token.set(keys::TokenIndex, index);
            tokens.push(token);
        }
        document.set(keys::Tokens, tokens);
        Ok(())
    }
}
