//! The closed registry of typed annotation keys.
//!
//! Every field an [`AnnotationStore`](crate::AnnotationStore) can hold is named
//! here, once, together with the type of its value. A key is a zero-sized
//! marker type implementing [`AnnotationKey`]; the associated `Value` type is
//! what `set` accepts and `get` returns for that key. Passing a value of the
//! wrong type is a compile error at the call site, not a runtime cast failure.
//!
//! # Sealed Trait Pattern
//!
//! `AnnotationKey` is sealed: it can only be implemented by marker types in
//! this module. The registry is therefore closed and known at build time,
//! which is what lets pipeline validation reason about key sets as plain
//! [`KeyId`] values.
//!
//! # Example
//!
//! ```rust
//! use annopipe::{keys, AnnotationStore};
//!
//! let mut store = AnnotationStore::new();
//! store.set(keys::Text, "Casey is 21.".to_string());
//! assert_eq!(store.get(keys::Text).map(String::as_str), Some("Casey is 21."));
//! ```

use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;
use crate::store::{AnnotationStore, AnnotationValue};

mod sealed {
    /// Sealed trait marker. Cannot be implemented outside this crate.
    pub trait Sealed {}
}

/// A typed annotation key: a unique identifier paired with its value type.
///
/// Implemented only by the zero-sized marker types in this module.
pub trait AnnotationKey: sealed::Sealed + Copy {
    /// The value type this key is paired with.
    type Value: AnnotationValue;
    /// The runtime identifier of this key.
    const ID: KeyId;
}

/// Runtime identifier for an annotation key.
///
/// Used wherever key sets are manipulated dynamically: annotator
/// `requires`/`produces` declarations, pipeline validation, and store
/// introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum KeyId {
    /// Raw text of a document, sentence, mention, or quote.
    Text,
    /// Document identifier.
    DocId,
    /// Token stores of a document or sentence.
    Tokens,
    /// Sentence stores of a document.
    Sentences,
    /// Mention stores of a sentence.
    Mentions,
    /// Quote stores of a document.
    Quotes,
    /// Surface form of a token.
    Word,
    /// Part-of-speech tag of a token.
    PosTag,
    /// Lemma of a token.
    Lemma,
    /// Named-entity tag of a token or mention.
    NerTag,
    /// Begin offset into the UTF-8 document text.
    CharBegin,
    /// End offset (exclusive) into the UTF-8 document text.
    CharEnd,
    /// Document-level index of a token.
    TokenIndex,
    /// Document-level index of a sentence.
    SentenceIndex,
    /// Document-level index of the first token of a span.
    TokenBegin,
    /// Document-level index one past the last token of a span.
    TokenEnd,
    /// Index of the first sentence of a quote (inclusive).
    SentenceBegin,
    /// Index of the last sentence of a quote (inclusive).
    SentenceEnd,
    /// Document-level index of a quote.
    QuoteIndex,
    /// Document-level index of the first speaker token of a quote.
    SpeakerTokenBegin,
    /// Document-level index one past the last speaker token of a quote.
    SpeakerTokenEnd,
    /// Basic dependency graph of a sentence.
    BasicDependencies,
    /// Enhanced dependency graph of a sentence.
    EnhancedDependencies,
}

impl KeyId {
    /// Stable lowercase name of this key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyId::Text => "text",
            KeyId::DocId => "doc_id",
            KeyId::Tokens => "tokens",
            KeyId::Sentences => "sentences",
            KeyId::Mentions => "mentions",
            KeyId::Quotes => "quotes",
            KeyId::Word => "word",
            KeyId::PosTag => "pos",
            KeyId::Lemma => "lemma",
            KeyId::NerTag => "ner",
            KeyId::CharBegin => "char_begin",
            KeyId::CharEnd => "char_end",
            KeyId::TokenIndex => "token_index",
            KeyId::SentenceIndex => "sentence_index",
            KeyId::TokenBegin => "token_begin",
            KeyId::TokenEnd => "token_end",
            KeyId::SentenceBegin => "sentence_begin",
            KeyId::SentenceEnd => "sentence_end",
            KeyId::QuoteIndex => "quote_index",
            KeyId::SpeakerTokenBegin => "speaker_token_begin",
            KeyId::SpeakerTokenEnd => "speaker_token_end",
            KeyId::BasicDependencies => "basic_dependencies",
            KeyId::EnhancedDependencies => "enhanced_dependencies",
        }
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Key Marker Types
// =============================================================================

/// Raw text. Value: `String`.
#[derive(Debug, Clone, Copy)]
pub struct Text;

/// Document identifier. Value: `String`.
#[derive(Debug, Clone, Copy)]
pub struct DocId;

/// Token stores. Value: `Vec<AnnotationStore>`.
#[derive(Debug, Clone, Copy)]
pub struct Tokens;

/// Sentence stores. Value: `Vec<AnnotationStore>`.
#[derive(Debug, Clone, Copy)]
pub struct Sentences;

/// Mention stores. Value: `Vec<AnnotationStore>`.
#[derive(Debug, Clone, Copy)]
pub struct Mentions;

/// Quote stores. Value: `Vec<AnnotationStore>`.
#[derive(Debug, Clone, Copy)]
pub struct Quotes;

/// Token surface form. Value: `String`.
#[derive(Debug, Clone, Copy)]
pub struct Word;

/// Part-of-speech tag. Value: `String`.
#[derive(Debug, Clone, Copy)]
pub struct PosTag;

/// Lemma. Value: `String`.
#[derive(Debug, Clone, Copy)]
pub struct Lemma;

/// Named-entity tag. Value: `String`.
#[derive(Debug, Clone, Copy)]
pub struct NerTag;

/// Begin offset into the document text. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct CharBegin;

/// End offset (exclusive) into the document text. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct CharEnd;

/// Document-level token index. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct TokenIndex;

/// Document-level sentence index. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct SentenceIndex;

/// First token of a span. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct TokenBegin;

/// One past the last token of a span. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct TokenEnd;

/// First sentence of a quote, inclusive. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct SentenceBegin;

/// Last sentence of a quote, inclusive. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct SentenceEnd;

/// Document-level quote index. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct QuoteIndex;

/// First speaker token of a quote. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct SpeakerTokenBegin;

/// One past the last speaker token of a quote. Value: `usize`.
#[derive(Debug, Clone, Copy)]
pub struct SpeakerTokenEnd;

/// Basic dependency graph. Value: `DependencyGraph`.
#[derive(Debug, Clone, Copy)]
pub struct BasicDependencies;

/// Enhanced dependency graph. Value: `DependencyGraph`.
#[derive(Debug, Clone, Copy)]
pub struct EnhancedDependencies;

// Implement Sealed + AnnotationKey for every marker in the registry.

impl sealed::Sealed for Text {}
impl AnnotationKey for Text {
    type Value = String;
    const ID: KeyId = KeyId::Text;
}

impl sealed::Sealed for DocId {}
impl AnnotationKey for DocId {
    type Value = String;
    const ID: KeyId = KeyId::DocId;
}

impl sealed::Sealed for Tokens {}
impl AnnotationKey for Tokens {
    type Value = Vec<AnnotationStore>;
    const ID: KeyId = KeyId::Tokens;
}

impl sealed::Sealed for Sentences {}
impl AnnotationKey for Sentences {
    type Value = Vec<AnnotationStore>;
    const ID: KeyId = KeyId::Sentences;
}

impl sealed::Sealed for Mentions {}
impl AnnotationKey for Mentions {
    type Value = Vec<AnnotationStore>;
    const ID: KeyId = KeyId::Mentions;
}

impl sealed::Sealed for Quotes {}
impl AnnotationKey for Quotes {
    type Value = Vec<AnnotationStore>;
    const ID: KeyId = KeyId::Quotes;
}

impl sealed::Sealed for Word {}
impl AnnotationKey for Word {
    type Value = String;
    const ID: KeyId = KeyId::Word;
}

impl sealed::Sealed for PosTag {}
impl AnnotationKey for PosTag {
    type Value = String;
    const ID: KeyId = KeyId::PosTag;
}

impl sealed::Sealed for Lemma {}
impl AnnotationKey for Lemma {
    type Value = String;
    const ID: KeyId = KeyId::Lemma;
}

impl sealed::Sealed for NerTag {}
impl AnnotationKey for NerTag {
    type Value = String;
    const ID: KeyId = KeyId::NerTag;
}

impl sealed::Sealed for CharBegin {}
impl AnnotationKey for CharBegin {
    type Value = usize;
    const ID: KeyId = KeyId::CharBegin;
}

impl sealed::Sealed for CharEnd {}
impl AnnotationKey for CharEnd {
    type Value = usize;
    const ID: KeyId = KeyId::CharEnd;
}

impl sealed::Sealed for TokenIndex {}
impl AnnotationKey for TokenIndex {
    type Value = usize;
    const ID: KeyId = KeyId::TokenIndex;
}

impl sealed::Sealed for SentenceIndex {}
impl AnnotationKey for SentenceIndex {
    type Value = usize;
    const ID: KeyId = KeyId::SentenceIndex;
}

impl sealed::Sealed for TokenBegin {}
impl AnnotationKey for TokenBegin {
    type Value = usize;
    const ID: KeyId = KeyId::TokenBegin;
}

impl sealed::Sealed for TokenEnd {}
impl AnnotationKey for TokenEnd {
    type Value = usize;
    const ID: KeyId = KeyId::TokenEnd;
}

impl sealed::Sealed for SentenceBegin {}
impl AnnotationKey for SentenceBegin {
    type Value = usize;
    const ID: KeyId = KeyId::SentenceBegin;
}

impl sealed::Sealed for SentenceEnd {}
impl AnnotationKey for SentenceEnd {
    type Value = usize;
    const ID: KeyId = KeyId::SentenceEnd;
}

impl sealed::Sealed for QuoteIndex {}
impl AnnotationKey for QuoteIndex {
    type Value = usize;
    const ID: KeyId = KeyId::QuoteIndex;
}

impl sealed::Sealed for SpeakerTokenBegin {}
impl AnnotationKey for SpeakerTokenBegin {
    type Value = usize;
    const ID: KeyId = KeyId::SpeakerTokenBegin;
}

impl sealed::Sealed for SpeakerTokenEnd {}
impl AnnotationKey for SpeakerTokenEnd {
    type Value = usize;
    const ID: KeyId = KeyId::SpeakerTokenEnd;
}

impl sealed::Sealed for BasicDependencies {}
impl AnnotationKey for BasicDependencies {
    type Value = DependencyGraph;
    const ID: KeyId = KeyId::BasicDependencies;
}

impl sealed::Sealed for EnhancedDependencies {}
impl AnnotationKey for EnhancedDependencies {
    type Value = DependencyGraph;
    const ID: KeyId = KeyId::EnhancedDependencies;
}
