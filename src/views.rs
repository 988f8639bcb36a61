//! Read-only derived projections over finished annotation stores.
//!
//! Views are thin wrappers built after the pipeline finishes. They hold a
//! lookup-only back-reference to their store, never outlive it, and never
//! mutate it: the only state a view owns is a lazily-built cache of derived
//! wrappers, built once on first access and stable thereafter provided the
//! underlying store is unchanged.
//!
//! # Example
//!
//! ```rust
//! use annopipe::{AnnotationStore, AnnotatorRegistry, DocumentView};
//!
//! let registry = AnnotatorRegistry::default();
//! let pipeline = registry
//!     .pipeline(&["tokenize", "ssplit"], &serde_json::Value::Null)
//!     .unwrap();
//! let mut doc = AnnotationStore::document("d", "Casey is 21.");
//! pipeline.run(&mut doc).unwrap();
//!
//! let view = DocumentView::new(&doc);
//! assert_eq!(view.sentences().len(), 1);
//! assert_eq!(view.sentences()[0].words(), vec!["Casey", "is", "21", "."]);
//! ```

use once_cell::unsync::OnceCell;

use crate::graph::DependencyGraph;
use crate::keys;
use crate::store::AnnotationStore;

/// View over one token store.
#[derive(Debug, Clone, Copy)]
pub struct TokenView<'a> {
    store: &'a AnnotationStore,
}

impl<'a> TokenView<'a> {
    /// Wrap a token store.
    #[must_use]
    pub fn new(store: &'a AnnotationStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &'a AnnotationStore {
        self.store
    }

    /// Surface form.
    #[must_use]
    pub fn word(&self) -> Option<&'a str> {
        self.store.get(keys::Word).map(String::as_str)
    }

    /// Part-of-speech tag, if tagged.
    #[must_use]
    pub fn pos(&self) -> Option<&'a str> {
        self.store.get(keys::PosTag).map(String::as_str)
    }

    /// Lemma, if lemmatized.
    #[must_use]
    pub fn lemma(&self) -> Option<&'a str> {
        self.store.get(keys::Lemma).map(String::as_str)
    }

    /// Named-entity tag, if tagged.
    #[must_use]
    pub fn ner(&self) -> Option<&'a str> {
        self.store.get(keys::NerTag).map(String::as_str)
    }

    /// Document-level token index.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.store.get(keys::TokenIndex).copied()
    }

    /// Byte offsets into the document text.
    #[must_use]
    pub fn char_span(&self) -> Option<(usize, usize)> {
        Some((
            *self.store.get(keys::CharBegin)?,
            *self.store.get(keys::CharEnd)?,
        ))
    }
}

/// View over one mention store.
#[derive(Debug, Clone, Copy)]
pub struct MentionView<'a> {
    store: &'a AnnotationStore,
}

impl<'a> MentionView<'a> {
    /// Wrap a mention store.
    #[must_use]
    pub fn new(store: &'a AnnotationStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &'a AnnotationStore {
        self.store
    }

    /// Mention text.
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        self.store.get(keys::Text).map(String::as_str)
    }

    /// Named-entity tag.
    #[must_use]
    pub fn ner(&self) -> Option<&'a str> {
        self.store.get(keys::NerTag).map(String::as_str)
    }

    /// Document-level token range, end exclusive.
    #[must_use]
    pub fn token_span(&self) -> Option<(usize, usize)> {
        Some((
            *self.store.get(keys::TokenBegin)?,
            *self.store.get(keys::TokenEnd)?,
        ))
    }

    /// Byte offsets into the document text.
    #[must_use]
    pub fn char_span(&self) -> Option<(usize, usize)> {
        Some((
            *self.store.get(keys::CharBegin)?,
            *self.store.get(keys::CharEnd)?,
        ))
    }
}

/// View over one sentence store.
///
/// Token and mention wrapper lists are built lazily, once, on first access.
pub struct SentenceView<'a> {
    store: &'a AnnotationStore,
    tokens: OnceCell<Vec<TokenView<'a>>>,
    mentions: OnceCell<Vec<MentionView<'a>>>,
}

impl<'a> SentenceView<'a> {
    /// Wrap a sentence store.
    #[must_use]
    pub fn new(store: &'a AnnotationStore) -> Self {
        Self {
            store,
            tokens: OnceCell::new(),
            mentions: OnceCell::new(),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &'a AnnotationStore {
        self.store
    }

    /// Sentence text.
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        self.store.get(keys::Text).map(String::as_str)
    }

    /// Document-level sentence index.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.store.get(keys::SentenceIndex).copied()
    }

    /// Byte offsets into the document text.
    #[must_use]
    pub fn char_span(&self) -> Option<(usize, usize)> {
        Some((
            *self.store.get(keys::CharBegin)?,
            *self.store.get(keys::CharEnd)?,
        ))
    }

    /// Document-level token range, end exclusive.
    #[must_use]
    pub fn token_span(&self) -> Option<(usize, usize)> {
        Some((
            *self.store.get(keys::TokenBegin)?,
            *self.store.get(keys::TokenEnd)?,
        ))
    }

    /// Token views, built on first access.
    #[must_use]
    pub fn tokens(&self) -> &[TokenView<'a>] {
        self.tokens.get_or_init(|| {
            self.store
                .get(keys::Tokens)
                .map(|tokens| tokens.iter().map(TokenView::new).collect())
                .unwrap_or_default()
        })
    }

    /// Surface forms of the sentence's tokens.
    #[must_use]
    pub fn words(&self) -> Vec<&'a str> {
        self.tokens()
            .iter()
            .filter_map(TokenView::word)
            .collect()
    }

    /// Per-token part-of-speech tags.
    #[must_use]
    pub fn pos_tags(&self) -> Vec<Option<&'a str>> {
        self.tokens().iter().map(TokenView::pos).collect()
    }

    /// Per-token lemmas.
    #[must_use]
    pub fn lemmas(&self) -> Vec<Option<&'a str>> {
        self.tokens().iter().map(TokenView::lemma).collect()
    }

    /// Per-token named-entity tags.
    #[must_use]
    pub fn ner_tags(&self) -> Vec<Option<&'a str>> {
        self.tokens().iter().map(TokenView::ner).collect()
    }

    /// Mention views, built on first access.
    #[must_use]
    pub fn mentions(&self) -> &[MentionView<'a>] {
        self.mentions.get_or_init(|| {
            self.store
                .get(keys::Mentions)
                .map(|mentions| mentions.iter().map(MentionView::new).collect())
                .unwrap_or_default()
        })
    }

    /// Basic dependency graph, if parsed.
    #[must_use]
    pub fn basic_dependencies(&self) -> Option<&'a DependencyGraph> {
        self.store.get(keys::BasicDependencies)
    }

    /// Enhanced dependency graph, if parsed.
    #[must_use]
    pub fn enhanced_dependencies(&self) -> Option<&'a DependencyGraph> {
        self.store.get(keys::EnhancedDependencies)
    }
}

impl std::fmt::Debug for SentenceView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceView")
            .field("index", &self.index())
            .field("text", &self.text())
            .finish_non_exhaustive()
    }
}

/// View over one quote store.
///
/// Resolves the quote's inclusive sentence-index range into the corresponding
/// ordered sentence views at construction time. The speaker is an explicit
/// absent value when attribution found none.
pub struct QuoteView<'a> {
    store: &'a AnnotationStore,
    doc_text: Option<&'a str>,
    doc_tokens: &'a [AnnotationStore],
    doc_sentences: &'a [AnnotationStore],
    sentences: Vec<SentenceView<'a>>,
}

impl<'a> QuoteView<'a> {
    /// Wrap a quote store, resolving its sentence range against the
    /// document's sentence stores.
    #[must_use]
    pub fn new(store: &'a AnnotationStore, document: &'a AnnotationStore) -> Self {
        let doc_sentences = document
            .get(keys::Sentences)
            .map_or(&[][..], Vec::as_slice);
        let doc_tokens = document.get(keys::Tokens).map_or(&[][..], Vec::as_slice);

        let sentences = match (
            store.get(keys::SentenceBegin).copied(),
            store.get(keys::SentenceEnd).copied(),
        ) {
            (Some(begin), Some(end)) if begin <= end && end < doc_sentences.len() => {
                doc_sentences[begin..=end].iter().map(SentenceView::new).collect()
            }
            _ => Vec::new(),
        };

        Self {
            store,
            doc_text: document.get(keys::Text).map(String::as_str),
            doc_tokens,
            doc_sentences,
            sentences,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &'a AnnotationStore {
        self.store
    }

    /// Quoted text, quotation marks included.
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        self.store.get(keys::Text).map(String::as_str)
    }

    /// Document-level quote index.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.store.get(keys::QuoteIndex).copied()
    }

    /// Byte offsets into the document text.
    #[must_use]
    pub fn char_span(&self) -> Option<(usize, usize)> {
        Some((
            *self.store.get(keys::CharBegin)?,
            *self.store.get(keys::CharEnd)?,
        ))
    }

    /// Inclusive sentence-index range this quote spans.
    #[must_use]
    pub fn sentence_span(&self) -> Option<(usize, usize)> {
        Some((
            *self.store.get(keys::SentenceBegin)?,
            *self.store.get(keys::SentenceEnd)?,
        ))
    }

    /// The sentence views this quote spans, in document order.
    #[must_use]
    pub fn sentences(&self) -> &[SentenceView<'a>] {
        &self.sentences
    }

    /// Document-level token range of the attributed speaker, end exclusive.
    #[must_use]
    pub fn speaker_token_span(&self) -> Option<(usize, usize)> {
        Some((
            *self.store.get(keys::SpeakerTokenBegin)?,
            *self.store.get(keys::SpeakerTokenEnd)?,
        ))
    }

    /// Text of the attributed speaker, or `None` when unattributed.
    #[must_use]
    pub fn speaker(&self) -> Option<&'a str> {
        let (begin, end) = self.speaker_token_span()?;
        let text = self.doc_text?;
        let first = self.doc_tokens.get(begin)?;
        let last = self.doc_tokens.get(end.checked_sub(1)?)?;
        let char_begin = *first.get(keys::CharBegin)?;
        let char_end = *last.get(keys::CharEnd)?;
        text.get(char_begin..char_end)
    }

    /// The mention whose token span covers the speaker, or `None` when no
    /// mention matches.
    #[must_use]
    pub fn speaker_mention(&self) -> Option<MentionView<'a>> {
        let (begin, end) = self.speaker_token_span()?;
        for sentence in self.doc_sentences {
            let Some(mentions) = sentence.get(keys::Mentions) else {
                continue;
            };
            for mention in mentions {
                let view = MentionView::new(mention);
                if let Some((mention_begin, mention_end)) = view.token_span() {
                    if mention_begin < end && begin < mention_end {
                        return Some(view);
                    }
                }
            }
        }
        None
    }
}

impl std::fmt::Debug for QuoteView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteView")
            .field("index", &self.index())
            .field("text", &self.text())
            .field("sentence_span", &self.sentence_span())
            .finish_non_exhaustive()
    }
}

/// View over one finished document store.
///
/// Sentence and quote view lists are built lazily, once, on first access.
pub struct DocumentView<'a> {
    store: &'a AnnotationStore,
    tokens: OnceCell<Vec<TokenView<'a>>>,
    sentences: OnceCell<Vec<SentenceView<'a>>>,
    quotes: OnceCell<Vec<QuoteView<'a>>>,
}

impl<'a> DocumentView<'a> {
    /// Wrap a document store.
    #[must_use]
    pub fn new(store: &'a AnnotationStore) -> Self {
        Self {
            store,
            tokens: OnceCell::new(),
            sentences: OnceCell::new(),
            quotes: OnceCell::new(),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &'a AnnotationStore {
        self.store
    }

    /// Document text.
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        self.store.get(keys::Text).map(String::as_str)
    }

    /// Document identifier.
    #[must_use]
    pub fn doc_id(&self) -> Option<&'a str> {
        self.store.get(keys::DocId).map(String::as_str)
    }

    /// Document-level token views, built on first access.
    #[must_use]
    pub fn tokens(&self) -> &[TokenView<'a>] {
        self.tokens.get_or_init(|| {
            self.store
                .get(keys::Tokens)
                .map(|tokens| tokens.iter().map(TokenView::new).collect())
                .unwrap_or_default()
        })
    }

    /// Sentence views, built on first access.
    #[must_use]
    pub fn sentences(&self) -> &[SentenceView<'a>] {
        self.sentences.get_or_init(|| {
            self.store
                .get(keys::Sentences)
                .map(|sentences| sentences.iter().map(SentenceView::new).collect())
                .unwrap_or_default()
        })
    }

    /// Sentence view at `index`.
    #[must_use]
    pub fn sentence(&self, index: usize) -> Option<&SentenceView<'a>> {
        self.sentences().get(index)
    }

    /// Quote views, built on first access.
    #[must_use]
    pub fn quotes(&self) -> &[QuoteView<'a>] {
        self.quotes.get_or_init(|| {
            self.store
                .get(keys::Quotes)
                .map(|quotes| {
                    quotes
                        .iter()
                        .map(|quote| QuoteView::new(quote, self.store))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    /// Quote view at `index`.
    #[must_use]
    pub fn quote(&self, index: usize) -> Option<&QuoteView<'a>> {
        self.quotes().get(index)
    }
}

impl std::fmt::Debug for DocumentView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentView")
            .field("doc_id", &self.doc_id())
            .finish_non_exhaustive()
    }
}
