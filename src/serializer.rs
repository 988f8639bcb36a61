//! Document record serialization: JSON Lines with handle threading.
//!
//! One record per line. [`RecordWriter::write`] appends a record and returns
//! the writer for the next append; [`RecordReader::read`] returns a
//! `(document, reader)` pair, and callers thread the returned reader into
//! subsequent reads. Stream corruption surfaces as [`Error::Serialization`]
//! with the 1-based record position; a clean end of stream is
//! [`Error::EndOfStream`] (check with [`Error::is_end_of_stream`]).
//!
//! A record carries the document's token sequence, sentence boundaries, any
//! attached dependency graphs, plus mentions and quotes. Sentence-level token
//! stores are rebuilt from the document-level token sequence on read, so
//! per-token enrichment must live on the document tokens to survive a round
//! trip.
//!
//! # Example
//!
//! ```rust
//! use annopipe::{AnnotationStore, AnnotatorRegistry, RecordReader, RecordWriter};
//!
//! let registry = AnnotatorRegistry::default();
//! let pipeline = registry
//!     .pipeline(&["tokenize", "ssplit"], &serde_json::Value::Null)
//!     .unwrap();
//! let mut doc = AnnotationStore::document("d0", "Casey is 21.");
//! pipeline.run(&mut doc).unwrap();
//!
//! let writer = RecordWriter::new(Vec::new());
//! let writer = writer.write(&doc).unwrap();
//! let bytes = writer.into_inner();
//!
//! let reader = RecordReader::new(bytes.as_slice());
//! let (restored, _reader) = reader.read().unwrap();
//! assert_eq!(restored, doc);
//! ```

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::{DependencyGraph, GraphRecord};
use crate::keys;
use crate::store::AnnotationStore;

// =============================================================================
// Record Schema
// =============================================================================

/// Serialized form of one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Surface form.
    pub word: String,
    /// Begin byte offset into the document text.
    #[serde(rename = "charBegin")]
    pub char_begin: usize,
    /// End byte offset (exclusive) into the document text.
    #[serde(rename = "charEnd")]
    pub char_end: usize,
    /// Part-of-speech tag, if tagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    /// Lemma, if lemmatized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    /// Named-entity tag, if tagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ner: Option<String>,
}

/// Serialized form of one entity mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionRecord {
    /// Named-entity tag.
    pub ner: String,
    /// Document-level token range, end exclusive.
    #[serde(rename = "tokenBegin")]
    pub token_begin: usize,
    /// One past the last token.
    #[serde(rename = "tokenEnd")]
    pub token_end: usize,
    /// Begin byte offset into the document text.
    #[serde(rename = "charBegin")]
    pub char_begin: usize,
    /// End byte offset (exclusive).
    #[serde(rename = "charEnd")]
    pub char_end: usize,
}

/// Serialized form of one sentence: boundaries, mentions, graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceRecord {
    /// Document-level token range, end exclusive.
    #[serde(rename = "tokenBegin")]
    pub token_begin: usize,
    /// One past the last token.
    #[serde(rename = "tokenEnd")]
    pub token_end: usize,
    /// Begin byte offset into the document text.
    #[serde(rename = "charBegin")]
    pub char_begin: usize,
    /// End byte offset (exclusive).
    #[serde(rename = "charEnd")]
    pub char_end: usize,
    /// Entity mentions, if the mention stage ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<MentionRecord>>,
    /// Basic dependency graph, if parsed.
    #[serde(
        rename = "basicDependencies",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub basic_dependencies: Option<GraphRecord>,
    /// Enhanced dependency graph, if parsed.
    #[serde(
        rename = "enhancedDependencies",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub enhanced_dependencies: Option<GraphRecord>,
}

/// Serialized form of one quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Begin byte offset into the document text.
    #[serde(rename = "charBegin")]
    pub char_begin: usize,
    /// End byte offset (exclusive).
    #[serde(rename = "charEnd")]
    pub char_end: usize,
    /// First sentence of the quote, inclusive.
    #[serde(rename = "sentenceBegin")]
    pub sentence_begin: usize,
    /// Last sentence of the quote, inclusive.
    #[serde(rename = "sentenceEnd")]
    pub sentence_end: usize,
    /// Speaker token range begin, when attributed.
    #[serde(
        rename = "speakerTokenBegin",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub speaker_token_begin: Option<usize>,
    /// Speaker token range end (exclusive), when attributed.
    #[serde(
        rename = "speakerTokenEnd",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub speaker_token_end: Option<usize>,
}

/// Serialized form of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Document identifier, if assigned.
    #[serde(rename = "docId", default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    /// Raw document text.
    pub text: String,
    /// Token sequence.
    pub tokens: Vec<TokenRecord>,
    /// Sentence boundaries.
    pub sentences: Vec<SentenceRecord>,
    /// Quotes, if the quote stage ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotes: Option<Vec<QuoteRecord>>,
}

// =============================================================================
// Store <-> Record Conversion
// =============================================================================

/// Flatten a document store into its record form.
pub fn document_to_record(document: &AnnotationStore) -> Result<DocumentRecord> {
    let text = document
        .get(keys::Text)
        .cloned()
        .ok_or_else(|| Error::invalid_input("document store has no text"))?;

    let tokens = document
        .get(keys::Tokens)
        .map(|tokens| tokens.iter().map(token_to_record).collect::<Result<_>>())
        .transpose()?
        .unwrap_or_default();

    let sentences = document
        .get(keys::Sentences)
        .map(|sentences| {
            sentences
                .iter()
                .map(sentence_to_record)
                .collect::<Result<_>>()
        })
        .transpose()?
        .unwrap_or_default();

    let quotes = document
        .get(keys::Quotes)
        .map(|quotes| quotes.iter().map(quote_to_record).collect::<Result<_>>())
        .transpose()?;

    Ok(DocumentRecord {
        doc_id: document.get(keys::DocId).cloned(),
        text,
        tokens,
        sentences,
        quotes,
    })
}

fn token_to_record(token: &AnnotationStore) -> Result<TokenRecord> {
    let missing = || Error::invalid_input("token store is missing a required field");
    Ok(TokenRecord {
        word: token.get(keys::Word).ok_or_else(missing)?.clone(),
        char_begin: *token.get(keys::CharBegin).ok_or_else(missing)?,
        char_end: *token.get(keys::CharEnd).ok_or_else(missing)?,
        pos: token.get(keys::PosTag).cloned(),
        lemma: token.get(keys::Lemma).cloned(),
        ner: token.get(keys::NerTag).cloned(),
    })
}

fn sentence_to_record(sentence: &AnnotationStore) -> Result<SentenceRecord> {
    let missing = || Error::invalid_input("sentence store is missing a boundary field");
    let mentions = sentence
        .get(keys::Mentions)
        .map(|mentions| {
            mentions
                .iter()
                .map(mention_to_record)
                .collect::<Result<_>>()
        })
        .transpose()?;
    Ok(SentenceRecord {
        token_begin: *sentence.get(keys::TokenBegin).ok_or_else(missing)?,
        token_end: *sentence.get(keys::TokenEnd).ok_or_else(missing)?,
        char_begin: *sentence.get(keys::CharBegin).ok_or_else(missing)?,
        char_end: *sentence.get(keys::CharEnd).ok_or_else(missing)?,
        mentions,
        basic_dependencies: sentence
            .get(keys::BasicDependencies)
            .map(DependencyGraph::to_record),
        enhanced_dependencies: sentence
            .get(keys::EnhancedDependencies)
            .map(DependencyGraph::to_record),
    })
}

fn mention_to_record(mention: &AnnotationStore) -> Result<MentionRecord> {
    let missing = || Error::invalid_input("mention store is missing a required field");
    Ok(MentionRecord {
        ner: mention.get(keys::NerTag).ok_or_else(missing)?.clone(),
        token_begin: *mention.get(keys::TokenBegin).ok_or_else(missing)?,
        token_end: *mention.get(keys::TokenEnd).ok_or_else(missing)?,
        char_begin: *mention.get(keys::CharBegin).ok_or_else(missing)?,
        char_end: *mention.get(keys::CharEnd).ok_or_else(missing)?,
    })
}

fn quote_to_record(quote: &AnnotationStore) -> Result<QuoteRecord> {
    let missing = || Error::invalid_input("quote store is missing a required field");
    Ok(QuoteRecord {
        char_begin: *quote.get(keys::CharBegin).ok_or_else(missing)?,
        char_end: *quote.get(keys::CharEnd).ok_or_else(missing)?,
        sentence_begin: *quote.get(keys::SentenceBegin).ok_or_else(missing)?,
        sentence_end: *quote.get(keys::SentenceEnd).ok_or_else(missing)?,
        speaker_token_begin: quote.get(keys::SpeakerTokenBegin).copied(),
        speaker_token_end: quote.get(keys::SpeakerTokenEnd).copied(),
    })
}

/// Rebuild a document store from its record form.
///
/// Graph records are validated while rebuilding; a dangling edge endpoint
/// fails with [`Error::GraphConsistency`].
pub fn record_to_document(record: &DocumentRecord) -> Result<AnnotationStore> {
    let text = &record.text;
    let slice = |begin: usize, end: usize| {
        text.get(begin..end).map(str::to_string).ok_or_else(|| {
            Error::invalid_input(format!(
                "span {begin}..{end} is out of bounds for a text of {} bytes",
                text.len()
            ))
        })
    };

    let mut tokens = Vec::with_capacity(record.tokens.len());
    for (index, token_record) in record.tokens.iter().enumerate() {
        let mut token = AnnotationStore::new();
        token.set(keys::Word, token_record.word.clone());
        token.set(keys::CharBegin, token_record.char_begin);
        token.set(keys::CharEnd, token_record.char_end);
        token.set(keys::TokenIndex, index);
        if let Some(pos) = &token_record.pos {
            token.set(keys::PosTag, pos.clone());
        }
        if let Some(lemma) = &token_record.lemma {
            token.set(keys::Lemma, lemma.clone());
        }
        if let Some(ner) = &token_record.ner {
            token.set(keys::NerTag, ner.clone());
        }
        tokens.push(token);
    }

    let mut sentences = Vec::with_capacity(record.sentences.len());
    for (index, sentence_record) in record.sentences.iter().enumerate() {
        let begin = sentence_record.token_begin;
        let end = sentence_record.token_end;
        if begin > end || end > tokens.len() {
            return Err(Error::invalid_input(format!(
                "sentence {index} token range {begin}..{end} is out of bounds for {} tokens",
                tokens.len()
            )));
        }

        let mut sentence = AnnotationStore::new();
        sentence.set(
            keys::Text,
            slice(sentence_record.char_begin, sentence_record.char_end)?,
        );
        sentence.set(keys::SentenceIndex, index);
        sentence.set(keys::TokenBegin, begin);
        sentence.set(keys::TokenEnd, end);
        sentence.set(keys::CharBegin, sentence_record.char_begin);
        sentence.set(keys::CharEnd, sentence_record.char_end);
        sentence.set(keys::Tokens, tokens[begin..end].to_vec());

        if let Some(mention_records) = &sentence_record.mentions {
            let mut mentions = Vec::with_capacity(mention_records.len());
            for mention_record in mention_records {
                let mut mention = AnnotationStore::new();
                mention.set(
                    keys::Text,
                    slice(mention_record.char_begin, mention_record.char_end)?,
                );
                mention.set(keys::NerTag, mention_record.ner.clone());
                mention.set(keys::TokenBegin, mention_record.token_begin);
                mention.set(keys::TokenEnd, mention_record.token_end);
                mention.set(keys::CharBegin, mention_record.char_begin);
                mention.set(keys::CharEnd, mention_record.char_end);
                mentions.push(mention);
            }
            sentence.set(keys::Mentions, mentions);
        }

        if let Some(graph_record) = &sentence_record.basic_dependencies {
            sentence.set(
                keys::BasicDependencies,
                DependencyGraph::from_record(graph_record)?,
            );
        }
        if let Some(graph_record) = &sentence_record.enhanced_dependencies {
            sentence.set(
                keys::EnhancedDependencies,
                DependencyGraph::from_record(graph_record)?,
            );
        }
        sentences.push(sentence);
    }

    let mut document = AnnotationStore::new();
    if let Some(doc_id) = &record.doc_id {
        document.set(keys::DocId, doc_id.clone());
    }
    document.set(keys::Text, text.clone());
    document.set(keys::Tokens, tokens);
    document.set(keys::Sentences, sentences);

    if let Some(quote_records) = &record.quotes {
        let mut quotes = Vec::with_capacity(quote_records.len());
        for (index, quote_record) in quote_records.iter().enumerate() {
            let mut quote = AnnotationStore::new();
            quote.set(keys::Text, slice(quote_record.char_begin, quote_record.char_end)?);
            quote.set(keys::QuoteIndex, index);
            quote.set(keys::CharBegin, quote_record.char_begin);
            quote.set(keys::CharEnd, quote_record.char_end);
            quote.set(keys::SentenceBegin, quote_record.sentence_begin);
            quote.set(keys::SentenceEnd, quote_record.sentence_end);
            if let Some(begin) = quote_record.speaker_token_begin {
                quote.set(keys::SpeakerTokenBegin, begin);
            }
            if let Some(end) = quote_record.speaker_token_end {
                quote.set(keys::SpeakerTokenEnd, end);
            }
            quotes.push(quote);
        }
        document.set(keys::Quotes, quotes);
    }

    Ok(document)
}

// =============================================================================
// Stream Handles
// =============================================================================

/// Appending writer handle for a logical record stream.
///
/// `write` consumes and returns the handle; callers thread it into the next
/// call.
#[derive(Debug)]
pub struct RecordWriter<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    /// Wrap an output handle.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Append one document record and return the handle for subsequent
    /// writes to the same stream.
    pub fn write(mut self, document: &AnnotationStore) -> Result<Self> {
        let record = document_to_record(document)?;
        let line = serde_json::to_string(&record)
            .map_err(|err| Error::serialization(self.written + 1, err.to_string()))?;
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.written += 1;
        Ok(self)
    }

    /// Number of records written so far.
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.written
    }

    /// Unwrap the underlying output handle.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reading handle for a logical record stream.
///
/// `read` consumes and returns the handle; callers thread it into subsequent
/// reads. Blank lines are skipped.
#[derive(Debug)]
pub struct RecordReader<R: BufRead> {
    inner: R,
    read: usize,
}

impl<R: BufRead> RecordReader<R> {
    /// Wrap an input handle.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self { inner, read: 0 }
    }

    /// Read one document record, returning the `(document, handle)` pair.
    ///
    /// A clean end of stream is [`Error::EndOfStream`]; a malformed record is
    /// [`Error::Serialization`] with the record's 1-based position, except
    /// that an invalid graph inside an otherwise well-formed record keeps its
    /// [`Error::GraphConsistency`] identity.
    pub fn read(mut self) -> Result<(AnnotationStore, Self)> {
        loop {
            let mut line = String::new();
            let bytes = self.inner.read_line(&mut line)?;
            if bytes == 0 {
                return Err(Error::EndOfStream);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() {
                continue;
            }
            let position = self.read + 1;

            let record: DocumentRecord = serde_json::from_str(trimmed)
                .map_err(|err| Error::serialization(position, err.to_string()))?;
            let document = record_to_document(&record).map_err(|err| match err {
                graph @ Error::GraphConsistency(_) => graph,
                other => Error::serialization(position, other.to_string()),
            })?;
            self.read = position;
            return Ok((document, self));
        }
    }

    /// Number of records read so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.read
    }

    /// Unwrap the underlying input handle.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

// =============================================================================
// Tests
// =============================================================================
