//! Rule-based sentence splitter.

use crate::annotator::Annotator;
use crate::error::{Error, Result};
use crate::keys::{self, KeyId};
use crate::store::AnnotationStore;

const TERMINATORS: [&str; 3] = [".", "!", "?"];
const CLOSERS: [&str; 4] = ["\"", "\u{201d}", "'", "\u{00bb}"];

/// Groups the document's tokens into sentence stores.
///
/// A sentence ends at a terminator token (`.`, `!`, `?`); a closing quote
/// immediately after the terminator is attached to the same sentence.
/// Trailing tokens with no terminator form a final sentence.
///
/// Each sentence store carries its text slice, its document-level index, its
/// token range ([`keys::TokenBegin`]/[`keys::TokenEnd`], end exclusive), its
/// byte offsets, and its own copies of the token stores in range.
#[derive(Debug, Default, Clone, Copy)]
pub struct SentenceSplitterAnnotator;

impl SentenceSplitterAnnotator {
    /// Create a sentence splitter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Annotator for SentenceSplitterAnnotator {
    fn name(&self) -> &str {
        "ssplit"
    }

    fn requires(&self) -> &[KeyId] {
        &[KeyId::Tokens]
    }

    fn produces(&self) -> &[KeyId] {
        &[KeyId::Sentences]
    }

    fn annotate(&self, document: &mut AnnotationStore) -> Result<()> {
        let text = document
            .get(keys::Text)
            .cloned()
            .ok_or_else(|| Error::invalid_input("document store has no text"))?;
        let tokens = document
            .get(keys::Tokens)
            .cloned()
            .ok_or_else(|| Error::invalid_input("document store has no tokens"))?;

        let mut sentences = Vec::new();
        let mut begin = 0;
        let mut cursor = 0;
        while cursor < tokens.len() {
            let word = tokens[cursor]
                .get(keys::Word)
                .ok_or_else(|| Error::invalid_input("token store has no word"))?;
            let mut end = None;
            if TERMINATORS.contains(&word.as_str()) {
                let mut last = cursor;
                while last + 1 < tokens.len() {
                    match tokens[last + 1].get(keys::Word) {
                        Some(next) if CLOSERS.contains(&next.as_str()) => last += 1,
                        _ => break,
                    }
                }
                end = Some(last + 1);
            } else if cursor + 1 == tokens.len() {
                // No terminator before the text ran out.
                end = Some(cursor + 1);
            }

            if let Some(end) = end {
                sentences.push(build_sentence(&text, &tokens, begin, end, sentences.len())?);
                begin = end;
                cursor = end;
            } else {
                cursor += 1;
            }
        }

        document.set(keys::Sentences, sentences);
        Ok(())
    }
}

fn build_sentence(
    text: &str,
    tokens: &[AnnotationStore],
    begin: usize,
    end: usize,
    index: usize,
) -> Result<AnnotationStore> {
    let char_begin = *tokens[begin]
        .get(keys::CharBegin)
        .ok_or_else(|| Error::invalid_input("token store has no char offsets"))?;
    let char_end = *tokens[end - 1]
        .get(keys::CharEnd)
        .ok_or_else(|| Error::invalid_input("token store has no char offsets"))?;

    let slice = text
        .get(char_begin..char_end)
        .ok_or_else(|| Error::invalid_input("token offsets do not fall inside the text"))?;

    let mut sentence = AnnotationStore::new();
    sentence.set(keys::Text, slice.to_string());
    sentence.set(keys::SentenceIndex, index);
    sentence.set(keys::TokenBegin, begin);
    sentence.set(keys::TokenEnd, end);
    sentence.set(keys::CharBegin, char_begin);
    sentence.set(keys::CharEnd, char_end);
    sentence.set(keys::Tokens, tokens[begin..end].to_vec());
    Ok(sentence)
}
