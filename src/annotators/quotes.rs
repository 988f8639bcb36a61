//! Quotation detection and heuristic speaker attribution.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::annotator::Annotator;
use crate::error::{Error, Result};
use crate::keys::{self, KeyId};
use crate::store::AnnotationStore;

/// Straight or curly double-quoted spans, single line.
static QUOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("\"[^\"\n]*\"|\u{201c}[^\u{201d}\n]*\u{201d}").expect("quote pattern is valid")
});

const REPORTING_VERBS: [&str; 14] = [
    "said", "says", "say", "asked", "asks", "replied", "replies", "wrote", "writes", "added",
    "adds", "noted", "notes", "exclaimed",
];

/// Longest speaker name we attribute, in tokens.
const MAX_SPEAKER_TOKENS: usize = 3;

/// Detects quoted spans and attributes speakers where a reporting-verb
/// pattern is adjacent to the quote.
///
/// Each quote store carries the quoted text (quotation marks included), its
/// byte offsets, its document-level index, the inclusive sentence range it
/// spans, and, when attribution succeeds, the speaker's document-level token
/// range. An unattributed quote simply has no speaker keys; absence is the
/// representation, not a sentinel.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuoteAnnotator;

impl QuoteAnnotator {
    /// Create a quote annotator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Annotator for QuoteAnnotator {
    fn name(&self) -> &str {
        "quotes"
    }

    fn requires(&self) -> &[KeyId] {
        &[KeyId::Tokens, KeyId::Sentences]
    }

    fn produces(&self) -> &[KeyId] {
        &[KeyId::Quotes]
    }

    fn annotate(&self, document: &mut AnnotationStore) -> Result<()> {
        let text = document
            .get(keys::Text)
            .cloned()
            .ok_or_else(|| Error::invalid_input("document store has no text"))?;
        let tokens = document
            .get(keys::Tokens)
            .ok_or_else(|| Error::invalid_input("document store has no tokens"))?;
        let sentences = document
            .get(keys::Sentences)
            .ok_or_else(|| Error::invalid_input("document store has no sentences"))?;

        let mut quotes = Vec::new();
        for m in QUOTE.find_iter(&text) {
            let Some((sentence_begin, sentence_end)) =
                sentence_range(sentences, m.start(), m.end())
            else {
                continue;
            };

            let mut quote = AnnotationStore::new();
            quote.set(keys::Text, m.as_str().to_string());
            quote.set(keys::QuoteIndex, quotes.len());
            quote.set(keys::CharBegin, m.start());
            quote.set(keys::CharEnd, m.end());
            quote.set(keys::SentenceBegin, sentence_begin);
            quote.set(keys::SentenceEnd, sentence_end);

            if let Some((begin, end)) = attribute_speaker(tokens, m.start(), m.end()) {
                quote.set(keys::SpeakerTokenBegin, begin);
                quote.set(keys::SpeakerTokenEnd, end);
            }
            quotes.push(quote);
        }
        document.set(keys::Quotes, quotes);
        Ok(())
    }
}

/// Inclusive range of sentence indices whose char spans intersect the quote.
fn sentence_range(
    sentences: &[AnnotationStore],
    char_begin: usize,
    char_end: usize,
) -> Option<(usize, usize)> {
    let mut range = None;
    for (index, sentence) in sentences.iter().enumerate() {
        let begin = *sentence.get(keys::CharBegin)?;
        let end = *sentence.get(keys::CharEnd)?;
        if begin < char_end && char_begin < end {
            range = Some(match range {
                None => (index, index),
                Some((first, _)) => (first, index),
            });
        }
    }
    range
}

fn word(tokens: &[AnnotationStore], index: usize) -> Option<&str> {
    tokens.get(index)?.get(keys::Word).map(String::as_str)
}

fn is_reporting_verb(tokens: &[AnnotationStore], index: usize) -> bool {
    word(tokens, index).is_some_and(|w| REPORTING_VERBS.contains(&w.to_lowercase().as_str()))
}

fn is_capitalized(tokens: &[AnnotationStore], index: usize) -> bool {
    word(tokens, index)
        .and_then(|w| w.chars().next())
        .is_some_and(char::is_uppercase)
}

fn is_skippable(tokens: &[AnnotationStore], index: usize) -> bool {
    matches!(word(tokens, index), Some(",") | Some(":"))
}

/// Capitalized run starting at `index`, up to `MAX_SPEAKER_TOKENS` long.
fn caps_run_forward(tokens: &[AnnotationStore], index: usize) -> Option<(usize, usize)> {
    let mut end = index;
    while end < tokens.len() && end - index < MAX_SPEAKER_TOKENS && is_capitalized(tokens, end) {
        end += 1;
    }
    (end > index).then_some((index, end))
}

/// Capitalized run ending at `index` (inclusive), scanning backwards.
fn caps_run_backward(tokens: &[AnnotationStore], index: usize) -> Option<(usize, usize)> {
    if !is_capitalized(tokens, index) {
        return None;
    }
    let mut begin = index;
    while begin > 0 && index - begin + 1 < MAX_SPEAKER_TOKENS && is_capitalized(tokens, begin - 1) {
        begin -= 1;
    }
    Some((begin, index + 1))
}

/// Match a reporting pattern adjacent to the quote: `said Casey` or
/// `Casey said` after it, `Casey said ,` or `said Casey :` before it.
/// Returns the speaker's document-level token range.
fn attribute_speaker(
    tokens: &[AnnotationStore],
    quote_char_begin: usize,
    quote_char_end: usize,
) -> Option<(usize, usize)> {
    let after = tokens
        .iter()
        .position(|t| t.get(keys::CharBegin).is_some_and(|b| *b >= quote_char_end));

    if let Some(mut i) = after {
        while is_skippable(tokens, i) {
            i += 1;
        }
        // said Casey
        if is_reporting_verb(tokens, i) {
            if let Some(run) = caps_run_forward(tokens, i + 1) {
                return Some(run);
            }
        }
        // Casey said
        if let Some((begin, end)) = caps_run_forward(tokens, i) {
            if is_reporting_verb(tokens, end) {
                return Some((begin, end));
            }
        }
    }

    let before = tokens
        .iter()
        .rposition(|t| t.get(keys::CharEnd).is_some_and(|e| *e <= quote_char_begin));

    if let Some(mut j) = before {
        while j > 0 && is_skippable(tokens, j) {
            j -= 1;
        }
        // Casey said ,
        if is_reporting_verb(tokens, j) {
            if let Some(run) = j.checked_sub(1).and_then(|k| caps_run_backward(tokens, k)) {
                return Some(run);
            }
        }
        // said Casey :
        if let Some((begin, end)) = caps_run_backward(tokens, j) {
            if begin > 0 && is_reporting_verb(tokens, begin - 1) {
                return Some((begin, end));
            }
        }
    }

    None
}
