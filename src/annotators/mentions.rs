//! Entity mention grouping.

use crate::annotator::Annotator;
use crate::error::{Error, Result};
use crate::keys::{self, KeyId};
use crate::store::AnnotationStore;

/// Groups contiguous tokens carrying the same named-entity tag into mention
/// stores on each sentence.
///
/// Tags come from whatever upstream stage populated [`keys::NerTag`] on the
/// sentence tokens (typically an external model-backed annotator); tokens
/// without a tag never join a mention. Sentences always end up with a
/// [`keys::Mentions`] list, possibly empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityMentionAnnotator;

impl EntityMentionAnnotator {
    /// Create a mention annotator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Annotator for EntityMentionAnnotator {
    fn name(&self) -> &str {
        "mentions"
    }

    fn requires(&self) -> &[KeyId] {
        &[KeyId::Sentences]
    }

    fn produces(&self) -> &[KeyId] {
        &[KeyId::Mentions]
    }

    fn annotate(&self, document: &mut AnnotationStore) -> Result<()> {
        let text = document
            .get(keys::Text)
            .cloned()
            .ok_or_else(|| Error::invalid_input("document store has no text"))?;
        let sentences = document
            .get_mut(keys::Sentences)
            .ok_or_else(|| Error::invalid_input("document store has no sentences"))?;

        for sentence in sentences.iter_mut() {
            let mentions = match sentence.get(keys::Tokens) {
                Some(tokens) => group_mentions(&text, tokens)?,
                None => Vec::new(),
            };
            sentence.set(keys::Mentions, mentions);
        }
        Ok(())
    }
}

fn group_mentions(text: &str, tokens: &[AnnotationStore]) -> Result<Vec<AnnotationStore>> {
    let mut mentions = Vec::new();
    let mut run_start: Option<usize> = None;

    for position in 0..=tokens.len() {
        let tag = tokens
            .get(position)
            .and_then(|token| token.get(keys::NerTag));
        let extends_run = match (run_start, tag) {
            (Some(start), Some(tag)) => tokens[start].get(keys::NerTag) == Some(tag),
            _ => false,
        };
        if extends_run {
            continue;
        }
        if let Some(start) = run_start.take() {
            mentions.push(build_mention(text, &tokens[start..position])?);
        }
        if tag.is_some() {
            run_start = Some(position);
        }
    }
    Ok(mentions)
}

fn build_mention(text: &str, tokens: &[AnnotationStore]) -> Result<AnnotationStore> {
    let missing = || Error::invalid_input("mention token store is missing a field");
    let first = tokens.first().ok_or_else(missing)?;
    let last = tokens.last().ok_or_else(missing)?;

    let char_begin = *first.get(keys::CharBegin).ok_or_else(missing)?;
    let char_end = *last.get(keys::CharEnd).ok_or_else(missing)?;
    let token_begin = *first.get(keys::TokenIndex).ok_or_else(missing)?;
    let token_end = *last.get(keys::TokenIndex).ok_or_else(missing)? + 1;
    let tag = first.get(keys::NerTag).ok_or_else(missing)?.clone();
    let slice = text
        .get(char_begin..char_end)
        .ok_or_else(|| Error::invalid_input("token offsets do not fall inside the text"))?;

    let mut mention = AnnotationStore::new();
    mention.set(keys::Text, slice.to_string());
    mention.set(keys::NerTag, tag);
    mention.set(keys::TokenBegin, token_begin);
    mention.set(keys::TokenEnd, token_end);
    mention.set(keys::CharBegin, char_begin);
    mention.set(keys::CharEnd, char_end);
    Ok(mention)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotators::{SentenceSplitterAnnotator, TokenizerAnnotator};

    /// Tag every token whose surface form appears in `tags`.
    fn tag_tokens(doc: &mut AnnotationStore, tags: &[(&str, &str)]) {
        let sentences = doc.get_mut(keys::Sentences).unwrap();
        for sentence in sentences.iter_mut() {
            let tokens = sentence.get_mut(keys::Tokens).unwrap();
            for token in tokens.iter_mut() {
                let word = token.get(keys::Word).unwrap().clone();
                if let Some((_, tag)) = tags.iter().find(|(w, _)| *w == word) {
                    token.set(keys::NerTag, (*tag).to_string());
                }
            }
        }
    }

    fn annotated(text: &str, tags: &[(&str, &str)]) -> AnnotationStore {
        let mut doc = AnnotationStore::document("d", text);
        TokenizerAnnotator::new().annotate(&mut doc).unwrap();
        SentenceSplitterAnnotator::new().annotate(&mut doc).unwrap();
        tag_tokens(&mut doc, tags);
        EntityMentionAnnotator::new().annotate(&mut doc).unwrap();
        doc
    }

    #[test]
    fn contiguous_same_tag_tokens_form_one_mention() {
        let doc = annotated(
            "Casey Smith lives here.",
            &[("Casey", "PERSON"), ("Smith", "PERSON")],
        );
        let sentence = &doc.get(keys::Sentences).unwrap()[0];
        let mentions = sentence.get(keys::Mentions).unwrap();
        assert_eq!(mentions.len(), 1);
        assert_eq!(
            mentions[0].get(keys::Text).map(String::as_str),
            Some("Casey Smith")
        );
        assert_eq!(mentions[0].get(keys::TokenBegin), Some(&0));
        assert_eq!(mentions[0].get(keys::TokenEnd), Some(&2));
    }

    #[test]
    fn tag_change_splits_mentions() {
        let doc = annotated(
            "Casey visited Paris.",
            &[("Casey", "PERSON"), ("Paris", "LOCATION")],
        );
        let sentence = &doc.get(keys::Sentences).unwrap()[0];
        let mentions = sentence.get(keys::Mentions).unwrap();
        assert_eq!(mentions.len(), 2);
        assert_eq!(
            mentions[1].get(keys::NerTag).map(String::as_str),
            Some("LOCATION")
        );
    }

    #[test]
    fn untagged_sentences_get_empty_mention_lists() {
        let doc = annotated("Nothing here.", &[]);
        let sentence = &doc.get(keys::Sentences).unwrap()[0];
        assert!(sentence.get(keys::Mentions).unwrap().is_empty());
    }
}
