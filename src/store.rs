//! Typed heterogeneous annotation store.
//!
//! An [`AnnotationStore`] is the per-document, per-sentence, per-token, and
//! per-mention field container. It maps a typed key from the closed registry
//! in [`keys`](crate::keys) to exactly one value of that key's declared type.
//! Stores nest by value: a document store holds its sentence stores under
//! [`keys::Sentences`](crate::keys::Sentences), a sentence store holds its
//! token and mention stores, and so on. Each child store is owned exclusively
//! by its parent.
//!
//! The store is not internally synchronized. Exactly one thread operates on a
//! given store at a time; concurrency safety across documents is the
//! pipeline's responsibility.
//!
//! # Design: Parse, Don't Cast
//!
//! Storage is a tagged union ([`Value`]) over the closed set of value types.
//! The typed-key API converts at exactly one place, the [`AnnotationValue`]
//! trait, so a `get` can never observe a value of the wrong type: the key's
//! associated type fixes the variant at `set` time.

use std::collections::HashMap;

use crate::graph::DependencyGraph;
use crate::keys::{AnnotationKey, KeyId};

/// Tagged union over the closed set of annotation value types.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// A string field (text, tags, identifiers).
    Str(String),
    /// An index or offset field.
    Index(usize),
    /// A sequence of nested stores (tokens, sentences, mentions, quotes).
    Stores(Vec<AnnotationStore>),
    /// A dependency graph.
    Graph(DependencyGraph),
}

/// Conversion between concrete value types and the [`Value`] union.
///
/// This is the single checked extraction point of the store: every typed
/// `get`/`set`/`remove` goes through these four functions and nowhere else.
pub trait AnnotationValue: Sized {
    /// Wrap this value into the union.
    fn into_value(self) -> Value;
    /// Borrow this type out of the union, if the variant matches.
    fn from_value(value: &Value) -> Option<&Self>;
    /// Mutably borrow this type out of the union, if the variant matches.
    fn from_value_mut(value: &mut Value) -> Option<&mut Self>;
    /// Take this type out of the union, if the variant matches.
    fn take_value(value: Value) -> Option<Self>;
}

impl AnnotationValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
    fn take_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl AnnotationValue for usize {
    fn into_value(self) -> Value {
        Value::Index(self)
    }
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Index(i) => Some(i),
            _ => None,
        }
    }
    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::Index(i) => Some(i),
            _ => None,
        }
    }
    fn take_value(value: Value) -> Option<Self> {
        match value {
            Value::Index(i) => Some(i),
            _ => None,
        }
    }
}

impl AnnotationValue for Vec<AnnotationStore> {
    fn into_value(self) -> Value {
        Value::Stores(self)
    }
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Stores(s) => Some(s),
            _ => None,
        }
    }
    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::Stores(s) => Some(s),
            _ => None,
        }
    }
    fn take_value(value: Value) -> Option<Self> {
        match value {
            Value::Stores(s) => Some(s),
            _ => None,
        }
    }
}

impl AnnotationValue for DependencyGraph {
    fn into_value(self) -> Value {
        Value::Graph(self)
    }
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Graph(g) => Some(g),
            _ => None,
        }
    }
    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::Graph(g) => Some(g),
            _ => None,
        }
    }
    fn take_value(value: Value) -> Option<Self> {
        match value {
            Value::Graph(g) => Some(g),
            _ => None,
        }
    }
}

/// Typed heterogeneous key/value container for one document, sentence, token,
/// or mention.
///
/// # Example
///
/// ```rust
/// use annopipe::{keys, AnnotationStore};
///
/// let mut token = AnnotationStore::new();
/// token.set(keys::Word, "Casey".to_string());
/// token.set(keys::TokenIndex, 0usize);
///
/// assert!(token.contains(keys::Word));
/// assert_eq!(token.get(keys::TokenIndex), Some(&0));
/// assert_eq!(token.remove(keys::Word), Some("Casey".to_string()));
/// assert_eq!(token.get(keys::Word), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    fields: HashMap<KeyId, Value>,
}

impl AnnotationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document store carrying its text and identifier.
    #[must_use]
    pub fn document(doc_id: impl Into<String>, text: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.set(crate::keys::DocId, doc_id.into());
        store.set(crate::keys::Text, text.into());
        store
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn set<K: AnnotationKey>(&mut self, _key: K, value: K::Value) {
        self.fields.insert(K::ID, value.into_value());
    }

    /// Get the value for `key`, or `None` if absent.
    #[must_use]
    pub fn get<K: AnnotationKey>(&self, _key: K) -> Option<&K::Value> {
        self.fields.get(&K::ID).and_then(K::Value::from_value)
    }

    /// Mutably get the value for `key`, or `None` if absent.
    #[must_use]
    pub fn get_mut<K: AnnotationKey>(&mut self, _key: K) -> Option<&mut K::Value> {
        self.fields
            .get_mut(&K::ID)
            .and_then(K::Value::from_value_mut)
    }

    /// True if `key` has a value.
    #[must_use]
    pub fn contains<K: AnnotationKey>(&self, _key: K) -> bool {
        self.fields.contains_key(&K::ID)
    }

    /// True if the key identified by `id` has a value.
    #[must_use]
    pub fn contains_id(&self, id: KeyId) -> bool {
        self.fields.contains_key(&id)
    }

    /// Remove and return the value for `key`.
    pub fn remove<K: AnnotationKey>(&mut self, _key: K) -> Option<K::Value> {
        self.fields.remove(&K::ID).and_then(K::Value::take_value)
    }

    /// Number of populated keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no key is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over the populated key identifiers, in no particular order.
    pub fn key_ids(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.fields.keys().copied()
    }

    /// Document identifier, or `"<unidentified>"` when absent.
    ///
    /// Used for error reporting at the worker boundary, where a document must
    /// always be nameable.
    #[must_use]
    pub fn doc_id_or_unknown(&self) -> &str {
        self.get(crate::keys::DocId)
            .map_or("<unidentified>", String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    #[test]
    fn set_then_get_returns_value() {
        let mut store = AnnotationStore::new();
        store.set(keys::Text, "hello".to_string());
        store.set(keys::SentenceIndex, 3usize);

        assert_eq!(store.get(keys::Text).map(String::as_str), Some("hello"));
        assert_eq!(store.get(keys::SentenceIndex), Some(&3));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_then_get_returns_absent() {
        let mut store = AnnotationStore::new();
        store.set(keys::Word, "x".to_string());
        assert_eq!(store.remove(keys::Word), Some("x".to_string()));
        assert_eq!(store.get(keys::Word), None);
        assert!(store.is_empty());
    }

    #[test]
    fn set_replaces_previous_value() {
        let mut store = AnnotationStore::new();
        store.set(keys::PosTag, "NN".to_string());
        store.set(keys::PosTag, "VB".to_string());
        assert_eq!(store.get(keys::PosTag).map(String::as_str), Some("VB"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn nested_stores_round_trip() {
        let mut token = AnnotationStore::new();
        token.set(keys::Word, "Casey".to_string());

        let mut sentence = AnnotationStore::new();
        sentence.set(keys::Tokens, vec![token.clone()]);

        let tokens = sentence.get(keys::Tokens).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0], token);
    }

    #[test]
    fn get_mut_mutates_in_place() {
        let mut store = AnnotationStore::new();
        store.set(keys::Tokens, Vec::new());
        store
            .get_mut(keys::Tokens)
            .unwrap()
            .push(AnnotationStore::new());
        assert_eq!(store.get(keys::Tokens).unwrap().len(), 1);
    }

    #[test]
    fn contains_id_matches_typed_contains() {
        let mut store = AnnotationStore::new();
        store.set(keys::Lemma, "be".to_string());
        assert!(store.contains(keys::Lemma));
        assert!(store.contains_id(crate::keys::KeyId::Lemma));
        assert!(!store.contains_id(crate::keys::KeyId::NerTag));
    }

    #[test]
    fn document_constructor_populates_id_and_text() {
        let doc = AnnotationStore::document("doc-1", "Some text.");
        assert_eq!(doc.get(keys::DocId).map(String::as_str), Some("doc-1"));
        assert_eq!(doc.get(keys::Text).map(String::as_str), Some("Some text."));
        assert_eq!(doc.doc_id_or_unknown(), "doc-1");
    }
}
