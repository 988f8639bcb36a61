//! Property-based tests for the annotation store.
//!
//! These tests verify invariants that must always hold for the store.

use annopipe::{keys, AnnotationStore};
use proptest::prelude::*;

proptest! {
    /// INVARIANT: set(k, v) then get(k) returns v.
    #[test]
    fn set_then_get_returns_value(text in ".{0,40}", index in 0usize..10_000) {
        let mut store = AnnotationStore::new();
        store.set(keys::Text, text.clone());
        store.set(keys::TokenIndex, index);

        prop_assert_eq!(store.get(keys::Text), Some(&text));
        prop_assert_eq!(store.get(keys::TokenIndex), Some(&index));
    }

    /// INVARIANT: remove(k) then get(k) returns absent.
    #[test]
    fn remove_then_get_returns_absent(text in ".{0,40}") {
        let mut store = AnnotationStore::new();
        store.set(keys::Word, text.clone());
        prop_assert_eq!(store.remove(keys::Word), Some(text));
        prop_assert_eq!(store.get(keys::Word), None);
        prop_assert!(!store.contains(keys::Word));
    }

    /// INVARIANT: the last set wins; keys stay unique.
    #[test]
    fn set_overwrites_without_duplicating(values in prop::collection::vec(".{0,20}", 1..8)) {
        let mut store = AnnotationStore::new();
        for value in &values {
            store.set(keys::Lemma, value.clone());
        }
        prop_assert_eq!(store.len(), 1);
        prop_assert_eq!(store.get(keys::Lemma), values.last());
    }

    /// INVARIANT: fields persist until explicit removal; removing one key
    /// never disturbs another.
    #[test]
    fn removal_is_isolated(word in ".{0,20}", tag in "[A-Z]{1,8}", index in 0usize..1000) {
        let mut store = AnnotationStore::new();
        store.set(keys::Word, word.clone());
        store.set(keys::NerTag, tag);
        store.set(keys::TokenIndex, index);

        store.remove(keys::NerTag);
        prop_assert_eq!(store.get(keys::Word), Some(&word));
        prop_assert_eq!(store.get(keys::TokenIndex), Some(&index));
        prop_assert_eq!(store.get(keys::NerTag), None);
    }

    /// INVARIANT: nested stores round-trip exactly through their parent.
    #[test]
    fn nested_stores_round_trip(words in prop::collection::vec(".{0,12}", 0..6)) {
        let children: Vec<AnnotationStore> = words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let mut child = AnnotationStore::new();
                child.set(keys::Word, word.clone());
                child.set(keys::TokenIndex, i);
                child
            })
            .collect();

        let mut parent = AnnotationStore::new();
        parent.set(keys::Tokens, children.clone());
        prop_assert_eq!(parent.get(keys::Tokens), Some(&children));
    }
}
