//! End-to-end pipeline integration tests.
//!
//! Drives the full chain: intake -> tokenize -> ssplit -> (mock NER) ->
//! mentions -> quotes -> views -> record serialization.

use annopipe::prelude::*;
use annopipe::{RecordReader, RecordWriter};

/// Stand-in for an external model-backed NER stage: tags a fixed lexicon of
/// surface forms on both the document and sentence token stores.
fn mock_ner(tags: Vec<(&'static str, &'static str)>) -> FnAnnotator {
    FnAnnotator::new("ner-mock", move |doc: &mut AnnotationStore| {
        let tag_of = |word: &str| {
            tags.iter()
                .find(|(w, _)| *w == word)
                .map(|(_, tag)| (*tag).to_string())
        };
        if let Some(tokens) = doc.get_mut(keys::Tokens) {
            for token in tokens.iter_mut() {
                if let Some(tag) = token.get(keys::Word).and_then(|w| tag_of(w)) {
                    token.set(keys::NerTag, tag);
                }
            }
        }
        if let Some(sentences) = doc.get_mut(keys::Sentences) {
            for sentence in sentences.iter_mut() {
                if let Some(tokens) = sentence.get_mut(keys::Tokens) {
                    for token in tokens.iter_mut() {
                        if let Some(tag) = token.get(keys::Word).and_then(|w| tag_of(w)) {
                            token.set(keys::NerTag, tag);
                        }
                    }
                }
            }
        }
        Ok(())
    })
    .with_requires(vec![KeyId::Tokens, KeyId::Sentences])
    .with_produces(vec![KeyId::NerTag])
}

fn full_pipeline() -> Pipeline {
    Pipeline::new(vec![
        Box::new(TokenizerAnnotator::new()),
        Box::new(SentenceSplitterAnnotator::new()),
        Box::new(mock_ner(vec![("Casey", "PERSON"), ("Paris", "LOCATION")])),
        Box::new(EntityMentionAnnotator::new()),
        Box::new(QuoteAnnotator::new()),
    ])
    .expect("stage order satisfies every requirement")
}

#[test]
fn casey_document_tokenizes_and_splits_as_specified() {
    let mut doc = AnnotationStore::document("d0", "Casey is 21.");
    full_pipeline().run(&mut doc).unwrap();

    let view = DocumentView::new(&doc);
    assert_eq!(view.tokens().len(), 4);
    assert_eq!(view.sentences().len(), 1);

    let sentence = &view.sentences()[0];
    assert_eq!(sentence.words(), vec!["Casey", "is", "21", "."]);
    assert_eq!(sentence.token_span(), Some((0, 4)));
}

#[test]
fn toy_graph_for_casey_round_trips_through_the_record_stream() {
    let mut doc = AnnotationStore::document("d0", "Casey is 21.");
    full_pipeline().run(&mut doc).unwrap();

    // [(root, 0, 2), (nsubj, 2, 1)] over 1-based token indices.
    let mut graph = DependencyGraph::new(0);
    let casey = graph.add_node(1);
    let is = graph.add_node(2);
    graph.add_node(3);
    graph.add_node(4);
    graph.add_edge("root", NodeId::ROOT, is).unwrap();
    graph.add_edge("nsubj", is, casey).unwrap();
    graph.set_root(is).unwrap();
    doc.get_mut(keys::Sentences).unwrap()[0].set(keys::BasicDependencies, graph.clone());

    let writer = RecordWriter::new(Vec::new()).write(&doc).unwrap();
    let (restored, _) = RecordReader::new(writer.into_inner().as_slice())
        .read()
        .unwrap();

    let view = DocumentView::new(&restored);
    let restored_graph = view.sentences()[0].basic_dependencies().unwrap();
    assert_eq!(restored_graph, &graph);
    assert_eq!(restored, doc);
}

#[test]
fn quote_spanning_sentences_one_and_two_resolves_both_views_in_order() {
    let mut doc = AnnotationStore::document(
        "d0",
        "An opening line. \"It rains here. It pours here.\" A closing line.",
    );
    full_pipeline().run(&mut doc).unwrap();

    let view = DocumentView::new(&doc);
    let quote = view.quote(0).unwrap();
    assert_eq!(quote.sentence_span(), Some((1, 2)));

    let resolved: Vec<usize> = quote
        .sentences()
        .iter()
        .map(|s| s.index().unwrap())
        .collect();
    assert_eq!(resolved, vec![1, 2]);
}

#[test]
fn mentions_and_speaker_resolution_work_end_to_end() {
    let mut doc = AnnotationStore::document("d0", "\"Paris is lovely,\" said Casey.");
    full_pipeline().run(&mut doc).unwrap();

    let view = DocumentView::new(&doc);
    let quote = view.quote(0).unwrap();
    assert_eq!(quote.speaker(), Some("Casey"));

    let mention = quote.speaker_mention().expect("Casey is a tagged mention");
    assert_eq!(mention.text(), Some("Casey"));
    assert_eq!(mention.ner(), Some("PERSON"));
}

#[test]
fn unattributed_speaker_is_explicitly_absent() {
    let mut doc = AnnotationStore::document("d0", "\"Nobody owns this line.\" Rain fell.");
    full_pipeline().run(&mut doc).unwrap();

    let view = DocumentView::new(&doc);
    let quote = view.quote(0).unwrap();
    assert_eq!(quote.speaker(), None);
    assert!(quote.speaker_mention().is_none());
}

#[test]
fn coordination_expansion_copy_node_round_trips() {
    let mut doc = AnnotationStore::document("d0", "Casey wrote and directed the film.");
    full_pipeline().run(&mut doc).unwrap();

    // "wrote and directed": the subject attaches to both verbs; the second
    // attachment goes through a copy of token 5 sharing its token index.
    let mut graph = DependencyGraph::new(0);
    for token in 1..=6 {
        graph.add_node(token);
    }
    let copy = graph.add_copy(5);
    assert_eq!(copy, NodeId::new(5, 1));

    graph
        .add_edge("root", NodeId::ROOT, NodeId::new(2, 0))
        .unwrap();
    graph
        .add_edge("nsubj", NodeId::new(2, 0), NodeId::new(1, 0))
        .unwrap();
    graph
        .add_edge("conj", NodeId::new(2, 0), NodeId::new(4, 0))
        .unwrap();
    graph
        .add_extra_edge("nsubj", NodeId::new(4, 0), NodeId::new(1, 0))
        .unwrap();
    graph.add_edge("det", copy, NodeId::new(5, 0)).unwrap();

    assert!(graph.contains(NodeId::new(5, 0)));
    assert!(graph.contains(NodeId::new(5, 1)));

    doc.get_mut(keys::Sentences).unwrap()[0].set(keys::EnhancedDependencies, graph.clone());

    let writer = RecordWriter::new(Vec::new()).write(&doc).unwrap();
    let (restored, _) = RecordReader::new(writer.into_inner().as_slice())
        .read()
        .unwrap();
    let view = DocumentView::new(&restored);
    let restored_graph = view.sentences()[0].enhanced_dependencies().unwrap();
    assert_eq!(restored_graph, &graph);
    assert!(restored_graph.contains(NodeId::new(5, 1)));
}

#[test]
fn registry_pipeline_matches_hand_built_pipeline() {
    let registry = AnnotatorRegistry::default();
    let pipeline = registry
        .pipeline(
            &["tokenize", "ssplit", "mentions", "quotes"],
            &serde_json::Value::Null,
        )
        .unwrap();

    let mut doc = AnnotationStore::document("d0", "Casey is 21.");
    pipeline.run(&mut doc).unwrap();
    assert_eq!(doc.get(keys::Tokens).unwrap().len(), 4);
    assert_eq!(doc.get(keys::Sentences).unwrap().len(), 1);
}

#[test]
fn custom_stage_registers_through_the_factory() {
    let mut registry = AnnotatorRegistry::default();
    registry.register("shout", |config| {
        let suffix = config
            .get("suffix")
            .and_then(|v| v.as_str())
            .unwrap_or("!")
            .to_string();
        Ok(Box::new(
            FnAnnotator::new("shout", move |doc: &mut AnnotationStore| {
                let text = doc.get(keys::Text).cloned().unwrap_or_default();
                doc.set(keys::Text, format!("{}{suffix}", text.to_uppercase()));
                Ok(())
            })
            .with_produces(vec![KeyId::Text]),
        ) as Box<dyn Annotator>)
    });

    let config = serde_json::json!({ "suffix": "!!" });
    let pipeline = registry.pipeline(&["shout"], &config).unwrap();
    let mut doc = AnnotationStore::document("d0", "quiet");
    pipeline.run(&mut doc).unwrap();
    assert_eq!(doc.get(keys::Text).map(String::as_str), Some("QUIET!!"));
}
