//! Property-based tests for batch execution determinism.

use annopipe::prelude::*;
use proptest::prelude::*;

fn pipeline() -> Pipeline {
    AnnotatorRegistry::default()
        .pipeline(
            &["tokenize", "ssplit", "mentions", "quotes"],
            &serde_json::Value::Null,
        )
        .unwrap()
}

fn docs_from(texts: &[String]) -> Vec<AnnotationStore> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| AnnotationStore::document(format!("doc-{i}"), text.clone()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// INVARIANT: for any pool size 1 <= w <= n, the index-correlated output
    /// is identical to sequential single-worker processing.
    #[test]
    fn batch_output_matches_sequential_for_any_pool_size(
        texts in prop::collection::vec("[A-Za-z0-9,.!? \"]{0,60}", 1..10),
        workers in 1usize..8,
    ) {
        let pipeline = pipeline();
        let workers = workers.min(texts.len()).max(1);

        let sequential = pipeline.run_batch(
            docs_from(&texts),
            &ExecutionConfig::with_workers(1),
        );
        let pooled = pipeline.run_batch(
            docs_from(&texts),
            &ExecutionConfig::with_workers(workers),
        );

        prop_assert_eq!(sequential.len(), pooled.len());
        for (left, right) in sequential.iter().zip(pooled.iter()) {
            match (left, right) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
                (a, b) => prop_assert!(false, "outcome kind diverged: {a:?} vs {b:?}"),
            }
        }
    }

    /// INVARIANT: a pipeline that validated never raises a configuration
    /// error while executing, whatever the input text.
    #[test]
    fn validated_pipeline_never_misconfigures_at_run_time(
        text in "[A-Za-z0-9,.!? \"]{0,120}",
    ) {
        let pipeline = pipeline();
        let mut doc = AnnotationStore::document("d", text);
        match pipeline.run(&mut doc) {
            Ok(()) => {}
            Err(Error::Configuration { .. }) => {
                prop_assert!(false, "configuration error leaked to run time");
            }
            Err(_) => {}
        }
    }

    /// INVARIANT: every input slot gets exactly one outcome, whatever the
    /// worker count.
    #[test]
    fn batch_is_total(
        texts in prop::collection::vec(".{0,30}", 0..12),
        workers in 1usize..6,
    ) {
        let results = pipeline().run_batch(
            docs_from(&texts),
            &ExecutionConfig::with_workers(workers),
        );
        prop_assert_eq!(results.len(), texts.len());
    }
}
