//! Property-based tests for the graph model and its serializer.
//!
//! These tests verify invariants that must always hold for graphs.

use annopipe::graph::{DependencyGraph, GraphRecord, NodeId};
use proptest::prelude::*;

const RELATIONS: [&str; 6] = ["nsubj", "obj", "det", "conj", "advmod", "obl"];

/// Build instruction for one random graph: token count, copies per token,
/// edge endpoint picks, and a root pick.
#[derive(Debug, Clone)]
struct GraphPlan {
    tokens: usize,
    copies: Vec<usize>,
    edges: Vec<(usize, usize, usize, bool)>,
    root: Option<usize>,
}

fn graph_plan() -> impl Strategy<Value = GraphPlan> {
    (1usize..8)
        .prop_flat_map(|tokens| {
            (
                Just(tokens),
                prop::collection::vec(0usize..3, tokens),
                prop::collection::vec(
                    (any::<usize>(), any::<usize>(), 0usize..RELATIONS.len(), any::<bool>()),
                    0..12,
                ),
                prop::option::of(any::<usize>()),
            )
        })
        .prop_map(|(tokens, copies, edges, root)| GraphPlan {
            tokens,
            copies,
            edges,
            root,
        })
}

fn build(plan: &GraphPlan) -> DependencyGraph {
    let mut graph = DependencyGraph::new(0);
    let mut ids = Vec::new();
    for token in 1..=plan.tokens {
        ids.push(graph.add_node(token));
        for _ in 0..plan.copies[token - 1] {
            ids.push(graph.add_copy(token));
        }
    }
    for (source_pick, target_pick, relation, is_extra) in &plan.edges {
        let source = ids[source_pick % ids.len()];
        let target = ids[target_pick % ids.len()];
        let relation = RELATIONS[*relation];
        let result = if *is_extra {
            graph.add_extra_edge(relation, source, target)
        } else {
            graph.add_edge(relation, source, target)
        };
        result.expect("both endpoints exist by construction");
    }
    if let Some(root_pick) = plan.root {
        graph
            .set_root(ids[root_pick % ids.len()])
            .expect("root candidate exists by construction");
    }
    graph
}

proptest! {
    /// INVARIANT: deserialize(serialize(g)) is structurally equal to g.
    #[test]
    fn round_trip_preserves_structure(plan in graph_plan()) {
        let graph = build(&plan);
        let restored = DependencyGraph::from_record(&graph.to_record()).unwrap();
        prop_assert_eq!(restored, graph);
    }

    /// INVARIANT: the record survives a JSON round trip unchanged.
    #[test]
    fn record_json_round_trip(plan in graph_plan()) {
        let record = build(&plan).to_record();
        let json = serde_json::to_string(&record).unwrap();
        let parsed: GraphRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, record);
    }

    /// INVARIANT: serialization order is canonical regardless of edge
    /// insertion order.
    #[test]
    fn serialization_is_order_independent(plan in graph_plan()) {
        let graph = build(&plan);
        let mut reversed_plan = plan.clone();
        reversed_plan.edges.reverse();
        let reversed = build(&reversed_plan);
        prop_assert_eq!(reversed.to_record(), graph.to_record());
        prop_assert_eq!(reversed, graph);
    }

    /// INVARIANT: nodes emit ascending by (token, copy); edges ascending by
    /// endpoint quadruple.
    #[test]
    fn record_ordering_is_sorted(plan in graph_plan()) {
        let record = build(&plan).to_record();
        let node_keys: Vec<(usize, usize)> = record
            .nodes
            .iter()
            .map(|n| (n.token_index, n.copy_index))
            .collect();
        let mut sorted_nodes = node_keys.clone();
        sorted_nodes.sort_unstable();
        sorted_nodes.dedup();
        prop_assert_eq!(&node_keys, &sorted_nodes);

        let edge_keys: Vec<(usize, usize, usize, usize)> = record
            .edges
            .iter()
            .map(|e| (e.source_index, e.source_copy, e.target_index, e.target_copy))
            .collect();
        let mut sorted_edges = edge_keys.clone();
        sorted_edges.sort_unstable();
        prop_assert_eq!(&edge_keys, &sorted_edges);
    }

    /// INVARIANT: a copy node always coexists with the identities below it.
    #[test]
    fn copies_are_dense_per_token(plan in graph_plan()) {
        let graph = build(&plan);
        for node in graph.nodes() {
            for copy in 0..node.copy_index {
                prop_assert!(graph.contains(NodeId::new(node.token_index, copy)));
            }
        }
    }
}
