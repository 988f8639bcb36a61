//! Dependency/semantic graph intermediate representation.
//!
//! A [`DependencyGraph`] holds the nodes and edges of one sentence's
//! linguistic graph. Nodes are identified by `(token_index, copy_index)`
//! within the sentence: `copy_index == 0` is the original token, higher
//! indices are structural copies introduced by expansion of coordinate
//! structures. Token indices are 1-based; index 0 is the reserved root, which
//! may appear as an edge endpoint without a node table entry.
//!
//! Serialization is deterministic: nodes are emitted ascending by
//! `(token_index, copy_index)` and edges ascending by
//! `(source_index, source_copy, target_index, target_copy)`, so two graphs
//! built in different orders serialize identically. Deserialization resolves
//! every edge endpoint against the rebuilt node table and fails with
//! [`Error::GraphConsistency`] on a dangling reference.
//!
//! # Example
//!
//! ```rust
//! use annopipe::graph::{DependencyGraph, NodeId};
//!
//! let mut graph = DependencyGraph::new(0);
//! let casey = graph.add_node(1);
//! let is = graph.add_node(2);
//! let age = graph.add_node(3);
//!
//! graph.add_edge("root", NodeId::ROOT, is).unwrap();
//! graph.add_edge("nsubj", is, casey).unwrap();
//! graph.add_edge("obj", is, age).unwrap();
//! graph.set_root(is).unwrap();
//!
//! let restored = DependencyGraph::from_record(&graph.to_record()).unwrap();
//! assert_eq!(restored, graph);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identity of a node within one sentence's graph: `(token_index, copy_index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    /// 1-based token index within the sentence; 0 is the reserved root.
    pub token: usize,
    /// 0 for the original token, >0 for a structural copy.
    pub copy: usize,
}

impl NodeId {
    /// The reserved root endpoint: token index 0, copy 0.
    pub const ROOT: NodeId = NodeId { token: 0, copy: 0 };

    /// Create a node identity.
    #[must_use]
    pub fn new(token: usize, copy: usize) -> Self {
        Self { token, copy }
    }

    /// True if this is the reserved root endpoint.
    #[must_use]
    pub fn is_reserved_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.copy == 0 {
            write!(f, "{}", self.token)
        } else {
            write!(f, "{}.{}", self.token, self.copy)
        }
    }
}

/// A node of a sentence graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// Index of the owning sentence within the document.
    pub sentence_index: usize,
    /// 1-based token index within the sentence.
    pub token_index: usize,
    /// 0 for the original token, >0 for a structural copy.
    pub copy_index: usize,
    /// True if this node anchors the sentence's graph.
    pub is_root: bool,
}

impl GraphNode {
    /// Identity of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        NodeId::new(self.token_index, self.copy_index)
    }
}

/// A directed, labeled edge of a sentence graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    /// Grammatical relation label.
    pub relation: String,
    /// Governor endpoint.
    pub source: NodeId,
    /// Dependent endpoint.
    pub target: NodeId,
    /// True for a non-tree (secondary) edge.
    pub is_extra: bool,
}

impl GraphEdge {
    /// Canonical ordering key: endpoints first, then label, then extra flag.
    ///
    /// The endpoint prefix is the serialization order; the label and flag
    /// break ties so that ordering is total and output is reproducible.
    fn sort_key(&self) -> (usize, usize, usize, usize, &str, bool) {
        (
            self.source.token,
            self.source.copy,
            self.target.token,
            self.target.copy,
            &self.relation,
            self.is_extra,
        )
    }
}

/// Node/edge representation of one sentence's dependency or semantic graph.
///
/// Owns its node table and edge list exclusively. Structural equality ignores
/// the order in which edges were added.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    sentence_index: usize,
    nodes: BTreeMap<NodeId, GraphNode>,
    edges: Vec<GraphEdge>,
}

impl DependencyGraph {
    /// Create an empty graph for the sentence at `sentence_index`.
    #[must_use]
    pub fn new(sentence_index: usize) -> Self {
        Self {
            sentence_index,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    /// Index of the owning sentence.
    #[must_use]
    pub fn sentence_index(&self) -> usize {
        self.sentence_index
    }

    /// Add the original node for `token_index` (copy 0).
    ///
    /// Each token contributes exactly one original node; adding the same
    /// token again returns the existing identity.
    pub fn add_node(&mut self, token_index: usize) -> NodeId {
        let id = NodeId::new(token_index, 0);
        self.nodes.entry(id).or_insert(GraphNode {
            sentence_index: self.sentence_index,
            token_index,
            copy_index: 0,
            is_root: false,
        });
        id
    }

    /// Add a structural copy of `token_index`, allocating the next free copy
    /// index for that token.
    pub fn add_copy(&mut self, token_index: usize) -> NodeId {
        let next_copy = self
            .nodes
            .range(NodeId::new(token_index, 0)..=NodeId::new(token_index, usize::MAX))
            .next_back()
            .map_or(1, |(id, _)| id.copy + 1);
        let id = NodeId::new(token_index, next_copy);
        self.nodes.insert(
            id,
            GraphNode {
                sentence_index: self.sentence_index,
                token_index,
                copy_index: next_copy,
                is_root: false,
            },
        );
        id
    }

    /// Add a tree edge from `source` to `target`.
    ///
    /// Both endpoints must resolve in the node table, except the reserved
    /// root which may appear without an entry.
    pub fn add_edge(
        &mut self,
        relation: impl Into<String>,
        source: NodeId,
        target: NodeId,
    ) -> Result<()> {
        self.push_edge(relation.into(), source, target, false)
    }

    /// Add a non-tree (secondary) edge from `source` to `target`.
    pub fn add_extra_edge(
        &mut self,
        relation: impl Into<String>,
        source: NodeId,
        target: NodeId,
    ) -> Result<()> {
        self.push_edge(relation.into(), source, target, true)
    }

    fn push_edge(
        &mut self,
        relation: String,
        source: NodeId,
        target: NodeId,
        is_extra: bool,
    ) -> Result<()> {
        self.check_endpoint(source)?;
        self.check_endpoint(target)?;
        self.edges.push(GraphEdge {
            relation,
            source,
            target,
            is_extra,
        });
        Ok(())
    }

    fn check_endpoint(&self, id: NodeId) -> Result<()> {
        if id.is_reserved_root() || self.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::graph(format!(
                "edge endpoint {id} is not in the node table of sentence {}",
                self.sentence_index
            )))
        }
    }

    /// Mark `id` as the root node, clearing any previous root marking.
    pub fn set_root(&mut self, id: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&id) {
            return Err(Error::graph(format!(
                "cannot mark absent node {id} as root of sentence {}",
                self.sentence_index
            )));
        }
        for node in self.nodes.values_mut() {
            node.is_root = node.id() == id;
        }
        Ok(())
    }

    /// Identity of the root node, or `None` when the root is only reachable
    /// through the reserved root index.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|node| node.is_root)
            .map(GraphNode::id)
    }

    /// Look up a node by identity.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    /// True if `id` has a node table entry.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterate over nodes ascending by `(token_index, copy_index)`.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialize into the deterministic record form.
    ///
    /// Output is independent of construction order: nodes ascend by
    /// `(token_index, copy_index)`, edges by
    /// `(source_index, source_copy, target_index, target_copy)` with ties
    /// broken by relation label.
    #[must_use]
    pub fn to_record(&self) -> GraphRecord {
        let nodes = self
            .nodes
            .values()
            .map(|node| NodeRecord {
                sentence_index: node.sentence_index,
                token_index: node.token_index,
                copy_index: node.copy_index,
                is_root: node.is_root,
            })
            .collect();

        let mut edges: Vec<&GraphEdge> = self.edges.iter().collect();
        edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        let edges = edges
            .into_iter()
            .map(|edge| EdgeRecord {
                relation: edge.relation.clone(),
                source_index: edge.source.token,
                source_copy: edge.source.copy,
                target_index: edge.target.token,
                target_copy: edge.target.copy,
                is_extra: edge.is_extra,
            })
            .collect();

        GraphRecord { nodes, edges }
    }

    /// Rebuild a graph from its record form.
    ///
    /// The node table is keyed by `(token_index, copy_index)`; every edge
    /// endpoint is resolved against it. A dangling endpoint or a duplicate
    /// node identity or root marking fails with [`Error::GraphConsistency`].
    pub fn from_record(record: &GraphRecord) -> Result<Self> {
        let sentence_index = record.nodes.first().map_or(0, |n| n.sentence_index);
        let mut graph = Self::new(sentence_index);

        for node in &record.nodes {
            let id = NodeId::new(node.token_index, node.copy_index);
            if node.sentence_index != sentence_index {
                return Err(Error::graph(format!(
                    "node {id} belongs to sentence {} in a graph of sentence {sentence_index}",
                    node.sentence_index
                )));
            }
            if node.is_root && graph.root().is_some() {
                return Err(Error::graph(format!(
                    "sentence {sentence_index} marks more than one root node"
                )));
            }
            let previous = graph.nodes.insert(
                id,
                GraphNode {
                    sentence_index: node.sentence_index,
                    token_index: node.token_index,
                    copy_index: node.copy_index,
                    is_root: node.is_root,
                },
            );
            if previous.is_some() {
                return Err(Error::graph(format!(
                    "duplicate node identity {id} in sentence {sentence_index}"
                )));
            }
        }

        for edge in &record.edges {
            let source = NodeId::new(edge.source_index, edge.source_copy);
            let target = NodeId::new(edge.target_index, edge.target_copy);
            graph.push_edge(edge.relation.clone(), source, target, edge.is_extra)?;
        }

        Ok(graph)
    }
}

// Structural equality: same sentence, same node table, same edge multiset.
// Edge insertion order is a construction artifact, not part of identity.
impl PartialEq for DependencyGraph {
    fn eq(&self, other: &Self) -> bool {
        if self.sentence_index != other.sentence_index || self.nodes != other.nodes {
            return false;
        }
        if self.edges.len() != other.edges.len() {
            return false;
        }
        let mut left: Vec<&GraphEdge> = self.edges.iter().collect();
        let mut right: Vec<&GraphEdge> = other.edges.iter().collect();
        left.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        right.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        left == right
    }
}

impl Eq for DependencyGraph {}

// =============================================================================
// Record Schema
// =============================================================================

/// Serialized form of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Index of the owning sentence.
    #[serde(rename = "sentenceIndex")]
    pub sentence_index: usize,
    /// 1-based token index within the sentence.
    #[serde(rename = "tokenIndex")]
    pub token_index: usize,
    /// 0 for the original token, >0 for a structural copy.
    #[serde(rename = "copyIndex")]
    pub copy_index: usize,
    /// True if this node anchors the graph.
    #[serde(rename = "isRoot")]
    pub is_root: bool,
}

/// Serialized form of a graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Grammatical relation label.
    pub relation: String,
    /// Governor token index.
    #[serde(rename = "sourceIndex")]
    pub source_index: usize,
    /// Governor copy index.
    #[serde(rename = "sourceCopy")]
    pub source_copy: usize,
    /// Dependent token index.
    #[serde(rename = "targetIndex")]
    pub target_index: usize,
    /// Dependent copy index.
    #[serde(rename = "targetCopy")]
    pub target_copy: usize,
    /// True for a non-tree (secondary) edge.
    #[serde(rename = "isExtra")]
    pub is_extra: bool,
}

/// Serialized form of a sentence graph: nodes then edges, both in canonical
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Nodes ascending by `(tokenIndex, copyIndex)`.
    pub nodes: Vec<NodeRecord>,
    /// Edges ascending by `(sourceIndex, sourceCopy, targetIndex, targetCopy)`.
    pub edges: Vec<EdgeRecord>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_graph() -> DependencyGraph {
        // "Casey is 21 ." with "is" as head.
        let mut graph = DependencyGraph::new(0);
        let casey = graph.add_node(1);
        let is = graph.add_node(2);
        graph.add_node(3);
        graph.add_node(4);
        graph.add_edge("root", NodeId::ROOT, is).unwrap();
        graph.add_edge("nsubj", is, casey).unwrap();
        graph.set_root(is).unwrap();
        graph
    }

    #[test]
    fn add_node_is_idempotent_per_token() {
        let mut graph = DependencyGraph::new(0);
        let a = graph.add_node(5);
        let b = graph.add_node(5);
        assert_eq!(a, b);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn copies_share_token_index_with_distinct_identity() {
        let mut graph = DependencyGraph::new(0);
        let original = graph.add_node(5);
        let copy = graph.add_copy(5);
        assert_eq!(copy, NodeId::new(5, 1));
        assert_ne!(original, copy);
        assert!(graph.contains(original));
        assert!(graph.contains(copy));

        // Edges may target either node independently.
        graph.add_node(2);
        graph.add_edge("conj", NodeId::new(2, 0), original).unwrap();
        graph.add_extra_edge("nsubj", NodeId::new(2, 0), copy).unwrap();
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn copy_indices_increment() {
        let mut graph = DependencyGraph::new(0);
        graph.add_node(3);
        assert_eq!(graph.add_copy(3), NodeId::new(3, 1));
        assert_eq!(graph.add_copy(3), NodeId::new(3, 2));
    }

    #[test]
    fn edge_to_absent_node_is_rejected() {
        let mut graph = DependencyGraph::new(0);
        graph.add_node(1);
        let err = graph
            .add_edge("nsubj", NodeId::new(1, 0), NodeId::new(9, 0))
            .unwrap_err();
        assert!(matches!(err, Error::GraphConsistency(_)));
    }

    #[test]
    fn reserved_root_needs_no_node_entry() {
        let mut graph = DependencyGraph::new(0);
        let head = graph.add_node(2);
        graph.add_edge("root", NodeId::ROOT, head).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(!graph.contains(NodeId::ROOT));
    }

    #[test]
    fn set_root_is_exclusive() {
        let mut graph = DependencyGraph::new(0);
        let a = graph.add_node(1);
        let b = graph.add_node(2);
        graph.set_root(a).unwrap();
        graph.set_root(b).unwrap();
        assert_eq!(graph.root(), Some(b));
        assert!(!graph.node(a).unwrap().is_root);
    }

    #[test]
    fn serialization_order_is_canonical() {
        // Build in scrambled order; the record must not care.
        let mut graph = DependencyGraph::new(1);
        graph.add_node(3);
        graph.add_node(1);
        let two = graph.add_node(2);
        graph.add_edge("obj", two, NodeId::new(3, 0)).unwrap();
        graph.add_edge("nsubj", two, NodeId::new(1, 0)).unwrap();
        graph.add_edge("root", NodeId::ROOT, two).unwrap();

        let record = graph.to_record();
        let node_order: Vec<usize> = record.nodes.iter().map(|n| n.token_index).collect();
        assert_eq!(node_order, vec![1, 2, 3]);
        let edge_order: Vec<(usize, usize)> = record
            .edges
            .iter()
            .map(|e| (e.source_index, e.target_index))
            .collect();
        assert_eq!(edge_order, vec![(0, 2), (2, 1), (2, 3)]);
    }

    #[test]
    fn round_trip_is_structurally_equal() {
        let graph = toy_graph();
        let restored = DependencyGraph::from_record(&graph.to_record()).unwrap();
        assert_eq!(restored, graph);
    }

    #[test]
    fn round_trip_ignores_construction_order() {
        let mut scrambled = DependencyGraph::new(0);
        scrambled.add_node(4);
        scrambled.add_node(3);
        let is = scrambled.add_node(2);
        let casey = scrambled.add_node(1);
        scrambled.add_edge("nsubj", is, casey).unwrap();
        scrambled.add_edge("root", NodeId::ROOT, is).unwrap();
        scrambled.set_root(is).unwrap();

        assert_eq!(scrambled, toy_graph());
        assert_eq!(scrambled.to_record(), toy_graph().to_record());
    }

    #[test]
    fn deserialize_rejects_dangling_edge() {
        let mut record = toy_graph().to_record();
        record.edges.push(EdgeRecord {
            relation: "obl".to_string(),
            source_index: 2,
            source_copy: 0,
            target_index: 7,
            target_copy: 0,
            is_extra: false,
        });
        let err = DependencyGraph::from_record(&record).unwrap_err();
        assert!(matches!(err, Error::GraphConsistency(_)));
    }

    #[test]
    fn deserialize_rejects_duplicate_identity() {
        let mut record = toy_graph().to_record();
        let duplicate = record.nodes[0].clone();
        record.nodes.push(duplicate);
        assert!(DependencyGraph::from_record(&record).is_err());
    }

    #[test]
    fn deserialize_rejects_second_root() {
        let mut record = toy_graph().to_record();
        record.nodes[0].is_root = true; // node 1, in addition to node 2
        assert!(DependencyGraph::from_record(&record).is_err());
    }

    #[test]
    fn record_json_uses_schema_field_names() {
        let json = serde_json::to_string(&toy_graph().to_record()).unwrap();
        for field in [
            "sentenceIndex",
            "tokenIndex",
            "copyIndex",
            "isRoot",
            "relation",
            "sourceIndex",
            "sourceCopy",
            "targetIndex",
            "targetCopy",
            "isExtra",
        ] {
            assert!(json.contains(field), "missing field {field} in {json}");
        }
    }

    #[test]
    fn equality_ignores_edge_order() {
        let mut a = DependencyGraph::new(0);
        let one = a.add_node(1);
        let two = a.add_node(2);
        a.add_edge("nsubj", two, one).unwrap();
        a.add_edge("root", NodeId::ROOT, two).unwrap();

        let mut b = DependencyGraph::new(0);
        let one = b.add_node(1);
        let two = b.add_node(2);
        b.add_edge("root", NodeId::ROOT, two).unwrap();
        b.add_edge("nsubj", two, one).unwrap();

        assert_eq!(a, b);
    }
}
