//! The keyword co-occurrence graph.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A keyword node and its frequency in the full token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: String,
    pub frequency: usize,
}

/// One undirected edge as exported: `weight` is the number of windows in
/// which `source` and `target` co-occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub source: String,
    pub target: String,
    pub weight: u32,
}

/// Undirected, weighted, simple graph of keywords.
///
/// Node order is insertion order and edges keep their insertion order, so two
/// graphs built from the same input compare equal.
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceGraph {
    graph: UnGraph<Keyword, u32>,
    node_indices: HashMap<String, NodeIndex>,
}

impl CooccurrenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the underlying petgraph graph.
    pub fn inner(&self) -> &UnGraph<Keyword, u32> {
        &self.graph
    }

    pub(crate) fn add_keyword(&mut self, name: &str, frequency: usize) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(Keyword {
            name: name.to_string(),
            frequency,
        });
        self.node_indices.insert(name.to_string(), idx);
        idx
    }

    /// Add an edge between two existing, distinct nodes.
    pub(crate) fn add_cooccurrence(&mut self, a: NodeIndex, b: NodeIndex, weight: u32) {
        debug_assert_ne!(a, b, "co-occurrence graph has no self-loops");
        debug_assert!(weight >= 1);
        if let Some(edge) = self.graph.find_edge(a, b) {
            self.graph[edge] += weight;
        } else {
            self.graph.add_edge(a, b, weight);
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.node_indices.get(name).copied()
    }

    pub fn keyword(&self, name: &str) -> Option<&Keyword> {
        self.index_of(name).map(|idx| &self.graph[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_indices.contains_key(name)
    }

    pub fn frequency(&self, name: &str) -> Option<usize> {
        self.keyword(name).map(|k| k.frequency)
    }

    pub fn degree(&self, name: &str) -> Option<usize> {
        self.index_of(name)
            .map(|idx| self.graph.neighbors(idx).count())
    }

    /// Co-occurrence weight between two keywords, in either order.
    pub fn weight(&self, a: &str, b: &str) -> Option<u32> {
        let (a, b) = (self.index_of(a)?, self.index_of(b)?);
        self.graph
            .find_edge(a, b)
            .and_then(|e| self.graph.edge_weight(e))
            .copied()
    }

    /// Keywords in node order.
    pub fn keywords(&self) -> impl Iterator<Item = &Keyword> + '_ {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> Vec<WeightedEdge> {
        self.graph
            .edge_references()
            .map(|e| WeightedEdge {
                source: self.graph[e.source()].name.clone(),
                target: self.graph[e.target()].name.clone(),
                weight: *e.weight(),
            })
            .collect()
    }

    /// Largest edge weight, or 0 for an edgeless graph.
    pub fn max_weight(&self) -> u32 {
        self.graph.edge_weights().copied().max().unwrap_or(0)
    }

    /// The subgraph formed by `names` and exactly the edges between them.
    ///
    /// Node and edge order follow this graph; unknown names are ignored.
    pub fn induced_subgraph(&self, names: &HashSet<&str>) -> Self {
        let mut sub = Self::new();
        let mut remap = HashMap::with_capacity(names.len());

        for idx in self.graph.node_indices() {
            let keyword = &self.graph[idx];
            if names.contains(keyword.name.as_str()) {
                remap.insert(idx, sub.add_keyword(&keyword.name, keyword.frequency));
            }
        }

        for edge in self.graph.edge_references() {
            if let (Some(&a), Some(&b)) = (remap.get(&edge.source()), remap.get(&edge.target())) {
                sub.add_cooccurrence(a, b, *edge.weight());
            }
        }

        sub
    }

    /// Keep the `max_nodes` most frequent keywords for display.
    ///
    /// Ties on frequency go to the lexicographically smaller name. Graphs that
    /// already fit are returned as an identical copy, which makes the operation
    /// idempotent. The result is for rendering only; metrics and communities
    /// must come from the full graph.
    pub fn downsample(&self, max_nodes: usize) -> Self {
        if self.node_count() <= max_nodes {
            return self.clone();
        }

        let mut ranked: Vec<&Keyword> = self.keywords().collect();
        ranked.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.name.cmp(&b.name))
        });

        let keep: HashSet<&str> = ranked
            .into_iter()
            .take(max_nodes)
            .map(|k| k.name.as_str())
            .collect();

        let sub = self.induced_subgraph(&keep);
        debug!(
            kept = sub.node_count(),
            total = self.node_count(),
            edges = sub.edge_count(),
            "downsampled graph for display"
        );
        sub
    }
}

impl PartialEq for CooccurrenceGraph {
    fn eq(&self, other: &Self) -> bool {
        self.node_count() == other.node_count()
            && self.edge_count() == other.edge_count()
            && self.keywords().eq(other.keywords())
            && self.edges() == other.edges()
    }
}

impl Eq for CooccurrenceGraph {}
