//! Sliding-window co-occurrence network construction.

use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::graph::CooccurrenceGraph;
use crate::keywords::count_tokens;

/// Builds a [`CooccurrenceGraph`] from a token sequence.
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    config: NetworkConfig,
}

impl NetworkBuilder {
    /// Fails fast on an invalid configuration.
    pub fn new(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Build the network.
    ///
    /// Tokens below `min_node_freq` are removed before windowing, so they never
    /// separate or join other tokens. Each window contributes at most one count
    /// per unordered pair of distinct tokens.
    pub fn build<S: AsRef<str>>(&self, tokens: &[S]) -> CooccurrenceGraph {
        let NetworkConfig {
            window_size,
            min_node_freq,
            min_edge_weight,
        } = self.config;

        let frequencies = count_tokens(tokens);
        let filtered: Vec<&str> = tokens
            .iter()
            .map(AsRef::as_ref)
            .filter(|t| frequencies.get(t).is_some_and(|&f| f >= min_node_freq))
            .collect();

        if filtered.is_empty() {
            warn!(
                tokens = tokens.len(),
                min_node_freq, "no tokens left after frequency filtering, graph is empty"
            );
            return CooccurrenceGraph::new();
        }

        let mut graph = CooccurrenceGraph::new();
        let ids: Vec<NodeIndex> = filtered
            .iter()
            .map(|t| graph.add_keyword(t, frequencies.get(t).copied().unwrap_or(0)))
            .collect();

        let pair_counts = count_window_pairs(&ids, window_size);
        let mut pruned = 0usize;
        for ((a, b), count) in pair_counts {
            if count >= min_edge_weight {
                graph.add_cooccurrence(NodeIndex::new(a), NodeIndex::new(b), count);
            } else {
                pruned += 1;
            }
        }

        debug!(pruned, min_edge_weight, "dropped weak pairs");
        info!(
            tokens = tokens.len(),
            filtered = filtered.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            window_size,
            "built co-occurrence network"
        );

        graph
    }
}

/// Build with explicit parameters.
pub fn build<S: AsRef<str>>(
    tokens: &[S],
    window_size: usize,
    min_node_freq: usize,
    min_edge_weight: u32,
) -> Result<CooccurrenceGraph> {
    let builder = NetworkBuilder::new(NetworkConfig::new(
        window_size,
        min_node_freq,
        min_edge_weight,
    ))?;
    Ok(builder.build(tokens))
}

/// Count, per unordered pair of node indices, the windows containing both.
///
/// Keys are `(smaller, larger)` index pairs; the ordered map keeps edge
/// insertion order stable.
fn count_window_pairs(ids: &[NodeIndex], window_size: usize) -> BTreeMap<(usize, usize), u32> {
    let mut counts = BTreeMap::new();
    let mut uniq = Vec::with_capacity(window_size);

    for window in ids.windows(window_size) {
        uniq.clear();
        uniq.extend(window.iter().map(|id| id.index()));
        uniq.sort_unstable();
        uniq.dedup();

        for i in 0..uniq.len() {
            for j in (i + 1)..uniq.len() {
                *counts.entry((uniq[i], uniq[j])).or_insert(0) += 1;
            }
        }
    }

    counts
}
