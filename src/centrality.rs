//! Node centrality measures.
//!
//! Every function returns one score per node, indexed by petgraph node index.
//! Closeness and betweenness use hop distance; co-occurrence weights only
//! enter eigenvector centrality, and only when asked to.

use std::collections::VecDeque;
use std::fmt;

use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CentralityUnavailable;
use crate::graph::CooccurrenceGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CentralityMeasure {
    Degree,
    Closeness,
    Betweenness,
    Eigenvector,
}

impl CentralityMeasure {
    pub const ALL: [CentralityMeasure; 4] = [
        CentralityMeasure::Degree,
        CentralityMeasure::Closeness,
        CentralityMeasure::Betweenness,
        CentralityMeasure::Eigenvector,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CentralityMeasure::Degree => "degree",
            CentralityMeasure::Closeness => "closeness",
            CentralityMeasure::Betweenness => "betweenness",
            CentralityMeasure::Eigenvector => "eigenvector",
        }
    }
}

impl fmt::Display for CentralityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn adjacency(graph: &CooccurrenceGraph) -> Vec<Vec<usize>> {
    let inner = graph.inner();
    inner
        .node_indices()
        .map(|idx| inner.neighbors(idx).map(|n| n.index()).collect())
        .collect()
}

fn weighted_adjacency(graph: &CooccurrenceGraph, weighted: bool) -> Vec<Vec<(usize, f64)>> {
    let inner = graph.inner();
    inner
        .node_indices()
        .map(|idx| {
            inner
                .edges(idx)
                .map(|e| {
                    let other = if e.source() == idx { e.target() } else { e.source() };
                    let w = if weighted { f64::from(*e.weight()) } else { 1.0 };
                    (other.index(), w)
                })
                .collect()
        })
        .collect()
}

/// Hop distances from `source`; `None` for unreachable nodes.
fn bfs_distances(adj: &[Vec<usize>], source: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; adj.len()];
    let mut queue = VecDeque::new();
    dist[source] = Some(0);
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        let next = dist[v].map_or(0, |d| d + 1);
        for &w in &adj[v] {
            if dist[w].is_none() {
                dist[w] = Some(next);
                queue.push_back(w);
            }
        }
    }

    dist
}

/// Degree divided by `n - 1`.
pub fn degree_centrality(graph: &CooccurrenceGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    adjacency(graph)
        .iter()
        .map(|nbrs| nbrs.len() as f64 * scale)
        .collect()
}

/// Closeness on hop distance, scaled by the fraction of reachable nodes so
/// that nodes in small components do not score as central.
pub fn closeness_centrality(graph: &CooccurrenceGraph) -> Vec<f64> {
    let n = graph.node_count();
    let adj = adjacency(graph);

    (0..n)
        .map(|v| {
            let dist = bfs_distances(&adj, v);
            let (reachable, total) = dist
                .iter()
                .flatten()
                .fold((0usize, 0usize), |(r, t), &d| (r + 1, t + d));

            if total == 0 || n <= 1 {
                return 0.0;
            }
            let r = (reachable - 1) as f64;
            (r / total as f64) * (r / (n - 1) as f64)
        })
        .collect()
}

/// Brandes betweenness, normalized by the number of node pairs not
/// involving the node.
pub fn betweenness_centrality(graph: &CooccurrenceGraph) -> Vec<f64> {
    let n = graph.node_count();
    let adj = adjacency(graph);
    let mut betweenness = vec![0.0; n];

    for s in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist: Vec<Option<usize>> = vec![None; n];
        let mut queue = VecDeque::new();

        sigma[s] = 1.0;
        dist[s] = Some(0);
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let dv = dist[v].unwrap_or(0);
            for &w in &adj[v] {
                if dist[w].is_none() {
                    dist[w] = Some(dv + 1);
                    queue.push_back(w);
                }
                if dist[w] == Some(dv + 1) {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                betweenness[w] += delta[w];
            }
        }
    }

    // Each undirected pair was counted from both ends.
    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for b in &mut betweenness {
            *b *= scale;
        }
    }

    betweenness
}

/// Eigenvector centrality by power iteration on `A + I`.
///
/// The identity shift keeps bipartite graphs from oscillating. Convergence is
/// declared when the L1 change drops below `n * tolerance`.
pub fn eigenvector_centrality(
    graph: &CooccurrenceGraph,
    max_iterations: usize,
    tolerance: f64,
    weighted: bool,
) -> Result<Vec<f64>, CentralityUnavailable> {
    let n = graph.node_count();
    if n == 0 {
        return Err(CentralityUnavailable::new(
            CentralityMeasure::Eigenvector,
            "graph has no nodes",
        ));
    }

    let adj = weighted_adjacency(graph, weighted);
    let mut x = vec![1.0 / n as f64; n];

    for iteration in 0..max_iterations {
        let last = x.clone();
        for (v, nbrs) in adj.iter().enumerate() {
            for &(u, w) in nbrs {
                x[u] += last[v] * w;
            }
        }

        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Err(CentralityUnavailable::new(
                CentralityMeasure::Eigenvector,
                format!("degenerate iterate at step {}", iteration + 1),
            ));
        }
        for v in &mut x {
            *v /= norm;
        }

        let change: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if change < n as f64 * tolerance {
            debug!(iterations = iteration + 1, "eigenvector centrality converged");
            return Ok(x);
        }
    }

    Err(CentralityUnavailable::new(
        CentralityMeasure::Eigenvector,
        format!("power iteration did not converge in {max_iterations} iterations"),
    ))
}
