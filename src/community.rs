//! Louvain community detection.
//!
//! Nodes are moved greedily between neighbouring communities while weighted
//! modularity improves, then each community is collapsed into a single node
//! and the process repeats on the smaller graph. The visiting order of every
//! pass is a seeded shuffle, so a given seed always yields the same partition.

use std::collections::{BTreeMap, HashMap};

use petgraph::visit::EdgeRef;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalyzerConfig;
use crate::graph::CooccurrenceGraph;

/// Smallest modularity gain that still counts as progress.
const MIN_GAIN: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LouvainConfig {
    pub seed: u64,
    pub resolution: f64,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            resolution: 1.0,
        }
    }
}

impl From<&AnalyzerConfig> for LouvainConfig {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            seed: config.seed,
            resolution: config.resolution,
        }
    }
}

/// Mapping from keyword to community id.
///
/// Ids are dense (`0..community_count`) and numbered by first appearance in
/// graph node order; they carry no other meaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    assignments: BTreeMap<String, usize>,
    community_count: usize,
    pub modularity: f64,
    pub seed: u64,
}

impl Partition {
    pub fn community_of(&self, name: &str) -> Option<usize> {
        self.assignments.get(name).copied()
    }

    pub fn community_count(&self) -> usize {
        self.community_count
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// `(keyword, community)` pairs ordered by keyword.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.assignments.iter().map(|(k, &c)| (k.as_str(), c))
    }

    /// Members of each community, largest community first.
    pub fn communities(&self) -> Vec<Vec<String>> {
        let mut groups = vec![Vec::new(); self.community_count];
        for (name, &c) in &self.assignments {
            groups[c].push(name.clone());
        }
        groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        groups
    }
}

/// Weighted graph collapsed to plain indices, as used by one Louvain level.
///
/// `loops[i]` holds the weight of edges folded inside node `i`; it counts
/// twice towards the node's degree.
#[derive(Debug, Clone)]
struct LevelGraph {
    adj: Vec<Vec<(usize, f64)>>,
    loops: Vec<f64>,
    degrees: Vec<f64>,
    total_weight: f64,
}

impl LevelGraph {
    fn from_graph(graph: &CooccurrenceGraph) -> Self {
        let inner = graph.inner();
        let mut adj = vec![Vec::new(); inner.node_count()];
        for edge in inner.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            let w = f64::from(*edge.weight());
            adj[a].push((b, w));
            adj[b].push((a, w));
        }
        Self::new(adj, vec![0.0; inner.node_count()])
    }

    fn new(adj: Vec<Vec<(usize, f64)>>, loops: Vec<f64>) -> Self {
        let degrees: Vec<f64> = adj
            .iter()
            .zip(&loops)
            .map(|(nbrs, l)| nbrs.iter().map(|(_, w)| w).sum::<f64>() + 2.0 * l)
            .collect();
        let total_weight = degrees.iter().sum::<f64>() / 2.0;
        Self {
            adj,
            loops,
            degrees,
            total_weight,
        }
    }

    fn len(&self) -> usize {
        self.adj.len()
    }

    fn modularity(&self, communities: &[usize], count: usize, resolution: f64) -> f64 {
        if self.total_weight == 0.0 {
            return 0.0;
        }
        let mut internal = vec![0.0; count];
        let mut total = vec![0.0; count];

        for v in 0..self.len() {
            let c = communities[v];
            total[c] += self.degrees[v];
            internal[c] += self.loops[v];
            for &(u, w) in &self.adj[v] {
                // each internal edge appears in both adjacency lists
                if communities[u] == c {
                    internal[c] += w / 2.0;
                }
            }
        }

        let m = self.total_weight;
        internal
            .iter()
            .zip(&total)
            .map(|(i, t)| i / m - resolution * (t / (2.0 * m)).powi(2))
            .sum()
    }

    /// Local moving phase; returns the community of each node.
    fn one_level(&self, rng: &mut StdRng, resolution: f64) -> Vec<usize> {
        let n = self.len();
        let mut communities: Vec<usize> = (0..n).collect();
        let mut totals = self.degrees.clone();
        let two_m = 2.0 * self.total_weight;

        let mut order: Vec<usize> = (0..n).collect();
        let mut current = self.modularity(&communities, n, resolution);

        loop {
            order.shuffle(rng);
            let mut moved = false;

            for &v in &order {
                let own = communities[v];
                let k = self.degrees[v];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for &(u, w) in &self.adj[v] {
                    *links.entry(communities[u]).or_insert(0.0) += w;
                }

                totals[own] -= k;
                let stay =
                    links.get(&own).copied().unwrap_or(0.0) - resolution * totals[own] * k / two_m;

                let mut best = own;
                let mut best_gain = stay;
                for (&c, &w) in &links {
                    let gain = w - resolution * totals[c] * k / two_m;
                    if gain > best_gain {
                        best = c;
                        best_gain = gain;
                    }
                }

                totals[best] += k;
                if best != own {
                    communities[v] = best;
                    moved = true;
                }
            }

            let next = self.modularity(&communities, n, resolution);
            if !moved || next - current < MIN_GAIN {
                break;
            }
            current = next;
        }

        communities
    }

    /// Collapse each community into one node.
    fn aggregate(&self, communities: &[usize], count: usize) -> Self {
        let mut weights: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        let mut loops = vec![0.0; count];

        for v in 0..self.len() {
            let cv = communities[v];
            loops[cv] += self.loops[v];
            for &(u, w) in &self.adj[v] {
                let cu = communities[u];
                if cu == cv {
                    loops[cv] += w / 2.0;
                } else {
                    *weights[cv].entry(cu).or_insert(0.0) += w;
                }
            }
        }

        let adj = weights.into_iter().map(|m| m.into_iter().collect()).collect();
        Self::new(adj, loops)
    }
}

/// Relabel communities densely in order of first appearance.
fn renumber(communities: &[usize]) -> (Vec<usize>, usize) {
    let mut labels: HashMap<usize, usize> = HashMap::new();
    let dense = communities
        .iter()
        .map(|c| {
            let next = labels.len();
            *labels.entry(*c).or_insert(next)
        })
        .collect();
    (dense, labels.len())
}

/// Partition the graph into communities by Louvain modularity maximization.
///
/// A graph without edges yields one singleton community per node.
pub fn partition(graph: &CooccurrenceGraph, config: &LouvainConfig) -> Partition {
    let n = graph.node_count();
    let mut level = LevelGraph::from_graph(graph);
    let mut membership: Vec<usize> = (0..n).collect();
    let mut modularity = 0.0;

    if level.total_weight > 0.0 {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut depth = 0usize;

        loop {
            let moved = level.one_level(&mut rng, config.resolution);
            let (communities, count) = renumber(&moved);
            let next = level.modularity(&communities, count, config.resolution);

            if depth > 0 && next - modularity < MIN_GAIN {
                break;
            }
            for m in membership.iter_mut() {
                *m = communities[*m];
            }
            modularity = next;
            depth += 1;
            debug!(depth, communities = count, modularity, "louvain level");

            if count == level.len() {
                break;
            }
            level = level.aggregate(&communities, count);
        }
    }

    let (membership, community_count) = renumber(&membership);
    let assignments = graph
        .keywords()
        .zip(membership)
        .map(|(k, c)| (k.name.clone(), c))
        .collect();

    info!(
        nodes = n,
        communities = community_count,
        modularity,
        seed = config.seed,
        "detected communities"
    );

    Partition {
        assignments,
        community_count,
        modularity,
        seed: config.seed,
    }
}

/// Weighted modularity of an existing partition on `graph`.
///
/// Keywords missing from the partition are treated as singletons.
pub fn modularity(graph: &CooccurrenceGraph, partition: &Partition, resolution: f64) -> f64 {
    let level = LevelGraph::from_graph(graph);
    let mut next_free = partition.community_count();
    let communities: Vec<usize> = graph
        .keywords()
        .map(|k| {
            partition.community_of(&k.name).unwrap_or_else(|| {
                next_free += 1;
                next_free - 1
            })
        })
        .collect();
    level.modularity(&communities, next_free, resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use approx::assert_abs_diff_eq;

    /// Two 4-cliques joined by a single light edge.
    fn two_cliques() -> CooccurrenceGraph {
        let mut g = CooccurrenceGraph::new();
        let left: Vec<_> = ["a1", "a2", "a3", "a4"]
            .iter()
            .map(|n| g.add_keyword(n, 1))
            .collect();
        let right: Vec<_> = ["b1", "b2", "b3", "b4"]
            .iter()
            .map(|n| g.add_keyword(n, 1))
            .collect();
        for group in [&left, &right] {
            for i in 0..group.len() {
                for j in (i + 1)..group.len() {
                    g.add_cooccurrence(group[i], group[j], 3);
                }
            }
        }
        g.add_cooccurrence(left[0], right[0], 1);
        g
    }

    #[test]
    fn separates_cliques() {
        let g = two_cliques();
        let p = partition(&g, &LouvainConfig::default());

        assert_eq!(p.community_count(), 2);
        let left = p.community_of("a1").unwrap();
        let right = p.community_of("b1").unwrap();
        assert_ne!(left, right);
        for name in ["a2", "a3", "a4"] {
            assert_eq!(p.community_of(name), Some(left));
        }
        for name in ["b2", "b3", "b4"] {
            assert_eq!(p.community_of(name), Some(right));
        }
        assert!(p.modularity > 0.4);
        assert_abs_diff_eq!(p.modularity, modularity(&g, &p, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn edgeless_graph_gives_singletons() {
        let g = build(&["a", "b", "c", "d"], 5, 1, 1).unwrap();
        assert_eq!(g.edge_count(), 0);

        let p = partition(&g, &LouvainConfig::default());
        assert_eq!(p.len(), 4);
        assert_eq!(p.community_count(), 4);
        let mut ids: Vec<usize> = p.iter().map(|(_, c)| c).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(p.modularity, 0.0);
    }

    #[test]
    fn empty_graph_gives_empty_partition() {
        let p = partition(&CooccurrenceGraph::new(), &LouvainConfig::default());
        assert!(p.is_empty());
        assert_eq!(p.community_count(), 0);
    }

    #[test]
    fn same_seed_same_partition() {
        let g = two_cliques();
        let config = LouvainConfig {
            seed: 7,
            resolution: 1.0,
        };
        assert_eq!(partition(&g, &config), partition(&g, &config));
    }

    #[test]
    fn ids_are_dense_and_ordered_by_first_node() {
        let g = two_cliques();
        let p = partition(&g, &LouvainConfig::default());
        assert_eq!(p.community_of("a1"), Some(0));
        assert_eq!(p.community_of("b1"), Some(1));

        let groups = p.communities();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec!["a1", "a2", "a3", "a4"]);
    }

    #[test]
    fn single_community_modularity_is_zero() {
        let g = two_cliques();
        let mut p = partition(&g, &LouvainConfig::default());
        for (_, c) in p.assignments.iter_mut() {
            *c = 0;
        }
        p.community_count = 1;
        assert_abs_diff_eq!(modularity(&g, &p, 1.0), 0.0, epsilon = 1e-12);
    }
}
