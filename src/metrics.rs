//! Graph-level statistics and per-node centrality tables.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::centrality::{
    CentralityMeasure, betweenness_centrality, closeness_centrality, degree_centrality,
    eigenvector_centrality,
};
use crate::config::{AnalyzerConfig, CentralityFallback};
use crate::error::CentralityUnavailable;
use crate::graph::CooccurrenceGraph;

/// Which graph a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphScope {
    Full,
    Display,
}

/// Scores keyed by keyword name.
pub type CentralityTable = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CentralityTables {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<CentralityTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closeness: Option<CentralityTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub betweenness: Option<CentralityTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eigenvector: Option<CentralityTable>,
}

impl CentralityTables {
    pub fn get(&self, measure: CentralityMeasure) -> Option<&CentralityTable> {
        match measure {
            CentralityMeasure::Degree => self.degree.as_ref(),
            CentralityMeasure::Closeness => self.closeness.as_ref(),
            CentralityMeasure::Betweenness => self.betweenness.as_ref(),
            CentralityMeasure::Eigenvector => self.eigenvector.as_ref(),
        }
    }

    fn slot(&mut self, measure: CentralityMeasure) -> &mut Option<CentralityTable> {
        match measure {
            CentralityMeasure::Degree => &mut self.degree,
            CentralityMeasure::Closeness => &mut self.closeness,
            CentralityMeasure::Betweenness => &mut self.betweenness,
            CentralityMeasure::Eigenvector => &mut self.eigenvector,
        }
    }

    /// Measures that produced a table.
    pub fn available(&self) -> Vec<CentralityMeasure> {
        CentralityMeasure::ALL
            .into_iter()
            .filter(|m| self.get(*m).is_some())
            .collect()
    }
}

/// Structural statistics of one graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub scope: GraphScope,
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    pub average_clustering: f64,
    /// Absent when the graph has fewer than two nodes or no edges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centrality: Option<CentralityTables>,
    /// Measures that could not be computed, with the reason.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<CentralityUnavailable>,
}

impl MetricsReport {
    /// True when some centrality measure was dropped.
    pub fn is_partial(&self) -> bool {
        !self.unavailable.is_empty()
    }

    pub fn table(&self, measure: CentralityMeasure) -> Option<&CentralityTable> {
        self.centrality.as_ref().and_then(|c| c.get(measure))
    }

    /// The `k` highest-scoring keywords for `measure`, ties by name.
    pub fn top_nodes(&self, measure: CentralityMeasure, k: usize) -> Vec<(&str, f64)> {
        let Some(table) = self.table(measure) else {
            return Vec::new();
        };
        let mut ranked: Vec<(&str, f64)> = table.iter().map(|(n, s)| (n.as_str(), *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(k);
        ranked
    }
}

/// `2|E| / (|V|(|V| - 1))`, zero below two nodes.
pub fn density(graph: &CooccurrenceGraph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    (2 * graph.edge_count()) as f64 / (n * (n - 1)) as f64
}

/// Unweighted local clustering coefficient per node.
pub fn clustering(graph: &CooccurrenceGraph) -> Vec<f64> {
    let inner = graph.inner();
    let neighbor_sets: Vec<HashSet<usize>> = inner
        .node_indices()
        .map(|idx| inner.neighbors(idx).map(|n| n.index()).collect())
        .collect();

    neighbor_sets
        .iter()
        .map(|nbrs| {
            let d = nbrs.len();
            if d < 2 {
                return 0.0;
            }
            let links: usize = nbrs
                .iter()
                .map(|&u| neighbor_sets[u].intersection(nbrs).count())
                .sum();
            // each link between neighbours was seen from both ends
            links as f64 / (d * (d - 1)) as f64
        })
        .collect()
}

/// Mean local clustering coefficient over all nodes.
pub fn average_clustering(graph: &CooccurrenceGraph) -> f64 {
    if graph.edge_count() == 0 {
        return 0.0;
    }
    let values = clustering(graph);
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compute the report for the full analysis graph.
pub fn compute_metrics(graph: &CooccurrenceGraph, config: &AnalyzerConfig) -> MetricsReport {
    compute_metrics_for(graph, config, GraphScope::Full)
}

/// Compute the report, labelled with the graph it describes.
pub fn compute_metrics_for(
    graph: &CooccurrenceGraph,
    config: &AnalyzerConfig,
    scope: GraphScope,
) -> MetricsReport {
    let nodes = graph.node_count();
    let edges = graph.edge_count();

    let mut report = MetricsReport {
        scope,
        nodes,
        edges,
        density: density(graph),
        average_clustering: average_clustering(graph),
        centrality: None,
        unavailable: Vec::new(),
    };

    if nodes < 2 || edges == 0 {
        debug!(nodes, edges, "graph too small for centrality");
        return report;
    }

    let (tables, unavailable) = centrality_tables(graph, config);
    report.centrality = Some(tables);
    report.unavailable = unavailable;

    info!(
        ?scope,
        nodes,
        edges,
        density = report.density,
        average_clustering = report.average_clustering,
        partial = report.is_partial(),
        "computed network metrics"
    );
    report
}

fn centrality_tables(
    graph: &CooccurrenceGraph,
    config: &AnalyzerConfig,
) -> (CentralityTables, Vec<CentralityUnavailable>) {
    let mut tables = CentralityTables::default();
    let mut unavailable = Vec::new();

    for measure in CentralityMeasure::ALL {
        let scores = match measure {
            CentralityMeasure::Degree => Ok(degree_centrality(graph)),
            CentralityMeasure::Closeness => Ok(closeness_centrality(graph)),
            CentralityMeasure::Betweenness => Ok(betweenness_centrality(graph)),
            CentralityMeasure::Eigenvector => eigenvector_centrality(
                graph,
                config.eigenvector_max_iterations,
                config.eigenvector_tolerance,
                config.eigenvector_weighted,
            ),
        };

        match scores {
            Ok(scores) => *tables.slot(measure) = Some(keyed_by_name(graph, &scores)),
            Err(failure) => {
                warn!(%failure, "centrality measure dropped");
                unavailable.push(failure);
            }
        }
    }

    if !unavailable.is_empty() && config.centrality_fallback == CentralityFallback::DegreeOnly {
        tables = CentralityTables {
            degree: tables.degree,
            ..CentralityTables::default()
        };
    }

    (tables, unavailable)
}

fn keyed_by_name(graph: &CooccurrenceGraph, scores: &[f64]) -> CentralityTable {
    graph
        .keywords()
        .zip(scores)
        .map(|(k, &s)| (k.name.clone(), s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use approx::assert_abs_diff_eq;

    fn path(names: &[&str]) -> CooccurrenceGraph {
        let mut g = CooccurrenceGraph::new();
        let ids: Vec<_> = names.iter().map(|n| g.add_keyword(n, 1)).collect();
        for pair in ids.windows(2) {
            g.add_cooccurrence(pair[0], pair[1], 1);
        }
        g
    }

    #[test]
    fn density_of_four_nodes_three_edges() {
        let g = path(&["a", "b", "c", "d"]);
        assert_eq!(g.edge_count(), 3);
        assert_abs_diff_eq!(density(&g), 0.5);
    }

    #[test]
    fn empty_graph_report_is_zeroed() {
        let tokens: Vec<&str> = Vec::new();
        let g = build(&tokens, 5, 1, 1).unwrap();
        let report = compute_metrics(&g, &AnalyzerConfig::default());

        assert_eq!(report.nodes, 0);
        assert_eq!(report.edges, 0);
        assert_eq!(report.density, 0.0);
        assert_eq!(report.average_clustering, 0.0);
        assert!(report.centrality.is_none());
        assert!(!report.is_partial());
    }

    #[test]
    fn edgeless_graph_has_no_centrality() {
        let g = build(&["x"; 10], 3, 1, 1).unwrap();
        let report = compute_metrics(&g, &AnalyzerConfig::default());
        assert_eq!(report.nodes, 1);
        assert!(report.centrality.is_none());
    }

    #[test]
    fn clustering_of_triangle_with_tail() {
        // triangle a-b-c plus c-d
        let mut g = path(&["a", "b", "c", "d"]);
        let a = g.index_of("a").unwrap();
        let c = g.index_of("c").unwrap();
        g.add_cooccurrence(a, c, 1);

        let cc = clustering(&g);
        let at = |name: &str| cc[g.index_of(name).unwrap().index()];
        assert_abs_diff_eq!(at("a"), 1.0);
        assert_abs_diff_eq!(at("b"), 1.0);
        assert_abs_diff_eq!(at("c"), 1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(at("d"), 0.0);
        assert_abs_diff_eq!(average_clustering(&g), (2.0 + 1.0 / 3.0) / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn full_report_has_all_tables() {
        let g = path(&["a", "b", "c"]);
        let report = compute_metrics(&g, &AnalyzerConfig::default());
        let tables = report.centrality.as_ref().unwrap();

        assert_eq!(tables.available(), CentralityMeasure::ALL.to_vec());
        assert_eq!(report.scope, GraphScope::Full);
        assert_abs_diff_eq!(tables.degree.as_ref().unwrap()["b"], 1.0);
        assert_eq!(report.top_nodes(CentralityMeasure::Betweenness, 1)[0].0, "b");
    }

    #[test]
    fn display_scope_is_labelled() {
        let g = path(&["a", "b", "c", "d"]);
        let display = g.downsample(2);
        let report = compute_metrics_for(&display, &AnalyzerConfig::default(), GraphScope::Display);
        assert_eq!(report.scope, GraphScope::Display);
        assert_eq!(report.nodes, 2);
        assert_eq!(serde_json::to_value(&report).unwrap()["scope"], "display");
    }

    #[test]
    fn eigenvector_failure_is_annotated_per_measure() {
        let g = path(&["a", "b", "c"]);
        let config = AnalyzerConfig {
            eigenvector_max_iterations: 1,
            ..AnalyzerConfig::default()
        };
        let report = compute_metrics(&g, &config);

        assert!(report.is_partial());
        assert_eq!(report.unavailable.len(), 1);
        assert_eq!(report.unavailable[0].measure, CentralityMeasure::Eigenvector);
        assert!(report.table(CentralityMeasure::Eigenvector).is_none());
        assert!(report.table(CentralityMeasure::Closeness).is_some());
        assert!(report.table(CentralityMeasure::Betweenness).is_some());
    }

    #[test]
    fn degree_only_fallback_keeps_only_degree() {
        let g = path(&["a", "b", "c"]);
        let config = AnalyzerConfig {
            eigenvector_max_iterations: 1,
            centrality_fallback: CentralityFallback::DegreeOnly,
            ..AnalyzerConfig::default()
        };
        let report = compute_metrics(&g, &config);

        assert_eq!(
            report.centrality.as_ref().unwrap().available(),
            vec![CentralityMeasure::Degree]
        );
        assert_eq!(report.unavailable[0].measure, CentralityMeasure::Eigenvector);
    }

    #[test]
    fn report_serializes_failures() {
        let g = path(&["a", "b", "c"]);
        let config = AnalyzerConfig {
            eigenvector_max_iterations: 1,
            ..AnalyzerConfig::default()
        };
        let json = serde_json::to_value(compute_metrics(&g, &config)).unwrap();

        assert_eq!(json["scope"], "full");
        assert_eq!(json["unavailable"][0]["measure"], "eigenvector");
        assert!(json["centrality"].get("eigenvector").is_none());
        assert!(json["centrality"]["degree"]["a"].is_number());
    }
}
