//! Keyword co-occurrence network analysis.
//!
//! Turns a pre-tokenized keyword sequence into an undirected weighted graph
//! (nodes are keywords, edges count shared sliding windows), then computes
//! structural metrics, Louvain communities and a two-panel Graphviz figure.
//!
//! ```
//! use cooccurrence_network::{build, compute_metrics, AnalyzerConfig};
//!
//! let graph = build(&["a", "b", "a", "b", "c"], 2, 1, 1).unwrap();
//! assert_eq!(graph.weight("a", "b"), Some(3));
//!
//! let report = compute_metrics(&graph, &AnalyzerConfig::default());
//! assert_eq!(report.edges, 2);
//! ```

pub mod builder;
pub mod centrality;
pub mod community;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod keywords;
pub mod metrics;
pub mod pipeline;
pub mod render;
pub mod tokens;

pub use builder::{NetworkBuilder, build};
pub use centrality::CentralityMeasure;
pub use community::{LouvainConfig, Partition, modularity, partition};
pub use config::{
    AnalysisConfig, AnalyzerConfig, CentralityFallback, DisplayConfig, NetworkConfig,
    OutputConfig,
};
pub use error::{CentralityUnavailable, NetworkError, Result};
pub use graph::{CooccurrenceGraph, Keyword, WeightedEdge};
pub use keywords::{KeywordRanking, RankedKeyword};
pub use metrics::{GraphScope, MetricsReport, compute_metrics, compute_metrics_for};
pub use pipeline::{AnalysisOutcome, Pipeline};
