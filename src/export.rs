//! Serialized node, edge, community and metric artifacts.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::community::Partition;
use crate::error::Result;
use crate::graph::CooccurrenceGraph;
use crate::metrics::MetricsReport;

pub const NODES_FILE: &str = "nodes.csv";
pub const EDGES_FILE: &str = "edges.csv";
pub const COMMUNITIES_FILE: &str = "communities.csv";
pub const METRICS_FILE: &str = "metrics.json";

#[derive(Debug, Serialize)]
struct CommunityRecord<'a> {
    name: &'a str,
    community: usize,
}

/// The metrics document: the report plus a summary of the partition.
#[derive(Debug, Serialize)]
struct MetricsDocument<'a> {
    #[serde(flatten)]
    report: &'a MetricsReport,
    communities: usize,
    modularity: f64,
    seed: u64,
}

/// Where each artifact of a run was written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub nodes: PathBuf,
    pub edges: PathBuf,
    pub communities: PathBuf,
    pub metrics: PathBuf,
    pub dot: Option<PathBuf>,
    pub image: Option<PathBuf>,
}

/// Header written up front so empty tables still describe their columns.
fn table_writer(path: &Path, header: &[&str]) -> Result<csv::Writer<File>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(header)?;
    Ok(writer)
}

/// `name,frequency` per keyword.
pub fn write_nodes(graph: &CooccurrenceGraph, path: &Path) -> Result<()> {
    let mut writer = table_writer(path, &["name", "frequency"])?;
    for keyword in graph.keywords() {
        writer.serialize(keyword)?;
    }
    writer.flush()?;
    Ok(())
}

/// `source,target,weight` per edge.
pub fn write_edges(graph: &CooccurrenceGraph, path: &Path) -> Result<()> {
    let mut writer = table_writer(path, &["source", "target", "weight"])?;
    for edge in graph.edges() {
        writer.serialize(edge)?;
    }
    writer.flush()?;
    Ok(())
}

/// `name,community` per keyword.
pub fn write_communities(partition: &Partition, path: &Path) -> Result<()> {
    let mut writer = table_writer(path, &["name", "community"])?;
    for (name, community) in partition.iter() {
        writer.serialize(CommunityRecord { name, community })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_metrics(report: &MetricsReport, partition: &Partition, path: &Path) -> Result<()> {
    let document = MetricsDocument {
        report,
        communities: partition.community_count(),
        modularity: partition.modularity,
        seed: partition.seed,
    };
    fs::write(path, serde_json::to_string_pretty(&document)?)?;
    Ok(())
}

/// Write every tabular artifact into `dir`, creating it if needed.
pub fn write_all(
    dir: &Path,
    graph: &CooccurrenceGraph,
    report: &MetricsReport,
    partition: &Partition,
) -> Result<ArtifactPaths> {
    fs::create_dir_all(dir)?;

    let paths = ArtifactPaths {
        nodes: dir.join(NODES_FILE),
        edges: dir.join(EDGES_FILE),
        communities: dir.join(COMMUNITIES_FILE),
        metrics: dir.join(METRICS_FILE),
        dot: None,
        image: None,
    };

    write_nodes(graph, &paths.nodes)?;
    write_edges(graph, &paths.edges)?;
    write_communities(partition, &paths.communities)?;
    write_metrics(report, partition, &paths.metrics)?;

    info!(dir = %dir.display(), "saved network results");
    Ok(paths)
}
