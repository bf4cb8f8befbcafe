//! End-to-end analysis run: build, analyze, export, render.

use std::fmt;
use std::fs;

use tracing::{info, warn};

use crate::builder::NetworkBuilder;
use crate::community::{LouvainConfig, Partition, partition};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::export::{self, ArtifactPaths};
use crate::graph::CooccurrenceGraph;
use crate::keywords::{KeywordRanking, RankedKeyword};
use crate::metrics::{MetricsReport, compute_metrics};
use crate::render::{self, RenderOptions};

pub const DOT_FILE: &str = "network.dot";
pub const IMAGE_FILE: &str = "network.png";

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub token_count: usize,
    /// Distinct keywords at or above the node frequency threshold.
    pub keyword_count: usize,
    pub top_keywords: Vec<RankedKeyword>,
    /// The full graph that metrics and communities describe.
    pub graph: CooccurrenceGraph,
    pub report: MetricsReport,
    pub partition: Partition,
    /// Keywords drawn in the figure.
    pub display_nodes: usize,
    pub artifacts: ArtifactPaths,
    /// Why no image was produced, when rendering was requested but failed.
    pub render_error: Option<String>,
}

impl fmt::Display for AnalysisOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Analysis summary ===")?;
        writeln!(f, "Extracted tokens:    {}", self.token_count)?;
        writeln!(f, "Distinct keywords:   {}", self.keyword_count)?;
        writeln!(f, "Network nodes:       {}", self.report.nodes)?;
        writeln!(f, "Network edges:       {}", self.report.edges)?;
        writeln!(f, "Network density:     {:.4}", self.report.density)?;
        writeln!(f, "Avg. clustering:     {:.4}", self.report.average_clustering)?;
        writeln!(
            f,
            "Communities:         {} (modularity {:.4}, seed {})",
            self.partition.community_count(),
            self.partition.modularity,
            self.partition.seed
        )?;
        if self.display_nodes < self.report.nodes {
            writeln!(
                f,
                "Figure shows the {} most frequent of {} keywords",
                self.display_nodes, self.report.nodes
            )?;
        }
        for failure in &self.report.unavailable {
            writeln!(f, "Note: {failure}")?;
        }

        if !self.top_keywords.is_empty() {
            writeln!(f)?;
            writeln!(f, "Top {} keywords:", self.top_keywords.len())?;
            for (i, keyword) in self.top_keywords.iter().enumerate() {
                writeln!(f, "  {}. {}: {}", i + 1, keyword.name, keyword.frequency)?;
            }
        }

        writeln!(f)?;
        if let Some(dir) = self.artifacts.nodes.parent() {
            writeln!(f, "Results saved to '{}'", dir.display())?;
        }
        if let Some(err) = &self.render_error {
            writeln!(f, "Figure not rendered: {err}")?;
        }
        Ok(())
    }
}

/// Runs the complete analysis for one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
    builder: NetworkBuilder,
}

impl Pipeline {
    /// Validates the whole configuration before anything runs.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let builder = NetworkBuilder::new(config.network.clone())?;
        Ok(Self { config, builder })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run<S: AsRef<str>>(&self, tokens: &[S]) -> Result<AnalysisOutcome> {
        let config = &self.config;
        info!("=== keyword co-occurrence analysis started ===");

        info!("1. ranking keywords");
        let ranking = KeywordRanking::from_tokens(tokens, config.network.min_node_freq);
        let top_keywords = ranking.top(config.analysis.top_keywords).to_vec();
        info!(
            top = ?top_keywords
                .iter()
                .map(|k| (k.name.as_str(), k.frequency))
                .collect::<Vec<_>>(),
            "top keywords"
        );

        info!("2. building co-occurrence network");
        let graph = self.builder.build(tokens);

        info!("3. analyzing network");
        let report = compute_metrics(&graph, &config.analysis);
        let partition = partition(&graph, &LouvainConfig::from(&config.analysis));

        info!("4. saving results");
        let mut artifacts = export::write_all(&config.output.dir, &graph, &report, &partition)?;

        info!("5. drawing network");
        let display = graph.downsample(config.display.max_nodes_display);
        let dot = render::to_dot(
            &display,
            &partition,
            &report,
            &RenderOptions {
                title: config.display.title.clone(),
                total_nodes: graph.node_count(),
            },
        );
        let dot_path = config.output.dir.join(DOT_FILE);
        fs::write(&dot_path, dot)?;
        artifacts.dot = Some(dot_path.clone());

        let mut render_error = None;
        if config.output.render {
            let image_path = config.output.dir.join(IMAGE_FILE);
            match render::render_png(&dot_path, &image_path) {
                Ok(()) => artifacts.image = Some(image_path),
                Err(e) => {
                    warn!(error = %e, "skipping network image");
                    render_error = Some(e.to_string());
                }
            }
        }

        info!("=== analysis finished ===");
        Ok(AnalysisOutcome {
            token_count: tokens.len(),
            keyword_count: ranking.len(),
            top_keywords,
            display_nodes: display.node_count(),
            graph,
            report,
            partition,
            artifacts,
            render_error,
        })
    }
}
