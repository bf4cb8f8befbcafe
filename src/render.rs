//! Graphviz rendering of the display graph.
//!
//! The figure has two panels side by side: keywords coloured by community on
//! the left, and by degree centrality on the right. Both panels draw the same
//! (possibly downsampled) display graph, while colours come from the full-graph
//! partition and metrics.

use std::fmt::Write as _;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::centrality::CentralityMeasure;
use crate::community::Partition;
use crate::error::{NetworkError, Result};
use crate::graph::CooccurrenceGraph;
use crate::metrics::MetricsReport;

/// Categorical palette cycled over community ids.
const PALETTE: [&str; 20] = [
    "#1f77b4", "#aec7e8", "#ff7f0e", "#ffbb78", "#2ca02c", "#98df8a", "#d62728", "#ff9896",
    "#9467bd", "#c5b0d5", "#8c564b", "#c49c94", "#e377c2", "#f7b6d2", "#7f7f7f", "#c7c7c7",
    "#bcbd22", "#dbdb8d", "#17becf", "#9edae5",
];

const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    /// Node count of the full graph, shown when the display graph is smaller.
    pub total_nodes: usize,
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn community_color(community: usize) -> &'static str {
    PALETTE[community % PALETTE.len()]
}

/// Node diameter in inches for a marker area of `max(100, 200 * degree)` pt².
fn node_size(degree: usize) -> f64 {
    (200.0 * degree as f64).max(100.0).sqrt() / POINTS_PER_INCH
}

fn edge_style(weight: u32, max_weight: u32) -> (f64, String) {
    let ratio = if max_weight == 0 {
        0.0
    } else {
        f64::from(weight) / f64::from(max_weight)
    };
    let penwidth = (2.0 * ratio).max(0.3);
    let alpha = ((0.6 * ratio + 0.4) * 255.0).round() as u8;
    (penwidth, format!("#808080{alpha:02x}"))
}

/// Build the two-panel DOT document.
pub fn to_dot(
    graph: &CooccurrenceGraph,
    partition: &Partition,
    report: &MetricsReport,
    options: &RenderOptions,
) -> String {
    let degree_table = report.table(CentralityMeasure::Degree);
    let max_degree_score = degree_table
        .map(|t| {
            graph
                .keywords()
                .filter_map(|k| t.get(&k.name).copied())
                .fold(0.0f64, f64::max)
        })
        .unwrap_or(0.0);
    let max_weight = graph.max_weight();

    let mut label = escape(&options.title);
    if graph.node_count() < options.total_nodes {
        let _ = write!(
            label,
            "\\nshowing {} of {} keywords",
            graph.node_count(),
            options.total_nodes
        );
    }

    let mut dot = String::new();
    let _ = writeln!(dot, "graph cooccurrence {{");
    let _ = writeln!(
        dot,
        "    graph [layout=fdp, label=\"{label}\", labelloc=t, fontsize=20, outputorder=edgesfirst];"
    );
    let _ = writeln!(
        dot,
        "    node [shape=circle, style=filled, fixedsize=false, fontsize=12, penwidth=0];"
    );

    let panels = [
        ("communities", "Communities", "c"),
        ("centrality", "Degree centrality", "d"),
    ];

    for (cluster, title, prefix) in panels {
        let _ = writeln!(dot, "    subgraph cluster_{cluster} {{");
        let _ = writeln!(dot, "        label=\"{title}\";");

        for idx in graph.inner().node_indices() {
            let keyword = &graph.inner()[idx];
            let degree = graph.inner().neighbors(idx).count();
            let size = node_size(degree);
            let fill = if prefix == "c" {
                partition
                    .community_of(&keyword.name)
                    .map_or("#dddddd", community_color)
                    .to_string()
            } else {
                let score = degree_table
                    .and_then(|t| t.get(&keyword.name).copied())
                    .unwrap_or(0.0);
                let saturation = if max_degree_score > 0.0 {
                    0.1 + 0.9 * score / max_degree_score
                } else {
                    0.1
                };
                format!("0.000 {saturation:.3} 0.950")
            };
            let _ = writeln!(
                dot,
                "        \"{prefix}{}\" [label=\"{}\", width={size:.3}, height={size:.3}, fillcolor=\"{fill}\"];",
                idx.index(),
                escape(&keyword.name),
            );
        }

        for edge in graph.inner().raw_edges() {
            let (penwidth, color) = edge_style(edge.weight, max_weight);
            let _ = writeln!(
                dot,
                "        \"{prefix}{}\" -- \"{prefix}{}\" [penwidth={penwidth:.2}, color=\"{color}\"];",
                edge.source().index(),
                edge.target().index(),
            );
        }

        let _ = writeln!(dot, "    }}");
    }

    let _ = writeln!(dot, "}}");
    dot
}

/// Run Graphviz to turn `dot_file` into a PNG.
pub fn render_png(dot_file: &Path, output_image: &Path) -> Result<()> {
    debug!(dot = %dot_file.display(), image = %output_image.display(), "invoking graphviz");
    let status = Command::new("dot")
        .arg("-Tpng")
        .arg(dot_file)
        .arg("-o")
        .arg(output_image)
        .status()
        .map_err(|e| NetworkError::Render(format!("could not run graphviz `dot`: {e}")))?;

    if !status.success() {
        return Err(NetworkError::Render(format!("graphviz exited with {status}")));
    }
    info!(image = %output_image.display(), "rendered network visualization");
    Ok(())
}

/// Open an image with the platform viewer.
pub fn open_image(image: &Path) -> Result<()> {
    let opener = if cfg!(target_os = "windows") {
        "start"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };

    Command::new(opener).arg(image).status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::community::{LouvainConfig, partition};
    use crate::config::AnalyzerConfig;
    use crate::metrics::compute_metrics;

    fn render(graph: &CooccurrenceGraph, total_nodes: usize) -> String {
        let report = compute_metrics(graph, &AnalyzerConfig::default());
        let p = partition(graph, &LouvainConfig::default());
        to_dot(
            graph,
            &p,
            &report,
            &RenderOptions {
                title: "test".into(),
                total_nodes,
            },
        )
    }

    #[test]
    fn both_panels_draw_every_node_and_edge() {
        let g = build(&["a", "b", "a", "b", "c"], 2, 1, 1).unwrap();
        let dot = render(&g, g.node_count());

        assert!(dot.starts_with("graph cooccurrence {"));
        assert!(dot.contains("subgraph cluster_communities"));
        assert!(dot.contains("subgraph cluster_centrality"));
        assert_eq!(dot.matches("[label=\"").count(), 2 * g.node_count());
        assert_eq!(dot.matches(" -- ").count(), 2 * g.edge_count());
        assert!(!dot.contains("showing"));
    }

    #[test]
    fn heaviest_edge_is_widest_and_opaque() {
        assert_eq!(edge_style(4, 4), (2.0, "#808080ff".to_string()));
        let (width, color) = edge_style(1, 4);
        assert!((width - 0.5).abs() < 1e-12);
        assert_eq!(color, "#8080808c");
    }

    #[test]
    fn node_size_has_a_floor() {
        assert!((node_size(0) - 10.0 / 72.0).abs() < 1e-12);
        assert!(node_size(3) > node_size(1));
    }

    #[test]
    fn labels_are_escaped_and_downsampling_noted() {
        let g = build(&["say \"hi\"", "x", "say \"hi\"", "x"], 2, 1, 1).unwrap();
        let dot = render(&g, 10);
        assert!(dot.contains("label=\"say \\\"hi\\\"\""));
        assert!(dot.contains("showing 2 of 10 keywords"));
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(community_color(0), community_color(20));
        assert_ne!(community_color(0), community_color(1));
    }
}
