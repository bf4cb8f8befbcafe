use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cooccurrence_network::{AnalysisConfig, Pipeline, render, tokens};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cooccurrence-network",
    about = "Keyword co-occurrence network analysis"
)]
struct Cli {
    /// Token file: whitespace-separated keywords in document order
    #[arg(long)]
    tokens: PathBuf,
    /// Path to config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output directory for the result files
    #[arg(long)]
    output_dir: Option<PathBuf>,
    #[arg(long)]
    window_size: Option<usize>,
    #[arg(long)]
    min_node_freq: Option<usize>,
    #[arg(long)]
    min_edge_weight: Option<u32>,
    /// Maximum number of keywords drawn in the figure
    #[arg(long)]
    max_nodes_display: Option<usize>,
    /// Seed for community detection
    #[arg(long)]
    seed: Option<u64>,
    /// Write the DOT file but do not call Graphviz
    #[arg(long)]
    no_render: bool,
    /// Open the rendered image when done
    #[arg(long)]
    open: bool,
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };

        if let Some(v) = self.window_size {
            config.network.window_size = v;
        }
        if let Some(v) = self.min_node_freq {
            config.network.min_node_freq = v;
        }
        if let Some(v) = self.min_edge_weight {
            config.network.min_edge_weight = v;
        }
        if let Some(v) = self.max_nodes_display {
            config.display.max_nodes_display = v;
        }
        if let Some(v) = self.seed {
            config.analysis.seed = v;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if self.no_render {
            config.output.render = false;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.load_config()?;
    let pipeline = Pipeline::new(config)?;

    let tokens = tokens::read_tokens(&cli.tokens)
        .with_context(|| format!("reading tokens from {}", cli.tokens.display()))?;
    let outcome = pipeline.run(&tokens)?;

    println!("{outcome}");

    if cli.open {
        if let Some(image) = &outcome.artifacts.image {
            render::open_image(image)?;
        }
    }

    Ok(())
}
