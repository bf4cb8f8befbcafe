//! Analysis configuration.
//!
//! Loaded from a TOML file where every field is optional:
//!
//! ```toml
//! [network]
//! window_size = 5
//! min_node_freq = 3
//! min_edge_weight = 2
//!
//! [analysis]
//! seed = 42
//! centrality_fallback = "per-measure"
//!
//! [display]
//! max_nodes_display = 100
//!
//! [output]
//! dir = "./analysis_results"
//! render = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};

/// Parameters of the co-occurrence network builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Length of the sliding co-occurrence window.
    pub window_size: usize,
    /// Tokens seen fewer times than this never become nodes.
    pub min_node_freq: usize,
    /// Pairs co-occurring in fewer windows than this never become edges.
    pub min_edge_weight: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            min_node_freq: 3,
            min_edge_weight: 2,
        }
    }
}

impl NetworkConfig {
    pub fn new(window_size: usize, min_node_freq: usize, min_edge_weight: u32) -> Self {
        Self {
            window_size,
            min_node_freq,
            min_edge_weight,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size < 2 {
            return Err(NetworkError::InvalidConfig(format!(
                "window_size must be at least 2, got {}",
                self.window_size
            )));
        }
        if self.min_node_freq == 0 {
            return Err(NetworkError::InvalidConfig(
                "min_node_freq must be at least 1".into(),
            ));
        }
        if self.min_edge_weight == 0 {
            return Err(NetworkError::InvalidConfig(
                "min_edge_weight must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// What to keep when one centrality measure fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CentralityFallback {
    /// Keep every measure that succeeded.
    #[default]
    PerMeasure,
    /// Keep only degree centrality once anything fails.
    DegreeOnly,
}

/// Parameters of the metric and community computations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Seed for the Louvain node visiting order.
    pub seed: u64,
    /// Modularity resolution; values above 1 favour smaller communities.
    pub resolution: f64,
    pub eigenvector_max_iterations: usize,
    pub eigenvector_tolerance: f64,
    /// Use co-occurrence counts as edge weights in the power iteration.
    pub eigenvector_weighted: bool,
    pub centrality_fallback: CentralityFallback,
    /// How many keywords the summary lists.
    pub top_keywords: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            resolution: 1.0,
            eigenvector_max_iterations: 1000,
            eigenvector_tolerance: 1e-6,
            eigenvector_weighted: false,
            centrality_fallback: CentralityFallback::PerMeasure,
            top_keywords: 10,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(NetworkError::InvalidConfig(format!(
                "resolution must be a positive number, got {}",
                self.resolution
            )));
        }
        if self.eigenvector_max_iterations == 0 {
            return Err(NetworkError::InvalidConfig(
                "eigenvector_max_iterations must be at least 1".into(),
            ));
        }
        if !(self.eigenvector_tolerance.is_finite() && self.eigenvector_tolerance > 0.0) {
            return Err(NetworkError::InvalidConfig(format!(
                "eigenvector_tolerance must be a positive number, got {}",
                self.eigenvector_tolerance
            )));
        }
        Ok(())
    }
}

/// Visualization-only settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Cap on the number of keywords drawn; metrics always use the full graph.
    pub max_nodes_display: usize,
    pub title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_nodes_display: 100,
            title: "Keyword co-occurrence network".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Invoke Graphviz to produce a PNG next to the DOT file.
    pub render: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./analysis_results"),
            render: true,
        }
    }
}

/// Complete configuration of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub network: NetworkConfig,
    pub analysis: AnalyzerConfig,
    pub display: DisplayConfig,
    pub output: OutputConfig,
}

impl AnalysisConfig {
    /// Parse a TOML document. Missing sections and fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.analysis.validate()?;
        if self.display.max_nodes_display == 0 {
            return Err(NetworkError::InvalidConfig(
                "max_nodes_display must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
