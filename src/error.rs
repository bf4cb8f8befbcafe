//! Error types for network construction, analysis and export.

use serde::Serialize;
use thiserror::Error;

use crate::centrality::CentralityMeasure;

/// Result type for co-occurrence network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Top-level error type.
///
/// Small or degenerate graphs are never errors; only bad configuration and
/// failing I/O surface here.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Rejected before any computation starts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Graphviz could not turn the DOT document into an image.
    #[error("render failed: {0}")]
    Render(String),
}

/// A single centrality measure that could not be produced for a graph.
///
/// Reported next to the measures that did succeed.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{measure} centrality unavailable: {reason}")]
pub struct CentralityUnavailable {
    pub measure: CentralityMeasure,
    pub reason: String,
}

impl CentralityUnavailable {
    pub fn new(measure: CentralityMeasure, reason: impl Into<String>) -> Self {
        Self {
            measure,
            reason: reason.into(),
        }
    }
}
