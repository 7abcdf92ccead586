//! Error types for the Confluence library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Confluence operations.
#[derive(Debug, Error)]
pub enum ConfluenceError {
    /// A connector cannot reach its backing store.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// A named table, schema, or root does not exist.
    #[error("source not found: {0}")]
    SourceNotFound(String),

    /// Malformed mapping configuration (threshold, epsilon, or reference set).
    ///
    /// Surfaced before any dataset is processed; a run never starts with an
    /// invalid mapping configuration.
    #[error("invalid mapping config: {0}")]
    InvalidMappingConfig(String),

    /// The enrichment backend is absent or failing. Never blocks a report;
    /// callers record it and omit the enrichment fields.
    #[error("enrichment unavailable: {0}")]
    EnrichmentUnavailable(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing delimited data.
    #[error("parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to analyze.
    #[error("empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Terminal failure reported by a streaming run.
    #[error("run failed: {0}")]
    RunFailed(String),
}

/// Result type alias for Confluence operations.
pub type Result<T> = std::result::Result<T, ConfluenceError>;
