//! Optional natural-language enrichment of reports.
//!
//! Enrichment is strictly a collaborator behind a capability interface:
//! absence or failure of the backend never blocks report generation, the
//! enrichment fields are simply omitted.

mod ollama;

use indexmap::IndexMap;

use crate::error::Result;

pub use ollama::OllamaEnricher;

/// Text-generation backend for column descriptions, dataset summaries,
/// and anomaly explanations.
///
/// Implementations must be thread-safe (Send + Sync); enrichment runs on
/// blocking workers alongside dataset processing.
pub trait Enricher: Send + Sync {
    /// A short description of a column from its name and sample values.
    fn describe_column(&self, column: &str, samples: &[String]) -> Result<String>;

    /// A concise summary of what a dataset represents.
    fn summarize_dataset(
        &self,
        name: &str,
        schema: &[(String, String)],
        sample_rows: &[IndexMap<String, String>],
    ) -> Result<String>;

    /// An explanation of why the flagged rows stand out.
    fn explain_anomalies(
        &self,
        name: &str,
        flagged: &[IndexMap<String, String>],
    ) -> Result<String>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Enricher that produces nothing.
///
/// The default collaborator: keeps the core fully testable without a
/// text-generation backend.
pub struct NoopEnricher;

impl Enricher for NoopEnricher {
    fn describe_column(&self, _column: &str, _samples: &[String]) -> Result<String> {
        Ok(String::new())
    }

    fn summarize_dataset(
        &self,
        _name: &str,
        _schema: &[(String, String)],
        _sample_rows: &[IndexMap<String, String>],
    ) -> Result<String> {
        Ok(String::new())
    }

    fn explain_anomalies(
        &self,
        _name: &str,
        _flagged: &[IndexMap<String, String>],
    ) -> Result<String> {
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
