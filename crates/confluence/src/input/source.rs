//! Data-source boundary consumed by the run orchestrator.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::dataset::Dataset;

/// Run-level provenance describing where datasets came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceInfo {
    /// Local directory of delimited files.
    Local { root: String },
    /// SQL or lakehouse source, identified by query and/or schema.
    Sql {
        #[serde(skip_serializing_if = "Option::is_none")]
        query: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
    },
    /// In-memory datasets (tests, embedding callers).
    Memory,
}

/// Contract for connectors that materialize datasets.
///
/// Implementations must be thread-safe (Send + Sync): loading runs on a
/// blocking worker while the orchestrator keeps streaming progress.
pub trait DataSource: Send + Sync {
    /// Materialize every dataset this source yields, in a stable order.
    ///
    /// Errors with [`crate::ConfluenceError::SourceUnavailable`] when the
    /// backing store cannot be reached and
    /// [`crate::ConfluenceError::SourceNotFound`] when the named root,
    /// schema, or table is absent. Individual unreadable datasets may be
    /// omitted with a logged warning instead of failing the whole load.
    fn load(&self) -> Result<Vec<Dataset>>;

    /// Run-level provenance recorded on the final report.
    fn info(&self) -> SourceInfo;

    /// List schemas available for discovery before a run is configured.
    fn list_schemas(&self) -> Result<Vec<String>>;

    /// List tables within a schema.
    fn list_tables(&self, schema: &str) -> Result<Vec<String>>;
}

/// A source backed by pre-built datasets.
///
/// Useful for tests and for callers that already hold tabular data in
/// memory and only want the analysis pipeline.
pub struct MemorySource {
    datasets: Vec<Dataset>,
}

impl MemorySource {
    /// Create a source over the given datasets.
    pub fn new(datasets: Vec<Dataset>) -> Self {
        Self { datasets }
    }
}

impl DataSource for MemorySource {
    fn load(&self) -> Result<Vec<Dataset>> {
        Ok(self.datasets.clone())
    }

    fn info(&self) -> SourceInfo {
        SourceInfo::Memory
    }

    fn list_schemas(&self) -> Result<Vec<String>> {
        Ok(vec!["memory".to_string()])
    }

    fn list_tables(&self, _schema: &str) -> Result<Vec<String>> {
        Ok(self.datasets.iter().map(|d| d.name.clone()).collect())
    }
}
