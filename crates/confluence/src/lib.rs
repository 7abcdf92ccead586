//! Confluence: profiling, semantic alignment, and anomaly reporting for
//! heterogeneous tabular datasets.
//!
//! Confluence takes many disparate sources (local files or SQL/lakehouse
//! tables), infers each column's type and semantics, aligns columns onto a
//! caller-supplied set of reference fields, and flags statistically
//! anomalous rows, aggregating everything into one unified report per run.
//!
//! # Core Principles
//!
//! - **No per-source code**: columns are matched to the reference
//!   vocabulary by similarity, with explicit ambiguity handling
//! - **Partial success is a first-class outcome**: one bad dataset never
//!   sinks a run
//! - **Reproducible**: sampling and the detector ensemble are
//!   deterministic for a given dataset and seed
//!
//! # Example
//!
//! ```no_run
//! use confluence::{Assistant, LocalFilesSource, MappingConfig};
//!
//! # async fn example() -> confluence::Result<()> {
//! let source = LocalFilesSource::new("./data");
//! let mapping = MappingConfig::new(vec![
//!     "customer_id".to_string(),
//!     "email".to_string(),
//!     "amount".to_string(),
//! ]);
//!
//! let report = Assistant::new(source).with_mapping(mapping).run().await?;
//!
//! for dataset in &report.datasets {
//!     println!("{}: {} columns mapped", dataset.name, dataset.mapped_column_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod anomaly;
pub mod enrich;
pub mod error;
pub mod input;
pub mod mapping;
pub mod profile;
pub mod report;

mod assistant;

pub use crate::assistant::{Assistant, CancelHandle, RunEvent, RunOptions};
pub use anomaly::{AnomalyConfig, AnomalyResult, DetectionMethod};
pub use enrich::{Enricher, NoopEnricher, OllamaEnricher};
pub use error::{ConfluenceError, Result};
pub use input::{DataSource, Dataset, LocalFilesSource, MemorySource, SourceInfo};
pub use mapping::{MappingConfig, MappingOutcome, SemanticFieldMapper};
pub use profile::{
    ColumnProfiler, ColumnStats, PrimitiveType, SchemaInference, SchemaRecognizer, SemanticType,
};
pub use report::{AssistantReport, ColumnReport, DatasetReport};
