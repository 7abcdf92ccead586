//! Report assembly: one report per dataset, one per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::{AnomalyResult, DetectionMethod};
use crate::input::{Dataset, SourceInfo};
use crate::mapping::MappingOutcome;
use crate::profile::{ColumnStats, SchemaInference};

/// Enrichment text attached to a dataset report when a backend is
/// available. Everything here is optional by design.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    /// Free-text description per column name.
    pub descriptions: std::collections::HashMap<String, String>,
    /// One-paragraph dataset summary.
    pub summary: Option<String>,
    /// Explanation of why the flagged rows stand out.
    pub anomaly_explanation: Option<String>,
}

/// Everything inferred about a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnReport {
    pub name: String,
    pub inference: SchemaInference,
    pub stats: ColumnStats,
    pub mapping: MappingOutcome,
    /// Enrichment description, when a backend provided one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Aggregated analysis of one dataset. Immutable after assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    pub rows: usize,
    pub cols: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<AnomalyResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_explanation: Option<String>,
    /// Set when the dataset failed to load or profile; other fields are
    /// empty in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub profiled_at: DateTime<Utc>,
}

impl DatasetReport {
    /// Assemble a report from the pipeline outputs for one dataset.
    ///
    /// The mapping and anomaly stages only produce inputs; this is the one
    /// place their results are combined.
    pub fn assemble(
        dataset: &Dataset,
        inferences: Vec<SchemaInference>,
        stats: Vec<ColumnStats>,
        mappings: Vec<MappingOutcome>,
        anomalies: Vec<AnomalyResult>,
        enrichment: Enrichment,
    ) -> Self {
        let mut descriptions = enrichment.descriptions;
        let columns = dataset
            .headers
            .iter()
            .zip(inferences)
            .zip(stats)
            .zip(mappings)
            .map(|(((name, inference), stats), mapping)| ColumnReport {
                name: name.clone(),
                description: descriptions.remove(name),
                inference,
                stats,
                mapping,
            })
            .collect();

        Self {
            name: dataset.name.clone(),
            path: dataset.path.as_ref().map(|p| p.display().to_string()),
            fingerprint: dataset.fingerprint.clone(),
            rows: dataset.row_count(),
            cols: dataset.column_count(),
            columns,
            anomalies,
            summary: enrichment.summary,
            anomaly_explanation: enrichment.anomaly_explanation,
            error: None,
            profiled_at: Utc::now(),
        }
    }

    /// Report for a dataset that failed to load or profile.
    pub fn failed(name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            name: name.into(),
            path: None,
            fingerprint: None,
            rows: 0,
            cols: 0,
            columns: Vec::new(),
            anomalies: Vec::new(),
            summary: None,
            anomaly_explanation: None,
            error: Some(error.to_string()),
            profiled_at: Utc::now(),
        }
    }

    /// Look up the result of one detection method.
    pub fn anomalies_for(&self, method: DetectionMethod) -> Option<&AnomalyResult> {
        self.anomalies.iter().find(|a| a.method == method)
    }

    /// Number of columns that mapped cleanly.
    pub fn mapped_column_count(&self) -> usize {
        self.columns.iter().filter(|c| c.mapping.is_mapped()).count()
    }
}

/// The unified report across every dataset of a run.
///
/// Datasets appear in input order regardless of the completion order of
/// concurrent processing. Read-only once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReport {
    /// Where the datasets came from.
    pub source: SourceInfo,
    pub datasets: Vec<DatasetReport>,
    /// True when the run was cancelled or timed out; the report then covers
    /// only the datasets that finished in time.
    pub cancelled: bool,
    pub generated_at: DateTime<Utc>,
}

impl AssistantReport {
    /// Create an empty report for a source.
    pub fn new(source: SourceInfo) -> Self {
        Self {
            source,
            datasets: Vec::new(),
            cancelled: false,
            generated_at: Utc::now(),
        }
    }

    /// Number of datasets that produced a usable report.
    pub fn succeeded(&self) -> usize {
        self.datasets.iter().filter(|d| d.error.is_none()).count()
    }

    /// Number of datasets recorded as failed.
    pub fn failed(&self) -> usize {
        self.datasets.len() - self.succeeded()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
