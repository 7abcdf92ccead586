//! Multi-method anomaly detection over a dataset's numeric matrix.
//!
//! Detectors run independently; their flagged-row sets are reported
//! per method, never merged, so downstream consumers can intersect or
//! union as needed.

mod isolation;
mod missing;
mod rules;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::Dataset;
use crate::profile::SchemaInference;

pub use isolation::{ForestParams, isolation_forest_rows};
pub use missing::missing_value_rows;
pub use rules::{iqr_rows, z_score_rows};

/// Datasets below this row count report zero flags from every detector.
pub const MIN_ROWS: usize = 10;

/// Flagged rows retained as a human-readable preview, per method.
const PREVIEW_LIMIT: usize = 5;

/// Per-request anomaly configuration. Immutable for the duration of a run.
///
/// Every field is optional on the wire; omitted knobs take the defaults
/// below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub use_zscore: bool,
    pub use_iqr: bool,
    pub use_isolation_forest: bool,
    pub use_missing_values: bool,
    /// Z-score cut-off.
    pub z_threshold: f64,
    /// Expected outlier fraction for the isolation forest.
    pub contamination: f64,
    /// Minimum missing fields per row for the missing-value detector.
    pub missing_threshold: usize,
    /// Trees in the isolation forest.
    pub n_estimators: usize,
    /// Seed for the isolation forest RNG.
    pub random_state: u64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            use_zscore: true,
            use_iqr: true,
            use_isolation_forest: true,
            use_missing_values: true,
            z_threshold: 3.0,
            contamination: 0.01,
            missing_threshold: 1,
            n_estimators: 100,
            random_state: 42,
        }
    }
}

/// Identifier of a detection method, used as the report key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ZScore,
    Iqr,
    IsolationForest,
    MissingValues,
}

impl DetectionMethod {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DetectionMethod::ZScore => "z-score",
            DetectionMethod::Iqr => "IQR",
            DetectionMethod::IsolationForest => "isolation forest",
            DetectionMethod::MissingValues => "missing values",
        }
    }
}

/// One detector variant with its parameters bound.
///
/// A closed set: adding a method means adding a variant, not a string key.
#[derive(Debug, Clone)]
pub enum Detector {
    ZScore { threshold: f64 },
    Iqr,
    IsolationForest(ForestParams),
    MissingValues { threshold: usize },
}

impl Detector {
    /// The detectors enabled by a configuration, in a fixed order.
    pub fn from_config(config: &AnomalyConfig) -> Vec<Detector> {
        let mut detectors = Vec::new();
        if config.use_zscore {
            detectors.push(Detector::ZScore {
                threshold: config.z_threshold,
            });
        }
        if config.use_iqr {
            detectors.push(Detector::Iqr);
        }
        if config.use_isolation_forest {
            detectors.push(Detector::IsolationForest(ForestParams {
                contamination: config.contamination,
                n_estimators: config.n_estimators,
                seed: config.random_state,
            }));
        }
        if config.use_missing_values {
            detectors.push(Detector::MissingValues {
                threshold: config.missing_threshold,
            });
        }
        detectors
    }

    /// The method identifier this detector reports under.
    pub fn method(&self) -> DetectionMethod {
        match self {
            Detector::ZScore { .. } => DetectionMethod::ZScore,
            Detector::Iqr => DetectionMethod::Iqr,
            Detector::IsolationForest(_) => DetectionMethod::IsolationForest,
            Detector::MissingValues { .. } => DetectionMethod::MissingValues,
        }
    }

    /// Flag rows in the dataset.
    pub fn detect(&self, dataset: &Dataset, frame: &NumericFrame) -> Vec<usize> {
        match self {
            Detector::ZScore { threshold } => z_score_rows(frame, *threshold),
            Detector::Iqr => iqr_rows(frame),
            Detector::IsolationForest(params) => isolation_forest_rows(frame, params),
            Detector::MissingValues { threshold } => missing_value_rows(dataset, *threshold),
        }
    }
}

/// Result of one detection method over one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub method: DetectionMethod,
    /// Number of flagged rows; always `flagged_rows.len()`.
    pub flagged_count: usize,
    /// Flagged row indices, sorted ascending.
    pub flagged_rows: Vec<usize>,
    /// A bounded sample of flagged rows rendered column -> value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preview: Vec<IndexMap<String, String>>,
}

impl AnomalyResult {
    fn empty(method: DetectionMethod) -> Self {
        Self {
            method,
            flagged_count: 0,
            flagged_rows: Vec::new(),
            preview: Vec::new(),
        }
    }
}

/// Numeric view of a dataset: numeric columns parsed to `f64`, missing
/// values as NaN.
#[derive(Debug, Clone)]
pub struct NumericFrame {
    /// Names of the numeric columns.
    pub names: Vec<String>,
    /// Column-major values.
    pub columns: Vec<Vec<f64>>,
    /// Row count of the originating dataset.
    pub rows: usize,
}

impl NumericFrame {
    /// Extract the numeric columns of a dataset, guided by its inferences.
    pub fn from_dataset(dataset: &Dataset, inferences: &[SchemaInference]) -> Self {
        let mut names = Vec::new();
        let mut columns = Vec::new();

        for (idx, inference) in inferences.iter().enumerate() {
            if !inference.primitive_type.is_numeric() {
                continue;
            }
            let values: Vec<f64> = dataset
                .column_values(idx)
                .map(|v| {
                    if Dataset::is_missing_value(v) {
                        f64::NAN
                    } else {
                        v.trim().parse::<f64>().unwrap_or(f64::NAN)
                    }
                })
                .collect();
            names.push(dataset.headers.get(idx).cloned().unwrap_or_default());
            columns.push(values);
        }

        Self {
            names,
            columns,
            rows: dataset.row_count(),
        }
    }

    /// True when no numeric columns are present.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Run every enabled detector over a dataset.
///
/// Datasets below [`MIN_ROWS`] degrade to zero flags per method, and a
/// detector seeing no usable columns reports zero flags; neither case is
/// an error.
pub fn detect_all(
    dataset: &Dataset,
    inferences: &[SchemaInference],
    config: &AnomalyConfig,
) -> Vec<AnomalyResult> {
    let detectors = Detector::from_config(config);

    if dataset.row_count() < MIN_ROWS {
        return detectors
            .iter()
            .map(|d| AnomalyResult::empty(d.method()))
            .collect();
    }

    let frame = NumericFrame::from_dataset(dataset, inferences);

    detectors
        .iter()
        .map(|detector| {
            let flagged_rows = detector.detect(dataset, &frame);
            let preview = flagged_rows
                .iter()
                .take(PREVIEW_LIMIT)
                .map(|&row| dataset.row_preview(row))
                .collect();
            AnomalyResult {
                method: detector.method(),
                flagged_count: flagged_rows.len(),
                flagged_rows,
                preview,
            }
        })
        .collect()
}
