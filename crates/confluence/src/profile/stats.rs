//! Per-column descriptive statistics.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::Dataset;

use super::recognizer::PrimitiveType;

/// How many of the most frequent values are retained for text columns.
pub const TOP_VALUES_K: usize = 10;

/// Statistics computed for a single column.
///
/// Exactly one of `numeric` / `text` is populated, depending on the
/// column's inferred primitive type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Fraction of missing values (0.0-1.0).
    pub missing_ratio: f64,
    /// Numeric statistics, for integer/float columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericStats>,
    /// Text statistics, for all other columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextStats>,
}

/// Statistics for numeric columns. Missing values are excluded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumericStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
    /// Exact zeros among present values.
    pub zero_count: usize,
}

/// Statistics for textual columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextStats {
    /// Exact count of distinct non-missing values.
    pub unique_count: usize,
    /// The K most frequent values with counts, ties broken by first-seen order.
    pub top_values: Vec<TopValue>,
}

/// One entry of a text column's frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopValue {
    pub value: String,
    pub count: usize,
}

// Welford's online algorithm: mean and variance in a single pass.
#[derive(Debug, Clone)]
struct StreamingStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    zero_count: usize,
}

impl StreamingStats {
    fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            zero_count: 0,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        if value == 0.0 {
            self.zero_count += 1;
        }
    }

    fn std(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / self.count as f64).sqrt()
        }
    }

    fn finish(self) -> NumericStats {
        if self.count == 0 {
            return NumericStats::default();
        }
        NumericStats {
            mean: self.mean,
            min: self.min,
            max: self.max,
            std: self.std(),
            zero_count: self.zero_count,
        }
    }
}

/// Computes [`ColumnStats`] from raw column values.
///
/// Pure function of its input: no side effects, no sampling.
pub struct ColumnProfiler {
    top_k: usize,
}

impl ColumnProfiler {
    /// Create a profiler with the default top-K limit.
    pub fn new() -> Self {
        Self { top_k: TOP_VALUES_K }
    }

    /// Profile a column given its raw values and inferred primitive type.
    ///
    /// An all-missing column yields `missing_ratio = 1.0` and empty stats.
    pub fn profile(&self, values: &[&str], primitive: PrimitiveType) -> ColumnStats {
        let total = values.len();
        let missing = values
            .iter()
            .filter(|v| Dataset::is_missing_value(v))
            .count();
        let missing_ratio = if total == 0 {
            0.0
        } else {
            missing as f64 / total as f64
        };

        let (numeric, text) = if primitive.is_numeric() {
            (Some(self.numeric_stats(values)), None)
        } else {
            (None, Some(self.text_stats(values)))
        };

        ColumnStats {
            missing_ratio,
            numeric,
            text,
        }
    }

    fn numeric_stats(&self, values: &[&str]) -> NumericStats {
        let mut stats = StreamingStats::new();
        for value in values {
            if Dataset::is_missing_value(value) {
                continue;
            }
            if let Ok(num) = value.trim().parse::<f64>() {
                if num.is_finite() {
                    stats.add(num);
                }
            }
        }
        stats.finish()
    }

    fn text_stats(&self, values: &[&str]) -> TextStats {
        let mut value_counts: IndexMap<&str, usize> = IndexMap::new();
        for value in values {
            if Dataset::is_missing_value(value) {
                continue;
            }
            *value_counts.entry(value.trim()).or_insert(0) += 1;
        }

        let unique_count = value_counts.len();

        // Stable sort keeps first-seen order among equal counts.
        let mut entries: Vec<(&str, usize)> = value_counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        let top_values = entries
            .into_iter()
            .take(self.top_k)
            .map(|(value, count)| TopValue {
                value: value.to_string(),
                count,
            })
            .collect();

        TextStats {
            unique_count,
            top_values,
        }
    }
}

impl Default for ColumnProfiler {
    fn default() -> Self {
        Self::new()
    }
}
