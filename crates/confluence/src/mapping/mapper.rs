//! Mapping dataset columns onto a set of reference fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfluenceError, Result};

use super::scorer::field_score;

/// How many tying candidates are reported for an ambiguous column.
const AMBIGUOUS_CANDIDATE_LIMIT: usize = 5;

/// Caller-supplied mapping configuration.
///
/// An immutable value passed into each run; never ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Canonical field names, in declaration order.
    pub reference_fields: Vec<String>,
    /// Optional aliases per reference field.
    #[serde(default)]
    pub synonyms: HashMap<String, Vec<String>>,
    /// Minimum similarity for a column to be accepted as mapped.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Ambiguity band: a runner-up scoring strictly within `epsilon` of the
    /// best candidate turns the column ambiguous.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_threshold() -> f64 {
    0.7
}

fn default_epsilon() -> f64 {
    0.05
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            reference_fields: Vec::new(),
            synonyms: HashMap::new(),
            threshold: 0.7,
            epsilon: 0.05,
        }
    }
}

impl MappingConfig {
    /// Create a config over the given reference fields with default knobs.
    pub fn new(reference_fields: Vec<String>) -> Self {
        Self {
            reference_fields,
            ..Default::default()
        }
    }

    /// Set synonyms.
    pub fn with_synonyms(mut self, synonyms: HashMap<String, Vec<String>>) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// Set the acceptance threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the ambiguity band width.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Validate threshold and epsilon ranges.
    ///
    /// Called before a run starts; a bad configuration aborts the whole run
    /// rather than failing per dataset.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfluenceError::InvalidMappingConfig(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ConfluenceError::InvalidMappingConfig(format!(
                "epsilon must be non-negative, got {}",
                self.epsilon
            )));
        }
        if self.reference_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfluenceError::InvalidMappingConfig(
                "reference fields must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// One scored reference-field candidate for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingCandidate {
    pub target: String,
    pub score: f64,
}

/// Classification of one dataset column against the reference fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MappingOutcome {
    /// A single reference field clearly wins.
    Mapped { target: String, score: f64 },
    /// The best candidate is acceptable but at least one runner-up ties it.
    Ambiguous { candidates: Vec<MappingCandidate> },
    /// No reference field reaches the threshold.
    Unmapped,
}

impl MappingOutcome {
    /// Returns the mapped target, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            MappingOutcome::Mapped { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Returns true for the `Mapped` variant.
    pub fn is_mapped(&self) -> bool {
        matches!(self, MappingOutcome::Mapped { .. })
    }

    /// Returns true for the `Ambiguous` variant.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, MappingOutcome::Ambiguous { .. })
    }
}

/// Scores dataset columns against reference fields and classifies each as
/// mapped, ambiguous, or unmapped.
pub struct SemanticFieldMapper {
    config: MappingConfig,
}

impl SemanticFieldMapper {
    /// Create a mapper for the given configuration.
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    /// Score every reference field for a column, best first.
    ///
    /// The sort is stable: equal scores keep reference-field declaration
    /// order.
    pub fn candidates(&self, column: &str) -> Vec<MappingCandidate> {
        let mut candidates: Vec<MappingCandidate> = self
            .config
            .reference_fields
            .iter()
            .map(|field| {
                let aliases = self
                    .config
                    .synonyms
                    .get(field)
                    .map(|v| v.as_slice())
                    .unwrap_or(&[]);
                MappingCandidate {
                    target: field.clone(),
                    score: field_score(column, field, aliases),
                }
            })
            .collect();
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates
    }

    /// Classify one column.
    pub fn map_column(&self, column: &str) -> MappingOutcome {
        let candidates = self.candidates(column);
        let Some(best) = candidates.first() else {
            return MappingOutcome::Unmapped;
        };
        if best.score < self.config.threshold {
            return MappingOutcome::Unmapped;
        }

        let runner_up = candidates.get(1);
        let ambiguous = runner_up.is_some_and(|second| {
            best.score - second.score < self.config.epsilon
                // fields differing only in case are the same target; take the best
                && !best.target.eq_ignore_ascii_case(&second.target)
        });

        if ambiguous {
            let tying: Vec<MappingCandidate> = candidates
                .iter()
                .filter(|c| best.score - c.score < self.config.epsilon)
                .take(AMBIGUOUS_CANDIDATE_LIMIT)
                .cloned()
                .collect();
            return MappingOutcome::Ambiguous { candidates: tying };
        }

        MappingOutcome::Mapped {
            target: best.target.clone(),
            score: best.score,
        }
    }

    /// Classify every column of a dataset. Columns are independent.
    pub fn map_columns(&self, columns: &[String]) -> Vec<MappingOutcome> {
        columns.iter().map(|c| self.map_column(c)).collect()
    }
}
