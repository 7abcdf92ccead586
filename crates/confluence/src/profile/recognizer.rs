//! Primitive-type and semantic-pattern recognition for columns.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::input::Dataset;

/// Values sampled per column for type and pattern recognition.
///
/// A fixed-size prefix of non-missing values keeps results reproducible
/// for a given dataset.
pub const SAMPLE_SIZE: usize = 200;

/// Fraction of sampled values that must coerce for a primitive type to win.
pub const COERCION_RATIO: f64 = 0.95;

/// Fraction of sampled values a semantic pattern must match.
const SEMANTIC_RATIO: f64 = 0.5;

/// Categorical flag thresholds: relative cardinality and absolute cap.
const CATEGORICAL_RATIO: f64 = 0.05;
const CATEGORICAL_CAP: usize = 50;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?\d{1,3}?[\s-]?\(?\d{2,4}\)?[\s-]?\d{3,4}[\s-]?\d{3,4}$").unwrap()
});
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .unwrap()
});
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(https?://|www\.)").unwrap());
static DATE_LIKE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([ T]\d{2}:\d{2}(:\d{2})?)?$|^\d{2}[/-]\d{2}[/-]\d{4}$")
        .unwrap()
});

/// Date formats attempted during primitive coercion.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Primitive storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Integer,
    Float,
    Boolean,
    Date,
    String,
}

impl PrimitiveType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, PrimitiveType::Integer | PrimitiveType::Float)
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            PrimitiveType::Integer => "integer",
            PrimitiveType::Float => "float",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Date => "date",
            PrimitiveType::String => "string",
        }
    }
}

/// A recognized domain-specific string pattern, distinct from the
/// primitive storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Email,
    Phone,
    Uuid,
    Url,
    DateLike,
}

impl SemanticType {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SemanticType::Email => "email",
            SemanticType::Phone => "phone",
            SemanticType::Uuid => "uuid",
            SemanticType::Url => "url",
            SemanticType::DateLike => "date_like",
        }
    }
}

/// Inference result for a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInference {
    /// Primitive storage type.
    pub primitive_type: PrimitiveType,
    /// Recognized value pattern, for string columns only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<SemanticType>,
    /// Cardinality is low relative to the row count.
    pub is_categorical: bool,
    /// Values look like composite structures (lists, maps); the column is
    /// still typed as string.
    pub is_nested: bool,
}

/// Infers primitive types, semantic patterns, and shape flags per column.
pub struct SchemaRecognizer {
    sample_size: usize,
    coercion_ratio: f64,
}

impl SchemaRecognizer {
    /// Create a recognizer with default sampling and acceptance settings.
    pub fn new() -> Self {
        Self {
            sample_size: SAMPLE_SIZE,
            coercion_ratio: COERCION_RATIO,
        }
    }

    /// Infer the schema of one column from its raw values.
    pub fn infer_column(&self, values: &[&str]) -> SchemaInference {
        let sample: Vec<&str> = values
            .iter()
            .filter(|v| !Dataset::is_missing_value(v))
            .take(self.sample_size)
            .copied()
            .collect();

        let primitive_type = self.infer_primitive(&sample);

        let semantic_type = if primitive_type == PrimitiveType::String {
            self.detect_semantic(&sample)
        } else {
            None
        };

        let is_nested = primitive_type == PrimitiveType::String && self.detect_nested(&sample);

        let is_categorical = self.detect_categorical(values, primitive_type);

        SchemaInference {
            primitive_type,
            semantic_type,
            is_categorical,
            is_nested,
        }
    }

    /// Walk the coercion ladder: boolean, integer, float, date, then string.
    fn infer_primitive(&self, sample: &[&str]) -> PrimitiveType {
        if sample.is_empty() {
            return PrimitiveType::String;
        }

        let candidates: [(PrimitiveType, fn(&str) -> bool); 4] = [
            (PrimitiveType::Boolean, coerces_boolean),
            (PrimitiveType::Integer, coerces_integer),
            (PrimitiveType::Float, coerces_float),
            (PrimitiveType::Date, coerces_date),
        ];

        for (candidate, coerces) in candidates {
            let hits = sample.iter().filter(|v| coerces(v.trim())).count();
            if hits as f64 / sample.len() as f64 >= self.coercion_ratio {
                return candidate;
            }
        }

        PrimitiveType::String
    }

    /// Apply the ordered pattern matchers; first one past the acceptance
    /// ratio wins.
    fn detect_semantic(&self, sample: &[&str]) -> Option<SemanticType> {
        if sample.is_empty() {
            return None;
        }

        let matchers: [(SemanticType, &Regex); 5] = [
            (SemanticType::Email, &EMAIL_RE),
            (SemanticType::Phone, &PHONE_RE),
            (SemanticType::Uuid, &UUID_RE),
            (SemanticType::Url, &URL_RE),
            (SemanticType::DateLike, &DATE_LIKE_RE),
        ];

        for (semantic, regex) in matchers {
            let hits = sample.iter().filter(|v| regex.is_match(v.trim())).count();
            if hits as f64 / sample.len() as f64 > SEMANTIC_RATIO {
                return Some(semantic);
            }
        }

        None
    }

    /// Structural markers: bracket/brace wrapping or embedded list separators.
    fn detect_nested(&self, sample: &[&str]) -> bool {
        if sample.is_empty() {
            return false;
        }
        let hits = sample
            .iter()
            .filter(|v| {
                let t = v.trim();
                (t.starts_with('[') && t.ends_with(']'))
                    || (t.starts_with('{') && t.ends_with('}'))
                    || t.split(';').filter(|p| !p.trim().is_empty()).count() >= 2
            })
            .count();
        hits as f64 / sample.len() as f64 > SEMANTIC_RATIO
    }

    /// Low-cardinality flag over the full column, for string and integer
    /// columns.
    fn detect_categorical(&self, values: &[&str], primitive: PrimitiveType) -> bool {
        if !matches!(primitive, PrimitiveType::String | PrimitiveType::Integer) {
            return false;
        }
        let total = values.len();
        if total == 0 {
            return false;
        }

        let mut seen = std::collections::HashSet::new();
        for value in values {
            if !Dataset::is_missing_value(value) {
                seen.insert(value.trim());
            }
        }
        let unique = seen.len();

        unique > 0 && (unique as f64 / total as f64) < CATEGORICAL_RATIO && unique < CATEGORICAL_CAP
    }
}

impl Default for SchemaRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

fn coerces_boolean(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "t" | "f" | "y" | "n"
    )
}

fn coerces_integer(value: &str) -> bool {
    value.parse::<i64>().is_ok()
}

fn coerces_float(value: &str) -> bool {
    value
        .parse::<f64>()
        .map(|v| v.is_finite())
        .unwrap_or(false)
}

fn coerces_date(value: &str) -> bool {
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}
