//! Column profiling: descriptive statistics and schema recognition.

mod recognizer;
mod stats;

pub use recognizer::{
    COERCION_RATIO, PrimitiveType, SAMPLE_SIZE, SchemaInference, SchemaRecognizer, SemanticType,
};
pub use stats::{ColumnProfiler, ColumnStats, NumericStats, TOP_VALUES_K, TextStats, TopValue};
