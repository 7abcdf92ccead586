//! Semantic field mapping: aligning dataset columns to reference fields.

mod mapper;
mod normalize;
mod scorer;

pub use mapper::{MappingCandidate, MappingConfig, MappingOutcome, SemanticFieldMapper};
pub use normalize::{normalize_name, tokenize};
pub use scorer::{field_score, jaccard, name_similarity};
