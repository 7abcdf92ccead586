//! Property-based tests for Confluence.
//!
//! These tests use proptest to generate random inputs and verify that
//! the profiling, mapping, and detection stages maintain their
//! invariants under all conditions:
//!
//! 1. **No panics**: no input crashes an analyzer
//! 2. **Determinism**: same input always produces same output
//! 3. **Invariants**: classification and statistics rules always hold

use proptest::prelude::*;

use confluence::mapping::{MappingConfig, SemanticFieldMapper, name_similarity, normalize_name};
use confluence::profile::{ColumnProfiler, PrimitiveType, SchemaRecognizer};
use confluence::{Dataset, MappingOutcome};

// =============================================================================
// Test Strategies
// =============================================================================

/// Generate strings that look like column names.
fn column_name_like() -> impl Strategy<Value = String> {
    prop_oneof![
        // snake_case
        "[a-z]{2,10}(_[a-z]{2,10}){0,2}",
        // camelCase
        "[a-z]{2,8}([A-Z][a-z]{1,7}){0,2}",
        // spaced and dashed
        "[A-Za-z]{2,8}[ \\-][A-Za-z]{2,8}",
        // arbitrary short ascii
        "[a-zA-Z0-9_\\-\\. ]{0,20}",
    ]
}

/// Generate cell values mixing numbers, text, and missing markers.
fn cell_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("NA".to_string()),
        "-?[0-9]{1,6}",
        "-?[0-9]{1,4}\\.[0-9]{1,4}",
        "[a-zA-Z]{1,12}",
    ]
}

fn reference_fields() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{2,10}(_[a-z]{2,10}){0,1}", 0..6)
}

// =============================================================================
// Normalization & Similarity
// =============================================================================

proptest! {
    #[test]
    fn normalize_never_panics_and_is_idempotent(name in any::<String>()) {
        let once = normalize_name(&name);
        let twice = normalize_name(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn similarity_is_in_unit_interval(a in column_name_like(), b in column_name_like()) {
        let score = name_similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
    }

    #[test]
    fn similarity_of_identical_names_is_one(name in "[a-zA-Z][a-zA-Z0-9_]{0,15}") {
        prop_assert_eq!(name_similarity(&name, &name), 1.0);
    }
}

// =============================================================================
// Mapping Classification
// =============================================================================

proptest! {
    #[test]
    fn mapping_is_deterministic(
        column in column_name_like(),
        fields in reference_fields(),
    ) {
        let mapper = SemanticFieldMapper::new(MappingConfig::new(fields));
        let first = mapper.map_column(&column);
        let second = mapper.map_column(&column);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn zero_epsilon_never_yields_ambiguous(
        column in column_name_like(),
        fields in reference_fields(),
    ) {
        let mapper = SemanticFieldMapper::new(
            MappingConfig::new(fields).with_epsilon(0.0),
        );
        prop_assert!(!mapper.map_column(&column).is_ambiguous());
    }

    #[test]
    fn raising_threshold_never_increases_mapped_count(
        columns in prop::collection::vec(column_name_like(), 1..8),
        fields in reference_fields(),
        low in 0.0f64..0.5,
        delta in 0.0f64..0.5,
    ) {
        let low_mapper = SemanticFieldMapper::new(
            MappingConfig::new(fields.clone()).with_threshold(low),
        );
        let high_mapper = SemanticFieldMapper::new(
            MappingConfig::new(fields).with_threshold(low + delta),
        );

        let mapped_at = |mapper: &SemanticFieldMapper| {
            columns.iter().filter(|c| mapper.map_column(c).is_mapped()).count()
        };

        prop_assert!(mapped_at(&high_mapper) <= mapped_at(&low_mapper));
    }

    #[test]
    fn empty_reference_set_always_unmaps(column in column_name_like()) {
        let mapper = SemanticFieldMapper::new(MappingConfig::new(Vec::new()));
        prop_assert_eq!(mapper.map_column(&column), MappingOutcome::Unmapped);
    }

    #[test]
    fn mapped_score_meets_threshold(
        column in column_name_like(),
        fields in reference_fields(),
        threshold in 0.0f64..1.0,
    ) {
        let mapper = SemanticFieldMapper::new(
            MappingConfig::new(fields).with_threshold(threshold),
        );
        if let MappingOutcome::Mapped { score, .. } = mapper.map_column(&column) {
            prop_assert!(score >= threshold);
        }
    }
}

// =============================================================================
// Profiling
// =============================================================================

proptest! {
    #[test]
    fn missing_ratio_matches_exact_count(values in prop::collection::vec(cell_value(), 1..60)) {
        let refs: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
        let missing = refs.iter().filter(|v| Dataset::is_missing_value(v)).count();

        let recognizer = SchemaRecognizer::new();
        let inference = recognizer.infer_column(&refs);
        let stats = ColumnProfiler::new().profile(&refs, inference.primitive_type);

        let expected = missing as f64 / values.len() as f64;
        prop_assert!((stats.missing_ratio - expected).abs() < 1e-9);
    }

    #[test]
    fn exactly_one_stats_family_is_populated(values in prop::collection::vec(cell_value(), 1..60)) {
        let refs: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
        let recognizer = SchemaRecognizer::new();
        let inference = recognizer.infer_column(&refs);
        let stats = ColumnProfiler::new().profile(&refs, inference.primitive_type);

        prop_assert!(stats.numeric.is_some() != stats.text.is_some());
        if inference.primitive_type.is_numeric() {
            prop_assert!(stats.numeric.is_some());
        } else {
            prop_assert!(stats.text.is_some());
        }
    }

    #[test]
    fn recognizer_never_panics(values in prop::collection::vec(any::<String>(), 0..40)) {
        let refs: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
        let inference = SchemaRecognizer::new().infer_column(&refs);
        // nested columns are always typed string
        if inference.is_nested {
            prop_assert_eq!(inference.primitive_type, PrimitiveType::String);
        }
    }
}

// =============================================================================
// Anomaly Detection
// =============================================================================

proptest! {
    #[test]
    fn detectors_flag_within_bounds_and_sorted(
        values in prop::collection::vec(-1.0e6f64..1.0e6, 10..80),
    ) {
        let rows: Vec<Vec<String>> = values.iter().map(|v| vec![format!("{v}")]).collect();
        let dataset = Dataset::new("prop", vec!["v".to_string()], rows);

        let recognizer = SchemaRecognizer::new();
        let columns: Vec<&str> = dataset.column_values(0).collect();
        let inferences = vec![recognizer.infer_column(&columns)];

        let results = confluence::anomaly::detect_all(
            &dataset,
            &inferences,
            &confluence::AnomalyConfig::default(),
        );

        for result in results {
            prop_assert_eq!(result.flagged_count, result.flagged_rows.len());
            prop_assert!(result.flagged_rows.iter().all(|&r| r < dataset.row_count()));
            prop_assert!(result.flagged_rows.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn constant_columns_never_flagged_by_rules(
        value in -1000i64..1000,
        rows in 10usize..60,
    ) {
        let data: Vec<Vec<String>> = (0..rows).map(|_| vec![value.to_string()]).collect();
        let dataset = Dataset::new("constant", vec!["v".to_string()], data);

        let recognizer = SchemaRecognizer::new();
        let columns: Vec<&str> = dataset.column_values(0).collect();
        let inferences = vec![recognizer.infer_column(&columns)];

        let results = confluence::anomaly::detect_all(
            &dataset,
            &inferences,
            &confluence::AnomalyConfig {
                use_isolation_forest: false,
                use_missing_values: false,
                ..Default::default()
            },
        );

        for result in results {
            prop_assert_eq!(result.flagged_count, 0);
        }
    }
}
