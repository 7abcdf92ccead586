//! Missing-value row detector.

use crate::input::Dataset;

/// Rows whose count of missing fields, across all columns, reaches the
/// threshold.
pub fn missing_value_rows(dataset: &Dataset, threshold: usize) -> Vec<usize> {
    if threshold == 0 {
        // every row trivially qualifies; treat as "any missing field"
        return missing_value_rows(dataset, 1);
    }
    (0..dataset.row_count())
        .filter(|&row| dataset.missing_in_row(row) >= threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dataset(rows: Vec<Vec<&str>>) -> Dataset {
        Dataset::new(
            "test",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        )
    }

    #[test]
    fn test_flags_rows_with_missing_fields() {
        let ds = make_dataset(vec![
            vec!["1", "2", "3"],
            vec!["1", "", "3"],
            vec!["NA", "NA", "3"],
        ]);
        assert_eq!(missing_value_rows(&ds, 1), vec![1, 2]);
        assert_eq!(missing_value_rows(&ds, 2), vec![2]);
    }

    #[test]
    fn test_no_missing_no_flags() {
        let ds = make_dataset(vec![vec!["1", "2", "3"]]);
        assert!(missing_value_rows(&ds, 1).is_empty());
    }
}
