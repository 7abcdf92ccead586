//! Single-column rule detectors: Z-score and IQR.

use super::NumericFrame;

/// Rows flagged by the Z-score rule across all numeric columns.
///
/// Per column, rows where `|value - mean| / std > threshold` are flagged;
/// missing values never flag. Columns with zero variance are skipped.
/// The result is the sorted union across columns.
pub fn z_score_rows(frame: &NumericFrame, threshold: f64) -> Vec<usize> {
    let mut flagged = Vec::new();

    for column in &frame.columns {
        let present: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
        if present.len() < 2 {
            continue;
        }
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        let variance =
            present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / present.len() as f64;
        let std = variance.sqrt();
        if std == 0.0 || !std.is_finite() {
            continue;
        }

        for (row, value) in column.iter().enumerate() {
            if value.is_finite() && ((value - mean) / std).abs() > threshold {
                flagged.push(row);
            }
        }
    }

    flagged.sort_unstable();
    flagged.dedup();
    flagged
}

/// Rows flagged by the IQR rule across all numeric columns.
///
/// Values outside `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]` are flagged; missing
/// values are ignored. The result is the sorted union across columns.
pub fn iqr_rows(frame: &NumericFrame) -> Vec<usize> {
    let mut flagged = Vec::new();

    for column in &frame.columns {
        let mut present: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
        if present.is_empty() {
            continue;
        }
        present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let q1 = percentile(&present, 25.0);
        let q3 = percentile(&present, 75.0);
        let iqr = q3 - q1;
        let lower = q1 - 1.5 * iqr;
        let upper = q3 + 1.5 * iqr;

        for (row, value) in column.iter().enumerate() {
            if value.is_finite() && (*value < lower || *value > upper) {
                flagged.push(row);
            }
        }
    }

    flagged.sort_unstable();
    flagged.dedup();
    flagged
}

/// Percentile over a sorted slice with linear interpolation.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_of(columns: Vec<Vec<f64>>) -> NumericFrame {
        let rows = columns.first().map(|c| c.len()).unwrap_or(0);
        NumericFrame {
            names: (0..columns.len()).map(|i| format!("c{i}")).collect(),
            columns,
            rows,
        }
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 100.0];
        assert_eq!(percentile(&sorted, 25.0), 2.0);
        assert_eq!(percentile(&sorted, 75.0), 4.0);
        assert_eq!(percentile(&sorted, 50.0), 3.0);
    }

    #[test]
    fn test_z_score_flags_extreme_value() {
        // 30 tight values and one far outlier: z(100) well above 3.
        let mut values = vec![10.0; 15];
        values.extend(vec![12.0; 15]);
        values.push(100.0);
        let flagged = z_score_rows(&frame_of(vec![values]), 3.0);
        assert_eq!(flagged, vec![30]);
    }

    #[test]
    fn test_z_score_constant_column_no_flags() {
        let flagged = z_score_rows(&frame_of(vec![vec![5.0; 20]]), 3.0);
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_z_score_ignores_missing() {
        let mut values = vec![10.0; 20];
        values.push(f64::NAN);
        let flagged = z_score_rows(&frame_of(vec![values]), 3.0);
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_iqr_flags_outlier() {
        let flagged = iqr_rows(&frame_of(vec![vec![1.0, 2.0, 3.0, 4.0, 100.0]]));
        assert_eq!(flagged, vec![4]);
    }

    #[test]
    fn test_iqr_constant_column_no_flags() {
        let flagged = iqr_rows(&frame_of(vec![vec![5.0; 20]]));
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_union_across_columns_sorted_dedup() {
        let col_a = vec![1.0, 2.0, 3.0, 4.0, 100.0];
        let col_b = vec![100.0, 2.0, 3.0, 4.0, 5.0];
        let flagged = iqr_rows(&frame_of(vec![col_a, col_b]));
        assert_eq!(flagged, vec![0, 4]);
    }
}
