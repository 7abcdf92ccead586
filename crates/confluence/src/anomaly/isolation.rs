//! Isolation forest over the numeric feature matrix.
//!
//! An ensemble of random partitioning trees; rows that isolate in few
//! splits score high. Catches joint-column anomalies the single-column
//! rules cannot see.

use super::NumericFrame;

/// Subsample size per tree.
const SUBSAMPLE: usize = 256;

/// Euler-Mascheroni constant, for the harmonic-number approximation.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Parameters for the forest.
#[derive(Debug, Clone)]
pub struct ForestParams {
    /// Expected fraction of rows treated as outliers.
    pub contamination: f64,
    /// Number of trees.
    pub n_estimators: usize,
    /// RNG seed; a fixed seed makes results reproducible.
    pub seed: u64,
}

enum Node {
    Internal {
        feature: usize,
        split: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// Rows flagged as the most isolated `contamination` fraction.
///
/// Missing values are imputed with the column mean before training, so
/// incomplete rows participate rather than being excluded.
pub fn isolation_forest_rows(frame: &NumericFrame, params: &ForestParams) -> Vec<usize> {
    let n = frame.rows;
    let features = frame.columns.len();
    if n < 2 || features == 0 {
        return Vec::new();
    }

    // a frame with no varying feature cannot isolate anything
    let has_signal = frame.columns.iter().any(|column| {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in column.iter().copied().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        max > min
    });
    if !has_signal {
        return Vec::new();
    }

    let matrix = imputed_matrix(frame);

    let mut rng = fastrand::Rng::with_seed(params.seed);
    let subsample = SUBSAMPLE.min(n);
    let max_depth = (subsample as f64).log2().ceil().max(1.0) as usize;

    let mut trees = Vec::with_capacity(params.n_estimators);
    for _ in 0..params.n_estimators {
        let sample = sample_indices(&mut rng, n, subsample);
        trees.push(build_tree(&matrix, &sample, features, 0, max_depth, &mut rng));
    }

    let norm = average_path_length(subsample);
    let mut scored: Vec<(usize, f64)> = (0..n)
        .map(|row| {
            let mean_path: f64 = trees
                .iter()
                .map(|t| path_length(t, &matrix[row], 0))
                .sum::<f64>()
                / trees.len() as f64;
            let score = if norm > 0.0 {
                2f64.powf(-mean_path / norm)
            } else {
                0.0
            };
            (row, score)
        })
        .collect();

    let k = ((params.contamination * n as f64).ceil() as usize).min(n);
    if k == 0 {
        return Vec::new();
    }

    // Deterministic cut: score descending, row index breaks ties.
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    let mut flagged: Vec<usize> = scored.iter().take(k).map(|(row, _)| *row).collect();
    flagged.sort_unstable();
    flagged
}

/// Row-major matrix with NaNs replaced by column means.
fn imputed_matrix(frame: &NumericFrame) -> Vec<Vec<f64>> {
    let means: Vec<f64> = frame
        .columns
        .iter()
        .map(|column| {
            let present: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
            if present.is_empty() {
                0.0
            } else {
                present.iter().sum::<f64>() / present.len() as f64
            }
        })
        .collect();

    (0..frame.rows)
        .map(|row| {
            frame
                .columns
                .iter()
                .enumerate()
                .map(|(col, values)| {
                    let v = values[row];
                    if v.is_finite() { v } else { means[col] }
                })
                .collect()
        })
        .collect()
}

/// Draw `k` distinct row indices via partial Fisher-Yates.
fn sample_indices(rng: &mut fastrand::Rng, n: usize, k: usize) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = i + rng.usize(0..(n - i));
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool
}

fn build_tree(
    matrix: &[Vec<f64>],
    rows: &[usize],
    features: usize,
    depth: usize,
    max_depth: usize,
    rng: &mut fastrand::Rng,
) -> Node {
    if depth >= max_depth || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only features that still vary within this partition can split it.
    let splittable: Vec<(usize, f64, f64)> = (0..features)
        .filter_map(|f| {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for &row in rows {
                let v = matrix[row][f];
                if v < min {
                    min = v;
                }
                if v > max {
                    max = v;
                }
            }
            (max > min).then_some((f, min, max))
        })
        .collect();

    if splittable.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, min, max) = splittable[rng.usize(0..splittable.len())];
    let split = min + rng.f64() * (max - min);

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .copied()
        .partition(|&row| matrix[row][feature] < split);

    Node::Internal {
        feature,
        split,
        left: Box::new(build_tree(matrix, &left_rows, features, depth + 1, max_depth, rng)),
        right: Box::new(build_tree(matrix, &right_rows, features, depth + 1, max_depth, rng)),
    }
}

fn path_length(node: &Node, point: &[f64], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Internal {
            feature,
            split,
            left,
            right,
        } => {
            if point[*feature] < *split {
                path_length(left, point, depth + 1)
            } else {
                path_length(right, point, depth + 1)
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let m = (n - 1) as f64;
            2.0 * (m.ln() + EULER_GAMMA) - 2.0 * m / n as f64
        }
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

    fn params(contamination: f64) -> ForestParams {
        ForestParams {
            contamination,
            n_estimators: 100,
            seed: 42,
        }
    }

    fn clustered_frame_with_outlier() -> NumericFrame {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for i in 0..50 {
            xs.push(10.0 + (i % 5) as f64 * 0.1);
            ys.push(20.0 + (i % 7) as f64 * 0.1);
        }
        xs.push(500.0);
        ys.push(-300.0);
        frame_of(vec![xs, ys])
    }

    #[test]
    fn test_flags_joint_outlier() {
        let frame = clustered_frame_with_outlier();
        let flagged = isolation_forest_rows(&frame, &params(0.02));
        assert!(flagged.contains(&50), "outlier row not flagged: {flagged:?}");
    }

    #[test]
    fn test_reproducible_for_fixed_seed() {
        let frame = clustered_frame_with_outlier();
        let first = isolation_forest_rows(&frame, &params(0.05));
        let second = isolation_forest_rows(&frame, &params(0.05));
        assert_eq!(first, second);
    }

    #[test]
    fn test_contamination_bounds_flag_count() {
        let frame = clustered_frame_with_outlier();
        let flagged = isolation_forest_rows(&frame, &params(0.1));
        // ceil(0.1 * 51) = 6
        assert_eq!(flagged.len(), 6);
    }

    #[test]
    fn test_empty_frame_no_flags() {
        let flagged = isolation_forest_rows(&frame_of(vec![]), &params(0.01));
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_constant_frame_no_flags() {
        let flagged = isolation_forest_rows(&frame_of(vec![vec![3.0; 40]]), &params(0.05));
        assert!(flagged.is_empty());
    }

    #[test]
    fn test_missing_values_imputed_not_flagged() {
        let mut xs = vec![10.0; 40];
        xs[5] = f64::NAN; // imputed to the mean: unremarkable
        xs.push(999.0);
        let frame = frame_of(vec![xs]);
        let flagged = isolation_forest_rows(&frame, &params(0.02));
        assert_eq!(flagged, vec![40]);
    }
}
