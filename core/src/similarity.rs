use crate::catalog::RowIndex;
use crate::matrix::FeatureMatrix;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub row: RowIndex,
    pub score: f32,
}

/// Cosine similarity of row `row` against every row of the matrix.
///
/// Only the query row is densified, so the extra memory is one vector of
/// vocabulary length regardless of catalog size. Scores are clamped to [0, 1];
/// rows with no terms score 0.
pub fn similarity_scores(matrix: &FeatureMatrix, row: RowIndex) -> Option<Vec<f32>> {
    let query = matrix.row(row)?;
    let dense = matrix.dense_row(row)?;
    let q_norm = query.norm();
    let scores = matrix
        .rows()
        .map(|other| {
            let denom = q_norm * other.norm();
            if denom == 0.0 {
                return 0.0;
            }
            let s = other.dot_dense(&dense) / denom;
            if s.is_finite() { s.clamp(0.0, 1.0) } else { 0.0 }
        })
        .collect();
    Some(scores)
}

/// Top `n` neighbors of `row`, most similar first, never including `row` itself.
/// Equal scores keep catalog order. An unknown row yields no neighbors.
pub fn rank(matrix: &FeatureMatrix, row: RowIndex, n: usize) -> Vec<Neighbor> {
    let Some(scores) = similarity_scores(matrix, row) else {
        tracing::warn!(row, rows = matrix.n_rows(), "rank requested for unknown row");
        return Vec::new();
    };
    let mut neighbors: Vec<Neighbor> = scores
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i != row)
        .map(|(i, score)| Neighbor { row: i, score })
        .collect();
    // sort_by is stable
    neighbors.sort_by(|a, b| b.score.total_cmp(&a.score));
    neighbors.truncate(n);
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> FeatureMatrix {
        let mut m = FeatureMatrix::new(3);
        m.push_row(&[(0, 1.0)]);
        m.push_row(&[(0, 0.6), (1, 0.8)]);
        m.push_row(&[(2, 1.0)]);
        m.push_row(&[(0, 1.0)]);
        m
    }

    #[test]
    fn identical_rows_score_one() {
        let s = similarity_scores(&matrix(), 0).unwrap();
        assert!((s[0] - 1.0).abs() < 1e-6);
        assert!((s[3] - 1.0).abs() < 1e-6);
        assert!((s[1] - 0.6).abs() < 1e-6);
        assert_eq!(s[2], 0.0);
    }

    #[test]
    fn rank_skips_self_and_orders_by_score() {
        let r = rank(&matrix(), 0, 10);
        let rows: Vec<RowIndex> = r.iter().map(|n| n.row).collect();
        assert_eq!(rows, vec![3, 1, 2]);
    }

    #[test]
    fn unknown_row_ranks_nothing() {
        assert!(rank(&matrix(), 42, 3).is_empty());
    }
}
