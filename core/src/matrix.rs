use serde::{Deserialize, Serialize};

pub type ColumnId = u32;

/// Compressed sparse row matrix of TF-IDF weights. Row `i` belongs to catalog row `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    n_cols: usize,
    indptr: Vec<usize>, // len = n_rows + 1
    indices: Vec<ColumnId>,
    data: Vec<f32>,
}

/// Borrowed view over one matrix row.
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    pub indices: &'a [ColumnId],
    pub values: &'a [f32],
}

impl<'a> SparseRow<'a> {
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Dot product against a dense vector indexed by column.
    pub fn dot_dense(&self, dense: &[f32]) -> f32 {
        self.indices
            .iter()
            .zip(self.values)
            .map(|(c, v)| dense.get(*c as usize).copied().unwrap_or(0.0) * v)
            .sum()
    }

    pub fn nnz(&self) -> usize { self.indices.len() }
}

impl FeatureMatrix {
    pub fn new(n_cols: usize) -> Self {
        Self { n_cols, indptr: vec![0], indices: Vec::new(), data: Vec::new() }
    }

    /// Append a row. Entries must be sorted by column and within `n_cols`.
    pub fn push_row(&mut self, entries: &[(ColumnId, f32)]) {
        for (c, v) in entries {
            debug_assert!((*c as usize) < self.n_cols);
            self.indices.push(*c);
            self.data.push(*v);
        }
        self.indptr.push(self.indices.len());
    }

    pub fn n_rows(&self) -> usize { self.indptr.len().saturating_sub(1) }

    pub fn n_cols(&self) -> usize { self.n_cols }

    pub fn nnz(&self) -> usize { self.data.len() }

    pub fn row(&self, i: usize) -> Option<SparseRow<'_>> {
        if i >= self.n_rows() {
            return None;
        }
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        Some(SparseRow { indices: &self.indices[start..end], values: &self.data[start..end] })
    }

    pub fn rows(&self) -> impl Iterator<Item = SparseRow<'_>> + '_ {
        (0..self.n_rows()).filter_map(move |i| self.row(i))
    }

    /// Scatter row `i` into a dense vector of length `n_cols`.
    pub fn dense_row(&self, i: usize) -> Option<Vec<f32>> {
        let row = self.row(i)?;
        let mut dense = vec![0.0f32; self.n_cols];
        for (c, v) in row.indices.iter().zip(row.values) {
            dense[*c as usize] = *v;
        }
        Some(dense)
    }

    /// Structural checks applied to matrices read back from disk.
    pub fn validate(&self) -> Result<(), String> {
        if self.indptr.first() != Some(&0) {
            return Err("indptr must start at 0".into());
        }
        if self.indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err("indptr is not monotonic".into());
        }
        if self.indptr.last().copied() != Some(self.indices.len()) || self.indices.len() != self.data.len() {
            return Err("indptr, indices and data lengths disagree".into());
        }
        if self.indices.iter().any(|c| *c as usize >= self.n_cols) {
            return Err("column index out of range".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_round_trip_through_csr() {
        let mut m = FeatureMatrix::new(4);
        m.push_row(&[(0, 1.0), (3, 2.0)]);
        m.push_row(&[]);
        m.push_row(&[(2, 0.5)]);
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.row(1).unwrap().nnz(), 0);
        assert_eq!(m.dense_row(0).unwrap(), vec![1.0, 0.0, 0.0, 2.0]);
        assert!(m.row(3).is_none());
        assert!(m.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_columns() {
        let mut m = FeatureMatrix::new(1);
        m.indices.push(5);
        m.data.push(1.0);
        m.indptr.push(1);
        assert!(m.validate().is_err());
    }
}
