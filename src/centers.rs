//! Center set with explicit per-row validity.
//!
//! A row becomes degenerate when the local search leaves its cluster empty.
//! Degenerate rows keep their slot (the set is always `k x n`) but are
//! skipped by every distance computation until shaking repairs them.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

#[derive(Debug, Clone, PartialEq)]
pub struct CenterSet {
    values: Array2<f64>,
    valid: Vec<bool>,
}

impl CenterSet {
    /// `k x n_features` set with every row degenerate.
    pub fn degenerate(k: usize, n_features: usize) -> Self {
        Self {
            values: Array2::zeros((k, n_features)),
            valid: vec![false; k],
        }
    }

    /// Center set whose rows are all valid.
    pub fn from_array(values: Array2<f64>) -> Self {
        let valid = vec![true; values.nrows()];
        Self { values, valid }
    }

    /// Number of rows (`k`), degenerate ones included
    pub fn k(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_valid(&self, i: usize) -> bool {
        self.valid[i]
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// Raw row storage. Entries of degenerate rows are meaningless.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Overwrite row `i` and mark it valid.
    pub fn set_row(&mut self, i: usize, row: ArrayView1<f64>) {
        self.values.row_mut(i).assign(&row);
        self.valid[i] = true;
    }

    pub fn mark_degenerate(&mut self, i: usize) {
        self.valid[i] = false;
    }

    pub fn degenerate_indices(&self) -> Vec<usize> {
        self.valid
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| (!v).then_some(i))
            .collect()
    }

    pub fn n_degenerate(&self) -> usize {
        self.valid.iter().filter(|&&v| !v).count()
    }

    /// Copy of the rows selected by `keep`, in row order.
    pub fn select_rows(&self, keep: impl Fn(usize) -> bool) -> Array2<f64> {
        let rows: Vec<usize> = (0..self.k()).filter(|&i| keep(i)).collect();
        self.values.select(Axis(0), &rows)
    }

    /// Copy of the valid rows only
    pub fn valid_rows(&self) -> Array2<f64> {
        self.select_rows(|i| self.valid[i])
    }

    /// Dense matrix with degenerate rows filled with NaN.
    pub fn to_array(&self) -> Array2<f64> {
        let mut out = self.values.clone();
        for (mut row, &valid) in out.rows_mut().into_iter().zip(self.valid.iter()) {
            if !valid {
                row.fill(f64::NAN);
            }
        }
        out
    }
}
