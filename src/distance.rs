use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};
use rayon::prelude::*;

/// Whether a primitive runs on the calling thread or fans out over rayon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    Sequential,
    Parallel,
}

impl Execution {
    /// Squared distance matrix between the rows of `a` and the rows of `b`
    pub fn distance_matrix(self, a: &ArrayView2<f64>, b: &ArrayView2<f64>) -> Array2<f64> {
        match self {
            Execution::Sequential => distance_matrix(a, b),
            Execution::Parallel => distance_matrix_parallel(a, b),
        }
    }

    pub fn squared_norms(self, data: &ArrayView2<f64>) -> Array1<f64> {
        match self {
            Execution::Sequential => compute_squared_norms_serial(data),
            Execution::Parallel => compute_squared_norms(data),
        }
    }
}

/// Formula used for point-to-center distances inside the local search.
///
/// Both give the squared Euclidean distance and agree up to round-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    /// `|x|^2 - 2 x.c + |c|^2`, using precomputed squared norms
    #[default]
    InnerProduct,
    /// `sum (x_i - c_i)^2`
    SquaredDifference,
}

impl DistanceMetric {
    /// Squared distance between `x` and `c`. The norms are only read by
    /// [`DistanceMetric::InnerProduct`].
    #[inline]
    pub fn dist2(self, x: &ArrayView1<f64>, c: &ArrayView1<f64>, x_norm: f64, c_norm: f64) -> f64 {
        match self {
            DistanceMetric::InnerProduct => x_norm - 2.0 * x.dot(c) + c_norm,
            DistanceMetric::SquaredDifference => x
                .iter()
                .zip(c.iter())
                .map(|(&a, &b)| (a - b) * (a - b))
                .sum(),
        }
    }
}

/// Compute squared L2 norms for each row of a 2D array
/// Returns a 1D array where each element is the squared norm of the corresponding row
#[inline]
pub fn compute_squared_norms(data: &ArrayView2<f64>) -> Array1<f64> {
    let norms: Vec<f64> = (0..data.nrows())
        .into_par_iter()
        .map(|i| {
            let row = data.row(i);
            row.dot(&row)
        })
        .collect();

    Array1::from_vec(norms)
}

/// Compute squared L2 norms for each row of a 2D array (non-parallel version for small arrays)
#[inline]
pub fn compute_squared_norms_serial(data: &ArrayView2<f64>) -> Array1<f64> {
    let n_samples = data.nrows();
    let mut norms = Array1::zeros(n_samples);

    for i in 0..n_samples {
        let row = data.row(i);
        norms[i] = row.dot(&row);
    }

    norms
}

/// Pairwise squared Euclidean distances, shape `(a.nrows(), b.nrows())`.
///
/// Uses the identity: ||x - y||^2 = ||x||^2 - 2*x.y + ||y||^2, so entries for
/// coincident points may come out slightly negative.
pub fn distance_matrix(a: &ArrayView2<f64>, b: &ArrayView2<f64>) -> Array2<f64> {
    let a_norms = compute_squared_norms_serial(a);
    let b_norms = compute_squared_norms_serial(b);

    // a: (n_a, n_features), b.t(): (n_features, n_b)
    let mut out = a.dot(&b.t());
    Zip::indexed(&mut out).for_each(|(i, j), d| {
        *d = a_norms[i] - 2.0 * *d + b_norms[j];
    });

    out
}

/// Data-parallel version of [`distance_matrix`]; rows of the output are
/// computed independently on the rayon pool.
pub fn distance_matrix_parallel(a: &ArrayView2<f64>, b: &ArrayView2<f64>) -> Array2<f64> {
    let a_norms = compute_squared_norms(a);
    let b_norms = compute_squared_norms(b);

    let mut out = Array2::zeros((a.nrows(), b.nrows()));
    Zip::from(out.rows_mut())
        .and(a.rows())
        .and(&a_norms)
        .par_for_each(|mut out_row, x, &x_norm| {
            for (j, y) in b.rows().into_iter().enumerate() {
                out_row[j] = x_norm - 2.0 * x.dot(&y) + b_norms[j];
            }
        });

    out
}
