//! Lloyd's algorithm run to convergence from a given center set.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use tracing::debug;

use crate::centers::CenterSet;
use crate::distance::{DistanceMetric, Execution};

/// Outcome of one [`LocalSearch::run`] call
#[derive(Debug, Clone)]
pub struct LocalSearchResult {
    /// Objective of the last assignment step
    pub objective: f64,
    /// Number of assignment steps performed
    pub n_iters: usize,
    /// Index of the nearest center per point, -1 only if no valid center exists
    pub assignment: Array1<i64>,
    /// `n_iters * k * m`
    pub n_dists: u64,
}

/// Options of the local search
#[derive(Debug, Clone, Copy)]
pub struct LocalSearch {
    /// Cap on assignment steps. `Some(0)` is an assignment-only pass.
    pub max_iters: Option<usize>,
    /// Relative objective drop at or below which the search stops; `<= 0` disables
    pub tol: f64,
    pub metric: DistanceMetric,
    pub exec: Execution,
}

impl LocalSearch {
    /// Assignment-only pass, used to label a full dataset against fixed centers.
    pub fn assignment_only(exec: Execution) -> Self {
        Self {
            max_iters: Some(0),
            tol: 0.0,
            metric: DistanceMetric::InnerProduct,
            exec,
        }
    }

    /// Run Lloyd iterations on `points`, updating `centers` in place.
    ///
    /// Every iteration assigns each point to its nearest valid center, then
    /// stops if the iteration cap was reached, no assignment changed, or the
    /// relative improvement fell to `tol`. Otherwise each center moves to the
    /// mean of its points; a center left without points becomes degenerate.
    pub fn run(&self, points: &ArrayView2<f64>, centers: &mut CenterSet) -> LocalSearchResult {
        let (m, n) = points.dim();
        let k = centers.k();
        debug_assert_eq!(centers.n_features(), n);

        let mut assignment = Array1::from_elem(m, -1i64);
        let mut objective = f64::INFINITY;
        let mut n_iters = 0usize;

        if m == 0 || n == 0 || k == 0 {
            return LocalSearchResult {
                objective,
                n_iters,
                assignment,
                n_dists: 0,
            };
        }

        let point_norms = self.exec.squared_norms(points);
        let mut objective_previous = f64::INFINITY;

        loop {
            let center_norms = self.exec.squared_norms(&centers.values());
            let nearest = self.assign(points, &point_norms.view(), centers, &center_norms.view());

            objective = 0.0;
            let mut n_changed = 0usize;
            for (label, (best, dist)) in assignment.iter_mut().zip(nearest) {
                if *label != best {
                    n_changed += 1;
                    *label = best;
                }
                objective += dist;
            }
            n_iters += 1;

            let improvement = 1.0 - objective / objective_previous;
            objective_previous = objective;

            if self.max_iters.map_or(false, |max| n_iters >= max)
                || n_changed == 0
                || (self.tol > 0.0 && improvement <= self.tol)
            {
                break;
            }

            update_centers(points, &assignment, centers);
        }

        debug!(objective, n_iters, m, k, "local search finished");

        LocalSearchResult {
            objective,
            n_iters,
            assignment,
            n_dists: (n_iters * k * m) as u64,
        }
    }

    /// Nearest valid center and its squared distance for every point.
    fn assign(
        &self,
        points: &ArrayView2<f64>,
        point_norms: &ArrayView1<f64>,
        centers: &CenterSet,
        center_norms: &ArrayView1<f64>,
    ) -> Vec<(i64, f64)> {
        let metric = self.metric;
        let nearest = |i: usize| {
            let x = points.row(i);
            let mut min_d = f64::INFINITY;
            let mut min_ind = -1i64;
            for j in 0..centers.k() {
                if !centers.is_valid(j) {
                    continue;
                }
                let d = metric.dist2(&x, &centers.row(j), point_norms[i], center_norms[j]);
                if d < min_d {
                    min_d = d;
                    min_ind = j as i64;
                }
            }
            (min_ind, min_d)
        };

        match self.exec {
            Execution::Sequential => (0..points.nrows()).map(nearest).collect(),
            Execution::Parallel => (0..points.nrows()).into_par_iter().map(nearest).collect(),
        }
    }
}

/// Move every center to the mean of its assigned points.
fn update_centers(points: &ArrayView2<f64>, assignment: &Array1<i64>, centers: &mut CenterSet) {
    let k = centers.k();
    let mut center_sums: Array2<f64> = Array2::zeros((k, points.ncols()));
    let mut center_counts = vec![0usize; k];

    for (point, &label) in points.rows().into_iter().zip(assignment.iter()) {
        if label < 0 {
            continue;
        }
        let c = label as usize;
        center_sums.row_mut(c).scaled_add(1.0, &point);
        center_counts[c] += 1;
    }

    for (c, &count) in center_counts.iter().enumerate() {
        if count > 0 {
            let mean = center_sums.row(c).mapv(|s| s / count as f64);
            centers.set_row(c, mean.view());
        } else {
            centers.mark_degenerate(c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Axis};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn search(max_iters: Option<usize>, exec: Execution) -> LocalSearch {
        LocalSearch {
            max_iters,
            tol: 0.0,
            metric: DistanceMetric::InnerProduct,
            exec,
        }
    }

    #[test]
    fn test_single_cluster_converges_to_mean() {
        let points = array![[0.0, 0.0], [2.0, 0.0], [0.0, 4.0], [2.0, 4.0]];
        let mut centers = CenterSet::from_array(array![[10.0, 10.0]]);

        let result = search(None, Execution::Sequential).run(&points.view(), &mut centers);

        // One update, then a confirming assignment pass with nothing changed
        assert_eq!(result.n_iters, 2);
        assert_eq!(centers.row(0), array![1.0, 2.0]);
        // sum of squared deviations from (1, 2): 4 * (1 + 4)
        assert_relative_eq!(result.objective, 20.0, epsilon = 1e-9);
        assert!(result.assignment.iter().all(|&a| a == 0));
        assert_eq!(result.n_dists, 2 * 4);
    }

    #[test]
    fn test_assignment_only_leaves_centers_untouched() {
        let points = array![[0.0, 0.0], [1.0, 0.0], [9.0, 0.0], [10.0, 0.0]];
        let initial = array![[0.0, 0.0], [4.0, 0.0]];
        let mut centers = CenterSet::from_array(initial.clone());

        let result = search(Some(0), Execution::Parallel).run(&points.view(), &mut centers);

        assert_eq!(result.n_iters, 1);
        assert_eq!(centers.values(), initial.view());
        assert_eq!(result.assignment, array![0, 0, 1, 1]);
        assert_relative_eq!(result.objective, 0.0 + 1.0 + 25.0 + 36.0, epsilon = 1e-9);
        assert_eq!(result.n_dists, 2 * 4);
    }

    #[test]
    fn test_empty_cluster_becomes_degenerate() {
        let points = array![[0.0, 0.0], [0.2, 0.0], [5.0, 5.0], [5.2, 5.0]];
        // The third center is closer to nothing
        let mut centers = CenterSet::from_array(array![[0.0, 0.0], [5.0, 5.0], [100.0, 100.0]]);

        let result = search(None, Execution::Sequential).run(&points.view(), &mut centers);

        assert!(!centers.is_valid(2));
        assert!(result.assignment.iter().all(|&a| a == 0 || a == 1));
        assert_relative_eq!(result.objective, 4.0 * 0.01, epsilon = 1e-9);
    }

    #[test]
    fn test_objective_never_increases_between_steps() {
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let points = Array2::random_using((400, 3), Uniform::new(-1.0, 1.0), &mut rng);
        let init = points.select(Axis(0), &[0, 1, 2, 3, 4, 5]);

        let mut previous = f64::INFINITY;
        for cap in 1..=40 {
            let mut centers = CenterSet::from_array(init.clone());
            let result = search(Some(cap), Execution::Sequential).run(&points.view(), &mut centers);
            assert!(
                result.objective <= previous + 1e-9,
                "objective rose from {} to {} at cap {}",
                previous,
                result.objective,
                cap
            );
            previous = result.objective;
        }
    }

    #[test]
    fn test_cluster_emptied_by_an_update() {
        // The middle center first takes 2.0 and 10.0, then both outer
        // centers move close enough to claim them.
        let points = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let init = array![[-3.0], [6.0], [15.0]];

        let mut objectives = Vec::new();
        for cap in 1..=4 {
            let mut centers = CenterSet::from_array(init.clone());
            let result = search(Some(cap), Execution::Sequential).run(&points.view(), &mut centers);
            objectives.push(result.objective);
        }
        assert_relative_eq!(objectives[0], 82.0, epsilon = 1e-9);
        assert_relative_eq!(objectives[1], 5.5, epsilon = 1e-9);
        assert_relative_eq!(objectives[2], 4.0, epsilon = 1e-9);
        assert_relative_eq!(objectives[3], 4.0, epsilon = 1e-9);

        let mut centers = CenterSet::from_array(init);
        let result = search(None, Execution::Sequential).run(&points.view(), &mut centers);

        assert!(!centers.is_valid(1));
        assert_eq!(result.n_iters, 3);
        assert_eq!(result.assignment, array![0, 0, 0, 2, 2, 2]);
        assert_relative_eq!(result.objective, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_rows_are_skipped() {
        let points = array![[0.0, 0.0], [1.0, 1.0]];
        let mut centers = CenterSet::degenerate(2, 2);
        centers.set_row(1, array![0.5, 0.5].view());

        let result = search(Some(0), Execution::Sequential).run(&points.view(), &mut centers);

        assert_eq!(result.assignment, array![1, 1]);
    }

    #[test]
    fn test_objective_matches_assignment() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let points = Array2::random_using((300, 5), Uniform::new(-1.0, 1.0), &mut rng);
        let init = points.select(Axis(0), &[0, 10, 20, 30]);
        let mut centers = CenterSet::from_array(init);

        let result = LocalSearch {
            max_iters: Some(300),
            tol: 1e-4,
            metric: DistanceMetric::SquaredDifference,
            exec: Execution::Sequential,
        }
        .run(&points.view(), &mut centers);

        // The loop stops right after an assignment step, so relabeling
        // against the returned centers reproduces labels and objective.
        let mut relabel = centers.clone();
        let check = search(Some(0), Execution::Sequential).run(&points.view(), &mut relabel);
        assert_eq!(check.assignment, result.assignment);
        assert_relative_eq!(check.objective, result.objective, epsilon = 1e-9);
        assert!(result.n_iters >= 1);
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let points = Array2::random_using((200, 3), Uniform::new(0.0, 1.0), &mut rng);
        let init = points.select(Axis(0), &[1, 2, 3]);

        let mut a = CenterSet::from_array(init.clone());
        let mut b = CenterSet::from_array(init);
        let ra = search(Some(50), Execution::Sequential).run(&points.view(), &mut a);
        let rb = search(Some(50), Execution::Parallel).run(&points.view(), &mut b);

        assert_eq!(ra.assignment, rb.assignment);
        assert_eq!(ra.n_iters, rb.n_iters);
        assert_relative_eq!(ra.objective, rb.objective, epsilon = 1e-9);
    }
}
