//! Search-loop output and the final full-dataset assignment pass.

use std::time::Duration;

use ndarray::{Array1, Array2, ArrayView2};

use crate::centers::CenterSet;
use crate::distance::Execution;
use crate::local_search::LocalSearch;

/// Result of a clustering run
#[derive(Debug, Clone)]
pub struct ClusterResult {
    /// Winning center set
    pub centers: CenterSet,
    /// Objective of `centers` over the full dataset
    pub objective: f64,
    /// Cluster index per input point
    pub assignment: Array1<i64>,
    /// Total number of outer iterations (samples processed)
    pub n_iter: usize,
    /// Outer iteration at which the winning centers were found
    pub best_n_iter: usize,
    /// Elapsed time at which the winning centers were found
    pub best_time: Duration,
    /// Pairwise distance evaluations, including the final assignment pass
    pub n_dists: u64,
    /// Per-iteration sample objectives of every trajectory
    pub trace: ObjectiveTrace,
}

impl ClusterResult {
    /// Number of points in each cluster
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.centers.k()];
        for &label in self.assignment.iter() {
            if label >= 0 {
                sizes[label as usize] += 1;
            }
        }
        sizes
    }
}

/// Objective/time trace, one row per trajectory (one row for the
/// single-trajectory variants, one per worker for the hybrid variant).
///
/// Column `i` is the trajectory's `i`-th outer iteration. Iterations that did
/// not improve hold `+inf` as objective and `0.0` as time.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveTrace {
    pub objectives: Array2<f64>,
    /// Elapsed seconds since the start of the run
    pub times: Array2<f64>,
}

impl ObjectiveTrace {
    pub(crate) fn from_trajectories(rows: &[TrajectoryTrace]) -> Self {
        let width = rows.iter().map(|r| r.n_iter).max().unwrap_or(0);
        let mut objectives = Array2::from_elem((rows.len(), width), f64::INFINITY);
        let mut times = Array2::zeros((rows.len(), width));
        for (t, row) in rows.iter().enumerate() {
            for &(i, obj, time) in &row.improvements {
                objectives[[t, i]] = obj;
                times[[t, i]] = time;
            }
        }
        Self { objectives, times }
    }

    /// Improving objectives of trajectory `t`, in iteration order.
    pub fn improvements(&self, t: usize) -> Vec<f64> {
        self.objectives
            .row(t)
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect()
    }
}

/// Trace of a single trajectory while it is running.
///
/// Only improvements are stored, as `(iteration, objective, seconds)`;
/// rejected iterations just advance the counter.
#[derive(Debug, Clone, Default)]
pub(crate) struct TrajectoryTrace {
    improvements: Vec<(usize, f64, f64)>,
    n_iter: usize,
}

impl TrajectoryTrace {
    pub(crate) fn accepted(&mut self, objective: f64, elapsed: Duration) {
        self.improvements
            .push((self.n_iter, objective, elapsed.as_secs_f64()));
        self.n_iter += 1;
    }

    pub(crate) fn rejected(&mut self) {
        self.n_iter += 1;
    }
}

/// Full-dataset labels produced from the winning centers
#[derive(Debug, Clone)]
pub(crate) struct Assembled {
    pub objective: f64,
    pub assignment: Array1<i64>,
    pub n_dists: u64,
}

/// Label every point against `centers` with one parallel assignment-only pass.
pub(crate) fn assemble(points: &ArrayView2<f64>, centers: &CenterSet) -> Assembled {
    let mut centers = centers.clone();
    let pass = LocalSearch::assignment_only(Execution::Parallel).run(points, &mut centers);
    Assembled {
        objective: pass.objective,
        assignment: pass.assignment,
        n_dists: pass.n_dists,
    }
}
