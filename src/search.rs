//! Single-trajectory VNS search loops.
//!
//! Both variants share one control flow: draw a sample, shake the incumbent,
//! run the local search on the sample, keep the result if it improves the
//! incumbent. The baseline runs everything on the calling thread; the
//! inner-parallel variant runs seeding and local search data-parallel.

use std::time::{Duration, Instant};

use ndarray::{Array2, ArrayView2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::centers::CenterSet;
use crate::config::{SearchBudget, VnsConfig};
use crate::distance::Execution;
use crate::error::ClusterError;
use crate::local_search::LocalSearch;
use crate::progress::Progress;
use crate::result::{assemble, ClusterResult, ObjectiveTrace, TrajectoryTrace};
use crate::shaking::Shaker;

/// Sequential sampling VNS clustering.
///
/// Runs until `budget` is exhausted, then labels the full dataset with the
/// best centers found on any sample.
#[instrument(skip_all, fields(m = points.nrows(), n = points.ncols(), k = config.n_centers))]
pub fn bimodal_clust(
    points: &ArrayView2<f64>,
    config: &VnsConfig,
    budget: &SearchBudget,
) -> Result<ClusterResult, ClusterError> {
    run_trajectory(points, config, budget, Execution::Sequential)
}

/// Sampling VNS clustering with data-parallel seeding and local search.
///
/// A budget with neither limit set runs until the process is stopped.
#[instrument(skip_all, fields(m = points.nrows(), n = points.ncols(), k = config.n_centers))]
pub fn bimodal_clust_inner(
    points: &ArrayView2<f64>,
    config: &VnsConfig,
    budget: &SearchBudget,
) -> Result<ClusterResult, ClusterError> {
    run_trajectory(points, config, budget, Execution::Parallel)
}

/// Draw `sample_size` distinct rows of `points`.
pub(crate) fn draw_sample(
    points: &ArrayView2<f64>,
    sample_size: usize,
    rng: &mut ChaCha8Rng,
) -> Array2<f64> {
    let indices = rand::seq::index::sample(rng, points.nrows(), sample_size).into_vec();
    points.select(Axis(0), &indices)
}

pub(crate) fn shaker_for(config: &VnsConfig, exec: Execution) -> Shaker {
    Shaker {
        init_mode: config.init_mode,
        n_candidates: config.n_candidates,
        exec,
    }
}

pub(crate) fn local_search_for(config: &VnsConfig, exec: Execution) -> LocalSearch {
    LocalSearch {
        max_iters: config.local_max_iters,
        tol: config.local_tol,
        metric: config.metric,
        exec,
    }
}

fn run_trajectory(
    points: &ArrayView2<f64>,
    config: &VnsConfig,
    budget: &SearchBudget,
    exec: Execution,
) -> Result<ClusterResult, ClusterError> {
    let (n_points, n_features) = points.dim();
    config.validate(n_points, n_features)?;
    if budget.max_iter == Some(0) || budget.t_max.is_some_and(|t| t.is_zero()) {
        return Err(ClusterError::InvalidBudget(
            "limits must be positive; use None for no limit".to_string(),
        ));
    }

    let start = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let progress = Progress::new(config.verbose);
    progress.header("sample objective");

    let shaker = shaker_for(config, exec);
    let local_search = local_search_for(config, exec);

    let mut centers = CenterSet::degenerate(config.n_centers, n_features);
    let mut objective = f64::INFINITY;
    let mut n_dists = 0u64;
    let mut n_iter = 0usize;
    let mut best_time = Duration::ZERO;
    let mut best_n_iter = 0usize;
    let mut trace = TrajectoryTrace::default();
    let mut p = 1usize;
    let mut elapsed = Duration::ZERO;

    while budget.allows(n_iter, elapsed) {
        let sample = draw_sample(points, config.sample_size, &mut rng);

        let shaken = shaker.shake(&sample.view(), &centers, p, &mut rng);
        n_dists += shaken.n_dists;
        let mut new_centers = shaken.centers;

        let local = local_search.run(&sample.view(), &mut new_centers);
        n_dists += local.n_dists;

        elapsed = start.elapsed();
        n_iter += 1;

        if local.objective < objective {
            objective = local.objective;
            centers = new_centers;
            best_time = elapsed;
            best_n_iter = n_iter;
            trace.accepted(objective, elapsed);
            progress.report(objective, n_iter, elapsed);
            debug!(objective, n_iter, p, "improved incumbent");
            p = 1;
        } else {
            trace.rejected();
            p += 1;
            if p > config.p_max {
                p = 1;
            }
        }
    }

    let assembled = assemble(points, &centers);
    n_dists += assembled.n_dists;

    info!(
        objective = assembled.objective,
        sample_objective = objective,
        n_iter,
        best_n_iter,
        n_dists,
        ?exec,
        "search finished"
    );

    Ok(ClusterResult {
        centers,
        objective: assembled.objective,
        assignment: assembled.assignment,
        n_iter,
        best_n_iter,
        best_time,
        n_dists,
        trace: ObjectiveTrace::from_trajectories(&[trace]),
    })
}
