//! Hybrid parallel VNS: a competitive phase followed by a collective phase.
//!
//! One worker runs per rayon thread, each with its own trajectory. During the
//! competitive phase a worker only ever improves its own incumbent. During the
//! collective phase every iteration starts from the best incumbent of any
//! worker and must beat that incumbent's objective to be kept.
//!
//! Workers share their incumbents through per-worker slots without a global
//! lock. A worker may read another slot's objective and centers from different
//! moments; the search tolerates this, it only changes which neighborhood gets
//! explored next.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use ndarray::ArrayView2;
use parking_lot::RwLock;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::centers::CenterSet;
use crate::config::{HybridBudget, VnsConfig};
use crate::distance::Execution;
use crate::error::ClusterError;
use crate::local_search::LocalSearch;
use crate::progress::Progress;
use crate::result::{assemble, ClusterResult, ObjectiveTrace, TrajectoryTrace};
use crate::search::{draw_sample, local_search_for, shaker_for};
use crate::shaking::Shaker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Competitive,
    Collective,
}

/// Incumbents published by the workers, one slot per worker.
struct SharedBest {
    objectives: Vec<AtomicU64>,
    centers: Vec<RwLock<CenterSet>>,
    n_iters: Vec<AtomicUsize>,
}

impl SharedBest {
    fn new(n_workers: usize, k: usize, n_features: usize) -> Self {
        Self {
            objectives: (0..n_workers)
                .map(|_| AtomicU64::new(f64::INFINITY.to_bits()))
                .collect(),
            centers: (0..n_workers)
                .map(|_| RwLock::new(CenterSet::degenerate(k, n_features)))
                .collect(),
            n_iters: (0..n_workers).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    fn objective(&self, t: usize) -> f64 {
        f64::from_bits(self.objectives[t].load(Ordering::Relaxed))
    }

    /// Worker holding the lowest objective, and that objective.
    fn best(&self) -> (usize, f64) {
        (0..self.objectives.len())
            .map(|t| (t, self.objective(t)))
            .fold((0, f64::INFINITY), |acc, cur| if cur.1 < acc.1 { cur } else { acc })
    }

    fn total_iters(&self) -> usize {
        self.n_iters.iter().map(|n| n.load(Ordering::Relaxed)).sum()
    }

    fn centers(&self, t: usize) -> CenterSet {
        self.centers[t].read().clone()
    }

    fn publish(&self, t: usize, objective: f64, centers: CenterSet) {
        *self.centers[t].write() = centers;
        self.objectives[t].store(objective.to_bits(), Ordering::Relaxed);
    }
}

/// Settings every worker reads
struct Context<'a> {
    points: ArrayView2<'a, f64>,
    sample_size: usize,
    p_max: usize,
    shaker: Shaker,
    local_search: LocalSearch,
    progress: Progress,
    start: Instant,
    shared: SharedBest,
}

/// State owned by one worker
struct Worker {
    id: usize,
    rng: ChaCha8Rng,
    p: usize,
    n_dists: u64,
    running_time: Duration,
    best_time: Duration,
    best_n_iter: usize,
    trace: TrajectoryTrace,
}

impl Worker {
    fn new(id: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(id as u64);
        Self {
            id,
            rng,
            p: 1,
            n_dists: 0,
            running_time: Duration::ZERO,
            best_time: Duration::ZERO,
            best_n_iter: 0,
            trace: TrajectoryTrace::default(),
        }
    }

    fn run_phase(&mut self, ctx: &Context<'_>, phase: Phase, max_iter: usize, t_max: Duration) {
        let t = self.id;
        let shared = &ctx.shared;

        while shared.total_iters() < max_iter && self.running_time < t_max {
            let sample = draw_sample(&ctx.points, ctx.sample_size, &mut self.rng);

            let (best_worker, best_objective) = shared.best();
            let base = match phase {
                Phase::Competitive => shared.centers(t),
                Phase::Collective => shared.centers(best_worker),
            };

            let shaken = ctx.shaker.shake(&sample.view(), &base, self.p, &mut self.rng);
            self.n_dists += shaken.n_dists;
            let mut new_centers = shaken.centers;

            let local = ctx.local_search.run(&sample.view(), &mut new_centers);
            self.n_dists += local.n_dists;

            let time_now = ctx.start.elapsed();
            self.running_time = time_now;
            shared.n_iters[t].fetch_add(1, Ordering::Relaxed);

            let baseline = match phase {
                Phase::Competitive => shared.objective(t),
                Phase::Collective => best_objective,
            };

            if local.objective < baseline {
                shared.publish(t, local.objective, new_centers);
                self.trace.accepted(local.objective, time_now);
                self.best_time = time_now;
                self.best_n_iter = shared.total_iters();
                if phase == Phase::Collective || local.objective < best_objective {
                    ctx.progress.report(local.objective, self.best_n_iter, time_now);
                }
                debug!(
                    worker = t,
                    ?phase,
                    objective = local.objective,
                    p = self.p,
                    "improved incumbent"
                );
                self.p = 1;
            } else {
                self.trace.rejected();
                // Never drops below p_max again until the next improvement
                self.p = (self.p + 1).max(ctx.p_max);
            }
        }
    }
}

/// Sampling VNS clustering with one independent trajectory per rayon thread.
///
/// Workers first compete until the summed iteration count reaches
/// `max_iter1` or their own clock reaches `t_max1`, then collaborate on the
/// global best until `max_iter1 + max_iter2` / `t_max1 + t_max2`. The best
/// worker's centers label the full dataset.
#[instrument(skip_all, fields(m = points.nrows(), n = points.ncols(), k = config.n_centers))]
pub fn bimodal_clust_hybrid(
    points: &ArrayView2<f64>,
    config: &VnsConfig,
    budget: &HybridBudget,
) -> Result<ClusterResult, ClusterError> {
    let (n_points, n_features) = points.dim();
    config.validate(n_points, n_features)?;
    budget.validate()?;

    let start = Instant::now();
    let n_workers = rayon::current_num_threads().max(1);
    let progress = Progress::new(config.verbose);
    progress.header("sample objective");

    let ctx = Context {
        points: points.view(),
        sample_size: config.sample_size,
        p_max: config.p_max,
        shaker: shaker_for(config, Execution::Sequential),
        local_search: local_search_for(config, Execution::Sequential),
        progress,
        start,
        shared: SharedBest::new(n_workers, config.n_centers, n_features),
    };

    let workers: Vec<Worker> = (0..n_workers)
        .map(|t| Worker::new(t, config.seed))
        .collect();

    let workers: Vec<Worker> = workers
        .into_par_iter()
        .map(|mut worker| {
            worker.run_phase(&ctx, Phase::Competitive, budget.max_iter1, budget.t_max1);
            worker
        })
        .collect();

    debug!(
        n_workers,
        n_iter = ctx.shared.total_iters(),
        objective = ctx.shared.best().1,
        "competitive phase finished"
    );

    let workers: Vec<Worker> = workers
        .into_par_iter()
        .map(|mut worker| {
            worker.run_phase(
                &ctx,
                Phase::Collective,
                budget.max_iter1 + budget.max_iter2,
                budget.t_max1 + budget.t_max2,
            );
            worker
        })
        .collect();

    let (best_worker, sample_objective) = ctx.shared.best();
    let centers = ctx.shared.centers(best_worker);
    let assembled = assemble(points, &centers);

    let n_iter = ctx.shared.total_iters();
    let n_dists = workers.iter().map(|w| w.n_dists).sum::<u64>() + assembled.n_dists;
    let traces: Vec<TrajectoryTrace> = workers.iter().map(|w| w.trace.clone()).collect();

    info!(
        objective = assembled.objective,
        sample_objective,
        n_workers,
        best_worker,
        n_iter,
        n_dists,
        "hybrid search finished"
    );

    Ok(ClusterResult {
        centers,
        objective: assembled.objective,
        assignment: assembled.assignment,
        n_iter,
        best_n_iter: workers[best_worker].best_n_iter,
        best_time: workers[best_worker].best_time,
        n_dists,
        trace: ObjectiveTrace::from_trajectories(&traces),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    fn budget(max_iter1: usize, max_iter2: usize) -> HybridBudget {
        HybridBudget::new(
            max_iter1,
            max_iter2,
            Duration::from_secs(30),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn test_shared_best_picks_lowest_slot() {
        let shared = SharedBest::new(3, 2, 2);
        assert_eq!(shared.best().1, f64::INFINITY);

        shared.publish(2, 4.0, CenterSet::from_array(array![[0.0, 0.0], [1.0, 1.0]]));
        shared.publish(1, 7.0, CenterSet::from_array(array![[2.0, 2.0], [3.0, 3.0]]));

        assert_eq!(shared.best(), (2, 4.0));
        assert_eq!(shared.centers(2).n_degenerate(), 0);
        assert_eq!(shared.centers(0).n_degenerate(), 2);
    }

    #[test]
    fn test_rejection_keeps_power_at_p_max() {
        // A sample of identical points: after the first acceptance nothing can improve.
        let points = Array2::from_elem((10, 2), 1.0);
        let config = VnsConfig::new(2).with_sample_size(5).with_p_max(3).with_seed(2);
        let ctx = Context {
            points: points.view(),
            sample_size: 5,
            p_max: 3,
            shaker: shaker_for(&config, Execution::Sequential),
            local_search: local_search_for(&config, Execution::Sequential),
            progress: Progress::new(false),
            start: Instant::now(),
            shared: SharedBest::new(1, 2, 2),
        };
        let mut worker = Worker::new(0, 2);

        worker.run_phase(&ctx, Phase::Competitive, 4, Duration::from_secs(30));

        assert_eq!(ctx.shared.total_iters(), 4);
        // accepted once, then 1 -> max(2, 3) -> 4 -> 5
        assert_eq!(worker.p, 5);
        let trace = ObjectiveTrace::from_trajectories(&[worker.trace.clone()]);
        assert_eq!(trace.improvements(0), vec![0.0]);
    }

    #[test]
    fn test_collective_phase_compares_against_global_best() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let points = Array2::random_using((40, 2), Uniform::new(0.0, 1.0), &mut rng);
        let config = VnsConfig::new(2).with_sample_size(10).with_p_max(2).with_seed(4);
        let ctx = Context {
            points: points.view(),
            sample_size: 10,
            p_max: 2,
            shaker: shaker_for(&config, Execution::Sequential),
            local_search: local_search_for(&config, Execution::Sequential),
            progress: Progress::new(false),
            start: Instant::now(),
            shared: SharedBest::new(2, 2, 2),
        };
        let incumbent = CenterSet::from_array(array![[0.25, 0.25], [0.75, 0.75]]);

        // Worker 1 holds an objective no sample can beat
        ctx.shared.publish(1, 0.0, incumbent.clone());
        let mut worker = Worker::new(0, 4);
        worker.run_phase(&ctx, Phase::Collective, 5, Duration::from_secs(30));

        assert_eq!(ctx.shared.objective(0), f64::INFINITY);
        assert_eq!(ctx.shared.total_iters(), 5);
        // 1 -> max(2, 2) -> 3 -> 4 -> 5 -> 6
        assert_eq!(worker.p, 6);

        // Any finite sample objective beats the new global best
        ctx.shared.publish(1, 1e9, incumbent);
        worker.run_phase(&ctx, Phase::Collective, 6, Duration::from_secs(30));

        assert!(ctx.shared.objective(0) < 1e9);
        assert_eq!(ctx.shared.best().0, 0);
        assert_eq!(worker.p, 1);
        assert_eq!(worker.best_n_iter, 6);
    }

    #[test]
    fn test_hybrid_labels_every_point() {
        let points = array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [3.0, 3.0],
            [3.1, 3.0],
            [3.0, 3.1],
            [6.0, 0.0],
            [6.1, 0.0],
            [6.0, 0.1],
        ];
        let config = VnsConfig::new(3).with_sample_size(6).with_seed(7);

        let result = bimodal_clust_hybrid(&points.view(), &config, &budget(20, 20)).unwrap();

        assert_eq!(result.assignment.len(), 9);
        assert!(result.assignment.iter().all(|&a| (0..3).contains(&a)));
        assert!(result.n_iter >= 40);
        assert!(result.n_dists > 0);
        for t in 0..result.trace.objectives.nrows() {
            let improvements = result.trace.improvements(t);
            assert!(improvements.windows(2).all(|w| w[1] < w[0]));
        }
    }

    #[test]
    fn test_rejects_non_positive_budget() {
        let points = Array2::from_elem((10, 2), 1.0);
        let config = VnsConfig::new(2).with_sample_size(5);
        let zero_time = HybridBudget::new(10, 10, Duration::ZERO, Duration::from_secs(1));

        let result = bimodal_clust_hybrid(&points.view(), &config, &zero_time);
        assert!(matches!(result, Err(ClusterError::InvalidBudget(_))));
    }
}
