//! Greedy K-means++ seeding.
//!
//! Each stage draws several candidates with probability proportional to the
//! squared distance to the closest already-chosen center and keeps the one
//! whose addition yields the lowest total potential.

use ndarray::{Array1, ArrayView2, Axis};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::distance::Execution;

/// Indices chosen by [`kmeans_plus_plus`] together with the number of
/// pairwise distances it evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Seeding {
    pub indices: Vec<usize>,
    pub n_dists: u64,
}

/// Pick `n_new_centers` rows of `points` as new centers.
///
/// `centers` are the centers that stay in place; when it has no rows the
/// first pick is uniform. Returns no picks when there are no points, no
/// features, nothing to add, or no candidates.
pub fn kmeans_plus_plus(
    points: &ArrayView2<f64>,
    centers: &ArrayView2<f64>,
    n_new_centers: usize,
    n_candidates: usize,
    rng: &mut ChaCha8Rng,
    exec: Execution,
) -> Seeding {
    let (n_points, n_features) = points.dim();
    let n_centers = centers.nrows();
    let mut seeding = Seeding::default();

    if n_points == 0 || n_features == 0 || n_new_centers == 0 || n_candidates == 0 {
        return seeding;
    }
    seeding.indices.reserve(n_new_centers);

    let mut closest_dist_sq: Array1<f64> = if n_centers == 0 {
        let first = rng.gen_range(0..n_points);
        seeding.indices.push(first);
        let first_row = points.select(Axis(0), &[first]);
        seeding.n_dists += n_points as u64;
        exec.distance_matrix(&first_row.view(), points).row(0).to_owned()
    } else {
        let dist_mat = exec.distance_matrix(centers, points);
        seeding.n_dists += (n_centers * n_points) as u64;
        dist_mat.fold_axis(Axis(0), f64::INFINITY, |&acc, &d| if d < acc { d } else { acc })
    };

    let mut current_pot: f64 = closest_dist_sq.sum();

    while seeding.indices.len() < n_new_centers {
        // Cumulative-sum inversion of uniform draws scaled by the potential
        let cumsum: Vec<f64> = closest_dist_sq
            .iter()
            .scan(0.0, |acc, &d| {
                *acc += d;
                Some(*acc)
            })
            .collect();
        let candidate_ids: Vec<usize> = (0..n_candidates)
            .map(|_| {
                let target = rng.gen::<f64>() * current_pot;
                cumsum.partition_point(|&c| c < target).min(n_points - 1)
            })
            .collect();

        let candidates = points.select(Axis(0), &candidate_ids);
        let mut dists = exec.distance_matrix(&candidates.view(), points);
        seeding.n_dists += dists.len() as u64;

        let mut best_candidate = 0;
        let mut best_pot = f64::INFINITY;
        for (c, mut row) in dists.rows_mut().into_iter().enumerate() {
            row.zip_mut_with(&closest_dist_sq, |d, &closest| {
                if closest < *d {
                    *d = closest;
                }
            });
            let pot = row.sum();
            if pot < best_pot {
                best_pot = pot;
                best_candidate = c;
            }
        }

        current_pot = best_pot;
        closest_dist_sq = dists.row(best_candidate).to_owned();
        seeding.indices.push(candidate_ids[best_candidate]);
    }

    seeding
}

/// Pick `amount` distinct rows uniformly at random out of `n_points`.
pub fn random_indices(n_points: usize, amount: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    rand::seq::index::sample(rng, n_points, amount.min(n_points)).into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::SeedableRng;

    fn three_groups() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [5.0, 5.0],
            [5.1, 5.0],
            [5.0, 5.1],
            [10.0, 0.0],
            [10.1, 0.0],
            [10.0, 0.1],
        ]
    }

    #[test]
    fn test_single_center_from_empty_set() {
        let points = three_groups();
        let empty = Array2::<f64>::zeros((0, 2));
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let seeding = kmeans_plus_plus(
            &points.view(),
            &empty.view(),
            1,
            3,
            &mut rng,
            Execution::Sequential,
        );

        assert_eq!(seeding.indices.len(), 1);
        assert!(seeding.indices[0] < points.nrows());
        assert_eq!(seeding.n_dists, points.nrows() as u64);
    }

    #[test]
    fn test_degenerate_inputs_select_nothing() {
        let points = three_groups();
        let empty = Array2::<f64>::zeros((0, 2));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for (n_new, n_cand) in [(0, 3), (2, 0)] {
            let seeding = kmeans_plus_plus(
                &points.view(),
                &empty.view(),
                n_new,
                n_cand,
                &mut rng,
                Execution::Sequential,
            );
            assert!(seeding.indices.is_empty());
            assert_eq!(seeding.n_dists, 0);
        }

        let no_points = Array2::<f64>::zeros((0, 2));
        let seeding = kmeans_plus_plus(
            &no_points.view(),
            &empty.view(),
            2,
            3,
            &mut rng,
            Execution::Sequential,
        );
        assert!(seeding.indices.is_empty());
    }

    #[test]
    fn test_spreads_over_groups() {
        let points = three_groups();
        let empty = Array2::<f64>::zeros((0, 2));
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let seeding = kmeans_plus_plus(
            &points.view(),
            &empty.view(),
            3,
            4,
            &mut rng,
            Execution::Sequential,
        );

        let mut groups: Vec<usize> = seeding.indices.iter().map(|&i| i / 3).collect();
        groups.sort_unstable();
        assert_eq!(groups, vec![0, 1, 2]);
        // 9 for the first pick, then 4 candidates x 9 points per stage
        assert_eq!(seeding.n_dists, 9 + 2 * 4 * 9);
    }

    #[test]
    fn test_existing_centers_steer_new_picks() {
        let points = three_groups();
        let existing = array![[0.0, 0.0], [5.0, 5.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let seeding = kmeans_plus_plus(
            &points.view(),
            &existing.view(),
            1,
            3,
            &mut rng,
            Execution::Sequential,
        );

        assert_eq!(seeding.indices.len(), 1);
        assert_eq!(seeding.indices[0] / 3, 2, "new center should land in the uncovered group");
        assert_eq!(seeding.n_dists, (2 * 9 + 3 * 9) as u64);
    }

    #[test]
    fn test_parallel_matches_sequential_with_same_seed() {
        use ndarray_rand::rand_distr::Uniform;
        use ndarray_rand::RandomExt;

        let mut data_rng = ChaCha8Rng::seed_from_u64(2024);
        let points = Array2::random_using((200, 4), Uniform::new(0.0, 1.0), &mut data_rng);
        let empty = Array2::<f64>::zeros((0, 4));

        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let seq = kmeans_plus_plus(
            &points.view(),
            &empty.view(),
            5,
            3,
            &mut rng,
            Execution::Sequential,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let par = kmeans_plus_plus(
            &points.view(),
            &empty.view(),
            5,
            3,
            &mut rng,
            Execution::Parallel,
        );

        assert_eq!(seq.indices.len(), 5);
        assert_eq!(seq, par);
    }

    #[test]
    fn test_random_indices_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut picks = random_indices(10, 4, &mut rng);
        picks.sort_unstable();
        picks.dedup();
        assert_eq!(picks.len(), 4);
        assert!(picks.iter().all(|&i| i < 10));
    }
}
