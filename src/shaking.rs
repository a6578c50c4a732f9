//! VNS shaking: repair degenerate centers, then reinitialize `min(p, k)`
//! randomly chosen centers. Larger shaking power means a larger neighborhood.

use ndarray::ArrayView2;
use rand_chacha::ChaCha8Rng;

use crate::centers::CenterSet;
use crate::config::InitMode;
use crate::distance::Execution;
use crate::seeding::{kmeans_plus_plus, random_indices};

/// Perturbed copy of a center set
#[derive(Debug, Clone)]
pub struct Shaken {
    pub centers: CenterSet,
    pub n_dists: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Shaker {
    pub init_mode: InitMode,
    pub n_candidates: usize,
    pub exec: Execution,
}

impl Shaker {
    /// Perturb `centers` using points of `sample`.
    ///
    /// Degenerate rows are always reseeded with K-means++ against the valid
    /// rows. Then `min(p, k)` rows are picked uniformly from the whole set and
    /// replaced, conditioned on the rows that were not picked.
    pub fn shake(
        &self,
        sample: &ArrayView2<f64>,
        centers: &CenterSet,
        p: usize,
        rng: &mut ChaCha8Rng,
    ) -> Shaken {
        let mut new_centers = centers.clone();
        let mut n_dists = 0u64;
        let k = new_centers.k();

        let degenerate = new_centers.degenerate_indices();
        if !degenerate.is_empty() {
            let reference = new_centers.valid_rows();
            let seeding = kmeans_plus_plus(
                sample,
                &reference.view(),
                degenerate.len(),
                self.n_candidates,
                rng,
                self.exec,
            );
            n_dists += seeding.n_dists;
            for (&row, &idx) in degenerate.iter().zip(seeding.indices.iter()) {
                new_centers.set_row(row, sample.row(idx));
            }
        }

        let n_shaken = p.min(k);
        let shaken_rows = rand::seq::index::sample(rng, k, n_shaken).into_vec();
        let picks = match self.init_mode {
            InitMode::Random => random_indices(sample.nrows(), n_shaken, rng),
            InitMode::KMeansPlusPlus => {
                let mut shaken_mask = vec![false; k];
                for &row in &shaken_rows {
                    shaken_mask[row] = true;
                }
                let reference = new_centers.select_rows(|i| !shaken_mask[i]);
                let seeding = kmeans_plus_plus(
                    sample,
                    &reference.view(),
                    n_shaken,
                    self.n_candidates,
                    rng,
                    self.exec,
                );
                n_dists += seeding.n_dists;
                seeding.indices
            }
        };
        for (&row, &idx) in shaken_rows.iter().zip(picks.iter()) {
            new_centers.set_row(row, sample.row(idx));
        }

        Shaken {
            centers: new_centers,
            n_dists,
        }
    }
}
