//! # bimodal-clust
//!
//! K-means clustering for datasets too large to cluster directly. Instead of
//! running Lloyd's algorithm on all points, each iteration draws a small
//! random sample, perturbs the best center set found so far, and runs K-means
//! to convergence on the sample. A Variable Neighborhood Search (VNS) decides
//! how strongly to perturb: every failed iteration widens the neighborhood,
//! every improvement narrows it again. The winning centers finally label the
//! full dataset in a single assignment pass.
//!
//! ## Features
//!
//! - **Greedy K-means++ shaking**: degenerate centers are repaired and `p`
//!   random centers are reseeded with multi-candidate K-means++
//! - **Three search loops**:
//!   - [`bimodal_clust`]: single trajectory on the calling thread
//!   - [`bimodal_clust_hybrid`]: one trajectory per rayon thread, first
//!     competing, then sharing the global best
//!   - [`bimodal_clust_inner`]: single trajectory with data-parallel seeding
//!     and local search
//! - **ndarray compatible**: points are `ArrayView2<f64>`
//! - **Optional BLAS acceleration**: Enable `accelerate` (macOS) or `openblas` features for faster matrix operations
//!
//! ## Example
//!
//! ```rust
//! use bimodal_clust::{bimodal_clust, preprocess, SearchBudget, VnsConfig};
//! use ndarray::Array2;
//! use ndarray_rand::RandomExt;
//! use ndarray_rand::rand_distr::Uniform;
//!
//! let data = Array2::random((5000, 16), Uniform::new(-1.0, 1.0));
//! let data = preprocess::normalize(&data.view());
//!
//! let config = VnsConfig::new(10)
//!     .with_sample_size(500)
//!     .with_p_max(5)
//!     .with_seed(42);
//! let result = bimodal_clust(&data.view(), &config, &SearchBudget::iterations(50)).unwrap();
//!
//! assert_eq!(result.assignment.len(), 5000);
//! assert!(result.objective.is_finite());
//! ```
//!
//! ## Hybrid parallelism
//!
//! ```rust
//! use std::time::Duration;
//! use bimodal_clust::{bimodal_clust_hybrid, HybridBudget, VnsConfig};
//! use ndarray::Array2;
//! use ndarray_rand::RandomExt;
//! use ndarray_rand::rand_distr::Uniform;
//!
//! let data = Array2::random((2000, 4), Uniform::new(0.0, 1.0));
//! let budget = HybridBudget::new(40, 40, Duration::from_secs(5), Duration::from_secs(5));
//!
//! let result = bimodal_clust_hybrid(&data.view(), &VnsConfig::new(4), &budget).unwrap();
//! assert!(result.assignment.iter().all(|&label| (0..4).contains(&label)));
//! ```

// Link BLAS libraries when features are enabled
#[cfg(feature = "accelerate")]
extern crate accelerate_src;

#[cfg(feature = "openblas")]
extern crate openblas_src;

mod centers;
mod config;
mod distance;
mod error;
mod hybrid;
mod local_search;
mod model;
pub mod preprocess;
mod progress;
mod result;
mod search;
mod seeding;
mod shaking;

pub use centers::CenterSet;
pub use config::{HybridBudget, InitMode, SearchBudget, VnsConfig};
pub use distance::{distance_matrix, distance_matrix_parallel, DistanceMetric, Execution};
pub use error::ClusterError;
pub use hybrid::bimodal_clust_hybrid;
pub use local_search::{LocalSearch, LocalSearchResult};
pub use model::{BiModalClust, SearchStrategy};
pub use result::{ClusterResult, ObjectiveTrace};
pub use search::{bimodal_clust, bimodal_clust_inner};
pub use seeding::{kmeans_plus_plus, Seeding};
pub use shaking::{Shaken, Shaker};
