use std::time::Duration;

use crate::distance::DistanceMetric;
use crate::error::ClusterError;

/// How shaking picks replacement centers for the randomly chosen rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitMode {
    /// Distinct sample points drawn uniformly at random
    Random,
    /// Greedy multi-candidate K-means++ conditioned on the surviving centers
    #[default]
    KMeansPlusPlus,
}

/// Configuration shared by all search-loop variants
#[derive(Debug, Clone)]
pub struct VnsConfig {
    /// Number of clusters
    pub n_centers: usize,

    /// Number of points drawn (without replacement) at each outer iteration
    pub sample_size: usize,

    /// Maximum shaking power of the VNS metaheuristic
    pub p_max: usize,

    /// Reinitialization mode used by shaking
    pub init_mode: InitMode,

    /// Maximum number of Lloyd iterations per sample. `None` runs to convergence.
    pub local_max_iters: Option<usize>,

    /// Relative objective improvement below which a local search stops.
    /// Set to zero or a negative value to disable.
    pub local_tol: f64,

    /// Number of candidates evaluated at each K-means++ stage
    pub n_candidates: usize,

    /// Distance formula used inside the local search
    pub metric: DistanceMetric,

    /// Random seed for sampling, seeding and shaking
    pub seed: u64,

    /// Print one progress line per improving iteration
    pub verbose: bool,
}

impl Default for VnsConfig {
    fn default() -> Self {
        Self {
            n_centers: 3,
            sample_size: 100,
            p_max: 5,
            init_mode: InitMode::KMeansPlusPlus,
            local_max_iters: Some(300),
            local_tol: 1e-4,
            n_candidates: 3,
            metric: DistanceMetric::InnerProduct,
            seed: 0,
            verbose: false,
        }
    }
}

impl VnsConfig {
    /// Create a new configuration with the specified number of clusters
    pub fn new(n_centers: usize) -> Self {
        Self {
            n_centers,
            ..Default::default()
        }
    }

    /// Set the sample size
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Set the maximum shaking power
    pub fn with_p_max(mut self, p_max: usize) -> Self {
        self.p_max = p_max;
        self
    }

    /// Set the shaking reinitialization mode
    pub fn with_init_mode(mut self, init_mode: InitMode) -> Self {
        self.init_mode = init_mode;
        self
    }

    /// Set the local search iteration cap
    pub fn with_local_max_iters(mut self, local_max_iters: Option<usize>) -> Self {
        self.local_max_iters = local_max_iters;
        self
    }

    /// Set the local search relative tolerance
    pub fn with_local_tol(mut self, local_tol: f64) -> Self {
        self.local_tol = local_tol;
        self
    }

    /// Set the number of K-means++ candidates per stage
    pub fn with_n_candidates(mut self, n_candidates: usize) -> Self {
        self.n_candidates = n_candidates;
        self
    }

    /// Set the local search distance formula
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set verbose mode
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the preconditions every variant enforces before sampling starts.
    pub(crate) fn validate(&self, n_points: usize, n_features: usize) -> Result<(), ClusterError> {
        if self.n_centers == 0 {
            return Err(ClusterError::InvalidK(
                "n_centers must be greater than 0".to_string(),
            ));
        }
        if n_points == 0 || n_features == 0 {
            return Err(ClusterError::InsufficientData(format!(
                "Point set is empty ({} points x {} features)",
                n_points, n_features
            )));
        }
        if self.sample_size > n_points {
            return Err(ClusterError::InsufficientData(format!(
                "Sample size ({}) cannot exceed the size of the entire dataset ({})",
                self.sample_size, n_points
            )));
        }
        if self.n_centers > self.sample_size {
            return Err(ClusterError::InsufficientData(format!(
                "Sample size ({}) is less than n_centers ({})",
                self.sample_size, self.n_centers
            )));
        }
        if self.p_max == 0 {
            return Err(ClusterError::InvalidParameter(
                "p_max must be at least 1".to_string(),
            ));
        }
        if self.n_candidates == 0 {
            return Err(ClusterError::InvalidParameter(
                "n_candidates must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outer-loop budget of the single-trajectory and inner-parallel variants.
///
/// `None` disables the corresponding check; with both disabled the
/// inner-parallel loop runs until the process is stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchBudget {
    /// Maximum number of samples to process
    pub max_iter: Option<usize>,
    /// Wall-clock limit for the search
    pub t_max: Option<Duration>,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_iter: Some(10_000),
            t_max: Some(Duration::from_secs(10)),
        }
    }
}

impl SearchBudget {
    pub fn new(max_iter: Option<usize>, t_max: Option<Duration>) -> Self {
        Self { max_iter, t_max }
    }

    /// Budget limited by iteration count only
    pub fn iterations(max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            t_max: None,
        }
    }

    /// No limit at all
    pub fn unbounded() -> Self {
        Self {
            max_iter: None,
            t_max: None,
        }
    }

    /// Build a budget from raw numbers, where zero or a negative value means "no limit".
    pub fn from_raw(max_iter: i64, t_max_secs: f64) -> Self {
        Self {
            max_iter: usize::try_from(max_iter).ok().filter(|&n| n > 0),
            t_max: (t_max_secs > 0.0).then(|| Duration::from_secs_f64(t_max_secs)),
        }
    }

    /// True while neither limit has been reached.
    pub(crate) fn allows(&self, n_iter: usize, elapsed: Duration) -> bool {
        self.max_iter.map_or(true, |max| n_iter < max) && self.t_max.map_or(true, |t| elapsed < t)
    }
}

/// Budgets of the two phases of the hybrid variant. All four must be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridBudget {
    /// Summed iteration count at which the competitive phase ends
    pub max_iter1: usize,
    /// Additional iterations for the collective phase
    pub max_iter2: usize,
    /// Time limit of the competitive phase
    pub t_max1: Duration,
    /// Additional time for the collective phase
    pub t_max2: Duration,
}

impl Default for HybridBudget {
    fn default() -> Self {
        Self {
            max_iter1: 10_000,
            max_iter2: 10_000,
            t_max1: Duration::from_secs(10),
            t_max2: Duration::from_secs(10),
        }
    }
}

impl HybridBudget {
    pub fn new(max_iter1: usize, max_iter2: usize, t_max1: Duration, t_max2: Duration) -> Self {
        Self {
            max_iter1,
            max_iter2,
            t_max1,
            t_max2,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ClusterError> {
        if self.max_iter1 == 0 || self.max_iter2 == 0 {
            return Err(ClusterError::InvalidBudget(format!(
                "max_iter1 ({}) and max_iter2 ({}) must be positive",
                self.max_iter1, self.max_iter2
            )));
        }
        if self.t_max1.is_zero() || self.t_max2.is_zero() {
            return Err(ClusterError::InvalidBudget(format!(
                "t_max1 ({:?}) and t_max2 ({:?}) must be positive",
                self.t_max1, self.t_max2
            )));
        }
        Ok(())
    }
}
