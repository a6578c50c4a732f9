use ndarray::{Array1, ArrayView2};

use crate::centers::CenterSet;
use crate::config::{HybridBudget, SearchBudget, VnsConfig};
use crate::error::ClusterError;
use crate::hybrid::bimodal_clust_hybrid;
use crate::result::{assemble, ClusterResult};
use crate::search::{bimodal_clust, bimodal_clust_inner};

/// Which search loop drives the clustering, with its budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchStrategy {
    /// Single trajectory on the calling thread
    Sequential(SearchBudget),
    /// Competitive then collective workers, one per rayon thread
    Hybrid(HybridBudget),
    /// Single trajectory with data-parallel seeding and local search
    Inner(SearchBudget),
}

impl Default for SearchStrategy {
    fn default() -> Self {
        SearchStrategy::Hybrid(HybridBudget::default())
    }
}

/// Big-data k-means clustering driven by sampling and variable neighborhood search.
///
/// # Example
///
/// ```
/// use bimodal_clust::{BiModalClust, SearchBudget, SearchStrategy, VnsConfig};
/// use ndarray::Array2;
/// use ndarray_rand::RandomExt;
/// use ndarray_rand::rand_distr::Uniform;
///
/// let data = Array2::random((1000, 8), Uniform::new(0.0, 1.0));
///
/// let config = VnsConfig::new(5).with_sample_size(200).with_seed(42);
/// let strategy = SearchStrategy::Inner(SearchBudget::iterations(20));
/// let mut model = BiModalClust::with_strategy(config, strategy);
///
/// let labels = model.fit_predict(&data.view()).unwrap();
/// assert_eq!(labels.len(), 1000);
/// ```
pub struct BiModalClust {
    /// Search configuration
    config: VnsConfig,

    /// Search loop and budget
    strategy: SearchStrategy,

    /// Number of features (dimensions), 0 until the first fit
    d: usize,

    /// Result of the last fit
    result: Option<ClusterResult>,
}

impl BiModalClust {
    /// Create a model with default configuration and the hybrid strategy.
    ///
    /// # Panics
    ///
    /// Panics if `k` is 0.
    pub fn new(k: usize) -> Self {
        Self::with_strategy(VnsConfig::new(k), SearchStrategy::default())
    }

    /// Create a model with custom configuration and strategy.
    ///
    /// # Panics
    ///
    /// Panics if `config.n_centers` is 0.
    pub fn with_strategy(config: VnsConfig, strategy: SearchStrategy) -> Self {
        assert!(config.n_centers > 0, "k must be greater than 0");

        Self {
            config,
            strategy,
            d: 0,
            result: None,
        }
    }

    /// Cluster `data`, keeping the result for later [`predict`](Self::predict) calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not fit the data or the
    /// budget is invalid, or if the feature count differs from a previous fit.
    pub fn fit(&mut self, data: &ArrayView2<f64>) -> Result<&ClusterResult, ClusterError> {
        let n_features = data.ncols();
        if self.d != 0 && n_features != self.d {
            return Err(ClusterError::InvalidDimensions(format!(
                "Expected {} features, got {}",
                self.d, n_features
            )));
        }

        let result = match &self.strategy {
            SearchStrategy::Sequential(budget) => bimodal_clust(data, &self.config, budget)?,
            SearchStrategy::Hybrid(budget) => bimodal_clust_hybrid(data, &self.config, budget)?,
            SearchStrategy::Inner(budget) => bimodal_clust_inner(data, &self.config, budget)?,
        };

        self.d = n_features;
        Ok(self.result.insert(result))
    }

    /// Label `data` against the fitted centers with one assignment pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been fitted or the feature count
    /// does not match.
    pub fn predict(&self, data: &ArrayView2<f64>) -> Result<Array1<i64>, ClusterError> {
        let result = self.result.as_ref().ok_or(ClusterError::NotFitted)?;

        if data.ncols() != self.d {
            return Err(ClusterError::InvalidDimensions(format!(
                "Expected {} features, got {}",
                self.d,
                data.ncols()
            )));
        }

        Ok(assemble(data, &result.centers).assignment)
    }

    /// Fit and return the labels of the training data.
    pub fn fit_predict(&mut self, data: &ArrayView2<f64>) -> Result<Array1<i64>, ClusterError> {
        Ok(self.fit(data)?.assignment.clone())
    }

    /// Fitted centers, if any
    pub fn centers(&self) -> Option<&CenterSet> {
        self.result.as_ref().map(|r| &r.centers)
    }

    /// Result of the last fit, if any
    pub fn result(&self) -> Option<&ClusterResult> {
        self.result.as_ref()
    }

    /// Get the number of clusters.
    pub fn k(&self) -> usize {
        self.config.n_centers
    }

    /// Get the number of features (dimensions).
    pub fn d(&self) -> usize {
        self.d
    }

    /// Get the configuration.
    pub fn config(&self) -> &VnsConfig {
        &self.config
    }

    pub fn strategy(&self) -> &SearchStrategy {
        &self.strategy
    }
}
