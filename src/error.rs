use thiserror::Error;

/// Error types for the bimodal-clust library
#[derive(Error, Debug)]
pub enum ClusterError {
    /// The number of clusters k is invalid (must be > 0)
    #[error("Invalid k value: {0}")]
    InvalidK(String),

    /// Not enough data points for the requested sample size or number of clusters
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A search parameter is outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An iteration or time budget that must be strictly positive is not
    #[error("Invalid budget: {0}")]
    InvalidBudget(String),

    /// Model has not been fitted yet
    #[error("Model has not been fitted. Call fit() first.")]
    NotFitted,

    /// Dimension mismatch between data and model
    #[error("Dimension mismatch: {0}")]
    InvalidDimensions(String),
}
