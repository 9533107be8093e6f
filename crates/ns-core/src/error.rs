//! Error types for NextStat cost functions

use thiserror::Error;

/// NextStat error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input: shapes, lengths, masks, names, argument counts.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Numerical failure while evaluating a cost.
    #[error("Computation error: {0}")]
    Computation(String),

    /// Linear-algebra failure (e.g. a singular covariance matrix).
    #[error("Linear algebra error: {0}")]
    LinearAlgebra(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
