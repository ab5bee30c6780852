//! Error types for the linear-algebra layer.

use thiserror::Error;

/// Errors reported by the dense and sparse linear-algebra routines.
///
/// The solver treats most of these as degraded-result statuses: they are
/// logged and the computation continues with the best available answer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LinalgError {
    /// Operand sizes do not agree.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A factorization hit an exactly (or numerically) singular pivot.
    #[error("Matrix is singular")]
    SingularMatrix,

    /// An iterative dense decomposition did not converge.
    #[error("Eigen-decomposition did not converge")]
    NoConvergence,

    /// Invalid structure, e.g. an out-of-range sparse index.
    #[error("Invalid dimensions: {0}")]
    InvalidDimension(String),
}

/// Result type for linear-algebra operations.
pub type Result<T> = std::result::Result<T, LinalgError>;
