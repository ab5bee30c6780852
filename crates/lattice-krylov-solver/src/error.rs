//! Error types for the solver crate.

use lattice_krylov_linalg::LinalgError;
use thiserror::Error;

/// Errors that reject a solve before or while it runs.
///
/// Numerical trouble inside a cycle (a singular projected matrix, a dense
/// eigen-decomposition that does not converge) is not an error: it is logged
/// and the solve continues with a degraded result.
#[derive(Debug, Error)]
pub enum Error {
    /// Vector lengths do not match the operator dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The deflation dimension is outside 0 < nr_ev < m.
    #[error("Invalid deflation dimension: nr_ev = {nr_ev} must satisfy 0 < nr_ev < m = {m}")]
    InvalidDeflation { nr_ev: usize, m: usize },

    /// Some other configuration value is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Structural error from the linear-algebra layer.
    #[error("Linear algebra error: {0}")]
    Linalg(#[from] LinalgError),
}

/// Result type for solver operations.
pub type Result<T> = std::result::Result<T, Error>;
