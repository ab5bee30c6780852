//! Deflated restarted GMRES for non-Hermitian lattice operators.
//!
//! This crate provides GMRES-DR(m, k): restarted GMRES that carries the `k`
//! harmonic Ritz vectors of smallest magnitude from one cycle into the next.
//! It targets the inversions of an HMC molecular-dynamics step, where the
//! Dirac operator is only available as a matrix-vector product and a few
//! near-zero eigenvalues would otherwise stall a plain restart.
//!
//! # Example
//!
//! ```
//! use lattice_krylov_solver::{
//!     C64, DiagonalOperator, GmresDrConfig, KrylovWorkspace, solve_gmres_dr,
//! };
//!
//! let op = DiagonalOperator::from_real(&[1.0, 2.0, 3.0, 1000.0]);
//! let b = vec![C64::new(1.0, 0.0); 4];
//! let mut x = vec![C64::new(0.0, 0.0); 4];
//!
//! let config = GmresDrConfig::new(3, 1).with_eps_sq(1e-20);
//! let mut workspace = KrylovWorkspace::new();
//! let result = solve_gmres_dr(&op, &mut x, &b, &config, &mut workspace).unwrap();
//!
//! assert!(result.converged);
//! assert!((x[1] - C64::new(0.5, 0.0)).norm() < 1e-8);
//! ```
//!
//! # Logging
//!
//! Progress is reported through the `log` facade: `debug` per cycle, `trace`
//! per Arnoldi step and for the harmonic Ritz spectrum, `warn` for degraded
//! dense algebra and exhausted restart budgets.

mod arnoldi;
pub mod config;
mod deflation;
pub mod error;
pub mod gmres_dr;
mod recursion;
pub mod workspace;

pub use config::{GmresDrConfig, Precision};
pub use error::{Error, Result};
pub use gmres_dr::{GmresDrResult, Termination, solve_gmres_dr};
pub use workspace::KrylovWorkspace;

pub use lattice_krylov_linalg::{
    C64, DiagonalOperator, FnOperator, LinearOperator, SparseOperator,
};
