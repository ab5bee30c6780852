//! Linear-algebra layer for the lattice-krylov solvers.
//!
//! The deflated GMRES solver in `lattice-krylov-solver` consumes three things
//! from this crate and nothing else:
//!
//! - [`operator`] - the [`LinearOperator`] trait through which the (matrix-free)
//!   lattice operator is applied, plus closure, diagonal and sparse adapters
//! - [`vector`] - inner products, norms and axpy-style updates on complex
//!   vectors, optionally parallel with the `parallel` feature
//! - [`dense`] - small dense complex algebra (LU solve, eigen-decomposition,
//!   least squares, Gram-Schmidt) on the projected Hessenberg matrices

pub mod dense;
pub mod error;
pub mod operator;
pub mod sparse_operator;
pub mod vector;

pub use error::{LinalgError, Result};
pub use operator::{DiagonalOperator, FnOperator, LinearOperator};
pub use sparse_operator::SparseOperator;

pub use num_complex::Complex64 as C64;
