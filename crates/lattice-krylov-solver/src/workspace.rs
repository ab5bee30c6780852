//! Reusable GMRES-DR work buffers.
//!
//! A solve needs `2m + 1` lattice-sized vectors, three `(m+1) x (m+1)` dense
//! matrices and a handful of short scalar arrays. HMC drivers call the solver
//! thousands of times with the same `(m, N)`, so the buffers live in a
//! caller-held [`KrylovWorkspace`] and are only reallocated when the shape
//! changes.

use log::debug;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64 as C64;

use crate::recursion::ResidualRecursion;

/// Work buffers for a GMRES-DR solve with subspace dimension `m` on vectors of length `N`.
#[derive(Debug, Clone)]
pub struct KrylovWorkspace {
    restart: usize,
    len: usize,
    /// Orthonormal Krylov basis `V`, `m + 1` vectors.
    pub(crate) basis: Vec<Vec<C64>>,
    /// Staging buffers `Z` for the re-based basis `V P`, `m` vectors.
    pub(crate) staging: Vec<Vec<C64>>,
    /// Projected operator `H-bar`, kept unrotated.
    pub(crate) hessenberg: DMatrix<C64>,
    /// Deflation transform `P`.
    pub(crate) transform: DMatrix<C64>,
    /// Projected right-hand side `c`.
    pub(crate) rhs: DVector<C64>,
    /// Coefficients `y` of the last solution update.
    pub(crate) coeffs: DVector<C64>,
    /// Givens factorization of the first cycle.
    pub(crate) recursion: ResidualRecursion,
    /// Operator output scratch `w`.
    pub(crate) scratch: Vec<C64>,
    /// Explicit residual `r = b - A x`.
    pub(crate) residual: Vec<C64>,
}

impl Default for KrylovWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl KrylovWorkspace {
    /// Create an empty workspace; buffers are allocated on first use.
    pub fn new() -> Self {
        Self {
            restart: 0,
            len: 0,
            basis: Vec::new(),
            staging: Vec::new(),
            hessenberg: DMatrix::zeros(0, 0),
            transform: DMatrix::zeros(0, 0),
            rhs: DVector::zeros(0),
            coeffs: DVector::zeros(0),
            recursion: ResidualRecursion::new(0),
            scratch: Vec::new(),
            residual: Vec::new(),
        }
    }

    /// Create a workspace already sized for subspace dimension `m` and vector length `n`.
    pub fn with_dimensions(m: usize, n: usize) -> Self {
        let mut ws = Self::new();
        ws.configure(m, n);
        ws
    }

    /// Size the buffers for `(m, n)`.
    ///
    /// Returns `true` when the buffers were (re)allocated and `false` when the
    /// existing ones already had the requested shape.
    pub fn configure(&mut self, m: usize, n: usize) -> bool {
        if m == self.restart && n == self.len && !self.basis.is_empty() {
            return false;
        }

        debug!("KrylovWorkspace: allocating for m = {}, N = {}", m, n);

        let zero = C64::new(0.0, 0.0);
        self.restart = m;
        self.len = n;
        self.basis = vec![vec![zero; n]; m + 1];
        self.staging = vec![vec![zero; n]; m];
        self.hessenberg = DMatrix::zeros(m + 1, m + 1);
        self.transform = DMatrix::zeros(m + 1, m + 1);
        self.rhs = DVector::zeros(m + 1);
        self.coeffs = DVector::zeros(m);
        self.recursion = ResidualRecursion::new(m);
        self.scratch = vec![zero; n];
        self.residual = vec![zero; n];
        true
    }

    /// Subspace dimension `m` the buffers are sized for.
    pub fn restart_len(&self) -> usize {
        self.restart
    }

    /// Vector length `N` the buffers are sized for.
    pub fn vector_len(&self) -> usize {
        self.len
    }

    /// Krylov basis of the most recent cycle.
    pub fn basis(&self) -> &[Vec<C64>] {
        &self.basis
    }

    /// Projected operator of the most recent cycle.
    pub fn hessenberg(&self) -> &DMatrix<C64> {
        &self.hessenberg
    }

    /// Explicit residual `b - A x` at the end of the most recent solve.
    pub fn residual(&self) -> &[C64] {
        &self.residual
    }
}
