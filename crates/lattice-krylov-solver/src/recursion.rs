//! Givens-rotation residual recursion for the undeflated first cycle.
//!
//! Each new Hessenberg column is rotated into upper-triangular form as it
//! arrives; the rotated right-hand side `alpha` then carries the least-squares
//! residual norm `|alpha[j+1]|` for free. The rotated factor lives here, so the
//! canonical `H-bar` in the workspace stays unrotated for the deflation step.

use lattice_krylov_linalg::dense::back_substitute;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64 as C64;

/// Compute Givens rotation coefficients for a complex diagonal entry `a` and
/// a real sub-diagonal entry `h`.
///
/// Returns `(c, s, beta)` with `beta = sqrt(|a|^2 + h^2)`, `c = a / beta` and
/// `s = h / beta`, such that:
/// ```text
/// [ c*  s ] [ a ]   [ beta ]
/// [ s  -c ] [ h ] = [  0   ]
/// ```
pub(crate) fn givens_rotation(a: C64, h: f64) -> (C64, f64, f64) {
    let beta = (a.norm_sqr() + h * h).sqrt();
    if beta < 1e-300 {
        return (C64::new(1.0, 0.0), 0.0, 0.0);
    }
    (a / beta, h / beta, beta)
}

/// Incrementally rotated QR factorization of `H-bar`.
#[derive(Debug, Clone)]
pub(crate) struct ResidualRecursion {
    alpha: Vec<C64>,
    c: Vec<C64>,
    s: Vec<f64>,
    r: DMatrix<C64>,
    cols: usize,
}

impl ResidualRecursion {
    pub(crate) fn new(m: usize) -> Self {
        Self {
            alpha: vec![C64::new(0.0, 0.0); m + 1],
            c: vec![C64::new(0.0, 0.0); m],
            s: vec![0.0; m],
            r: DMatrix::zeros(m + 1, m),
            cols: 0,
        }
    }

    /// Start a new factorization for right-hand side `beta * e_1`.
    pub(crate) fn reset(&mut self, beta: f64) {
        self.alpha.fill(C64::new(0.0, 0.0));
        self.alpha[0] = C64::new(beta, 0.0);
        self.cols = 0;
    }

    /// Rotate column `j` of `hbar` into the factorization and return the
    /// updated residual estimate `|alpha[j+1]|`.
    pub(crate) fn push_column(&mut self, hbar: &DMatrix<C64>, j: usize) -> f64 {
        debug_assert_eq!(j, self.cols, "columns must be pushed in order");

        for i in 0..=j {
            self.r[(i, j)] = hbar[(i, j)];
        }

        for i in 0..j {
            let t1 = self.r[(i, j)];
            let t2 = self.r[(i + 1, j)];
            self.r[(i, j)] = self.c[i].conj() * t1 + t2 * self.s[i];
            self.r[(i + 1, j)] = t1 * self.s[i] - self.c[i] * t2;
        }

        let (c, s, beta) = givens_rotation(self.r[(j, j)], hbar[(j + 1, j)].re);
        self.c[j] = c;
        self.s[j] = s;
        self.r[(j, j)] = C64::new(beta, 0.0);

        self.alpha[j + 1] = self.alpha[j] * s;
        self.alpha[j] = c.conj() * self.alpha[j];
        self.cols = j + 1;

        self.alpha[j + 1].norm()
    }

    /// Current residual estimate.
    pub(crate) fn estimate(&self) -> f64 {
        self.alpha[self.cols].norm()
    }

    /// Back-substitute `R y = alpha` over the columns pushed so far.
    ///
    /// The second value counts numerically zero pivots, whose coefficients
    /// were set to zero.
    pub(crate) fn solve(&self) -> (DVector<C64>, usize) {
        back_substitute(&self.r, &self.alpha, self.cols)
    }
}
