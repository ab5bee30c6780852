//! Dense linear algebra on small projected matrices.
//!
//! The Krylov solvers project the operator onto an `m`-dimensional subspace and
//! then work with `(m+1) x m` complex matrices. Everything here is built on
//! nalgebra's `DMatrix<Complex64>`; sizes are small (tens), so clarity wins
//! over blocking.

use nalgebra::linalg::Schur;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64 as C64;
use num_traits::{One, Zero};

use crate::error::{LinalgError, Result};

/// Pivots below this magnitude (relative to the largest pivot) are treated as zero.
pub const PIVOT_RTOL: f64 = 1e-14;

/// Solve a square complex system Ax = b using LU decomposition.
pub fn solve(a: &DMatrix<C64>, b: &DVector<C64>) -> Result<DVector<C64>> {
    if a.nrows() != a.ncols() {
        return Err(LinalgError::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(LinalgError::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }

    let x = a
        .clone()
        .lu()
        .solve(b)
        .ok_or(LinalgError::SingularMatrix)?;

    if x.iter().all(|xi| xi.re.is_finite() && xi.im.is_finite()) {
        Ok(x)
    } else {
        Err(LinalgError::SingularMatrix)
    }
}

/// Eigenvalues and right eigenvectors of a general complex matrix.
#[derive(Debug, Clone)]
pub struct Eigen {
    /// Eigenvalues, in the order produced by the Schur form.
    pub values: Vec<C64>,
    /// Unit-norm eigenvectors; column `i` belongs to `values[i]`.
    pub vectors: DMatrix<C64>,
}

/// Full eigen-decomposition of a general (non-Hermitian) complex matrix.
///
/// Computes the complex Schur form `A = Q T Q^H`, reads the eigenvalues off the
/// diagonal of `T` and back-substitutes `(T - lambda_k I) y = 0` for each
/// eigenvector, which is then mapped back with `Q`. Near-coincident
/// eigenvalues are separated by clamping the pivot, as LAPACK's `ztrevc` does.
pub fn eigen(a: &DMatrix<C64>) -> Result<Eigen> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(LinalgError::DimensionMismatch {
            expected: n,
            actual: a.ncols(),
        });
    }
    if n == 0 {
        return Ok(Eigen {
            values: Vec::new(),
            vectors: DMatrix::zeros(0, 0),
        });
    }

    let schur = Schur::try_new(a.clone(), f64::EPSILON, 100 * n.max(10))
        .ok_or(LinalgError::NoConvergence)?;
    let (q, t) = schur.unpack();

    let t_norm = t.iter().map(|z| z.norm()).fold(0.0_f64, f64::max);
    let smin = (f64::EPSILON * t_norm).max(f64::MIN_POSITIVE);

    let values: Vec<C64> = (0..n).map(|i| t[(i, i)]).collect();
    let mut vectors = DMatrix::<C64>::zeros(n, n);
    let mut y = DVector::<C64>::zeros(n);

    for k in 0..n {
        let lambda = values[k];
        y.fill(C64::zero());
        y[k] = C64::one();
        for i in (0..k).rev() {
            let mut sum = C64::zero();
            for l in (i + 1)..=k {
                sum += t[(i, l)] * y[l];
            }
            let mut pivot = t[(i, i)] - lambda;
            if pivot.norm() < smin {
                pivot = C64::new(smin, 0.0);
            }
            y[i] = -sum / pivot;
        }

        let x = &q * &y;
        let x_norm = x.norm();
        for i in 0..n {
            vectors[(i, k)] = x[i] / x_norm;
        }
    }

    Ok(Eigen { values, vectors })
}

/// Solution of a dense least-squares problem.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    /// Minimizer of ||A x - b||.
    pub solution: DVector<C64>,
    /// Number of triangular pivots that were numerically zero. Their
    /// coefficients are set to zero, so a non-zero value means the
    /// solution is only a best-effort answer.
    pub rank_deficiency: usize,
}

/// Solve min ||A x - b|| for a tall complex matrix (rows >= cols) via QR.
pub fn least_squares(a: &DMatrix<C64>, b: &DVector<C64>) -> Result<LeastSquares> {
    let (rows, cols) = a.shape();
    if rows != b.len() {
        return Err(LinalgError::DimensionMismatch {
            expected: rows,
            actual: b.len(),
        });
    }
    if rows < cols {
        return Err(LinalgError::InvalidDimension(format!(
            "least squares needs rows >= cols, got {rows}x{cols}"
        )));
    }

    let qr = a.clone().qr();
    let q = qr.q();
    let r = qr.r();
    let qhb = q.adjoint() * b;

    let (solution, rank_deficiency) = back_substitute(&r, qhb.as_slice(), cols);
    Ok(LeastSquares {
        solution,
        rank_deficiency,
    })
}

/// Solve the leading `k x k` upper-triangular system R y = rhs.
///
/// Returns the solution and the number of pivots that were numerically zero;
/// those components are set to zero.
pub fn back_substitute(r: &DMatrix<C64>, rhs: &[C64], k: usize) -> (DVector<C64>, usize) {
    let max_pivot = (0..k).map(|i| r[(i, i)].norm()).fold(0.0_f64, f64::max);
    let tol = (PIVOT_RTOL * max_pivot).max(f64::MIN_POSITIVE);

    let mut y = DVector::<C64>::zeros(k);
    let mut skipped = 0;
    for i in (0..k).rev() {
        let mut sum = rhs[i];
        for l in (i + 1)..k {
            sum -= r[(i, l)] * y[l];
        }
        if r[(i, i)].norm() > tol {
            y[i] = sum / r[(i, i)];
        } else {
            skipped += 1;
        }
    }
    (y, skipped)
}

/// Orthonormalize column `col` of `basis` against columns `0..col` with
/// modified Gram-Schmidt, then normalize it.
///
/// The projection is swept twice, normalizing in between, so the column
/// stays orthogonal to rounding level even when it is nearly dependent on
/// the earlier ones. Returns the norm of the column after projection and
/// before normalization. A column that vanishes is left as-is.
pub fn modified_gram_schmidt(basis: &mut DMatrix<C64>, col: usize) -> f64 {
    let mut remaining = 1.0;
    for _ in 0..2 {
        for i in 0..col {
            let qi = basis.column(i).clone_owned();
            let proj = qi.dotc(&basis.column(col));
            basis.column_mut(col).axpy(-proj, &qi, C64::one());
        }

        let norm = basis.column(col).norm();
        if norm <= f64::MIN_POSITIVE {
            return remaining * norm;
        }
        for z in basis.column_mut(col).iter_mut() {
            *z /= norm;
        }
        remaining *= norm;
    }
    remaining
}

/// Permutation that sorts `values` by ascending magnitude.
pub fn argsort_by_magnitude(values: &[C64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].norm_sqr().total_cmp(&values[b].norm_sqr()));
    idx
}
