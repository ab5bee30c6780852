//! One Arnoldi step with modified Gram-Schmidt and one reorthogonalization pass.

use lattice_krylov_linalg::{LinearOperator, vector};
use num_complex::Complex64 as C64;

use crate::workspace::KrylovWorkspace;

/// `h_{j+1,j}` at or below this fraction of `||A v_j||` is an invariant subspace.
pub(crate) const BREAKDOWN_RTOL: f64 = 100.0 * f64::EPSILON;

/// Gram-Schmidt sweeps per Arnoldi step.
const ORTHOGONALIZATION_PASSES: usize = 2;

/// Outcome of extending the basis by one vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArnoldiStep {
    /// `v_{j+1}` was appended to the basis.
    Extended,
    /// `A v_j` lies in the span of `v_0..=v_j`; the basis was not extended.
    Breakdown,
}

/// Apply the operator to `v_j`, orthogonalize against `v_0..=v_j` and append
/// the normalized result as `v_{j+1}`.
///
/// Fills column `j` of the workspace Hessenberg matrix, rows `0..=j+1`.
pub(crate) fn arnoldi_step(
    op: &dyn LinearOperator,
    ws: &mut KrylovWorkspace,
    j: usize,
) -> ArnoldiStep {
    let KrylovWorkspace {
        basis,
        hessenberg,
        scratch,
        ..
    } = ws;

    op.apply(&basis[j], scratch);
    let applied_norm = vector::norm(scratch);

    for i in 0..=j {
        hessenberg[(i, j)] = C64::new(0.0, 0.0);
    }
    for _ in 0..ORTHOGONALIZATION_PASSES {
        for (i, vi) in basis.iter().enumerate().take(j + 1) {
            let h = vector::dot(vi, scratch);
            hessenberg[(i, j)] += h;
            vector::axpy(scratch, -h, vi);
        }
    }

    let h_next = vector::norm(scratch);
    hessenberg[(j + 1, j)] = h_next.into();

    if h_next <= BREAKDOWN_RTOL * applied_norm {
        return ArnoldiStep::Breakdown;
    }

    vector::assign_scaled(&mut basis[j + 1], scratch, 1.0 / h_next);
    ArnoldiStep::Extended
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_krylov_linalg::{DiagonalOperator, FnOperator};

    /// Non-normal bidiagonal operator with a complex diagonal.
    fn shifted_bidiagonal(n: usize) -> FnOperator<impl Fn(&[C64], &mut [C64]) + Send + Sync> {
        FnOperator::new(n, move |x: &[C64], y: &mut [C64]| {
            for i in 0..n {
                let diag = C64::new(2.0 + 0.1 * i as f64, 0.3);
                y[i] = diag * x[i];
                if i + 1 < n {
                    y[i] += C64::new(0.0, 1.5) * x[i + 1];
                }
            }
        })
    }

    fn start_vector(ws: &mut KrylovWorkspace, n: usize) {
        for i in 0..n {
            ws.basis[0][i] = C64::new(1.0, 0.5 * (i % 3) as f64);
        }
        let nrm = vector::norm(&ws.basis[0]);
        vector::scale(&mut ws.basis[0], 1.0 / nrm);
    }

    #[test]
    fn basis_is_orthonormal() {
        let (n, m) = (16, 6);
        let op = shifted_bidiagonal(n);
        let mut ws = KrylovWorkspace::with_dimensions(m, n);
        start_vector(&mut ws, n);

        for j in 0..m {
            assert_eq!(arnoldi_step(&op, &mut ws, j), ArnoldiStep::Extended);
        }

        for a in 0..=m {
            for b in 0..=m {
                let expected = if a == b { 1.0 } else { 0.0 };
                let g = vector::dot(&ws.basis[a], &ws.basis[b]);
                assert!(
                    (g - C64::new(expected, 0.0)).norm() < 1e-12,
                    "<v{}, v{}> = {}",
                    a,
                    b,
                    g
                );
            }
        }
    }

    #[test]
    fn arnoldi_relation_holds() {
        let (n, m) = (16, 5);
        let op = shifted_bidiagonal(n);
        let mut ws = KrylovWorkspace::with_dimensions(m, n);
        start_vector(&mut ws, n);

        for j in 0..m {
            arnoldi_step(&op, &mut ws, j);
        }

        // A v_j = sum_i H[i, j] v_i
        let mut av = vec![C64::new(0.0, 0.0); n];
        for j in 0..m {
            op.apply(&ws.basis[j], &mut av);
            for i in 0..=j + 1 {
                vector::axpy(&mut av, -ws.hessenberg[(i, j)], &ws.basis[i]);
            }
            assert!(vector::norm(&av) < 1e-12, "column {} residual", j);
            assert_eq!(ws.hessenberg[(j + 1, j)].im, 0.0);
            assert!(ws.hessenberg[(j + 1, j)].re > 0.0);
        }
    }

    #[test]
    fn breakdown_on_eigenvector() {
        let n = 4;
        let op = DiagonalOperator::from_real(&[1.0, 2.0, 3.0, 4.0]);
        let mut ws = KrylovWorkspace::with_dimensions(3, n);
        ws.basis[0][2] = C64::new(1.0, 0.0);

        assert_eq!(arnoldi_step(&op, &mut ws, 0), ArnoldiStep::Breakdown);
        assert!((ws.hessenberg[(0, 0)] - C64::new(3.0, 0.0)).norm() < 1e-15);
    }

    #[test]
    fn long_run_on_jordan_block_stays_orthonormal() {
        // y_i = 2 x_i + x_{i+1}: a single defective eigenvalue.
        let (n, m) = (200, 40);
        let op = FnOperator::new(n, move |x: &[C64], y: &mut [C64]| {
            for i in 0..n {
                y[i] = 2.0 * x[i];
                if i + 1 < n {
                    y[i] += x[i + 1];
                }
            }
        });
        let mut ws = KrylovWorkspace::with_dimensions(m, n);
        start_vector(&mut ws, n);

        for j in 0..m {
            assert_eq!(arnoldi_step(&op, &mut ws, j), ArnoldiStep::Extended);
        }

        let mut defect = 0.0_f64;
        for a in 0..=m {
            for b in 0..=a {
                let expected = if a == b { 1.0 } else { 0.0 };
                let g = vector::dot(&ws.basis[a], &ws.basis[b]);
                defect = defect.max((g - C64::new(expected, 0.0)).norm());
            }
        }
        assert!(defect < 1e-12, "orthonormality defect {:e}", defect);
    }
}
