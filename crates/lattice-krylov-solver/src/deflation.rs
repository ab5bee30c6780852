//! Deflated restart: re-base the Krylov subspace on harmonic Ritz vectors.
//!
//! After a full cycle the workspace holds an Arnoldi factorization
//! `A V_m = V_{m+1} H-bar` and the least-squares coefficients `y`. The restart
//! keeps the `nr_ev` harmonic Ritz vectors of smallest magnitude together
//! with the least-squares residual direction. Those `nr_ev + 1` vectors span
//! an invariant pair for `H-bar`, so the new basis satisfies a compact
//! Arnoldi relation `A V_k = V_{k+1} H-bar_new` and the Arnoldi process can
//! resume at column `nr_ev` without new operator applications.

use lattice_krylov_linalg::{dense, vector};
use log::{Level, debug, log_enabled, trace, warn};
use nalgebra::DVector;
use num_complex::Complex64 as C64;

use crate::workspace::KrylovWorkspace;

/// What a deflated restart carried over into the new cycle.
#[derive(Debug, Clone)]
pub(crate) struct Deflation {
    /// Number of harmonic Ritz vectors kept; the new basis has `retained + 1` vectors.
    pub(crate) retained: usize,
    /// The kept harmonic Ritz values, ascending by magnitude.
    pub(crate) ritz_values: Vec<C64>,
}

/// Replace the first `nr_ev + 1` basis vectors, the Hessenberg matrix and the
/// projected right-hand side by their deflated counterparts.
///
/// Expects a full cycle: columns `0..m` of `H-bar`, `m + 1` basis vectors,
/// the cycle's coefficients `y` (length `m`) and the explicit residual of
/// the updated iterate.
pub(crate) fn deflated_restart(ws: &mut KrylovWorkspace, nr_ev: usize) -> Deflation {
    let m = ws.restart_len();
    let zero = C64::new(0.0, 0.0);
    debug_assert!(nr_ev < m);
    debug_assert_eq!(ws.coeffs.len(), m);

    let hbar = ws.hessenberg.view((0, 0), (m + 1, m)).clone_owned();
    let h_sub_sq = hbar[(m, m - 1)].norm_sqr();

    // G = H_m + h_{m+1,m}^2 f e_m^T with H_m^H f = e_m
    let mut g = hbar.rows(0, m).clone_owned();
    let mut e_m = DVector::<C64>::zeros(m);
    e_m[m - 1] = C64::new(1.0, 0.0);
    match dense::solve(&g.adjoint(), &e_m) {
        Ok(f) => {
            for i in 0..m {
                g[(i, m - 1)] += f[i] * h_sub_sq;
            }
        }
        Err(err) => warn!(
            "GMRES-DR: harmonic correction skipped ({}), deflating with plain Ritz vectors",
            err
        ),
    }

    ws.transform.fill(zero);
    let (retained, ritz_values) = match dense::eigen(&g) {
        Ok(eig) => {
            let order = dense::argsort_by_magnitude(&eig.values);
            if log_enabled!(Level::Trace) {
                let sorted: Vec<C64> = order.iter().map(|&i| eig.values[i]).collect();
                trace!("GMRES-DR: harmonic Ritz values {:?}", sorted);
            }

            for (col, &idx) in order.iter().take(nr_ev).enumerate() {
                for row in 0..m {
                    ws.transform[(row, col)] = eig.vectors[(row, idx)];
                }
                dense::modified_gram_schmidt(&mut ws.transform, col);
            }
            let kept: Vec<C64> = order.iter().take(nr_ev).map(|&i| eig.values[i]).collect();
            (nr_ev, kept)
        }
        Err(err) => {
            warn!(
                "GMRES-DR: eigen-decomposition of the projected operator failed ({}), \
                 restarting without deflation",
                err
            );
            (0, Vec::new())
        }
    };
    let k = retained;

    // Least-squares residual c - H-bar y, appended as column k of P.
    let rho = &ws.rhs - &hbar * &ws.coeffs;
    for row in 0..=m {
        ws.transform[(row, k)] = rho[row];
    }
    let rho_norm = dense::modified_gram_schmidt(&mut ws.transform, k);
    trace!("GMRES-DR: least-squares residual norm {:e}", rho_norm);

    // H-bar_new = P_{k+1}^H H-bar P_k
    let p_next = ws.transform.columns(0, k + 1).clone_owned();
    let p_k = ws.transform.view((0, 0), (m, k)).clone_owned();
    let h_new = p_next.adjoint() * (&hbar * &p_k);

    // V_new = V P_{k+1}, staged in Z and swapped in.
    {
        let KrylovWorkspace {
            basis,
            staging,
            transform,
            ..
        } = &mut *ws;
        for (col, z) in staging.iter_mut().enumerate().take(k + 1) {
            z.fill(zero);
            for (row, v) in basis.iter().enumerate() {
                let coeff = transform[(row, col)];
                if coeff != zero {
                    vector::axpy(z, coeff, v);
                }
            }
        }
        for (v, z) in basis.iter_mut().zip(staging.iter_mut()).take(k + 1) {
            std::mem::swap(v, z);
        }
    }

    ws.hessenberg.fill(zero);
    ws.hessenberg.view_mut((0, 0), (k + 1, k)).copy_from(&h_new);

    // c = V_new^H r
    ws.rhs.fill(zero);
    for i in 0..=k {
        ws.rhs[i] = vector::dot(&ws.basis[i], &ws.residual);
    }

    if log_enabled!(Level::Trace) {
        let mut defect = 0.0_f64;
        for a in 0..=k {
            for b in 0..=a {
                let expected = if a == b { 1.0 } else { 0.0 };
                let gab = vector::dot(&ws.basis[a], &ws.basis[b]);
                defect = defect.max((gab - expected).norm());
            }
        }
        trace!("GMRES-DR: re-based basis orthonormality defect {:e}", defect);
    }

    debug!(
        "GMRES-DR: deflated restart keeps {} harmonic Ritz values {:?}",
        k, ritz_values
    );

    Deflation {
        retained: k,
        ritz_values,
    }
}
