//! GMRES with deflated restarting (GMRES-DR).
//!
//! Solves `A x = b` for a non-Hermitian operator that is only available as a
//! matrix-vector product. The first cycle is plain GMRES with a Givens
//! residual recursion; every later cycle starts from `nr_ev` harmonic Ritz
//! vectors of the previous one, which deflates the eigenvalues closest to the
//! origin that stall restarted GMRES on lattice Dirac operators.

use lattice_krylov_linalg::{LinearOperator, dense, vector};
use log::{debug, trace, warn};
use nalgebra::DVector;
use num_complex::Complex64 as C64;

use crate::arnoldi::{ArnoldiStep, arnoldi_step};
use crate::config::GmresDrConfig;
use crate::deflation::deflated_restart;
use crate::error::{Error, Result};
use crate::workspace::KrylovWorkspace;

/// Why the solve stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The residual reached the requested tolerance.
    Converged,
    /// The Krylov space became invariant. The result counts as converged
    /// only when the explicit residual meets the tolerance.
    Breakdown,
    /// The cycle budget ran out before the tolerance was reached.
    MaxRestarts,
}

/// Result of a GMRES-DR solve. The solution itself is written into `x`.
#[derive(Debug, Clone)]
pub struct GmresDrResult {
    /// Number of operator applications inside Arnoldi steps.
    pub iterations: usize,
    /// Number of deflated restarts performed.
    pub restarts: usize,
    /// Final residual norm: the recursion estimate when the first cycle
    /// converges without breakdown, the explicit ||b - A x|| otherwise.
    pub residual: f64,
    /// Whether the solver converged.
    pub converged: bool,
    /// Why the solver stopped.
    pub termination: Termination,
    /// Explicit residual norm at the start and after every cycle.
    pub residual_history: Vec<f64>,
    /// Harmonic Ritz values kept by the last deflated restart.
    pub ritz_values: Vec<C64>,
}

impl GmresDrResult {
    /// Iteration count, or -1 when the solve did not converge.
    ///
    /// This is the convention HMC drivers use to flag a failed inversion.
    pub fn iteration_count(&self) -> i64 {
        if self.converged {
            self.iterations as i64
        } else {
            -1
        }
    }
}

/// Solve `A x = b` with GMRES-DR(m, nr_ev).
///
/// `x` holds the initial guess on entry and the solution on return. The
/// workspace is resized for `(m, N)` when needed and may be reused across
/// calls.
///
/// # Errors
///
/// Returns an error when the configuration is invalid or `x`/`b` do not match
/// the operator dimension. Numerical trouble inside a cycle is logged and
/// does not abort the solve.
pub fn solve_gmres_dr(
    op: &dyn LinearOperator,
    x: &mut [C64],
    b: &[C64],
    config: &GmresDrConfig,
    workspace: &mut KrylovWorkspace,
) -> Result<GmresDrResult> {
    config.validate()?;

    let n = op.dim();
    if b.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }
    if x.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: x.len(),
        });
    }

    let m = config.restart;
    let nr_ev = config.deflation;
    workspace.configure(m, n);
    let ws = workspace;

    let target = config.precision.threshold(config.eps(), vector::norm(b));
    let mut history = Vec::with_capacity(config.max_restarts + 1);
    let mut iterations = 0;

    let mut beta = true_residual(op, x, b, ws);
    history.push(beta);
    debug!(
        "GMRES-DR({}, {}): N = {}, initial residual {:e}, target {:e}",
        m, nr_ev, n, beta, target
    );

    if beta == 0.0 {
        return Ok(finished(0, 0, 0.0, Termination::Breakdown, history, Vec::new()));
    }
    if beta <= target {
        return Ok(finished(0, 0, beta, Termination::Converged, history, Vec::new()));
    }

    // First cycle: plain GMRES with the Givens residual recursion.
    vector::assign_scaled(&mut ws.basis[0], &ws.residual, 1.0 / beta);
    ws.hessenberg.fill(C64::new(0.0, 0.0));
    ws.rhs.fill(C64::new(0.0, 0.0));
    ws.rhs[0] = C64::new(beta, 0.0);
    ws.recursion.reset(beta);

    for j in 0..m {
        let step = arnoldi_step(op, ws, j);
        iterations += 1;
        let estimate = ws.recursion.push_column(&ws.hessenberg, j);
        trace!("GMRES-DR iter {}: residual estimate {:e}", iterations, estimate);

        let breakdown = step == ArnoldiStep::Breakdown;
        if estimate <= target || breakdown {
            let y = recursion_coefficients(ws);
            update_solution(x, &ws.basis, &y);
            if breakdown {
                beta = true_residual(op, x, b, ws);
                history.push(beta);
                debug!(
                    "GMRES-DR: invariant subspace after {} iterations, residual {:e}",
                    iterations, beta
                );
                return Ok(settle_breakdown(
                    iterations,
                    0,
                    beta,
                    target,
                    history,
                    Vec::new(),
                ));
            }
            debug!(
                "GMRES-DR: converged in first cycle after {} iterations, residual {:e}",
                iterations, estimate
            );
            return Ok(finished(
                iterations,
                0,
                estimate,
                Termination::Converged,
                history,
                Vec::new(),
            ));
        }
    }

    let y = recursion_coefficients(ws);
    update_solution(x, &ws.basis, &y);
    ws.coeffs = y;

    beta = true_residual(op, x, b, ws);
    history.push(beta);
    debug!(
        "GMRES-DR: first cycle done, {} iterations, residual {:e} (estimate {:e})",
        iterations,
        beta,
        ws.recursion.estimate()
    );
    if beta <= target {
        return Ok(finished(
            iterations,
            0,
            beta,
            Termination::Converged,
            history,
            Vec::new(),
        ));
    }

    // Deflated cycles.
    let mut ritz_values = Vec::new();
    for restart in 1..config.max_restarts {
        let deflation = deflated_restart(ws, nr_ev);
        let k = deflation.retained;
        ritz_values = deflation.ritz_values;

        let mut cols = m;
        let mut breakdown = false;
        for j in k..m {
            let step = arnoldi_step(op, ws, j);
            iterations += 1;
            if step == ArnoldiStep::Breakdown {
                cols = j + 1;
                breakdown = true;
                break;
            }
        }

        let hbar = ws.hessenberg.view((0, 0), (cols + 1, cols)).clone_owned();
        let rhs = ws.rhs.rows(0, cols + 1).clone_owned();
        let ls = dense::least_squares(&hbar, &rhs)?;
        if ls.rank_deficiency > 0 {
            warn!(
                "GMRES-DR restart {}: projected least-squares problem is rank deficient \
                 ({} zero pivots)",
                restart, ls.rank_deficiency
            );
        }
        update_solution(x, &ws.basis, &ls.solution);
        ws.coeffs = ls.solution;

        beta = true_residual(op, x, b, ws);
        history.push(beta);
        debug!(
            "GMRES-DR restart {}: {} iterations, residual {:e}",
            restart, iterations, beta
        );

        if breakdown {
            debug!("GMRES-DR: invariant subspace in restart {}", restart);
            return Ok(settle_breakdown(
                iterations,
                restart,
                beta,
                target,
                history,
                ritz_values,
            ));
        }
        if beta <= target {
            return Ok(finished(
                iterations,
                restart,
                beta,
                Termination::Converged,
                history,
                ritz_values,
            ));
        }
    }

    warn!(
        "GMRES-DR: no convergence after {} cycles ({} iterations), residual {:e}, target {:e}",
        config.max_restarts, iterations, beta, target
    );
    Ok(GmresDrResult {
        iterations,
        restarts: config.max_restarts - 1,
        residual: beta,
        converged: false,
        termination: Termination::MaxRestarts,
        residual_history: history,
        ritz_values,
    })
}

fn finished(
    iterations: usize,
    restarts: usize,
    residual: f64,
    termination: Termination,
    residual_history: Vec<f64>,
    ritz_values: Vec<C64>,
) -> GmresDrResult {
    GmresDrResult {
        iterations,
        restarts,
        residual,
        converged: true,
        termination,
        residual_history,
        ritz_values,
    }
}

/// Result for a Krylov space that became invariant. The iterate minimizes the
/// residual over that space; the explicit residual decides convergence.
fn settle_breakdown(
    iterations: usize,
    restarts: usize,
    residual: f64,
    target: f64,
    residual_history: Vec<f64>,
    ritz_values: Vec<C64>,
) -> GmresDrResult {
    let mut result = finished(
        iterations,
        restarts,
        residual,
        Termination::Breakdown,
        residual_history,
        ritz_values,
    );
    if residual > target {
        warn!(
            "GMRES-DR: invariant subspace reached with residual {:e} above target {:e}",
            residual, target
        );
        result.converged = false;
    }
    result
}

/// r = b - A x into the workspace residual; returns ||r||.
fn true_residual(
    op: &dyn LinearOperator,
    x: &[C64],
    b: &[C64],
    ws: &mut KrylovWorkspace,
) -> f64 {
    op.apply(x, &mut ws.scratch);
    vector::diff(&mut ws.residual, b, &ws.scratch);
    vector::norm(&ws.residual)
}

fn recursion_coefficients(ws: &KrylovWorkspace) -> DVector<C64> {
    let (y, skipped) = ws.recursion.solve();
    if skipped > 0 {
        warn!(
            "GMRES-DR: triangular factor is singular, {} coefficients set to zero",
            skipped
        );
    }
    y
}

/// x += sum_i y_i v_i
fn update_solution(x: &mut [C64], basis: &[Vec<C64>], y: &DVector<C64>) {
    for (yi, vi) in y.iter().zip(basis) {
        vector::axpy(x, *yi, vi);
    }
}
