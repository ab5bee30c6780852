//! Operator trait for matrix-free matrix-vector products.
//!
//! The Krylov solvers never see the matrix itself. A discretized lattice
//! operator (Wilson, twisted-mass, clover, ...) only has to implement
//! [`LinearOperator`], and the solver applies it to its basis vectors.

use num_complex::Complex64 as C64;

/// A linear operator that computes y = A * x for complex vectors.
///
/// Implementations must be deterministic: applying the operator twice to the
/// same input produces the same output. Internal parallelism is allowed, but
/// `apply` must have finished writing `y` when it returns.
pub trait LinearOperator: Send + Sync {
    /// Dimension of the operator (N x N).
    fn dim(&self) -> usize;

    /// Apply the operator: y = A * x.
    ///
    /// `x` and `y` are complex vectors of length `dim()`.
    fn apply(&self, x: &[C64], y: &mut [C64]);
}

/// Operator backed by a closure.
///
/// This is the usual way to hand an existing matrix-multiply routine to the
/// solver without writing a dedicated type.
pub struct FnOperator<F> {
    dim: usize,
    f: F,
}

impl<F> FnOperator<F>
where
    F: Fn(&[C64], &mut [C64]) + Send + Sync,
{
    /// Wrap `f` as an operator of dimension `dim`.
    pub fn new(dim: usize, f: F) -> Self {
        Self { dim, f }
    }
}

impl<F> LinearOperator for FnOperator<F>
where
    F: Fn(&[C64], &mut [C64]) + Send + Sync,
{
    fn dim(&self) -> usize {
        self.dim
    }

    fn apply(&self, x: &[C64], y: &mut [C64]) {
        (self.f)(x, y);
    }
}

/// Diagonal operator y_i = d_i * x_i.
#[derive(Debug, Clone)]
pub struct DiagonalOperator {
    diag: Vec<C64>,
}

impl DiagonalOperator {
    /// Create from the diagonal entries.
    pub fn new(diag: Vec<C64>) -> Self {
        Self { diag }
    }

    /// Create from real diagonal entries.
    pub fn from_real(diag: &[f64]) -> Self {
        Self {
            diag: diag.iter().map(|&d| C64::new(d, 0.0)).collect(),
        }
    }

    /// Diagonal entries.
    pub fn diagonal(&self) -> &[C64] {
        &self.diag
    }
}

impl LinearOperator for DiagonalOperator {
    fn dim(&self) -> usize {
        self.diag.len()
    }

    fn apply(&self, x: &[C64], y: &mut [C64]) {
        assert_eq!(x.len(), self.diag.len());
        assert_eq!(y.len(), self.diag.len());

        for ((yi, &xi), &di) in y.iter_mut().zip(x.iter()).zip(self.diag.iter()) {
            *yi = di * xi;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_operator_basic() {
        let op = DiagonalOperator::new(vec![C64::new(1.0, 1.0), C64::new(2.0, 0.0)]);
        assert_eq!(op.dim(), 2);

        let x = vec![C64::new(1.0, 0.0), C64::new(0.0, 1.0)];
        let mut y = vec![C64::new(0.0, 0.0); 2];
        op.apply(&x, &mut y);

        // (1+i)*1 = 1+i
        assert!((y[0] - C64::new(1.0, 1.0)).norm() < 1e-15);
        // 2*(i) = 2i
        assert!((y[1] - C64::new(0.0, 2.0)).norm() < 1e-15);
    }

    #[test]
    fn diagonal_from_real_has_zero_imaginary_part() {
        let op = DiagonalOperator::from_real(&[1.0, -2.5, 1000.0]);
        assert_eq!(op.dim(), 3);
        assert_eq!(
            op.diagonal(),
            &[C64::new(1.0, 0.0), C64::new(-2.5, 0.0), C64::new(1000.0, 0.0)]
        );
    }

    #[test]
    fn fn_operator_wraps_closure() {
        // Cyclic shift with a phase: y_i = i * x_{i+1}
        let op = FnOperator::new(3, |x: &[C64], y: &mut [C64]| {
            let n = x.len();
            for i in 0..n {
                y[i] = C64::new(0.0, 1.0) * x[(i + 1) % n];
            }
        });
        assert_eq!(op.dim(), 3);

        let x = vec![C64::new(1.0, 0.0), C64::new(2.0, 0.0), C64::new(3.0, 0.0)];
        let mut y = vec![C64::new(0.0, 0.0); 3];
        op.apply(&x, &mut y);

        assert!((y[0] - C64::new(0.0, 2.0)).norm() < 1e-15);
        assert!((y[1] - C64::new(0.0, 3.0)).norm() < 1e-15);
        assert!((y[2] - C64::new(0.0, 1.0)).norm() < 1e-15);
    }

    #[test]
    fn operator_as_trait_object() {
        let op = DiagonalOperator::from_real(&[2.0, 3.0]);
        let op_ref: &dyn LinearOperator = &op;

        let x = vec![C64::new(5.0, 0.0), C64::new(7.0, 0.0)];
        let mut y = vec![C64::new(0.0, 0.0); 2];
        op_ref.apply(&x, &mut y);

        assert!((y[0] - C64::new(10.0, 0.0)).norm() < 1e-15);
        assert!((y[1] - C64::new(21.0, 0.0)).norm() < 1e-15);
    }

    #[test]
    fn operator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DiagonalOperator>();
    }
}
