//! Sparse matrix operator for iterative solvers.
//!
//! Wraps faer's sparse column matrices so that an explicitly assembled sparse
//! operator (a small lattice, a hopping matrix from a test fixture) can be
//! handed to the Krylov solvers through [`LinearOperator`].

use crate::error::{LinalgError, Result};
use crate::operator::LinearOperator;
use faer::prelude::*;
use faer::sparse::{SparseColMat, Triplet};
use num_complex::Complex64 as C64;

/// Sparse complex-valued operator.
///
/// Wraps a faer `SparseColMat<usize, c64>` and implements `LinearOperator`.
pub struct SparseOperator {
    matrix: SparseColMat<usize, c64>,
}

impl SparseOperator {
    /// Create from an existing square sparse matrix.
    pub fn from_matrix(matrix: SparseColMat<usize, c64>) -> Result<Self> {
        if matrix.nrows() != matrix.ncols() {
            return Err(LinalgError::DimensionMismatch {
                expected: matrix.nrows(),
                actual: matrix.ncols(),
            });
        }
        Ok(Self { matrix })
    }

    /// Create from triplets (row, col, value).
    ///
    /// Duplicate entries at the same position are summed.
    pub fn from_triplets(size: usize, triplets: &[(usize, usize, C64)]) -> Result<Self> {
        let faer_triplets: Vec<_> = triplets
            .iter()
            .map(|&(r, c, v)| Triplet::new(r, c, c64::new(v.re, v.im)))
            .collect();

        SparseColMat::<usize, c64>::try_new_from_triplets(size, size, &faer_triplets)
            .map(|matrix| Self { matrix })
            .map_err(|e| LinalgError::InvalidDimension(format!("{e:?}")))
    }

    /// Get a reference to the underlying matrix.
    pub fn matrix(&self) -> &SparseColMat<usize, c64> {
        &self.matrix
    }
}

impl LinearOperator for SparseOperator {
    fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply(&self, x: &[C64], y: &mut [C64]) {
        let n = self.matrix.nrows();
        assert_eq!(x.len(), n);
        assert_eq!(y.len(), n);

        y.iter_mut().for_each(|yi| *yi = C64::new(0.0, 0.0));

        // CSC: for each column j, add A[:, j] * x[j] to y
        let mat_ref = self.matrix.as_ref();
        let col_ptrs = mat_ref.col_ptr();
        let row_indices = mat_ref.row_idx();
        let values = mat_ref.val();

        for j in 0..n {
            let xj = x[j];
            for idx in col_ptrs[j]..col_ptrs[j + 1] {
                let aij = values[idx];
                y[row_indices[idx]] += C64::new(aij.re, aij.im) * xj;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_identity() {
        let triplets = vec![(0, 0, C64::new(1.0, 0.0)), (1, 1, C64::new(1.0, 0.0))];
        let op = SparseOperator::from_triplets(2, &triplets).unwrap();

        assert_eq!(op.dim(), 2);

        let x = vec![C64::new(1.0, 2.0), C64::new(3.0, 4.0)];
        let mut y = vec![C64::new(0.0, 0.0); 2];
        op.apply(&x, &mut y);

        assert!((y[0] - x[0]).norm() < 1e-15);
        assert!((y[1] - x[1]).norm() < 1e-15);
    }

    #[test]
    fn sparse_non_hermitian_hopping() {
        // Forward hopping with a phase, backward hopping without:
        // [ 2      e^{i}  0 ]
        // [ -1     2      e^{i} ]
        // [ 0     -1      2 ]
        let phase = C64::from_polar(1.0, 1.0);
        let triplets = vec![
            (0, 0, C64::new(2.0, 0.0)),
            (0, 1, phase),
            (1, 0, C64::new(-1.0, 0.0)),
            (1, 1, C64::new(2.0, 0.0)),
            (1, 2, phase),
            (2, 1, C64::new(-1.0, 0.0)),
            (2, 2, C64::new(2.0, 0.0)),
        ];
        let op = SparseOperator::from_triplets(3, &triplets).unwrap();

        let x = vec![C64::new(1.0, 0.0), C64::new(2.0, 0.0), C64::new(3.0, 0.0)];
        let mut y = vec![C64::new(0.0, 0.0); 3];
        op.apply(&x, &mut y);

        assert!((y[0] - (C64::new(2.0, 0.0) + phase * 2.0)).norm() < 1e-14);
        assert!((y[1] - (C64::new(3.0, 0.0) + phase * 3.0)).norm() < 1e-14);
        assert!((y[2] - C64::new(4.0, 0.0)).norm() < 1e-14);
    }

    #[test]
    fn sparse_duplicate_triplets_are_summed() {
        let triplets = vec![(0, 0, C64::new(2.0, 0.0)), (0, 0, C64::new(0.0, 1.0))];
        let op = SparseOperator::from_triplets(1, &triplets).unwrap();

        let x = vec![C64::new(1.0, 0.0)];
        let mut y = vec![C64::new(0.0, 0.0)];
        op.apply(&x, &mut y);

        assert!((y[0] - C64::new(2.0, 1.0)).norm() < 1e-15);
    }

    #[test]
    fn sparse_out_of_bounds_triplet_rejected() {
        let triplets = vec![(0, 3, C64::new(1.0, 0.0))];
        let result = SparseOperator::from_triplets(2, &triplets);
        assert!(matches!(result, Err(LinalgError::InvalidDimension(_))));
    }

    #[test]
    fn sparse_from_matrix_matches_triplets() {
        let triplets = vec![
            (0, 0, C64::new(3.0, 0.0)),
            (0, 1, C64::new(0.0, -1.0)),
            (1, 0, C64::new(0.5, 0.5)),
            (1, 1, C64::new(3.0, 0.0)),
        ];
        let from_triplets = SparseOperator::from_triplets(2, &triplets).unwrap();
        let from_matrix = SparseOperator::from_matrix(from_triplets.matrix().clone()).unwrap();

        assert_eq!(from_matrix.dim(), 2);
        assert_eq!(from_matrix.matrix().ncols(), 2);

        let x = vec![C64::new(1.0, -1.0), C64::new(2.0, 0.5)];
        let mut y_triplets = vec![C64::new(0.0, 0.0); 2];
        let mut y_matrix = vec![C64::new(0.0, 0.0); 2];
        from_triplets.apply(&x, &mut y_triplets);
        from_matrix.apply(&x, &mut y_matrix);
        assert_eq!(y_triplets, y_matrix);
    }

    #[test]
    fn sparse_from_rectangular_matrix_rejected() {
        let entries = [Triplet::new(0, 2, c64::new(1.0, 0.0))];
        let matrix = SparseColMat::<usize, c64>::try_new_from_triplets(2, 3, &entries).unwrap();
        let result = SparseOperator::from_matrix(matrix);
        assert!(matches!(
            result,
            Err(LinalgError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }
}
