//! Vector kernels used by the Krylov solvers.
//!
//! Every solver-side vector operation goes through these functions, so the
//! solver does not depend on how a vector is stored or reduced. With the
//! `parallel` feature the reductions and updates run on rayon's thread pool;
//! results then differ from the serial path only by floating-point
//! associativity.

use num_complex::Complex64 as C64;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Conjugated inner product <x, y> = sum_i conj(x_i) * y_i.
pub fn dot(x: &[C64], y: &[C64]) -> C64 {
    debug_assert_eq!(x.len(), y.len());

    #[cfg(feature = "parallel")]
    {
        x.par_iter()
            .zip(y.par_iter())
            .map(|(xi, yi)| xi.conj() * yi)
            .sum()
    }
    #[cfg(not(feature = "parallel"))]
    {
        x.iter().zip(y.iter()).map(|(xi, yi)| xi.conj() * yi).sum()
    }
}

/// Squared 2-norm sum_i |x_i|^2.
pub fn norm_sqr(x: &[C64]) -> f64 {
    #[cfg(feature = "parallel")]
    {
        x.par_iter().map(|xi| xi.norm_sqr()).sum()
    }
    #[cfg(not(feature = "parallel"))]
    {
        x.iter().map(|xi| xi.norm_sqr()).sum()
    }
}

/// 2-norm of a complex vector.
pub fn norm(x: &[C64]) -> f64 {
    norm_sqr(x).sqrt()
}

/// y += a * x
pub fn axpy(y: &mut [C64], a: C64, x: &[C64]) {
    debug_assert_eq!(x.len(), y.len());

    #[cfg(feature = "parallel")]
    {
        y.par_iter_mut()
            .zip(x.par_iter())
            .for_each(|(yi, &xi)| *yi += a * xi);
    }
    #[cfg(not(feature = "parallel"))]
    {
        for (yi, &xi) in y.iter_mut().zip(x.iter()) {
            *yi += a * xi;
        }
    }
}

/// x *= a for a real scale factor.
pub fn scale(x: &mut [C64], a: f64) {
    #[cfg(feature = "parallel")]
    {
        x.par_iter_mut().for_each(|xi| *xi *= a);
    }
    #[cfg(not(feature = "parallel"))]
    {
        for xi in x.iter_mut() {
            *xi *= a;
        }
    }
}

/// dst = src
pub fn assign(dst: &mut [C64], src: &[C64]) {
    dst.copy_from_slice(src);
}

/// out = a - b
pub fn diff(out: &mut [C64], a: &[C64], b: &[C64]) {
    debug_assert_eq!(out.len(), a.len());
    debug_assert_eq!(out.len(), b.len());

    #[cfg(feature = "parallel")]
    {
        out.par_iter_mut()
            .zip(a.par_iter().zip(b.par_iter()))
            .for_each(|(oi, (&ai, &bi))| *oi = ai - bi);
    }
    #[cfg(not(feature = "parallel"))]
    {
        for (oi, (&ai, &bi)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
            *oi = ai - bi;
        }
    }
}

/// out = x * a for a real scale factor.
pub fn assign_scaled(out: &mut [C64], x: &[C64], a: f64) {
    debug_assert_eq!(out.len(), x.len());
    for (oi, &xi) in out.iter_mut().zip(x.iter()) {
        *oi = xi * a;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_conjugates_first_argument() {
        let x = vec![C64::new(0.0, 1.0), C64::new(1.0, 0.0)];
        let y = vec![C64::new(0.0, 1.0), C64::new(2.0, 3.0)];
        // conj(i) * i + 1 * (2+3i) = 1 + 2 + 3i
        assert!((dot(&x, &y) - C64::new(3.0, 3.0)).norm() < 1e-15);
    }

    #[test]
    fn norm_of_complex_vector() {
        let v = vec![C64::new(3.0, 4.0)];
        assert!((norm(&v) - 5.0).abs() < 1e-15);
    }

    #[test]
    fn axpy_and_scale() {
        let x = vec![C64::new(1.0, 0.0), C64::new(0.0, 1.0)];
        let mut y = vec![C64::new(1.0, 1.0), C64::new(1.0, 1.0)];
        axpy(&mut y, C64::new(0.0, 2.0), &x);
        assert!((y[0] - C64::new(1.0, 3.0)).norm() < 1e-15);
        assert!((y[1] - C64::new(-1.0, 1.0)).norm() < 1e-15);

        scale(&mut y, 0.5);
        assert!((y[0] - C64::new(0.5, 1.5)).norm() < 1e-15);
    }

    #[test]
    fn diff_and_assign() {
        let a = vec![C64::new(5.0, 1.0), C64::new(2.0, 2.0)];
        let b = vec![C64::new(1.0, 1.0), C64::new(3.0, 0.0)];
        let mut out = vec![C64::new(0.0, 0.0); 2];
        diff(&mut out, &a, &b);
        assert!((out[0] - C64::new(4.0, 0.0)).norm() < 1e-15);
        assert!((out[1] - C64::new(-1.0, 2.0)).norm() < 1e-15);

        let mut copy = vec![C64::new(0.0, 0.0); 2];
        assign(&mut copy, &out);
        assert_eq!(copy, out);

        assign_scaled(&mut copy, &a, 2.0);
        assert!((copy[1] - C64::new(4.0, 4.0)).norm() < 1e-15);
    }
}
