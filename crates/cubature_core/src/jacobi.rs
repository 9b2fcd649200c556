//! Jacobi polynomial recurrences.
//!
//! The basis evaluator works with the homogenised form
//! `v^n P_n^{(α,β)}(u / v)`, which stays polynomial in `(u, v)` and so never
//! divides by a collapsing coordinate. Passing `v = 1` recovers the ordinary
//! Jacobi polynomials.

use crate::traits::Scalar;

/// Returns `[Q_0, ..., Q_{n_max}]` with `Q_n = v^n P_n^{(α,β)}(u / v)`.
pub fn scaled_jacobi<T: Scalar>(n_max: usize, alpha: f64, beta: f64, u: T, v: T) -> Vec<T> {
    let mut out = Vec::with_capacity(n_max + 1);
    out.push(T::one());
    if n_max == 0 {
        return out;
    }

    // P_1 = ((α + β + 2) x + (α - β)) / 2
    out.push(u.scale(0.5 * (alpha + beta + 2.0)) + v.scale(0.5 * (alpha - beta)));

    let v2 = v * v;
    for n in 1..n_max {
        let nf = n as f64;
        let s = 2.0 * nf + alpha + beta;
        let a1 = 2.0 * (nf + 1.0) * (nf + alpha + beta + 1.0) * s;
        let a2 = (s + 1.0) * (alpha * alpha - beta * beta);
        let a3 = s * (s + 1.0) * (s + 2.0);
        let a4 = 2.0 * (nf + alpha) * (nf + beta) * (s + 2.0);

        let lead = (u.scale(a3) + v.scale(a2)) * out[n];
        let tail = (v2 * out[n - 1]).scale(a4);
        out.push((lead - tail).scale(1.0 / a1));
    }
    out
}

/// Ordinary Jacobi polynomials `P_n^{(α,0)}(x)` for `n = 0..=n_max`.
pub fn jacobi<T: Scalar>(n_max: usize, alpha: f64, x: T) -> Vec<T> {
    scaled_jacobi(n_max, alpha, 0.0, x, T::one())
}

/// Legendre polynomials `P_n(x)` for `n = 0..=n_max`.
pub fn legendre<T: Scalar>(n_max: usize, x: T) -> Vec<T> {
    scaled_jacobi(n_max, 0.0, 0.0, x, T::one())
}

#[cfg(test)]
mod tests {
    use super::{jacobi, legendre, scaled_jacobi};
    use crate::autodiff::Dual;

    #[test]
    fn legendre_matches_closed_forms() {
        let x: f64 = 0.3;
        let p = legendre(4, x);
        assert_eq!(p[0], 1.0);
        assert!((p[1] - x).abs() < 1e-15);
        assert!((p[2] - 0.5 * (3.0 * x * x - 1.0)).abs() < 1e-15);
        assert!((p[3] - 0.5 * (5.0 * x.powi(3) - 3.0 * x)).abs() < 1e-15);
        let p4 = (35.0 * x.powi(4) - 30.0 * x * x + 3.0) / 8.0;
        assert!((p[4] - p4).abs() < 1e-15);
    }

    #[test]
    fn jacobi_alpha_one_second_order() {
        // P_2^{(1,0)}(x) = (10x^2 + 4x - 2) / 4
        let x: f64 = -0.4;
        let p = jacobi(2, 1.0, x);
        assert!((p[1] - (3.0 * x + 1.0) / 2.0).abs() < 1e-15);
        assert!((p[2] - (10.0 * x * x + 4.0 * x - 2.0) / 4.0).abs() < 1e-14);
    }

    #[test]
    fn scaled_form_is_homogeneous() {
        let (u, v): (f64, f64) = (0.35, 0.7);
        let scaled = scaled_jacobi(5, 3.0, 0.0, u, v);
        let plain = jacobi(5, 3.0, u / v);
        for n in 0..=5 {
            assert!((scaled[n] - v.powi(n as i32) * plain[n]).abs() < 1e-13);
        }
    }

    #[test]
    fn scaled_form_vanishes_at_collapsed_vertex() {
        let scaled = scaled_jacobi(4, 0.0, 0.0, 0.0_f64, 0.0);
        assert_eq!(scaled[0], 1.0);
        assert!(scaled[1..].iter().all(|v| v.abs() < 1e-15));
    }

    #[test]
    fn dual_derivative_matches_legendre_derivative() {
        // P_3'(x) = (15x^2 - 3) / 2
        let x = 0.2;
        let p = legendre(3, Dual::variable(x, 1.0));
        assert!((p[3].eps - (15.0 * x * x - 3.0) / 2.0).abs() < 1e-14);
    }
}
