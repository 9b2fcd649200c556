//! Triangle with vertices `(-1,-1)`, `(1,-1)`, `(-1,1)`.
//!
//! Orbits are generated in barycentric coordinates under all six vertex
//! permutations. The basis is the orthonormal Dubiner basis written in
//! homogenised form:
//!
//! `ψ_ij = c_ij · (1-q)^i P_i(a) · P_j^{(2i+1,0)}(q)`, with
//! `(1-q)·a = 1 + 2p + q`.

use super::symmetry::{permutations, SignedPerm};
use super::{barycentric_to_cartesian, uniform, OrbitGenerator, Shape};
use crate::jacobi::{jacobi, scaled_jacobi};
use crate::traits::Scalar;
use rand::Rng;

pub(crate) const VERTICES: [&[f64]; 3] = [&[-1.0, -1.0], &[1.0, -1.0], &[-1.0, 1.0]];

pub(crate) struct Triangle;

impl Shape for Triangle {
    const NAME: &'static str = "tri";
    const DIM: usize = 2;
    const VOLUME: f64 = 2.0;
    const ORBITS: &'static [(usize, usize)] = &[
        (1, 0), // S3
        (3, 1), // S21:  (a, a, 1 - 2a)
        (6, 2), // S111: (a, b, 1 - a - b)
    ];
    const INVARIANT_DEGREES: &'static [usize] = &[2, 3];

    fn group() -> Vec<SignedPerm> {
        permutations(3)
    }

    fn generator(orbit: usize) -> OrbitGenerator {
        generator(orbit)
    }

    fn to_cartesian(natural: &[f64]) -> Vec<f64> {
        barycentric_to_cartesian(&VERTICES, natural)
    }

    fn clamp(orbit: usize, args: &mut [f64]) {
        clamp(orbit, args)
    }

    fn seed<R: Rng + ?Sized>(orbit: usize, rng: &mut R, args: &mut [f64]) {
        seed(orbit, rng, args)
    }

    fn basis_indices(degree: usize) -> Vec<[usize; 3]> {
        let mut out = Vec::new();
        for i in 0..=degree {
            for j in 0..=(degree - i) {
                out.push([i, j, 0]);
            }
        }
        out
    }

    fn eval_basis<T: Scalar>(degree: usize, indices: &[[usize; 3]], pt: &[T], out: &mut [T]) {
        let families = DubinerFamilies::new(degree, pt[0], pt[1]);
        for (slot, &[i, j, _]) in out.iter_mut().zip(indices) {
            *slot = families.value(i, j);
        }
    }
}

/// Triangle orbit generators, shared with the prism.
pub(crate) fn generator(orbit: usize) -> OrbitGenerator {
    let third = 1.0 / 3.0;
    match orbit {
        0 => OrbitGenerator::fixed(&[third, third, third]),
        1 => OrbitGenerator::new(&[0.0, 0.0, 1.0], &[&[1.0, 1.0, -2.0]]),
        2 => OrbitGenerator::new(&[0.0, 0.0, 1.0], &[&[1.0, 0.0, -1.0], &[0.0, 1.0, -1.0]]),
        _ => unreachable!("tri orbit {} not in table", orbit),
    }
}

/// Keeps every barycentric coordinate in `[0, 1]`.
pub(crate) fn clamp(orbit: usize, args: &mut [f64]) {
    match orbit {
        1 => args[0] = args[0].clamp(0.0, 0.5),
        2 => {
            args[0] = args[0].clamp(0.0, 1.0);
            args[1] = args[1].clamp(0.0, 1.0 - args[0]);
        }
        _ => {}
    }
}

pub(crate) fn seed<R: Rng + ?Sized>(orbit: usize, rng: &mut R, args: &mut [f64]) {
    match orbit {
        1 => args[0] = uniform(rng, 0.0, 0.5),
        2 => {
            args[0] = uniform(rng, 0.0, 1.0);
            args[1] = uniform(rng, 0.0, 1.0 - args[0]);
        }
        _ => {}
    }
}

/// Polynomial families needed to evaluate every `ψ_ij` at one point.
pub(crate) struct DubinerFamilies<T> {
    collapsed: Vec<T>,
    radial: Vec<Vec<T>>,
}

impl<T: Scalar> DubinerFamilies<T> {
    pub fn new(degree: usize, p: T, q: T) -> Self {
        let one = T::one();
        let u = one + p.scale(2.0) + q;
        let collapsed = scaled_jacobi(degree, 0.0, 0.0, u, one - q);
        let radial = (0..=degree)
            .map(|i| jacobi(degree - i, 2.0 * i as f64 + 1.0, q))
            .collect();
        Self { collapsed, radial }
    }

    pub fn value(&self, i: usize, j: usize) -> T {
        let c = ((2 * i + 1) as f64 * (i + j + 1) as f64 / 2f64.powi(2 * i as i32 + 1)).sqrt();
        (self.collapsed[i] * self.radial[i][j]).scale(c)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{assert_closed_under, assert_inside, expanded_orbits};
    use super::super::{Domain, DomainKind};

    fn inside(x: &[f64]) -> bool {
        const TOL: f64 = 1e-12;
        x[0] >= -1.0 - TOL && x[1] >= -1.0 - TOL && x[0] + x[1] <= TOL
    }

    #[test]
    fn orbits_are_closed_under_vertex_permutations() {
        for (_, pts) in expanded_orbits(DomainKind::Triangle, 2) {
            // swap of the second and third vertex
            assert_closed_under(&pts, |x| vec![x[1], x[0]]);
            // swap of the first and second vertex
            assert_closed_under(&pts, |x| vec![-1.0 - x[0] - x[1], x[1]]);
            assert_inside(&pts, inside);
        }
    }

    #[test]
    fn centroid_orbit_sits_at_centroid() {
        let domain = Domain::new(DomainKind::Triangle);
        let mut pts = nalgebra::DMatrix::zeros(1, 2);
        domain
            .expand_orbit(0, &[], 0, &mut pts)
            .expect("expansion should succeed");
        assert!((pts[(0, 0)] + 1.0 / 3.0).abs() < 1e-15);
        assert!((pts[(0, 1)] + 1.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn edge_midpoints_at_half() {
        let domain = Domain::new(DomainKind::Triangle);
        let mut pts = nalgebra::DMatrix::zeros(3, 2);
        domain
            .expand_orbit(1, &[0.5], 0, &mut pts)
            .expect("expansion should succeed");
        let mut rows: Vec<(f64, f64)> = (0..3).map(|r| (pts[(r, 0)], pts[(r, 1)])).collect();
        rows.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected = [(-1.0, 0.0), (0.0, -1.0), (0.0, 0.0)];
        for (got, want) in rows.iter().zip(expected.iter()) {
            assert!((got.0 - want.0).abs() < 1e-15 && (got.1 - want.1).abs() < 1e-15);
        }
    }

    #[test]
    fn clamp_keeps_barycentrics_feasible() {
        let domain = Domain::new(DomainKind::Triangle);
        let mut args = [0.8, 0.7];
        domain.clamp_args(2, &mut args).expect("clamp should succeed");
        assert!((args[0] - 0.8).abs() < 1e-15);
        assert!((args[1] - 0.2).abs() < 1e-15);
        let mut args = [0.9];
        domain.clamp_args(1, &mut args).expect("clamp should succeed");
        assert_eq!(args, [0.5]);
    }

    #[test]
    fn basis_is_orthonormal_under_conical_product() {
        // Gauss-Legendre in both collapsed coordinates, exact for these degrees
        let gl = [
            (-0.9061798459386640, 0.2369268850561891),
            (-0.5384693101056831, 0.4786286704993665),
            (0.0, 0.5688888888888889),
            (0.5384693101056831, 0.4786286704993665),
            (0.9061798459386640, 0.2369268850561891),
        ];
        let domain = Domain::new(DomainKind::Triangle);
        let degree = 3;
        let indices = domain.basis_indices(degree);
        let m = indices.len();
        let mut gram = vec![0.0; m * m];
        let mut psi = vec![0.0; m];
        for &(a, wa) in &gl {
            for &(b, wb) in &gl {
                // dp dq = (1 - b) / 2 da db
                let p = 0.5 * (1.0 + a) * (1.0 - b) - 1.0;
                let w = wa * wb * 0.5 * (1.0 - b);
                domain.eval_basis_point(degree, &indices, &[p, b], &mut psi);
                for r in 0..m {
                    for c in 0..m {
                        gram[r * m + c] += w * psi[r] * psi[c];
                    }
                }
            }
        }
        for r in 0..m {
            for c in 0..m {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!(
                    (gram[r * m + c] - expected).abs() < 1e-12,
                    "entry ({}, {}) = {}",
                    r,
                    c,
                    gram[r * m + c]
                );
            }
        }
    }
}
