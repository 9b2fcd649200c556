//! Square pyramid with base `[-1, 1]^2` at `r = -1` and apex `(0, 0, 1)`.
//!
//! The cross-section at height `r` is the square of half-width `(1 - r) / 2`,
//! so every orbit carries its height as the last argument and the in-plane
//! arguments are bounded by that half-width.

use super::symmetry::{product, signed_permutations, SignedPerm};
use super::{uniform, OrbitGenerator, Shape};
use crate::jacobi::{jacobi, scaled_jacobi};
use crate::traits::Scalar;
use rand::Rng;

/// Height direction; every pyramid orbit moves along it.
const AXIS: [f64; 3] = [0.0, 0.0, 1.0];

pub(crate) struct Pyramid;

impl Shape for Pyramid {
    const NAME: &'static str = "pyr";
    const DIM: usize = 3;
    const VOLUME: f64 = 8.0 / 3.0;
    const ORBITS: &'static [(usize, usize)] = &[
        (1, 1), // (0, 0, c)
        (4, 2), // (a, 0, c)
        (4, 2), // (a, a, c)
        (8, 3), // (a, b, c)
    ];
    const INVARIANT_DEGREES: &'static [usize] = &[1, 2, 4];

    fn group() -> Vec<SignedPerm> {
        product(&signed_permutations(2), &[SignedPerm::identity(1)])
    }

    fn generator(orbit: usize) -> OrbitGenerator {
        match orbit {
            0 => OrbitGenerator::new(&[0.0; 3], &[&AXIS]),
            1 => OrbitGenerator::new(&[0.0; 3], &[&[1.0, 0.0, 0.0], &AXIS]),
            2 => OrbitGenerator::new(&[0.0; 3], &[&[1.0, 1.0, 0.0], &AXIS]),
            3 => OrbitGenerator::new(&[0.0; 3], &[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &AXIS]),
            _ => unreachable!("pyr orbit {} not in table", orbit),
        }
    }

    fn to_cartesian(natural: &[f64]) -> Vec<f64> {
        natural.to_vec()
    }

    fn clamp(_orbit: usize, args: &mut [f64]) {
        if let Some((height, planar)) = args.split_last_mut() {
            *height = height.clamp(-1.0, 1.0);
            let half_width = 0.5 * (1.0 - *height);
            for a in planar.iter_mut() {
                *a = a.clamp(0.0, half_width);
            }
        }
    }

    fn seed<R: Rng + ?Sized>(_orbit: usize, rng: &mut R, args: &mut [f64]) {
        if let Some((height, planar)) = args.split_last_mut() {
            *height = uniform(rng, -1.0, 1.0);
            let half_width = 0.5 * (1.0 - *height);
            for a in planar.iter_mut() {
                *a = uniform(rng, 0.0, half_width);
            }
        }
    }

    fn basis_indices(degree: usize) -> Vec<[usize; 3]> {
        let mut out = Vec::new();
        for i in (0..=degree).step_by(2) {
            for j in (i..=degree - i).step_by(2) {
                for k in 0..=(degree - i - j) {
                    out.push([i, j, k]);
                }
            }
        }
        out
    }

    fn eval_basis<T: Scalar>(degree: usize, indices: &[[usize; 3]], pt: &[T], out: &mut [T]) {
        let (p, q, r) = (pt[0], pt[1], pt[2]);
        let v = (T::one() - r).scale(0.5);

        let a_fam = scaled_jacobi(degree, 0.0, 0.0, p, v);
        let b_fam = scaled_jacobi(degree, 0.0, 0.0, q, v);

        for (slot, &[i, j, k]) in out.iter_mut().zip(indices) {
            let c_fam = jacobi(degree - i - j, 2.0 * (i + j) as f64 + 2.0, r);
            let norm = ((2 * i + 1) as f64 * (2 * j + 1) as f64 * (2 * (i + j + k) + 3) as f64 / 8.0).sqrt();
            *slot = (a_fam[i] * b_fam[j] * c_fam[k]).scale(norm);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{assert_closed_under, assert_inside, expanded_orbits};
    use super::super::{Domain, DomainKind};

    fn inside(x: &[f64]) -> bool {
        const TOL: f64 = 1e-12;
        let half_width = 0.5 * (1.0 - x[2]);
        x[2] >= -1.0 - TOL && x[0].abs() <= half_width + TOL && x[1].abs() <= half_width + TOL
    }

    #[test]
    fn orbits_are_closed_under_square_symmetries() {
        for (_, pts) in expanded_orbits(DomainKind::Pyramid, 13) {
            assert_closed_under(&pts, |x| vec![-x[0], x[1], x[2]]);
            assert_closed_under(&pts, |x| vec![x[1], x[0], x[2]]);
            assert_inside(&pts, inside);
        }
    }

    #[test]
    fn in_plane_arguments_shrink_towards_apex() {
        let domain = Domain::new(DomainKind::Pyramid);
        let mut args = [0.9, 0.1, 0.5];
        domain.clamp_args(3, &mut args).expect("clamp should succeed");
        assert_eq!(args, [0.25, 0.1, 0.5]);

        let mut apex = [0.3, 2.0];
        domain.clamp_args(1, &mut apex).expect("clamp should succeed");
        assert_eq!(apex, [0.0, 1.0]);
    }

    #[test]
    fn basis_is_orthonormal_under_collapsed_gauss() {
        let gl = [
            (-0.9061798459386640, 0.2369268850561891),
            (-0.5384693101056831, 0.4786286704993665),
            (0.0, 0.5688888888888889),
            (0.5384693101056831, 0.4786286704993665),
            (0.9061798459386640, 0.2369268850561891),
        ];
        let domain = Domain::new(DomainKind::Pyramid);
        let degree = 3;
        let indices = domain.basis_indices(degree);
        let m = indices.len();
        let mut gram = vec![0.0; m * m];
        let mut psi = vec![0.0; m];
        for &(a, wa) in &gl {
            for &(b, wb) in &gl {
                for &(c, wc) in &gl {
                    let h = 0.5 * (1.0 - c);
                    let w = wa * wb * wc * h * h;
                    domain.eval_basis_point(degree, &indices, &[a * h, b * h, c], &mut psi);
                    for x in 0..m {
                        for y in 0..m {
                            gram[x * m + y] += w * psi[x] * psi[y];
                        }
                    }
                }
            }
        }
        for x in 0..m {
            for y in 0..m {
                let expected = if x == y { 1.0 } else { 0.0 };
                assert!((gram[x * m + y] - expected).abs() < 1e-12, "{:?} {:?}", indices[x], indices[y]);
            }
        }
    }
}
