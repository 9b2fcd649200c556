//! Hexahedron `[-1, 1]^3` with the full octahedral group (48 elements).

use super::symmetry::{signed_permutations, SignedPerm};
use super::{uniform, OrbitGenerator, Shape};
use crate::jacobi::legendre;
use crate::traits::Scalar;
use rand::Rng;

pub(crate) struct Hexahedron;

impl Shape for Hexahedron {
    const NAME: &'static str = "hex";
    const DIM: usize = 3;
    const VOLUME: f64 = 8.0;
    const ORBITS: &'static [(usize, usize)] = &[
        (1, 0),  // centroid
        (6, 1),  // (a, 0, 0)
        (8, 1),  // (a, a, a)
        (12, 1), // (a, a, 0)
        (24, 2), // (a, b, 0)
        (24, 2), // (a, a, b)
        (48, 3), // (a, b, c)
    ];
    const INVARIANT_DEGREES: &'static [usize] = &[2, 4, 6];

    fn group() -> Vec<SignedPerm> {
        signed_permutations(3)
    }

    fn generator(orbit: usize) -> OrbitGenerator {
        match orbit {
            0 => OrbitGenerator::fixed(&[0.0, 0.0, 0.0]),
            1 => OrbitGenerator::new(&[0.0; 3], &[&[1.0, 0.0, 0.0]]),
            2 => OrbitGenerator::new(&[0.0; 3], &[&[1.0, 1.0, 1.0]]),
            3 => OrbitGenerator::new(&[0.0; 3], &[&[1.0, 1.0, 0.0]]),
            4 => OrbitGenerator::new(&[0.0; 3], &[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]]),
            5 => OrbitGenerator::new(&[0.0; 3], &[&[1.0, 1.0, 0.0], &[0.0, 0.0, 1.0]]),
            6 => OrbitGenerator::new(
                &[0.0; 3],
                &[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0]],
            ),
            _ => unreachable!("hex orbit {} not in table", orbit),
        }
    }

    fn to_cartesian(natural: &[f64]) -> Vec<f64> {
        natural.to_vec()
    }

    fn clamp(_orbit: usize, args: &mut [f64]) {
        for a in args.iter_mut() {
            *a = a.clamp(0.0, 1.0);
        }
    }

    fn seed<R: Rng + ?Sized>(_orbit: usize, rng: &mut R, args: &mut [f64]) {
        for a in args.iter_mut() {
            *a = uniform(rng, 0.0, 1.0);
        }
    }

    fn basis_indices(degree: usize) -> Vec<[usize; 3]> {
        let mut out = Vec::new();
        for i in (0..=degree).step_by(2) {
            for j in (i..=degree - i).step_by(2) {
                for k in (j..=degree - i - j).step_by(2) {
                    out.push([i, j, k]);
                }
            }
        }
        out
    }

    fn eval_basis<T: Scalar>(degree: usize, indices: &[[usize; 3]], pt: &[T], out: &mut [T]) {
        let lp = legendre(degree, pt[0]);
        let lq = legendre(degree, pt[1]);
        let lr = legendre(degree, pt[2]);

        for (slot, &[i, j, k]) in out.iter_mut().zip(indices) {
            let c = ((i as f64 + 0.5) * (j as f64 + 0.5) * (k as f64 + 0.5)).sqrt();
            *slot = (lp[i] * lq[j] * lr[k]).scale(c);
        }
    }
}
