//! Tetrahedron with vertices `(-1,-1,-1)`, `(1,-1,-1)`, `(-1,1,-1)`, `(-1,-1,1)`.
//!
//! Orbits are barycentric and closed under all 24 vertex permutations. The
//! basis is the collapsed-coordinate orthonormal family
//! `c_ijk · P_i(a)(1-b)^i(1-c)^i · P_j^{(2i+1,0)}(b)(1-c)^j · P_k^{(2i+2j+2,0)}(r)`
//! with every factor expanded in `(p, q, r)` so nothing is divided by zero.

use super::symmetry::{permutations, SignedPerm};
use super::{barycentric_to_cartesian, uniform, OrbitGenerator, Shape};
use crate::jacobi::{jacobi, scaled_jacobi};
use crate::traits::Scalar;
use rand::Rng;

const VERTICES: [&[f64]; 4] = [
    &[-1.0, -1.0, -1.0],
    &[1.0, -1.0, -1.0],
    &[-1.0, 1.0, -1.0],
    &[-1.0, -1.0, 1.0],
];

pub(crate) struct Tetrahedron;

impl Shape for Tetrahedron {
    const NAME: &'static str = "tet";
    const DIM: usize = 3;
    const VOLUME: f64 = 4.0 / 3.0;
    const ORBITS: &'static [(usize, usize)] = &[
        (1, 0),  // S4
        (4, 1),  // S31:   (a, a, a, 1 - 3a)
        (6, 1),  // S22:   (a, a, 1/2 - a, 1/2 - a)
        (12, 2), // S211:  (a, a, b, 1 - 2a - b)
        (24, 3), // S1111: (a, b, c, 1 - a - b - c)
    ];
    const INVARIANT_DEGREES: &'static [usize] = &[2, 3, 4];

    fn group() -> Vec<SignedPerm> {
        permutations(4)
    }

    fn generator(orbit: usize) -> OrbitGenerator {
        match orbit {
            0 => OrbitGenerator::fixed(&[0.25; 4]),
            1 => OrbitGenerator::new(&[0.0, 0.0, 0.0, 1.0], &[&[1.0, 1.0, 1.0, -3.0]]),
            2 => OrbitGenerator::new(&[0.0, 0.0, 0.5, 0.5], &[&[1.0, 1.0, -1.0, -1.0]]),
            3 => OrbitGenerator::new(
                &[0.0, 0.0, 0.0, 1.0],
                &[&[1.0, 1.0, 0.0, -2.0], &[0.0, 0.0, 1.0, -1.0]],
            ),
            4 => OrbitGenerator::new(
                &[0.0, 0.0, 0.0, 1.0],
                &[
                    &[1.0, 0.0, 0.0, -1.0],
                    &[0.0, 1.0, 0.0, -1.0],
                    &[0.0, 0.0, 1.0, -1.0],
                ],
            ),
            _ => unreachable!("tet orbit {} not in table", orbit),
        }
    }

    fn to_cartesian(natural: &[f64]) -> Vec<f64> {
        barycentric_to_cartesian(&VERTICES, natural)
    }

    fn clamp(orbit: usize, args: &mut [f64]) {
        match orbit {
            1 => args[0] = args[0].clamp(0.0, 1.0 / 3.0),
            2 => args[0] = args[0].clamp(0.0, 0.5),
            3 => {
                args[0] = args[0].clamp(0.0, 0.5);
                args[1] = args[1].clamp(0.0, 1.0 - 2.0 * args[0]);
            }
            4 => {
                args[0] = args[0].clamp(0.0, 1.0);
                args[1] = args[1].clamp(0.0, 1.0 - args[0]);
                args[2] = args[2].clamp(0.0, 1.0 - args[0] - args[1]);
            }
            _ => {}
        }
    }

    fn seed<R: Rng + ?Sized>(orbit: usize, rng: &mut R, args: &mut [f64]) {
        match orbit {
            1 => args[0] = uniform(rng, 0.0, 1.0 / 3.0),
            2 => args[0] = uniform(rng, 0.0, 0.5),
            3 => {
                args[0] = uniform(rng, 0.0, 0.5);
                args[1] = uniform(rng, 0.0, 1.0 - 2.0 * args[0]);
            }
            4 => {
                args[0] = uniform(rng, 0.0, 1.0);
                args[1] = uniform(rng, 0.0, 1.0 - args[0]);
                args[2] = uniform(rng, 0.0, 1.0 - args[0] - args[1]);
            }
            _ => {}
        }
    }

    fn basis_indices(degree: usize) -> Vec<[usize; 3]> {
        let mut out = Vec::new();
        for i in 0..=degree {
            for j in 0..=(degree - i) {
                for k in 0..=(degree - i - j) {
                    out.push([i, j, k]);
                }
            }
        }
        out
    }

    fn eval_basis<T: Scalar>(degree: usize, indices: &[[usize; 3]], pt: &[T], out: &mut [T]) {
        let (p, q, r) = (pt[0], pt[1], pt[2]);
        let one = T::one();

        // (1-b)(1-c) = -2(q + r), a(1-b)(1-c) = 4(1 + p) + 2(q + r)
        let qr = q + r;
        let a_fam = scaled_jacobi(degree, 0.0, 0.0, (one + p).scale(4.0) + qr.scale(2.0), qr.scale(-2.0));
        // (1-c) = 1 - r, b(1-c) = 1 + 2q + r
        let b_fams: Vec<Vec<T>> = (0..=degree)
            .map(|i| {
                scaled_jacobi(degree - i, 2.0 * i as f64 + 1.0, 0.0, one + q.scale(2.0) + r, one - r)
            })
            .collect();

        let mut c_cache: Vec<Option<Vec<T>>> = vec![None; (degree + 1) * (degree + 1)];
        for (slot, &[i, j, k]) in out.iter_mut().zip(indices) {
            let c_fam = c_cache[i * (degree + 1) + j]
                .get_or_insert_with(|| jacobi(degree - i - j, 2.0 * (i + j) as f64 + 2.0, r));
            let norm = ((2 * i + 1) as f64 * (i + j + 1) as f64 * (2 * (i + j + k) + 3) as f64
                / 2f64.powi((4 * i + 2 * j + 2) as i32))
                .sqrt();
            *slot = (a_fam[i] * b_fams[i][j] * c_fam[k]).scale(norm);
        }
    }
}
