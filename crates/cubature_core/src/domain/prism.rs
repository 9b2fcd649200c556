//! Prism (wedge): the reference triangle extruded over `r ∈ [-1, 1]`.
//!
//! Natural coordinates are the three triangle barycentrics plus the axial
//! coordinate; the group is the triangle's vertex permutations times the
//! reflection `r -> -r`.

use super::symmetry::{permutations, product, reflections, SignedPerm};
use super::{barycentric_to_cartesian, tri, uniform, OrbitGenerator, Shape};
use crate::jacobi::legendre;
use crate::traits::Scalar;
use rand::Rng;

pub(crate) struct Prism;

/// Triangle orbit type behind each prism orbit and whether it is lifted off
/// the mid-plane by an axial argument.
const LAYOUT: [(usize, bool); 6] = [
    (0, false),
    (1, false),
    (2, false),
    (0, true),
    (1, true),
    (2, true),
];

impl Shape for Prism {
    const NAME: &'static str = "pri";
    const DIM: usize = 3;
    const VOLUME: f64 = 4.0;
    const ORBITS: &'static [(usize, usize)] = &[
        (1, 0),  // S3 on the mid-plane
        (3, 1),  // S21 on the mid-plane
        (6, 2),  // S111 on the mid-plane
        (2, 1),  // S3 at ±c
        (6, 2),  // S21 at ±c
        (12, 3), // S111 at ±c
    ];
    const INVARIANT_DEGREES: &'static [usize] = &[2, 2, 3];

    fn group() -> Vec<SignedPerm> {
        product(&permutations(3), &reflections(1))
    }

    fn generator(orbit: usize) -> OrbitGenerator {
        let (tri_orbit, lifted) = LAYOUT[orbit];
        let base = tri::generator(tri_orbit);

        let mut offset = base.offset;
        offset.push(0.0);
        let mut directions: Vec<Vec<f64>> = base
            .directions
            .into_iter()
            .map(|mut d| {
                d.push(0.0);
                d
            })
            .collect();
        if lifted {
            directions.push(vec![0.0, 0.0, 0.0, 1.0]);
        }
        OrbitGenerator { offset, directions }
    }

    fn to_cartesian(natural: &[f64]) -> Vec<f64> {
        let mut x = barycentric_to_cartesian(&tri::VERTICES, &natural[..3]);
        x.push(natural[3]);
        x
    }

    fn clamp(orbit: usize, args: &mut [f64]) {
        let (tri_orbit, lifted) = LAYOUT[orbit];
        match args.split_last_mut() {
            Some((axial, planar)) if lifted => {
                *axial = axial.clamp(0.0, 1.0);
                tri::clamp(tri_orbit, planar);
            }
            _ => tri::clamp(tri_orbit, args),
        }
    }

    fn seed<R: Rng + ?Sized>(orbit: usize, rng: &mut R, args: &mut [f64]) {
        let (tri_orbit, lifted) = LAYOUT[orbit];
        let planar = if lifted { args.len() - 1 } else { args.len() };
        tri::seed(tri_orbit, rng, &mut args[..planar]);
        if lifted {
            args[planar] = uniform(rng, 0.0, 1.0);
        }
    }

    fn basis_indices(degree: usize) -> Vec<[usize; 3]> {
        let mut out = Vec::new();
        for i in 0..=degree {
            for j in 0..=(degree - i) {
                for k in (0..=(degree - i - j)).step_by(2) {
                    out.push([i, j, k]);
                }
            }
        }
        out
    }

    fn eval_basis<T: Scalar>(degree: usize, indices: &[[usize; 3]], pt: &[T], out: &mut [T]) {
        let planar = tri::DubinerFamilies::new(degree, pt[0], pt[1]);
        let axial = legendre(degree, pt[2]);

        for (slot, &[i, j, k]) in out.iter_mut().zip(indices) {
            let c = (k as f64 + 0.5).sqrt();
            *slot = (planar.value(i, j) * axial[k]).scale(c);
        }
    }
}
