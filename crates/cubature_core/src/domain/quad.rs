//! Quadrilateral `[-1, 1]^2` with the dihedral group of the square.

use super::symmetry::{signed_permutations, SignedPerm};
use super::{uniform, OrbitGenerator, Shape};
use crate::jacobi::legendre;
use crate::traits::Scalar;
use rand::Rng;

pub(crate) struct Quadrilateral;

impl Shape for Quadrilateral {
    const NAME: &'static str = "quad";
    const DIM: usize = 2;
    const VOLUME: f64 = 4.0;
    const ORBITS: &'static [(usize, usize)] = &[
        (1, 0), // centroid
        (4, 1), // (a, 0)
        (4, 1), // (a, a)
        (8, 2), // (a, b)
    ];
    const INVARIANT_DEGREES: &'static [usize] = &[2, 4];

    fn group() -> Vec<SignedPerm> {
        signed_permutations(2)
    }

    fn generator(orbit: usize) -> OrbitGenerator {
        match orbit {
            0 => OrbitGenerator::fixed(&[0.0, 0.0]),
            1 => OrbitGenerator::new(&[0.0; 2], &[&[1.0, 0.0]]),
            2 => OrbitGenerator::new(&[0.0; 2], &[&[1.0, 1.0]]),
            3 => OrbitGenerator::new(&[0.0; 2], &[&[1.0, 0.0], &[0.0, 1.0]]),
            _ => unreachable!("quad orbit {} not in table", orbit),
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
                out.push([i, j, 0]);
            }
        }
        out
    }

    fn eval_basis<T: Scalar>(degree: usize, indices: &[[usize; 3]], pt: &[T], out: &mut [T]) {
        let lp = legendre(degree, pt[0]);
        let lq = legendre(degree, pt[1]);

        for (slot, &[i, j, _]) in out.iter_mut().zip(indices) {
            let c = ((i as f64 + 0.5) * (j as f64 + 0.5)).sqrt();
            *slot = (lp[i] * lq[j]).scale(c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{assert_closed_under, assert_inside, expanded_orbits};
    use super::super::{Domain, DomainKind};

    #[test]
    fn basis_count_counts_even_sorted_pairs() {
        let domain = Domain::new(DomainKind::Quadrilateral);
        let expected = [1, 1, 2, 2, 4, 4, 6, 6, 9];
        for (degree, &n) in expected.iter().enumerate() {
            assert_eq!(domain.basis_count(degree), n, "degree {}", degree);
        }
    }

    #[test]
    fn orbits_are_closed_under_square_generators() {
        for (_, pts) in expanded_orbits(DomainKind::Quadrilateral, 4) {
            assert_closed_under(&pts, |x| vec![-x[0], x[1]]);
            assert_closed_under(&pts, |x| vec![x[1], x[0]]);
            assert_inside(&pts, |x| x.iter().all(|c| c.abs() <= 1.0));
        }
    }

    #[test]
    fn diagonal_orbit_hits_corners_at_unit_argument() {
        let domain = Domain::new(DomainKind::Quadrilateral);
        let mut pts = nalgebra::DMatrix::zeros(4, 2);
        domain
            .expand_orbit(2, &[1.0], 0, &mut pts)
            .expect("expansion should succeed");
        assert!(pts.iter().all(|v| v.abs() == 1.0));
    }
}
