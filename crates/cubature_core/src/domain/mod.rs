//! Reference domains and their symmetry orbits.
//!
//! Each shape supplies compiled-in data (orbit sizes, affine orbit
//! generators in natural coordinates, its symmetry group, feasible argument
//! regions and an orthonormal basis). `Domain::new` applies the group to the
//! generators once and stores every image as an affine map of the orbit
//! arguments, so expansion and its derivative are table lookups afterwards.

pub mod symmetry;

mod hex;
mod prism;
mod pyramid;
mod quad;
mod tet;
mod tri;

use crate::error::DomainError;
use crate::traits::Scalar;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use serde::{Deserialize, Serialize};
use symmetry::SignedPerm;

/// The closed set of supported reference shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainKind {
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
    Prism,
    Pyramid,
}

impl DomainKind {
    pub const ALL: [DomainKind; 6] = [
        DomainKind::Triangle,
        DomainKind::Quadrilateral,
        DomainKind::Tetrahedron,
        DomainKind::Hexahedron,
        DomainKind::Prism,
        DomainKind::Pyramid,
    ];
}

/// Runs `$body` with `$S` bound to the shape type behind `$kind`.
macro_rules! with_shape {
    ($kind:expr, $S:ident => $body:expr) => {
        match $kind {
            DomainKind::Triangle => {
                type $S = tri::Triangle;
                $body
            }
            DomainKind::Quadrilateral => {
                type $S = quad::Quadrilateral;
                $body
            }
            DomainKind::Tetrahedron => {
                type $S = tet::Tetrahedron;
                $body
            }
            DomainKind::Hexahedron => {
                type $S = hex::Hexahedron;
                $body
            }
            DomainKind::Prism => {
                type $S = prism::Prism;
                $body
            }
            DomainKind::Pyramid => {
                type $S = pyramid::Pyramid;
                $body
            }
        }
    };
}

/// Affine orbit generator in natural coordinates:
/// `natural = offset + Σ args[k] * directions[k]`.
#[derive(Debug, Clone)]
pub(crate) struct OrbitGenerator {
    pub offset: Vec<f64>,
    pub directions: Vec<Vec<f64>>,
}

impl OrbitGenerator {
    pub fn fixed(offset: &[f64]) -> Self {
        Self {
            offset: offset.to_vec(),
            directions: Vec::new(),
        }
    }

    pub fn new(offset: &[f64], directions: &[&[f64]]) -> Self {
        Self {
            offset: offset.to_vec(),
            directions: directions.iter().map(|d| d.to_vec()).collect(),
        }
    }
}

/// Compiled-in description of one reference shape.
pub(crate) trait Shape {
    const NAME: &'static str;
    const DIM: usize;
    const VOLUME: f64;
    /// `(points, args)` for each orbit type.
    const ORBITS: &'static [(usize, usize)];
    /// Degrees of the basic invariants of the symmetry group.
    const INVARIANT_DEGREES: &'static [usize];

    /// Symmetry group acting on natural coordinates.
    fn group() -> Vec<SignedPerm>;

    fn generator(orbit: usize) -> OrbitGenerator;

    /// Linear map from natural to Cartesian coordinates.
    fn to_cartesian(natural: &[f64]) -> Vec<f64>;

    /// Projects `args` into the feasible region of `orbit`.
    fn clamp(orbit: usize, args: &mut [f64]);

    /// Draws `args` uniformly over the feasible region of `orbit`.
    fn seed<R: Rng + ?Sized>(orbit: usize, rng: &mut R, args: &mut [f64]);

    /// Multi-indices of the residual rows up to `degree`, `[0, 0, 0]` first.
    fn basis_indices(degree: usize) -> Vec<[usize; 3]>;

    /// Evaluates the basis functions listed in `indices` at `pt`.
    fn eval_basis<T: Scalar>(degree: usize, indices: &[[usize; 3]], pt: &[T], out: &mut [T]);

    /// Zero-argument orbits sit at a fixed point and may appear once.
    fn validate(selection: &[usize]) -> bool {
        selection.iter().any(|&n| n > 0)
            && Self::ORBITS
                .iter()
                .zip(selection)
                .all(|(&(_, args), &n)| args > 0 || n <= 1)
    }
}

/// One symmetry image of an orbit: `x = offset + jacobian * args`.
#[derive(Debug, Clone)]
pub struct OrbitImage {
    pub offset: DVector<f64>,
    pub jacobian: DMatrix<f64>,
}

impl OrbitImage {
    pub fn point(&self, args: &[f64]) -> DVector<f64> {
        &self.offset + &self.jacobian * DVector::from_column_slice(args)
    }

    fn same_map(&self, other: &OrbitImage) -> bool {
        const TOL: f64 = 1e-12;
        (&self.offset - &other.offset).amax() < TOL
            && (self.jacobian.ncols() == 0 || (&self.jacobian - &other.jacobian).amax() < TOL)
    }
}

#[derive(Debug, Clone)]
struct OrbitTable {
    points: usize,
    args: usize,
    images: Vec<OrbitImage>,
}

/// An immutable reference domain descriptor.
#[derive(Debug, Clone)]
pub struct Domain {
    kind: DomainKind,
    orbits: Vec<OrbitTable>,
}

impl Domain {
    pub fn new(kind: DomainKind) -> Self {
        let orbits = with_shape!(kind, S => build_tables::<S>());
        Self { kind, orbits }
    }

    pub fn kind(&self) -> DomainKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        with_shape!(self.kind, S => S::NAME)
    }

    pub fn dimension(&self) -> usize {
        with_shape!(self.kind, S => S::DIM)
    }

    pub fn volume(&self) -> f64 {
        with_shape!(self.kind, S => S::VOLUME)
    }

    /// Exact integral of the zeroth orthonormal basis function.
    pub fn moment_scale(&self) -> f64 {
        self.volume().sqrt()
    }

    /// Number of orbit types K.
    pub fn orbit_types(&self) -> usize {
        self.orbits.len()
    }

    pub fn point_count(&self, orbit: usize) -> Result<usize, DomainError> {
        Ok(self.table(orbit)?.points)
    }

    pub fn arg_count(&self, orbit: usize) -> Result<usize, DomainError> {
        Ok(self.table(orbit)?.args)
    }

    /// Number of residual rows used up to `degree`.
    pub fn basis_count(&self, degree: usize) -> usize {
        self.basis_indices(degree).len()
    }

    pub fn basis_indices(&self, degree: usize) -> Vec<[usize; 3]> {
        with_shape!(self.kind, S => S::basis_indices(degree))
    }

    /// Number of independent moment equations a fully symmetric rule of
    /// `degree` must satisfy: monomials in the basic invariants.
    pub fn constraint_count(&self, degree: usize) -> usize {
        let degrees = with_shape!(self.kind, S => S::INVARIANT_DEGREES);
        // ways[t] = number of invariant monomials of degree exactly t
        let mut ways = vec![0usize; degree + 1];
        ways[0] = 1;
        for &g in degrees {
            for t in g..=degree {
                ways[t] += ways[t - g];
            }
        }
        ways.iter().sum()
    }

    /// Symmetry images of `orbit`, each an affine map of its arguments.
    pub fn orbit_images(&self, orbit: usize) -> Result<&[OrbitImage], DomainError> {
        Ok(&self.table(orbit)?.images)
    }

    /// Writes the `point_count(orbit)` images of `args` into rows
    /// `point_offset..` of the N×D matrix `out`.
    pub fn expand_orbit(
        &self,
        orbit: usize,
        args: &[f64],
        point_offset: usize,
        out: &mut DMatrix<f64>,
    ) -> Result<(), DomainError> {
        let table = self.table(orbit)?;
        check_args(orbit, table, args)?;
        if out.ncols() != self.dimension() {
            return Err(DomainError::DimensionMismatch {
                domain: self.name(),
                expected: self.dimension(),
                got: out.ncols(),
            });
        }
        let end = point_offset + table.points;
        if end > out.nrows() {
            return Err(DomainError::PointRangeOverflow {
                orbit,
                offset: point_offset,
                end,
                rows: out.nrows(),
            });
        }

        for (row, image) in table.images.iter().enumerate() {
            let x = image.point(args);
            out.row_mut(point_offset + row).copy_from(&x.transpose());
        }
        Ok(())
    }

    pub fn seed_orbit<R: Rng + ?Sized>(
        &self,
        orbit: usize,
        rng: &mut R,
        args: &mut [f64],
    ) -> Result<(), DomainError> {
        let table = self.table(orbit)?;
        check_args(orbit, table, args)?;
        with_shape!(self.kind, S => S::seed(orbit, rng, args));
        Ok(())
    }

    pub fn clamp_args(&self, orbit: usize, args: &mut [f64]) -> Result<(), DomainError> {
        let table = self.table(orbit)?;
        check_args(orbit, table, args)?;
        with_shape!(self.kind, S => S::clamp(orbit, args));
        Ok(())
    }

    /// Whether an orbit-multiplicity vector may be attempted at all.
    pub fn validate_orbit_selection(&self, selection: &[usize]) -> Result<bool, DomainError> {
        if selection.len() != self.orbits.len() {
            return Err(DomainError::SelectionLengthMismatch {
                domain: self.name(),
                expected: self.orbits.len(),
                got: selection.len(),
            });
        }
        Ok(with_shape!(self.kind, S => S::validate(selection)))
    }

    pub(crate) fn eval_basis_point<T: Scalar>(
        &self,
        degree: usize,
        indices: &[[usize; 3]],
        pt: &[T],
        out: &mut [T],
    ) {
        with_shape!(self.kind, S => S::eval_basis(degree, indices, pt, out))
    }

    fn table(&self, orbit: usize) -> Result<&OrbitTable, DomainError> {
        self.orbits
            .get(orbit)
            .ok_or_else(|| DomainError::OrbitOutOfRange {
                domain: self.name(),
                orbit,
                count: self.orbits.len(),
            })
    }
}

fn check_args(orbit: usize, table: &OrbitTable, args: &[f64]) -> Result<(), DomainError> {
    if args.len() != table.args {
        return Err(DomainError::ArgCountMismatch {
            orbit,
            expected: table.args,
            got: args.len(),
        });
    }
    Ok(())
}

fn build_tables<S: Shape>() -> Vec<OrbitTable> {
    let group = S::group();
    S::ORBITS
        .iter()
        .enumerate()
        .map(|(orbit, &(points, args))| {
            let generator = S::generator(orbit);
            debug_assert_eq!(generator.directions.len(), args);

            let mut images: Vec<OrbitImage> = Vec::with_capacity(points);
            for g in &group {
                let offset = S::to_cartesian(&g.apply(&generator.offset));
                let mut jacobian = DMatrix::zeros(S::DIM, args);
                for (k, dir) in generator.directions.iter().enumerate() {
                    let column = S::to_cartesian(&g.apply(dir));
                    for (d, value) in column.into_iter().enumerate() {
                        jacobian[(d, k)] = value;
                    }
                }
                let image = OrbitImage {
                    offset: DVector::from_vec(offset),
                    jacobian,
                };
                if !images.iter().any(|known| known.same_map(&image)) {
                    images.push(image);
                }
            }
            debug_assert_eq!(images.len(), points, "{} orbit {}", S::NAME, orbit);

            OrbitTable {
                points,
                args,
                images,
            }
        })
        .collect()
}

/// Uniform draw on `[lo, hi]`.
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.gen::<f64>()
}

/// Barycentric coordinates to Cartesian via the given vertices.
pub(crate) fn barycentric_to_cartesian(vertices: &[&[f64]], lambda: &[f64]) -> Vec<f64> {
    let dim = vertices[0].len();
    let mut x = vec![0.0; dim];
    for (v, &l) in vertices.iter().zip(lambda) {
        for d in 0..dim {
            x[d] += l * v[d];
        }
    }
    x
}
