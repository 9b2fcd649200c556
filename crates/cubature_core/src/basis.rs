//! Orthonormal polynomial basis of a reference domain.

use crate::autodiff::Dual;
use crate::domain::Domain;
use crate::error::DomainError;
use nalgebra::DMatrix;

/// The basis functions that form the residual rows for one degree.
#[derive(Debug, Clone)]
pub struct BasisSet {
    domain: Domain,
    degree: usize,
    indices: Vec<[usize; 3]>,
}

impl BasisSet {
    pub fn new(domain: &Domain, degree: usize) -> Self {
        Self {
            domain: domain.clone(),
            degree,
            indices: domain.basis_indices(degree),
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of basis functions M.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[[usize; 3]] {
        &self.indices
    }

    /// Evaluates every basis function at one point.
    pub fn eval_point(&self, point: &[f64], out: &mut [f64]) {
        self.domain
            .eval_basis_point(self.degree, &self.indices, point, out);
    }

    /// Maps an N×D point matrix to the N×M matrix of basis values.
    pub fn eval(&self, points: &DMatrix<f64>) -> Result<DMatrix<f64>, DomainError> {
        let dim = self.domain.dimension();
        if points.ncols() != dim {
            return Err(DomainError::DimensionMismatch {
                domain: self.domain.name(),
                expected: dim,
                got: points.ncols(),
            });
        }

        let mut values = DMatrix::zeros(points.nrows(), self.len());
        let mut point = vec![0.0; dim];
        let mut row = vec![0.0; self.len()];
        for n in 0..points.nrows() {
            for (d, x) in point.iter_mut().enumerate() {
                *x = points[(n, d)];
            }
            self.eval_point(&point, &mut row);
            for (m, &v) in row.iter().enumerate() {
                values[(n, m)] = v;
            }
        }
        Ok(values)
    }

    /// Values and derivatives along `direction` of every basis function at
    /// `point`.
    pub fn eval_directional(&self, point: &[f64], direction: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let seeded: Vec<Dual> = point
            .iter()
            .zip(direction)
            .map(|(&x, &dx)| Dual::variable(x, dx))
            .collect();
        let mut out = vec![Dual::new(0.0, 0.0); self.len()];
        self.domain
            .eval_basis_point(self.degree, &self.indices, &seeded, &mut out);
        out.into_iter().map(|d| (d.val, d.eps)).unzip()
    }
}
