use crate::assembly::MomentProblem;
use crate::basis::BasisSet;
use crate::domain::DomainKind;
use crate::error::DomainError;
use nalgebra::{DMatrix, DVector};

/// A materialised fully symmetric cubature rule.
#[derive(Debug, Clone)]
pub struct QuadratureRule {
    pub domain: DomainKind,
    pub degree: usize,
    /// N×D matrix of points.
    pub points: DMatrix<f64>,
    /// One weight per point, shared within each orbit.
    pub weights: DVector<f64>,
    pub selection: Vec<usize>,
    /// Arguments of each chosen orbit in slot order.
    pub orbit_args: Vec<Vec<f64>>,
    pub orbit_weights: Vec<f64>,
    pub residual_norm: f64,
}

impl QuadratureRule {
    pub fn from_unknowns(
        problem: &MomentProblem,
        x: &[f64],
        residual_norm: f64,
    ) -> Result<Self, DomainError> {
        let (points, weights) = problem.expand(x)?;
        let orbit_args = problem
            .slots()
            .iter()
            .map(|slot| problem.slot_args(slot, x).to_vec())
            .collect();
        let orbit_weights = (0..problem.slots().len())
            .map(|s| x[problem.weight_index(s)])
            .collect();

        Ok(Self {
            domain: problem.domain().kind(),
            degree: problem.basis().degree(),
            points,
            weights,
            selection: problem.selection().to_vec(),
            orbit_args,
            orbit_weights,
            residual_norm,
        })
    }

    pub fn point_count(&self) -> usize {
        self.points.nrows()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.sum()
    }

    /// Orbit arguments followed by orbit weights.
    pub fn unknowns(&self) -> Vec<f64> {
        self.orbit_args
            .iter()
            .flatten()
            .chain(self.orbit_weights.iter())
            .cloned()
            .collect()
    }

    /// `Σ w ψ_m - ∫ψ_m` for every function of `basis`.
    pub fn moment_errors(&self, basis: &BasisSet, moment_scale: f64) -> Result<DVector<f64>, DomainError> {
        let values = basis.eval(&self.points)?;
        let mut errors = values.transpose() * &self.weights;
        if !errors.is_empty() {
            errors[0] -= moment_scale;
        }
        Ok(errors)
    }

    pub fn max_moment_error(&self, basis: &BasisSet, moment_scale: f64) -> Result<f64, DomainError> {
        Ok(self.moment_errors(basis, moment_scale)?.amax())
    }
}
