//! Moment equations for a fixed orbit selection.
//!
//! The unknown vector holds the arguments of every chosen orbit, in slot
//! order, followed by one weight per chosen orbit. Row `m` of the residual is
//! `Σ_s w_s Σ_images ψ_m(x) - ∫ψ_m`.

use crate::basis::BasisSet;
use crate::domain::Domain;
use crate::error::DomainError;
use nalgebra::{DMatrix, DVector};
use rand::Rng;

/// One chosen orbit inside the unknown vector and the point matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub orbit: usize,
    pub args: usize,
    pub arg_offset: usize,
    pub points: usize,
    pub point_offset: usize,
}

pub struct MomentProblem<'a> {
    domain: &'a Domain,
    basis: &'a BasisSet,
    selection: Vec<usize>,
    slots: Vec<Slot>,
    arg_total: usize,
    point_total: usize,
    target: DVector<f64>,
}

impl<'a> MomentProblem<'a> {
    pub fn new(
        domain: &'a Domain,
        basis: &'a BasisSet,
        selection: &[usize],
    ) -> Result<Self, DomainError> {
        if selection.len() != domain.orbit_types() {
            return Err(DomainError::SelectionLengthMismatch {
                domain: domain.name(),
                expected: domain.orbit_types(),
                got: selection.len(),
            });
        }
        if !domain.validate_orbit_selection(selection)? {
            return Err(DomainError::InadmissibleSelection {
                domain: domain.name(),
                selection: selection.to_vec(),
            });
        }

        let mut slots = Vec::new();
        let mut arg_offset = 0;
        let mut point_offset = 0;
        for (orbit, &count) in selection.iter().enumerate() {
            let args = domain.arg_count(orbit)?;
            let points = domain.point_count(orbit)?;
            for _ in 0..count {
                slots.push(Slot {
                    orbit,
                    args,
                    arg_offset,
                    points,
                    point_offset,
                });
                arg_offset += args;
                point_offset += points;
            }
        }

        let mut target = DVector::zeros(basis.len());
        if !target.is_empty() {
            target[0] = domain.moment_scale();
        }

        Ok(Self {
            domain,
            basis,
            selection: selection.to_vec(),
            slots,
            arg_total: arg_offset,
            point_total: point_offset,
            target,
        })
    }

    pub fn domain(&self) -> &Domain {
        self.domain
    }

    pub fn basis(&self) -> &BasisSet {
        self.basis
    }

    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Total number of points N of the expanded rule.
    pub fn point_count(&self) -> usize {
        self.point_total
    }

    pub fn unknown_count(&self) -> usize {
        self.arg_total + self.slots.len()
    }

    pub fn residual_count(&self) -> usize {
        self.basis.len()
    }

    pub fn target(&self) -> &DVector<f64> {
        &self.target
    }

    /// Position of the weight of `slot` in the unknown vector.
    pub fn weight_index(&self, slot: usize) -> usize {
        self.arg_total + slot
    }

    pub fn slot_args<'x>(&self, slot: &Slot, x: &'x [f64]) -> &'x [f64] {
        &x[slot.arg_offset..slot.arg_offset + slot.args]
    }

    pub fn check_unknowns(&self, x: &[f64]) -> Result<(), DomainError> {
        if x.len() != self.unknown_count() {
            return Err(DomainError::UnknownLengthMismatch {
                expected: self.unknown_count(),
                got: x.len(),
            });
        }
        Ok(())
    }

    /// Draws fresh orbit arguments for every slot; weights are left alone.
    pub fn seed<R: Rng + ?Sized>(&self, rng: &mut R, x: &mut [f64]) -> Result<(), DomainError> {
        self.check_unknowns(x)?;
        for slot in &self.slots {
            let args = &mut x[slot.arg_offset..slot.arg_offset + slot.args];
            self.domain.seed_orbit(slot.orbit, rng, args)?;
        }
        Ok(())
    }

    /// Projects every slot's arguments into its feasible region.
    pub fn clamp(&self, x: &mut [f64]) -> Result<(), DomainError> {
        self.check_unknowns(x)?;
        for slot in &self.slots {
            let args = &mut x[slot.arg_offset..slot.arg_offset + slot.args];
            self.domain.clamp_args(slot.orbit, args)?;
        }
        self.check_selection()
    }

    /// Re-runs the domain's admissibility rule on the held selection.
    pub fn check_selection(&self) -> Result<(), DomainError> {
        if self.domain.validate_orbit_selection(&self.selection)? {
            Ok(())
        } else {
            Err(DomainError::InadmissibleSelection {
                domain: self.domain.name(),
                selection: self.selection.clone(),
            })
        }
    }

    /// M×S matrix whose column `s` sums every basis function over the
    /// images of slot `s`.
    pub fn orbit_sums(&self, x: &[f64]) -> Result<DMatrix<f64>, DomainError> {
        self.check_unknowns(x)?;
        let m = self.basis.len();
        let mut sums = DMatrix::zeros(m, self.slots.len());
        let mut psi = vec![0.0; m];
        for (s, slot) in self.slots.iter().enumerate() {
            let args = self.slot_args(slot, x);
            for image in self.domain.orbit_images(slot.orbit)? {
                let point = image.point(args);
                self.basis.eval_point(point.as_slice(), &mut psi);
                for (row, &v) in psi.iter().enumerate() {
                    sums[(row, s)] += v;
                }
            }
        }
        Ok(sums)
    }

    pub fn weights(&self, x: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(&x[self.arg_total..])
    }

    pub fn residual(&self, x: &[f64]) -> Result<DVector<f64>, DomainError> {
        let sums = self.orbit_sums(x)?;
        Ok(sums * self.weights(x) - &self.target)
    }

    /// M×U derivative of the residual with respect to the unknowns.
    pub fn jacobian(&self, x: &[f64]) -> Result<DMatrix<f64>, DomainError> {
        self.check_unknowns(x)?;
        let m = self.basis.len();
        let mut jac = DMatrix::zeros(m, self.unknown_count());

        for (s, slot) in self.slots.iter().enumerate() {
            let args = self.slot_args(slot, x);
            let weight = x[self.weight_index(s)];
            let weight_col = self.weight_index(s);

            for image in self.domain.orbit_images(slot.orbit)? {
                let point = image.point(args);
                if slot.args == 0 {
                    let mut psi = vec![0.0; m];
                    self.basis.eval_point(point.as_slice(), &mut psi);
                    for (row, &v) in psi.iter().enumerate() {
                        jac[(row, weight_col)] += v;
                    }
                    continue;
                }

                for k in 0..slot.args {
                    let direction: Vec<f64> = image.jacobian.column(k).iter().cloned().collect();
                    let (values, derivs) = self.basis.eval_directional(point.as_slice(), &direction);
                    let col = slot.arg_offset + k;
                    for row in 0..m {
                        jac[(row, col)] += weight * derivs[row];
                        if k == 0 {
                            jac[(row, weight_col)] += values[row];
                        }
                    }
                }
            }
        }
        Ok(jac)
    }

    /// The N×D point matrix and length-N weight vector described by `x`.
    pub fn expand(&self, x: &[f64]) -> Result<(DMatrix<f64>, DVector<f64>), DomainError> {
        self.check_unknowns(x)?;
        let mut points = DMatrix::zeros(self.point_total, self.domain.dimension());
        let mut weights = DVector::zeros(self.point_total);
        for (s, slot) in self.slots.iter().enumerate() {
            self.domain
                .expand_orbit(slot.orbit, self.slot_args(slot, x), slot.point_offset, &mut points)?;
            weights
                .rows_mut(slot.point_offset, slot.points)
                .fill(x[self.weight_index(s)]);
        }
        Ok((points, weights))
    }
}
