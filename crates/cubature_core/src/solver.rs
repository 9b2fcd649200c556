//! Damped least-squares solver for one seeded trial.
//!
//! A trial seeds the orbit arguments, fits the weights by linear least
//! squares and then runs Levenberg-Marquardt on the full unknown vector,
//! clamping the arguments back into their feasible regions after every step.
//! Every way a trial can end is a [`TrialStatus`]; only descriptor contract
//! violations surface as errors.

use crate::assembly::MomentProblem;
use crate::error::{DomainError, SearchError};
use crate::rule::QuadratureRule;
use anyhow::{anyhow, bail, Result};
use log::debug;
use nalgebra::linalg::SVD;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const DAMPING_SHRINK: f64 = 0.1;
const DAMPING_GROWTH: f64 = 10.0;
const MIN_DAMPING: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub max_iterations: usize,
    /// Residual norm at which a trial counts as converged.
    pub tolerance: f64,
    pub initial_damping: f64,
    pub max_damping: f64,
    /// Consecutive iterations without a relative decrease of `stall_ratio`
    /// before the trial is abandoned.
    pub stall_iterations: usize,
    pub stall_ratio: f64,
    pub require_positive_weights: bool,
    /// Points closer than this make a converged rule infeasible.
    pub min_point_separation: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-12,
            initial_damping: 1e-3,
            max_damping: 1e10,
            stall_iterations: 15,
            stall_ratio: 1e-3,
            require_positive_weights: true,
            min_point_separation: 1e-6,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), SearchError> {
        let invalid = |msg: &str| Err(SearchError::InvalidSettings(msg.to_string()));
        if self.max_iterations == 0 {
            return invalid("max_iterations must be greater than zero.");
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return invalid("tolerance must be positive.");
        }
        if !(self.initial_damping > 0.0) {
            return invalid("initial_damping must be positive.");
        }
        if !(self.max_damping > self.initial_damping) {
            return invalid("max_damping must exceed initial_damping.");
        }
        if self.stall_iterations == 0 {
            return invalid("stall_iterations must be greater than zero.");
        }
        if !(0.0..1.0).contains(&self.stall_ratio) {
            return invalid("stall_ratio must lie in [0, 1).");
        }
        if !(self.min_point_separation >= 0.0) {
            return invalid("min_point_separation must be non-negative.");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrialStatus {
    Converged,
    Stalled,
    Diverged,
    BudgetExhausted,
    Cancelled,
    /// The residual vanished but the rule has a non-positive weight or two
    /// coincident points.
    Infeasible,
}

#[derive(Debug, Clone)]
pub struct TrialReport {
    pub status: TrialStatus,
    pub iterations: usize,
    pub residual_norm: f64,
    /// Final unknown vector, arguments followed by weights.
    pub unknowns: Vec<f64>,
}

impl TrialReport {
    pub fn converged(&self) -> bool {
        self.status == TrialStatus::Converged
    }
}

/// Cooperative cancellation flag with an optional wall-clock deadline,
/// checked between solver iterations.
#[derive(Debug, Default)]
pub struct CancelToken {
    flag: AtomicBool,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(limit: Duration) -> Self {
        Self {
            flag: AtomicBool::new(false),
            deadline: Instant::now().checked_add(limit),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.cancel();
                true
            }
            _ => false,
        }
    }
}

/// Seeds the unknowns from `rng` and solves.
pub fn run_trial<R: Rng + ?Sized>(
    problem: &MomentProblem,
    rng: &mut R,
    settings: &SolverSettings,
    cancel: &CancelToken,
) -> Result<TrialReport, DomainError> {
    let mut x = vec![0.0; problem.unknown_count()];
    problem.seed(rng, &mut x)?;
    problem.clamp(&mut x)?;

    let weights = match least_squares_weights(problem, &x) {
        Ok(weights) => weights,
        Err(err) => {
            debug!("Falling back to uniform weights: {:#}", err);
            uniform_weights(problem)
        }
    };
    for (s, w) in weights.iter().enumerate() {
        x[problem.weight_index(s)] = *w;
    }

    levenberg_marquardt(problem, x, settings, cancel)
}

/// Restarts the solver from an existing rule built on the same selection.
pub fn polish(
    problem: &MomentProblem,
    rule: &QuadratureRule,
    settings: &SolverSettings,
    cancel: &CancelToken,
) -> Result<TrialReport, DomainError> {
    let expected_domain = problem.domain().kind();
    if rule.domain != expected_domain || rule.selection != problem.selection() {
        return Err(DomainError::RuleMismatch {
            expected_domain,
            expected: problem.selection().to_vec(),
            got_domain: rule.domain,
            got: rule.selection.clone(),
        });
    }
    let x = rule.unknowns();
    problem.check_unknowns(&x)?;
    levenberg_marquardt(problem, x, settings, cancel)
}

enum Step {
    Accepted {
        x: Vec<f64>,
        residual: DVector<f64>,
        norm: f64,
    },
    /// Every factorisable damping level increased the residual.
    Rejected,
    /// The normal matrix never factorised up to `max_damping`.
    Singular,
}

fn levenberg_marquardt(
    problem: &MomentProblem,
    mut x: Vec<f64>,
    settings: &SolverSettings,
    cancel: &CancelToken,
) -> Result<TrialReport, DomainError> {
    let mut residual = problem.residual(&x)?;
    let mut norm = residual.norm();
    let mut lambda = settings.initial_damping;
    let mut reference = norm;
    let mut stalled_for = 0usize;
    let mut iterations = 0usize;

    let status = loop {
        if !norm.is_finite() {
            break TrialStatus::Diverged;
        }
        if norm <= settings.tolerance {
            break feasibility(problem, &x, settings)?;
        }
        if cancel.is_cancelled() {
            break TrialStatus::Cancelled;
        }
        if iterations >= settings.max_iterations {
            break TrialStatus::BudgetExhausted;
        }
        iterations += 1;

        let jacobian = problem.jacobian(&x)?;
        match damped_step(problem, &x, &residual, norm, &jacobian, &mut lambda, settings)? {
            Step::Accepted {
                x: next,
                residual: next_residual,
                norm: next_norm,
            } => {
                x = next;
                residual = next_residual;
                norm = next_norm;
            }
            Step::Rejected => break TrialStatus::Stalled,
            Step::Singular => break TrialStatus::Diverged,
        }

        if norm < reference * (1.0 - settings.stall_ratio) {
            reference = norm;
            stalled_for = 0;
        } else if norm > settings.tolerance {
            stalled_for += 1;
            if stalled_for >= settings.stall_iterations {
                break TrialStatus::Stalled;
            }
        }
    };

    debug!(
        "Trial ended {:?} after {} iterations (|r| = {:.3e}).",
        status, iterations, norm
    );

    Ok(TrialReport {
        status,
        iterations,
        residual_norm: norm,
        unknowns: x,
    })
}

fn damped_step(
    problem: &MomentProblem,
    x: &[f64],
    residual: &DVector<f64>,
    norm: f64,
    jacobian: &DMatrix<f64>,
    lambda: &mut f64,
    settings: &SolverSettings,
) -> Result<Step, DomainError> {
    let jt = jacobian.transpose();
    let normal = &jt * jacobian;
    let gradient = &jt * residual;
    let mut factorised = false;

    while *lambda <= settings.max_damping {
        let delta = match solve_damped(&normal, &gradient, *lambda) {
            Ok(delta) => delta,
            Err(err) => {
                debug!("{:#}", err);
                *lambda *= DAMPING_GROWTH;
                continue;
            }
        };
        factorised = true;

        let mut trial: Vec<f64> = x.iter().zip(delta.iter()).map(|(a, d)| a + d).collect();
        problem.clamp(&mut trial)?;
        let trial_residual = problem.residual(&trial)?;
        let trial_norm = trial_residual.norm();

        if trial_norm.is_finite() && trial_norm < norm {
            *lambda = (*lambda * DAMPING_SHRINK).max(MIN_DAMPING);
            return Ok(Step::Accepted {
                x: trial,
                residual: trial_residual,
                norm: trial_norm,
            });
        }
        *lambda *= DAMPING_GROWTH;
    }

    Ok(if factorised {
        Step::Rejected
    } else {
        Step::Singular
    })
}

/// Solves `(JᵀJ + λI) δ = -Jᵀr`.
fn solve_damped(normal: &DMatrix<f64>, gradient: &DVector<f64>, lambda: f64) -> Result<DVector<f64>> {
    let n = normal.nrows();
    let damped = normal + DMatrix::identity(n, n) * lambda;
    let Some(cholesky) = damped.cholesky() else {
        bail!("Normal matrix is not positive definite at damping {:.1e}.", lambda);
    };
    let delta = -cholesky.solve(gradient);
    if delta.iter().any(|v| !v.is_finite()) {
        bail!("Damped step is not finite at damping {:.1e}.", lambda);
    }
    Ok(delta)
}

/// Least-squares orbit weights for the current arguments.
fn least_squares_weights(problem: &MomentProblem, x: &[f64]) -> Result<DVector<f64>> {
    let sums = problem.orbit_sums(x)?;
    let svd = SVD::new(sums, true, true);
    let weights = svd
        .solve(problem.target(), 1e-12)
        .map_err(|msg| anyhow!("SVD least-squares solve failed: {}", msg))?;
    if weights.iter().any(|w| !w.is_finite()) {
        bail!("Least-squares weights are not finite.");
    }
    Ok(weights)
}

/// Spreads the domain volume evenly over every point.
fn uniform_weights(problem: &MomentProblem) -> DVector<f64> {
    let w = problem.domain().volume() / problem.point_count().max(1) as f64;
    DVector::from_element(problem.slots().len(), w)
}

fn feasibility(
    problem: &MomentProblem,
    x: &[f64],
    settings: &SolverSettings,
) -> Result<TrialStatus, DomainError> {
    let (points, weights) = problem.expand(x)?;
    if settings.require_positive_weights && weights.iter().any(|&w| w <= 0.0) {
        return Ok(TrialStatus::Infeasible);
    }
    for a in 0..points.nrows() {
        for b in (a + 1)..points.nrows() {
            if (points.row(a) - points.row(b)).norm() < settings.min_point_separation {
                return Ok(TrialStatus::Infeasible);
            }
        }
    }
    Ok(TrialStatus::Converged)
}
