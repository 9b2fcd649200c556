//! Search over orbit selections for the smallest rule of a given degree.
//!
//! Candidate selections are grouped by total point count and the levels are
//! tried in ascending order. Inside a level every `(selection, trial)` pair is
//! an independent job; the accepted rule is the converged job with the
//! smallest `(selection index, trial index)` key, so the result does not
//! depend on how the jobs were scheduled.

use crate::assembly::MomentProblem;
use crate::basis::BasisSet;
use crate::domain::Domain;
use crate::error::{DomainError, SearchError};
use crate::rule::QuadratureRule;
use crate::solver::{run_trial, CancelToken, SolverSettings};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub min_points: usize,
    pub max_points: usize,
    pub trials_per_selection: usize,
    pub base_seed: u64,
    pub parallel: bool,
    /// Wall-clock budget for the whole search.
    pub time_limit_secs: Option<f64>,
    pub solver: SolverSettings,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_points: 1,
            max_points: 64,
            trials_per_selection: 8,
            base_seed: 0x5eed,
            parallel: true,
            time_limit_secs: None,
            solver: SolverSettings::default(),
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.min_points > self.max_points {
            return Err(SearchError::InvalidSettings(format!(
                "min_points ({}) exceeds max_points ({}).",
                self.min_points, self.max_points
            )));
        }
        if self.trials_per_selection == 0 {
            return Err(SearchError::InvalidSettings(
                "trials_per_selection must be greater than zero.".to_string(),
            ));
        }
        self.time_limit()?;
        self.solver.validate()
    }

    /// The wall-clock budget as a `Duration`, if one is set.
    pub fn time_limit(&self) -> Result<Option<Duration>, SearchError> {
        let Some(limit) = self.time_limit_secs else {
            return Ok(None);
        };
        if !(limit > 0.0 && limit.is_finite()) {
            return Err(SearchError::InvalidSettings(
                "time_limit_secs must be positive.".to_string(),
            ));
        }
        Duration::try_from_secs_f64(limit)
            .map(Some)
            .map_err(|e| SearchError::InvalidSettings(format!("time_limit_secs ({limit}): {e}.")))
    }
}

/// An orbit selection admitted to the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub selection: Vec<usize>,
    pub points: usize,
    pub unknowns: usize,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub rule: QuadratureRule,
    /// Index of the winning selection in the candidate order.
    pub selection_index: usize,
    pub trial_index: usize,
    pub trials_run: usize,
}

/// Valid selections with `min_points..=max_points` points and at least as
/// many unknowns as independent moment equations, ordered by point count,
/// then unknown count, then lexicographically.
pub fn enumerate_selections(
    domain: &Domain,
    degree: usize,
    min_points: usize,
    max_points: usize,
) -> Result<Vec<Candidate>, DomainError> {
    let sizes = (0..domain.orbit_types())
        .map(|orbit| domain.point_count(orbit))
        .collect::<Result<Vec<_>, _>>()?;
    let args = (0..domain.orbit_types())
        .map(|orbit| domain.arg_count(orbit))
        .collect::<Result<Vec<_>, _>>()?;
    let needed = domain.constraint_count(degree);

    let mut all = Vec::new();
    let mut current = vec![0; sizes.len()];
    fill_selections(&sizes, 0, 0, max_points, &mut current, &mut all);

    let mut candidates = Vec::new();
    for selection in all {
        let points: usize = selection.iter().zip(&sizes).map(|(n, p)| n * p).sum();
        let unknowns: usize = selection.iter().zip(&args).map(|(n, a)| n * (a + 1)).sum();
        if points < min_points || unknowns < needed {
            continue;
        }
        if !domain.validate_orbit_selection(&selection)? {
            continue;
        }
        candidates.push(Candidate {
            selection,
            points,
            unknowns,
        });
    }
    candidates.sort_by(|a, b| {
        (a.points, a.unknowns, &a.selection).cmp(&(b.points, b.unknowns, &b.selection))
    });
    Ok(candidates)
}

fn fill_selections(
    sizes: &[usize],
    orbit: usize,
    used: usize,
    max_points: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if orbit == sizes.len() {
        out.push(current.clone());
        return;
    }
    let mut count = 0;
    while used + count * sizes[orbit] <= max_points {
        current[orbit] = count;
        fill_selections(sizes, orbit + 1, used + count * sizes[orbit], max_points, current, out);
        count += 1;
    }
    current[orbit] = 0;
}

/// Per-trial random stream seed; depends only on its three inputs.
pub fn trial_seed(base_seed: u64, selection_index: usize, trial_index: usize) -> u64 {
    let z = splitmix64(base_seed);
    let z = splitmix64(z ^ selection_index as u64);
    splitmix64(z ^ (trial_index as u64).rotate_left(32))
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

pub fn find_rule(
    domain: &Domain,
    degree: usize,
    settings: &SearchSettings,
) -> Result<SearchOutcome, SearchError> {
    settings.validate()?;
    let cancel = match settings.time_limit()? {
        Some(limit) => CancelToken::with_deadline(limit),
        None => CancelToken::new(),
    };
    find_rule_with_cancel(domain, degree, settings, &cancel)
}

/// Like [`find_rule`], observing an external cancellation token as well.
pub fn find_rule_with_cancel(
    domain: &Domain,
    degree: usize,
    settings: &SearchSettings,
    cancel: &CancelToken,
) -> Result<SearchOutcome, SearchError> {
    settings.validate()?;
    let basis = BasisSet::new(domain, degree);
    let candidates =
        enumerate_selections(domain, degree, settings.min_points, settings.max_points)?;
    info!(
        "Searching {} for a degree {} rule: {} candidate selections, {} moment equations.",
        domain.name(),
        degree,
        candidates.len(),
        domain.constraint_count(degree)
    );

    let trials_run = AtomicUsize::new(0);
    let mut start = 0;
    while start < candidates.len() {
        let points = candidates[start].points;
        let end = start
            + candidates[start..]
                .iter()
                .take_while(|c| c.points == points)
                .count();
        info!("Trying {} points ({} selections).", points, end - start);

        let found = run_level(domain, &basis, &candidates, start..end, settings, cancel, &trials_run)?;
        if let Some(best) = found {
            let (selection_index, trial_index) = best.key;
            info!(
                "Found {}-point rule with selection {:?} (trial {}, |r| = {:.3e}).",
                best.rule.point_count(),
                best.rule.selection,
                trial_index,
                best.rule.residual_norm
            );
            return Ok(SearchOutcome {
                rule: best.rule,
                selection_index,
                trial_index,
                trials_run: trials_run.load(Ordering::Relaxed),
            });
        }
        if cancel.is_cancelled() {
            warn!("Search cancelled while trying {} points.", points);
            break;
        }
        start = end;
    }

    Err(SearchError::Exhausted {
        degree,
        min_points: settings.min_points,
        max_points: settings.max_points,
        trials: trials_run.load(Ordering::Relaxed),
    })
}

struct Best {
    key: (usize, usize),
    rule: QuadratureRule,
}

fn run_level(
    domain: &Domain,
    basis: &BasisSet,
    candidates: &[Candidate],
    level: Range<usize>,
    settings: &SearchSettings,
    cancel: &CancelToken,
    trials_run: &AtomicUsize,
) -> Result<Option<Best>, DomainError> {
    let problems = candidates[level.clone()]
        .iter()
        .map(|c| MomentProblem::new(domain, basis, &c.selection))
        .collect::<Result<Vec<_>, _>>()?;
    let jobs: Vec<(usize, usize)> = level
        .clone()
        .flat_map(|sel| (0..settings.trials_per_selection).map(move |trial| (sel, trial)))
        .collect();
    let best: Mutex<Option<Best>> = Mutex::new(None);

    let run_job = |&(sel, trial): &(usize, usize)| -> Result<(), DomainError> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let beaten = best
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map_or(false, |b| b.key < (sel, trial));
        if beaten {
            return Ok(());
        }

        let problem = &problems[sel - level.start];
        let mut rng = StdRng::seed_from_u64(trial_seed(settings.base_seed, sel, trial));
        let report = run_trial(problem, &mut rng, &settings.solver, cancel)?;
        trials_run.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Selection {} {:?} trial {}: {:?}.",
            sel,
            problem.selection(),
            trial,
            report.status
        );
        if !report.converged() {
            return Ok(());
        }

        let rule = QuadratureRule::from_unknowns(problem, &report.unknowns, report.residual_norm)?;
        let mut guard = best.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.as_ref().map_or(true, |b| (sel, trial) < b.key) {
            *guard = Some(Best {
                key: (sel, trial),
                rule,
            });
        }
        Ok(())
    };

    if settings.parallel {
        jobs.par_iter().try_for_each(&run_job)?;
    } else {
        jobs.iter().try_for_each(&run_job)?;
    }

    Ok(best.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
}
