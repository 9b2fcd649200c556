//! Error types for the rule search.
//!
//! Precondition violations (`DomainError`) indicate miswired callers and
//! are never produced by a well-formed search. Numeric trial failures are
//! not errors at all; they are reported as `TrialStatus` values.

use crate::domain::DomainKind;
use thiserror::Error;

/// Contract violations raised at the domain descriptor boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Orbit type index outside `0..orbit_types`.
    #[error("orbit index {orbit} out of range for {domain} (has {count} orbit types)")]
    OrbitOutOfRange {
        /// Name of the domain
        domain: &'static str,
        /// The offending orbit index
        orbit: usize,
        /// Number of orbit types the domain declares
        count: usize,
    },

    /// Argument slice does not match `arg_count(orbit)`.
    #[error("orbit {orbit} expects {expected} arguments, got {got}")]
    ArgCountMismatch {
        /// Orbit type index
        orbit: usize,
        /// Declared argument count
        expected: usize,
        /// Length actually supplied
        got: usize,
    },

    /// Orbit selection vector has the wrong number of entries.
    #[error("orbit selection has {got} entries, {domain} has {expected} orbit types")]
    SelectionLengthMismatch {
        /// Name of the domain
        domain: &'static str,
        /// Number of orbit types
        expected: usize,
        /// Length actually supplied
        got: usize,
    },

    /// Expansion would write past the end of the point matrix.
    #[error("orbit {orbit} needs rows {offset}..{end} but the point matrix has {rows} rows")]
    PointRangeOverflow {
        /// Orbit type index
        orbit: usize,
        /// First row to be written
        offset: usize,
        /// One past the last row to be written
        end: usize,
        /// Rows available
        rows: usize,
    },

    /// Point matrix has the wrong number of columns.
    #[error("point matrix has {got} columns, {domain} is {expected}-dimensional")]
    DimensionMismatch {
        /// Name of the domain
        domain: &'static str,
        /// Spatial dimension of the domain
        expected: usize,
        /// Columns actually supplied
        got: usize,
    },

    /// Unknown vector length does not match the selection layout.
    #[error("unknown vector has {got} entries, layout expects {expected}")]
    UnknownLengthMismatch {
        /// Length implied by the selection
        expected: usize,
        /// Length actually supplied
        got: usize,
    },

    /// Selection is empty or repeats a zero-argument orbit.
    #[error("selection {selection:?} is not admissible for {domain}")]
    InadmissibleSelection {
        domain: &'static str,
        selection: Vec<usize>,
    },

    /// Rule was built for a different domain or orbit selection.
    #[error("rule for {got_domain:?} {got:?} does not match problem for {expected_domain:?} {expected:?}")]
    RuleMismatch {
        expected_domain: DomainKind,
        expected: Vec<usize>,
        got_domain: DomainKind,
        got: Vec<usize>,
    },
}

/// Errors reported by the rule search driver.
#[derive(Debug, Error)]
pub enum SearchError {
    /// No selection/seed converged inside the configured budget.
    #[error(
        "no degree {degree} rule found with {min_points}..={max_points} points after {trials} trials"
    )]
    Exhausted {
        /// Requested exactness degree
        degree: usize,
        /// Smallest point count searched
        min_points: usize,
        /// Largest point count searched
        max_points: usize,
        /// Number of solver trials actually run
        trials: usize,
    },

    /// Settings failed validation before any trial ran.
    #[error("invalid search settings: {0}")]
    InvalidSettings(String),

    /// A descriptor contract was violated.
    #[error(transparent)]
    Precondition(#[from] DomainError),
}

impl SearchError {
    /// Returns `true` for wiring defects that must abort the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SearchError::Precondition(_))
    }

    /// Returns `true` if the search ran but found nothing.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, SearchError::Exhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_out_of_range_message_names_domain() {
        let err = DomainError::OrbitOutOfRange {
            domain: "hex",
            orbit: 7,
            count: 7,
        };
        assert_eq!(
            err.to_string(),
            "orbit index 7 out of range for hex (has 7 orbit types)"
        );
    }

    #[test]
    fn precondition_errors_are_fatal() {
        let err = SearchError::from(DomainError::ArgCountMismatch {
            orbit: 1,
            expected: 1,
            got: 2,
        });
        assert!(err.is_fatal());
        assert!(!err.is_exhausted());
    }

    #[test]
    fn exhaustion_is_not_fatal() {
        let err = SearchError::Exhausted {
            degree: 5,
            min_points: 1,
            max_points: 6,
            trials: 0,
        };
        assert!(err.is_exhausted());
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("degree 5"));
    }
}
