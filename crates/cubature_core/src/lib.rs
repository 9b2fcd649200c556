pub mod assembly;
pub mod autodiff;
pub mod basis;
pub mod domain;
pub mod error;
pub mod jacobi;
pub mod rule;
pub mod search;
pub mod solver;
/// The `cubature_core` crate searches for minimal fully symmetric cubature rules
/// on the standard reference elements (triangle, quadrilateral, tetrahedron,
/// hexahedron, prism and pyramid).
/// Polynomial evaluation is generic over `Scalar`, so the same basis code runs on
/// `f64` and on Dual numbers when the solver needs derivatives.
///
/// Key components:
/// - **Domain**: orbit tables, symmetry groups and orthonormal bases per shape.
/// - **Assembly**: moment residual and Jacobian for one orbit selection.
/// - **Solver**: seeded Levenberg-Marquardt trials with clamped arguments.
/// - **Search**: ordered enumeration of orbit selections with parallel trials.
pub mod traits;

pub use domain::{Domain, DomainKind};
pub use error::{DomainError, SearchError};
pub use rule::QuadratureRule;
pub use search::{find_rule, SearchOutcome, SearchSettings};
pub use solver::{SolverSettings, TrialStatus};
