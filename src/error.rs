use thiserror::Error;

/// Errors raised by the polynomial kernel and the integration drivers.
///
/// Invalid-input variants are returned before any work is done; numeric
/// variants are attached to the partially computed [`Solution`] by the
/// drivers, which never discard the trajectory accumulated so far.
///
/// [`Solution`]: crate::ode_solver::Solution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("tolerance must be positive, got {0:e}")]
    InvalidTolerance(f64),
    #[error("expansion order must be at least 1")]
    ZeroOrder,
    #[error("time grid must contain at least two strictly monotonic points")]
    NonMonotonicGrid,
    #[error("state vector is empty")]
    EmptyState,
    #[error("state polynomials have mismatched orders ({0} vs {1})")]
    OrderMismatch(usize, usize),
    #[error("right-hand side produced {got} components for a {expected}-dimensional state")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("division by a series with zero constant term")]
    DivByZero,
    #[error("{0} of a series with constant term outside the domain")]
    DomainError(&'static str),
    #[error("step size underflowed to zero at t = {t}")]
    StepTooSmall { t: f64 },
    #[error("step size became non-finite at t = {t}")]
    NonFiniteStep { t: f64 },
    #[error("tangent vectors became linearly dependent during reorthonormalization")]
    DegenerateTangents,
    #[error("variational direction index {0} out of bounds for state dimension {1}")]
    DirectionOutOfBounds(usize, usize),
}
