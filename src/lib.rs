//! An adaptive ODE integrator based on the Taylor-series method.
//!
//! At each step the truncated Taylor expansion of the solution around the
//! current time is built by forward-mode automatic differentiation on
//! univariate polynomials ([`Taylor`]), the step size is chosen from the
//! tail coefficients so the local truncation error stays below the
//! requested tolerance, and the polynomial is evaluated at that step.
//!
//! The right-hand side is an ordinary closure (or [`OdeRhs`] impl) over
//! polynomial arguments; the kernel recurrences do the differentiation:
//!
//! ```
//! use taysol::Taylor;
//!
//! // x' = x, so x(1) = e
//! let sol = taysol::integrate_scalar(
//!     |_t, x: &Taylor<f64>| Ok(x.clone()),
//!     1.0,
//!     0.0,
//!     1.0,
//!     12,
//!     1e-16,
//!     100,
//! )?;
//! assert_eq!(sol.last_time(), 1.0);
//! assert!((sol.last_state()[0] - std::f64::consts::E).abs() < 1e-12);
//! # Ok::<(), taysol::Error>(())
//! ```
//!
//! Coefficients are generic over the [`Coefficient`] capability set: `f64`,
//! `Complex<f64>`, first-order multivariate duals ([`Dual`]) and nested
//! polynomials all integrate through the same drivers. The
//! [`lyapunov`] driver builds on that to run the variational equations and
//! extract Lyapunov spectra.

pub mod error;
pub mod lyapunov;
pub mod ode_solver;
pub mod scalar;
pub mod taylor;

pub use error::Error;
pub use lyapunov::{
    classical_gram_schmidt, lyapunov, lyapunov_with, modified_gram_schmidt, GramSchmidt,
    LyapunovSolution, VariationalRing,
};
pub use ode_solver::{
    integrate, integrate_grid, integrate_scalar, integrate_scalar_grid, integrate_tol, jet_coeffs,
    stepsize, stepsize_tol, InPlaceRhs, JetWorkspace, OdeRhs, ScalarRhs, Solution, Statistics,
};
pub use scalar::dual::Dual;
pub use scalar::Coefficient;
pub use taylor::{eval_state, Taylor};
