//! The integration drivers and their right-hand-side plumbing.

use nalgebra::DVector;
use serde::Serialize;

use crate::error::Error;
use crate::scalar::Coefficient;
use crate::taylor::Taylor;

pub mod integrator;
pub mod jet;
pub mod stepsize;
pub mod test_models;

pub use integrator::{
    integrate, integrate_grid, integrate_scalar, integrate_scalar_grid, integrate_tol,
};
pub use jet::{jet_coeffs, JetWorkspace};
pub use stepsize::{stepsize, stepsize_tol};

/// A right-hand side dx/dt = f(t, x) evaluated on truncated polynomials.
///
/// The in-place form is canonical; the functional form
/// `Fn(f64, &[Taylor<T>]) -> Result<Vec<Taylor<T>>, Error>` implements this
/// trait through a blanket impl, and [`InPlaceRhs`] / [`ScalarRhs`] adapt
/// in-place and scalar closures. Both closure forms drive the identical
/// kernel recurrences, so a system written both ways produces bit-identical
/// trajectories.
pub trait OdeRhs<T: Coefficient> {
    fn rhs_inplace(&self, t: f64, x: &[Taylor<T>], dx: &mut [Taylor<T>]) -> Result<(), Error>;
}

impl<T, F> OdeRhs<T> for F
where
    T: Coefficient,
    F: Fn(f64, &[Taylor<T>]) -> Result<Vec<Taylor<T>>, Error>,
{
    fn rhs_inplace(&self, t: f64, x: &[Taylor<T>], dx: &mut [Taylor<T>]) -> Result<(), Error> {
        let out = self(t, x)?;
        if out.len() != dx.len() {
            return Err(Error::DimensionMismatch {
                expected: dx.len(),
                got: out.len(),
            });
        }
        for (d, o) in dx.iter_mut().zip(out) {
            *d = o;
        }
        Ok(())
    }
}

/// Adapts an in-place closure `Fn(t, x, dx)` to [`OdeRhs`].
pub struct InPlaceRhs<F>(pub F);

impl<T, F> OdeRhs<T> for InPlaceRhs<F>
where
    T: Coefficient,
    F: Fn(f64, &[Taylor<T>], &mut [Taylor<T>]) -> Result<(), Error>,
{
    fn rhs_inplace(&self, t: f64, x: &[Taylor<T>], dx: &mut [Taylor<T>]) -> Result<(), Error> {
        (self.0)(t, x, dx)
    }
}

/// Adapts a scalar closure `Fn(t, x) -> dx` to the d = 1 vector shape.
pub struct ScalarRhs<F>(pub F);

impl<T, F> OdeRhs<T> for ScalarRhs<F>
where
    T: Coefficient,
    F: Fn(f64, &Taylor<T>) -> Result<Taylor<T>, Error>,
{
    fn rhs_inplace(&self, t: f64, x: &[Taylor<T>], dx: &mut [Taylor<T>]) -> Result<(), Error> {
        dx[0] = (self.0)(t, &x[0])?;
        Ok(())
    }
}

/// Counters accumulated over one integration call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub number_of_steps: usize,
    pub number_of_rhs_evals: usize,
    /// Steps shortened to land exactly on a requested time.
    pub number_of_clipped_steps: usize,
}

/// The recorded trajectory of one integration call.
#[derive(Clone, Debug)]
pub struct Solution<T> {
    /// Recorded times: every accepted step for the span drivers, the
    /// requested grid times for the grid driver. Strictly monotonic in the
    /// integration direction.
    pub t: Vec<f64>,
    /// The state at each recorded time.
    pub y: Vec<DVector<T>>,
    pub stats: Statistics,
    /// A numeric failure that ended the integration early. The recorded
    /// prefix of the trajectory is still valid.
    pub error: Option<Error>,
}

impl<T: Coefficient> Solution<T> {
    pub(crate) fn with_initial(t0: f64, y0: DVector<T>) -> Self {
        Self {
            t: vec![t0],
            y: vec![y0],
            stats: Statistics::default(),
            error: None,
        }
    }

    pub(crate) fn push(&mut self, t: f64, y: DVector<T>) {
        self.t.push(t);
        self.y.push(y);
    }

    /// The last recorded time; `tmax` (or the last grid point) when the
    /// call ran to completion.
    pub fn last_time(&self) -> f64 {
        *self.t.last().expect("a solution always records t0")
    }

    pub fn last_state(&self) -> &DVector<T> {
        self.y.last().expect("a solution always records x0")
    }
}
