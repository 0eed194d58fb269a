//! Lyapunov spectra from the variational equations.
//!
//! The physical state is augmented with the flow Jacobian Φ (flattened
//! row-major), the augmented right-hand side closes Φ' = J(x(t))·Φ with J
//! obtained from a dual-seeded pass through the same user system, and after
//! every accepted step Φ is reorthonormalized, accumulating the logarithms
//! of the R diagonal into running exponent estimates.

use log::warn;
use nalgebra::{DMatrix, DVector};

use crate::error::Error;
use crate::ode_solver::jet::{jet_coeffs, JetWorkspace};
use crate::ode_solver::stepsize::stepsize;
use crate::ode_solver::{OdeRhs, Statistics};
use crate::scalar::dual::Dual;
use crate::taylor::{eval_state, Taylor};

mod gram_schmidt;

pub use gram_schmidt::{classical_gram_schmidt, modified_gram_schmidt, GramSchmidt};

/// Per-integration handle describing the variational block: which state
/// components are seeded as variational directions.
///
/// The number of directions is independent of the state dimension — a
/// handle over a subset of components tracks the corresponding partial
/// spectrum. Passing the handle explicitly (instead of any process-wide
/// configuration) keeps concurrent integrations with different variational
/// shapes from interfering.
#[derive(Clone, Debug)]
pub struct VariationalRing {
    state_dim: usize,
    dirs: Vec<usize>,
}

impl VariationalRing {
    /// A handle seeding the given state components as directions.
    pub fn new(state_dim: usize, dirs: Vec<usize>) -> Result<Self, Error> {
        if state_dim == 0 || dirs.is_empty() {
            return Err(Error::EmptyState);
        }
        for &d in &dirs {
            if d >= state_dim {
                return Err(Error::DirectionOutOfBounds(d, state_dim));
            }
        }
        Ok(Self { state_dim, dirs })
    }

    /// The full ring: every state component is a direction, Φ(0) = I.
    pub fn full(state_dim: usize) -> Self {
        Self {
            state_dim,
            dirs: (0..state_dim).collect(),
        }
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn ndirs(&self) -> usize {
        self.dirs.len()
    }

    pub fn dirs(&self) -> &[usize] {
        &self.dirs
    }
}

/// The augmented right-hand side: the physical block followed by
/// Φ' = J·Φ. J is recovered order-by-order from a pass of the user system
/// over [`Dual`] coefficients with every state component seeded.
struct Variational<'a, S> {
    sys: &'a S,
    ring: &'a VariationalRing,
}

impl<S> OdeRhs<f64> for Variational<'_, S>
where
    S: OdeRhs<f64> + OdeRhs<Dual>,
{
    fn rhs_inplace(
        &self,
        t: f64,
        x: &[Taylor<f64>],
        dx: &mut [Taylor<f64>],
    ) -> Result<(), Error> {
        let d = self.ring.state_dim();
        let m = self.ring.ndirs();
        let order = x[0].order();
        let (xphys, xvar) = x.split_at(d);
        let (dphys, dvar) = dx.split_at_mut(d);
        OdeRhs::<f64>::rhs_inplace(self.sys, t, xphys, dphys)?;

        let xdual: Vec<Taylor<Dual>> = xphys
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Taylor::from_coeffs(
                    p.coeffs()
                        .iter()
                        .enumerate()
                        .map(|(k, c)| {
                            if k == 0 {
                                Dual::variable(*c, i, d)
                            } else {
                                Dual::constant(*c)
                            }
                        })
                        .collect(),
                )
            })
            .collect();
        let mut ddual: Vec<Taylor<Dual>> = vec![Taylor::zeros(order); d];
        OdeRhs::<Dual>::rhs_inplace(self.sys, t, &xdual, &mut ddual)?;

        for i in 0..d {
            // row i of J as polynomials in t
            let jrow: Vec<Taylor<f64>> = (0..d)
                .map(|l| {
                    Taylor::from_coeffs(ddual[i].coeffs().iter().map(|c| c.grad(l)).collect())
                })
                .collect();
            for j in 0..m {
                let mut acc = Taylor::zeros(order);
                for (l, jil) in jrow.iter().enumerate() {
                    acc += jil * &xvar[l * m + j];
                }
                dvar[i * m + j] = acc;
            }
        }
        Ok(())
    }
}

/// The result of a [`lyapunov`] call: trajectory of the physical state plus
/// the running Lyapunov-exponent estimates (zeros at `t0`).
#[derive(Clone, Debug)]
pub struct LyapunovSolution {
    pub t: Vec<f64>,
    pub y: Vec<DVector<f64>>,
    pub exponents: Vec<DVector<f64>>,
    pub stats: Statistics,
    /// A numeric failure that ended the run early; the recorded prefix is
    /// still valid.
    pub error: Option<Error>,
}

impl LyapunovSolution {
    pub fn last_exponents(&self) -> &DVector<f64> {
        self.exponents.last().expect("exponents recorded from t0")
    }
}

/// Computes the full Lyapunov spectrum along the trajectory from
/// `(t0, x0)`: the identity ring and modified Gram–Schmidt.
pub fn lyapunov<S>(
    rhs: &S,
    x0: &DVector<f64>,
    t0: f64,
    tmax: f64,
    order: usize,
    abs_tol: f64,
    max_steps: usize,
) -> Result<LyapunovSolution, Error>
where
    S: OdeRhs<f64> + OdeRhs<Dual>,
{
    let ring = VariationalRing::full(x0.len());
    lyapunov_with(rhs, &ring, GramSchmidt::Modified, x0, t0, tmax, order, abs_tol, max_steps)
}

/// As [`lyapunov`], with an explicit direction set and orthonormalization
/// scheme.
#[allow(clippy::too_many_arguments)]
pub fn lyapunov_with<S>(
    rhs: &S,
    ring: &VariationalRing,
    scheme: GramSchmidt,
    x0: &DVector<f64>,
    t0: f64,
    tmax: f64,
    order: usize,
    abs_tol: f64,
    max_steps: usize,
) -> Result<LyapunovSolution, Error>
where
    S: OdeRhs<f64> + OdeRhs<Dual>,
{
    if x0.is_empty() {
        return Err(Error::EmptyState);
    }
    if x0.len() != ring.state_dim() {
        return Err(Error::DimensionMismatch {
            expected: ring.state_dim(),
            got: x0.len(),
        });
    }
    if order == 0 {
        return Err(Error::ZeroOrder);
    }
    if !(abs_tol > 0.0) {
        return Err(Error::InvalidTolerance(abs_tol));
    }

    let d = x0.len();
    let m = ring.ndirs();
    let var = Variational { sys: rhs, ring };
    let dir_sign = if tmax >= t0 { 1.0 } else { -1.0 };

    let mut x: Vec<Taylor<f64>> = Vec::with_capacity(d + d * m);
    for c in x0.iter() {
        x.push(Taylor::constant(*c, order));
    }
    for l in 0..d {
        for &dir in ring.dirs() {
            let phi0 = if l == dir { 1.0 } else { 0.0 };
            x.push(Taylor::constant(phi0, order));
        }
    }

    let mut ws = JetWorkspace::new(d + d * m, order);
    let mut sol = LyapunovSolution {
        t: vec![t0],
        y: vec![x0.clone()],
        exponents: vec![DVector::zeros(m)],
        stats: Statistics::default(),
        error: None,
    };
    let mut logsum = DVector::<f64>::zeros(m);
    let mut t = t0;

    while dir_sign * (tmax - t) > 0.0 {
        if sol.stats.number_of_steps >= max_steps {
            warn!("step cap of {max_steps} reached at t = {t}; returning the partial spectrum");
            break;
        }
        if let Err(e) = jet_coeffs(&var, t, &mut x, &mut ws) {
            sol.error = Some(e);
            break;
        }
        sol.stats.number_of_rhs_evals += order;

        let mut dt = stepsize(&x, abs_tol);
        if dt.is_nan() {
            sol.error = Some(Error::NonFiniteStep { t });
            break;
        }
        let remaining = dir_sign * (tmax - t);
        let clipped = dt >= remaining;
        if clipped {
            dt = remaining;
            sol.stats.number_of_clipped_steps += 1;
        }
        if !(dt > 0.0) {
            sol.error = Some(Error::StepTooSmall { t });
            break;
        }

        let xnew = eval_state(&x, dir_sign * dt);
        t = if clipped { tmax } else { t + dir_sign * dt };

        let mut phi = DMatrix::zeros(d, m);
        for l in 0..d {
            for j in 0..m {
                phi[(l, j)] = xnew[d + l * m + j];
            }
        }
        let rdiag = match scheme {
            GramSchmidt::Modified => modified_gram_schmidt(&mut phi),
            GramSchmidt::Classical => classical_gram_schmidt(&mut phi),
        };
        if rdiag.iter().any(|r| !(*r > 0.0) || !r.is_finite()) {
            sol.error = Some(Error::DegenerateTangents);
            break;
        }
        for j in 0..m {
            logsum[j] += rdiag[j].ln();
        }

        for (i, xi) in x.iter_mut().enumerate().take(d) {
            xi.set_constant_term(xnew[i]);
        }
        for l in 0..d {
            for j in 0..m {
                x[d + l * m + j].set_constant_term(phi[(l, j)]);
            }
        }

        sol.stats.number_of_steps += 1;
        let elapsed = dir_sign * (t - t0);
        sol.t.push(t);
        sol.y
            .push(DVector::from_iterator(d, xnew.iter().take(d).cloned()));
        sol.exponents.push(&logsum / elapsed);
    }
    Ok(sol)
}
