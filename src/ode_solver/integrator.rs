//! The outer integration loops: advance with the adaptive Taylor step,
//! record the trajectory, land exactly on requested times.

use log::warn;
use nalgebra::DVector;

use crate::error::Error;
use crate::ode_solver::jet::{jet_coeffs, JetWorkspace};
use crate::ode_solver::stepsize::{stepsize, stepsize_tol};
use crate::ode_solver::{OdeRhs, ScalarRhs, Solution};
use crate::scalar::Coefficient;
use crate::taylor::{eval_state, Taylor};

/// Which step controller a driver runs with.
enum Controller {
    Absolute(f64),
    Scaled { abs_tol: f64, rel_tol: f64 },
}

impl Controller {
    fn stepsize<T: Coefficient>(&self, x: &[Taylor<T>]) -> f64 {
        match self {
            Controller::Absolute(eps) => stepsize(x, *eps),
            Controller::Scaled { abs_tol, rel_tol } => stepsize_tol(x, *abs_tol, *rel_tol),
        }
    }
}

fn validate(dim: usize, order: usize, tolerances: &[f64]) -> Result<(), Error> {
    if dim == 0 {
        return Err(Error::EmptyState);
    }
    if order == 0 {
        return Err(Error::ZeroOrder);
    }
    for &tol in tolerances {
        if !(tol > 0.0) {
            return Err(Error::InvalidTolerance(tol));
        }
    }
    Ok(())
}

/// Integrates `dx/dt = rhs(t, x)` from `(t0, x0)` until `tmax`, recording
/// every accepted step. The final step is clipped so the last recorded time
/// is exactly `tmax`; `tmax < t0` integrates backwards.
///
/// Hitting `max_steps` is not an error: a diagnostic is logged and the
/// partial trajectory is returned. A numeric failure inside the kernel ends
/// the integration and is reported in [`Solution::error`] next to the
/// trajectory computed so far.
pub fn integrate<T, S>(
    rhs: &S,
    x0: &DVector<T>,
    t0: f64,
    tmax: f64,
    order: usize,
    abs_tol: f64,
    max_steps: usize,
) -> Result<Solution<T>, Error>
where
    T: Coefficient,
    S: OdeRhs<T> + ?Sized,
{
    validate(x0.len(), order, &[abs_tol])?;
    integrate_span(rhs, x0, t0, tmax, order, &Controller::Absolute(abs_tol), max_steps)
}

/// Relative/absolute tolerance variant of [`integrate`]. The expansion
/// order is chosen from the tolerances before the first step as
/// `⌈1 − ln(min(ε_abs, ε_rel·|x0|))/2⌉` and the workspace sized to it.
pub fn integrate_tol<T, S>(
    rhs: &S,
    x0: &DVector<T>,
    t0: f64,
    tmax: f64,
    rel_tol: f64,
    abs_tol: f64,
    max_steps: usize,
) -> Result<Solution<T>, Error>
where
    T: Coefficient,
    S: OdeRhs<T> + ?Sized,
{
    if x0.is_empty() {
        return Err(Error::EmptyState);
    }
    for &tol in &[rel_tol, abs_tol] {
        if !(tol > 0.0) {
            return Err(Error::InvalidTolerance(tol));
        }
    }
    let rho = x0.iter().fold(0.0_f64, |m, c| m.max(c.modulus()));
    let tol = if rho > 0.0 {
        abs_tol.min(rel_tol * rho)
    } else {
        abs_tol
    };
    let order = (((1.0 - tol.ln() / 2.0).ceil()) as usize).max(2);
    let controller = Controller::Scaled { abs_tol, rel_tol };
    integrate_span(rhs, x0, t0, tmax, order, &controller, max_steps)
}

fn integrate_span<T, S>(
    rhs: &S,
    x0: &DVector<T>,
    t0: f64,
    tmax: f64,
    order: usize,
    controller: &Controller,
    max_steps: usize,
) -> Result<Solution<T>, Error>
where
    T: Coefficient,
    S: OdeRhs<T> + ?Sized,
{
    let dim = x0.len();
    let dir = if tmax >= t0 { 1.0 } else { -1.0 };
    let mut x: Vec<Taylor<T>> = x0
        .iter()
        .map(|c| Taylor::constant(c.clone(), order))
        .collect();
    let mut ws = JetWorkspace::new(dim, order);
    let mut sol = Solution::with_initial(t0, x0.clone());
    let mut t = t0;

    while dir * (tmax - t) > 0.0 {
        if sol.stats.number_of_steps >= max_steps {
            warn!("step cap of {max_steps} reached at t = {t}; returning the partial trajectory");
            break;
        }
        if let Err(e) = jet_coeffs(rhs, t, &mut x, &mut ws) {
            sol.error = Some(e);
            break;
        }
        sol.stats.number_of_rhs_evals += order;

        let mut dt = controller.stepsize(&x);
        if dt.is_nan() {
            sol.error = Some(Error::NonFiniteStep { t });
            break;
        }
        let remaining = dir * (tmax - t);
        let clipped = dt >= remaining;
        if clipped {
            dt = remaining;
            sol.stats.number_of_clipped_steps += 1;
        }
        if !(dt > 0.0) {
            sol.error = Some(Error::StepTooSmall { t });
            break;
        }

        let xnew = eval_state(&x, dir * dt);
        t = if clipped { tmax } else { t + dir * dt };
        for (xi, c) in x.iter_mut().zip(xnew.iter()) {
            xi.set_constant_term(c.clone());
        }
        sol.stats.number_of_steps += 1;
        sol.push(t, xnew);
    }
    Ok(sol)
}

/// Integrates onto a prescribed strictly monotonic grid, returning the
/// states at exactly the grid times; position 0 is `x0` at `grid[0]`.
///
/// Between grid points the loop steps adaptively; a step that would cross
/// the next grid time is redone from the same pre-step expansion with the
/// clipped step so the solution lands exactly on it.
pub fn integrate_grid<T, S>(
    rhs: &S,
    x0: &DVector<T>,
    grid: &[f64],
    order: usize,
    abs_tol: f64,
    max_steps: usize,
) -> Result<Solution<T>, Error>
where
    T: Coefficient,
    S: OdeRhs<T> + ?Sized,
{
    validate(x0.len(), order, &[abs_tol])?;
    if grid.len() < 2 {
        return Err(Error::NonMonotonicGrid);
    }
    let dir = if grid[1] > grid[0] { 1.0 } else { -1.0 };
    for w in grid.windows(2) {
        if dir * (w[1] - w[0]) <= 0.0 {
            return Err(Error::NonMonotonicGrid);
        }
    }

    let dim = x0.len();
    let mut x: Vec<Taylor<T>> = x0
        .iter()
        .map(|c| Taylor::constant(c.clone(), order))
        .collect();
    let mut ws = JetWorkspace::new(dim, order);
    let mut sol = Solution::with_initial(grid[0], x0.clone());
    let mut t = grid[0];
    let mut xnow = x0.clone();

    'outer: for &target in &grid[1..] {
        while dir * (target - t) > 0.0 {
            if sol.stats.number_of_steps >= max_steps {
                warn!(
                    "step cap of {max_steps} reached at t = {t}; returning the states up to the last grid point"
                );
                break 'outer;
            }
            if let Err(e) = jet_coeffs(rhs, t, &mut x, &mut ws) {
                sol.error = Some(e);
                break 'outer;
            }
            sol.stats.number_of_rhs_evals += order;

            let mut dt = stepsize(&x, abs_tol);
            if dt.is_nan() {
                sol.error = Some(Error::NonFiniteStep { t });
                break 'outer;
            }
            let remaining = dir * (target - t);
            let clipped = dt >= remaining;
            if clipped {
                dt = remaining;
                sol.stats.number_of_clipped_steps += 1;
            }
            if !(dt > 0.0) {
                sol.error = Some(Error::StepTooSmall { t });
                break 'outer;
            }

            xnow = eval_state(&x, dir * dt);
            t = if clipped { target } else { t + dir * dt };
            for (xi, c) in x.iter_mut().zip(xnow.iter()) {
                xi.set_constant_term(c.clone());
            }
            sol.stats.number_of_steps += 1;
        }
        sol.push(target, xnow.clone());
    }
    Ok(sol)
}

/// The scalar (d = 1) form of [`integrate`].
pub fn integrate_scalar<T, F>(
    f: F,
    x0: T,
    t0: f64,
    tmax: f64,
    order: usize,
    abs_tol: f64,
    max_steps: usize,
) -> Result<Solution<T>, Error>
where
    T: Coefficient,
    F: Fn(f64, &Taylor<T>) -> Result<Taylor<T>, Error>,
{
    integrate(
        &ScalarRhs(f),
        &DVector::from_vec(vec![x0]),
        t0,
        tmax,
        order,
        abs_tol,
        max_steps,
    )
}

/// The scalar (d = 1) form of [`integrate_grid`].
pub fn integrate_scalar_grid<T, F>(
    f: F,
    x0: T,
    grid: &[f64],
    order: usize,
    abs_tol: f64,
    max_steps: usize,
) -> Result<Solution<T>, Error>
where
    T: Coefficient,
    F: Fn(f64, &Taylor<T>) -> Result<Taylor<T>, Error>,
{
    integrate_grid(
        &ScalarRhs(f),
        &DVector::from_vec(vec![x0]),
        grid,
        order,
        abs_tol,
        max_steps,
    )
}
