//! The jet-coefficients driver: lifts a 0-th order state to a full order-N
//! Taylor expansion of the trajectory by repeated substitution through the
//! right-hand side.

use crate::error::Error;
use crate::ode_solver::OdeRhs;
use crate::scalar::Coefficient;
use crate::taylor::Taylor;

/// Scratch buffers for [`jet_coeffs`], allocated once per integration call
/// and reused across steps.
pub struct JetWorkspace<T> {
    /// Zero-padded prefix view of the state.
    xaux: Vec<Taylor<T>>,
    /// The derivative returned by the right-hand side.
    dx: Vec<Taylor<T>>,
}

impl<T: Coefficient> JetWorkspace<T> {
    pub fn new(dim: usize, order: usize) -> Self {
        Self {
            xaux: vec![Taylor::zeros(order); dim],
            dx: vec![Taylor::zeros(order); dim],
        }
    }
}

/// Computes coefficients `1..=N` of every polynomial in `x`, in place,
/// given that the 0-th coefficients hold the state at `t0`.
///
/// For each order: the right-hand side is evaluated on the zero-padded
/// prefix of the expansion known so far, which legitimately produces at
/// least coefficient `ord − 1` of ẋ, and the Taylor-series identity
/// `x[ord] = ẋ[ord−1] / ord` raises the expansion one order.
pub fn jet_coeffs<T, S>(
    rhs: &S,
    t0: f64,
    x: &mut [Taylor<T>],
    ws: &mut JetWorkspace<T>,
) -> Result<(), Error>
where
    T: Coefficient,
    S: OdeRhs<T> + ?Sized,
{
    if x.is_empty() {
        return Err(Error::EmptyState);
    }
    let order = x[0].order();
    for xi in x.iter() {
        if xi.order() != order {
            return Err(Error::OrderMismatch(order, xi.order()));
        }
    }
    debug_assert_eq!(ws.xaux.len(), x.len());

    for ord in 1..=order {
        for (aux, xi) in ws.xaux.iter_mut().zip(x.iter()) {
            aux.assign_prefix(xi, ord);
        }
        rhs.rhs_inplace(t0, &ws.xaux, &mut ws.dx)?;
        for (xi, dxi) in x.iter_mut().zip(ws.dx.iter()) {
            xi[ord] = dxi.coeff_or_zero(ord - 1) / T::from_re(ord as f64);
        }
    }
    Ok(())
}
