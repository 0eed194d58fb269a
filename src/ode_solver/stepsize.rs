//! Step-size control from the tail coefficients of a finished jet.

use crate::scalar::Coefficient;
use crate::taylor::Taylor;

/// Largest step keeping the two tail terms of the expansion below the
/// absolute tolerance `eps`:
///
/// `δt = min over coordinates and k ∈ {N−1, N} of (eps / |a_k|)^(1/k)`.
///
/// Vanishing tail coefficients are skipped; if every one of them vanishes
/// the expansion is exact and the result is `+∞` (the integration loop then
/// clips to the remaining span). NaN coefficients produce a NaN step, which
/// the loop surfaces as a domain error.
pub fn stepsize<T: Coefficient>(x: &[Taylor<T>], eps: f64) -> f64 {
    let order = x[0].order();
    let mut dt = f64::INFINITY;
    for p in x {
        for k in [order - 1, order] {
            if k == 0 {
                continue;
            }
            let a = p[k].modulus();
            if a.is_nan() {
                return f64::NAN;
            }
            if a == 0.0 {
                continue;
            }
            let h = (eps / a).powf(1.0 / k as f64);
            if h < dt {
                dt = h;
            }
        }
    }
    dt
}

/// Tolerance-scaled variant. With `ρ` the infinity norm of the 0-th
/// coefficients, `ε_rel·ρ ≤ ε_abs` selects the absolute regime (ε := 1,
/// safety factor `e⁻¹·e⁻²`), otherwise the relative regime (ε := ρ, safety
/// factor `e^(−7/(10(N−1)))·e⁻²`). The safety factors pull the step into
/// the convergence region of the series.
pub fn stepsize_tol<T: Coefficient>(x: &[Taylor<T>], abs_tol: f64, rel_tol: f64) -> f64 {
    let order = x[0].order();
    let rho = x.iter().fold(0.0_f64, |m, p| m.max(p[0].modulus()));
    let (eps, safety) = if rel_tol * rho <= abs_tol {
        (1.0, f64::exp(-1.0) * f64::exp(-2.0))
    } else {
        let first_order = f64::exp(-7.0 / (10.0 * (order as f64 - 1.0)));
        (rho, first_order * f64::exp(-2.0))
    };
    stepsize(x, eps) * safety
}
