//! Elementary transcendentals as coefficient recurrences.
//!
//! Each order-k form expresses the next coefficient of the result purely in
//! terms of already-known coefficients, so the jet driver can raise a state
//! one order at a time through arbitrary right-hand sides.

use super::Taylor;
use crate::error::Error;
use crate::scalar::Coefficient;

impl<T: Coefficient> Taylor<T> {
    /// `exp(a)[k] = (1/k) Σ_{j=0..k} (k−j) · self[j] · a[k−j]`
    pub fn exp_coeff(&mut self, a: &Self, k: usize) {
        if k == 0 {
            self.coeffs[0] = a.coeffs[0].exp();
            return;
        }
        let mut acc = T::zero();
        for j in 0..k {
            acc += self.coeffs[j].clone()
                * a.coeffs[k - j].clone()
                * T::from_re((k - j) as f64);
        }
        self.coeffs[k] = acc / T::from_re(k as f64);
    }

    /// `ln(a)[k] = (a[k] − Σ_{j=1..k} (j/k) · a[j] · self[k−j]) / a[0]`
    pub fn ln_coeff(&mut self, a: &Self, k: usize) -> Result<(), Error> {
        if k == 0 {
            if !a.coeffs[0].supports_ln() {
                return Err(Error::DomainError("log"));
            }
            self.coeffs[0] = a.coeffs[0].ln();
            return Ok(());
        }
        if a.coeffs[0].is_zero() {
            return Err(Error::DomainError("log"));
        }
        let mut acc = a.coeffs[k].clone();
        for j in 1..k {
            acc -= a.coeffs[j].clone()
                * self.coeffs[k - j].clone()
                * T::from_re(j as f64 / k as f64);
        }
        self.coeffs[k] = acc / a.coeffs[0].clone();
        Ok(())
    }

    /// `sqrt(a)[k] = (a[k] − Σ_{j=1..k} self[j] · self[k−j]) / (2 · self[0])`
    pub fn sqrt_coeff(&mut self, a: &Self, k: usize) -> Result<(), Error> {
        if k == 0 {
            if !a.coeffs[0].supports_sqrt() || a.coeffs[0].is_zero() {
                return Err(Error::DomainError("sqrt"));
            }
            self.coeffs[0] = a.coeffs[0].sqrt();
            return Ok(());
        }
        if self.coeffs[0].is_zero() {
            return Err(Error::DomainError("sqrt"));
        }
        let mut acc = a.coeffs[k].clone();
        for j in 1..k {
            acc -= self.coeffs[j].clone() * self.coeffs[k - j].clone();
        }
        self.coeffs[k] = acc / (T::from_re(2.0) * self.coeffs[0].clone());
        Ok(())
    }

    /// `(a^p)[k] = (1/(k·a[0])) Σ_{j=0..k} (p·(k−j) − j) · self[j] · a[k−j]`
    ///
    /// Requires `a[0] ≠ 0`.
    pub fn pow_coeff(&mut self, a: &Self, p: f64, k: usize) -> Result<(), Error> {
        if a.coeffs[0].is_zero() {
            return Err(Error::DomainError("non-integer power"));
        }
        if k == 0 {
            self.coeffs[0] = a.coeffs[0].powf(p);
            return Ok(());
        }
        let mut acc = T::zero();
        for j in 0..k {
            acc += self.coeffs[j].clone()
                * a.coeffs[k - j].clone()
                * T::from_re(p * (k - j) as f64 - j as f64);
        }
        self.coeffs[k] = acc / (T::from_re(k as f64) * a.coeffs[0].clone());
        Ok(())
    }

    /// Joint recurrence for sine and cosine:
    /// `sin[k] = (1/k) Σ_{j=1..=k} j · a[j] · cos[k−j]`,
    /// `cos[k] = −(1/k) Σ_{j=1..=k} j · a[j] · sin[k−j]`.
    pub fn sin_cos_coeff(sin: &mut Self, cos: &mut Self, a: &Self, k: usize) {
        if k == 0 {
            let (s, c) = a.coeffs[0].sin_cos();
            sin.coeffs[0] = s;
            cos.coeffs[0] = c;
            return;
        }
        let mut s_acc = T::zero();
        let mut c_acc = T::zero();
        for j in 1..=k {
            let w = a.coeffs[j].clone() * T::from_re(j as f64 / k as f64);
            s_acc += w.clone() * cos.coeffs[k - j].clone();
            c_acc -= w * sin.coeffs[k - j].clone();
        }
        sin.coeffs[k] = s_acc;
        cos.coeffs[k] = c_acc;
    }
}

// Allocating forms.
impl<T: Coefficient> Taylor<T> {
    pub fn exp(&self) -> Self {
        let n = self.order();
        let mut out = Taylor::zeros(n);
        for k in 0..=n {
            out.exp_coeff(self, k);
        }
        out
    }

    /// Fails with `DomainError("log")` when the constant term is outside
    /// the coefficient type's logarithm domain.
    pub fn checked_ln(&self) -> Result<Self, Error> {
        let n = self.order();
        let mut out = Taylor::zeros(n);
        for k in 0..=n {
            out.ln_coeff(self, k)?;
        }
        Ok(out)
    }

    /// Fails with `DomainError("sqrt")` when the constant term is outside
    /// the square-root domain or vanishes (the recurrence divides by it).
    pub fn checked_sqrt(&self) -> Result<Self, Error> {
        let n = self.order();
        let mut out = Taylor::zeros(n);
        for k in 0..=n {
            out.sqrt_coeff(self, k)?;
        }
        Ok(out)
    }

    /// Real power. Non-negative integer exponents reduce to repeated
    /// multiplication and accept any constant term; everything else runs
    /// the power recurrence and requires a non-vanishing constant term.
    pub fn checked_pow(&self, p: f64) -> Result<Self, Error> {
        if p.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&p) {
            return Ok(self.powi(p as u32));
        }
        let n = self.order();
        let mut out = Taylor::zeros(n);
        for k in 0..=n {
            out.pow_coeff(self, p, k)?;
        }
        Ok(out)
    }

    /// Non-negative integer power by binary exponentiation.
    pub fn powi(&self, mut n: u32) -> Self {
        let mut out = Taylor::constant(T::one(), self.order());
        let mut base = self.clone();
        while n > 0 {
            if n & 1 == 1 {
                out = &out * &base;
            }
            n >>= 1;
            if n > 0 {
                base = &base * &base;
            }
        }
        out
    }

    /// Sine and cosine of the same argument, computed together.
    pub fn sin_cos(&self) -> (Self, Self) {
        let n = self.order();
        let mut sin = Taylor::zeros(n);
        let mut cos = Taylor::zeros(n);
        for k in 0..=n {
            Taylor::sin_cos_coeff(&mut sin, &mut cos, self, k);
        }
        (sin, cos)
    }

    pub fn sin(&self) -> Self {
        self.sin_cos().0
    }

    pub fn cos(&self) -> Self {
        self.sin_cos().1
    }
}

/// Nested polynomials: a `Taylor<T>` is itself a coefficient type, with the
/// transcendentals routed through the recurrences above. This is the outer
/// level of the two-level jets used by variational calculations, and what
/// makes jet transport (`Taylor<Taylor<f64>>`) work unchanged through the
/// integration drivers.
impl<T: Coefficient> Coefficient for Taylor<T> {
    fn from_re(re: f64) -> Self {
        Taylor::constant(T::from_re(re), 0)
    }

    fn modulus(&self) -> f64 {
        self.inf_norm()
    }

    fn exp(&self) -> Self {
        Taylor::exp(self)
    }

    fn ln(&self) -> Self {
        self.checked_ln().unwrap_or_else(|_| self.nan_like())
    }

    fn sqrt(&self) -> Self {
        self.checked_sqrt().unwrap_or_else(|_| self.nan_like())
    }

    fn sin_cos(&self) -> (Self, Self) {
        Taylor::sin_cos(self)
    }

    fn powf(&self, p: f64) -> Self {
        self.checked_pow(p).unwrap_or_else(|_| self.nan_like())
    }

    fn supports_ln(&self) -> bool {
        self.coeffs[0].supports_ln()
    }

    fn supports_sqrt(&self) -> bool {
        self.coeffs[0].supports_sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_poly(rng: &mut StdRng, order: usize) -> Taylor<f64> {
        Taylor::from_coeffs((0..=order).map(|_| rng.gen_range(-1.0..1.0)).collect())
    }

    #[test]
    fn exp_round_trips_through_evaluation() {
        let mut rng = StdRng::seed_from_u64(17);
        let dt = 0.01;
        for _ in 0..10 {
            let a = random_poly(&mut rng, 10);
            assert_relative_eq!(a.exp().eval(dt), a.eval(dt).exp(), epsilon = 1e-13);
        }
    }

    #[test]
    fn ln_inverts_exp() {
        let mut rng = StdRng::seed_from_u64(19);
        for _ in 0..10 {
            let a = random_poly(&mut rng, 10);
            let back = a.exp().checked_ln().unwrap();
            for k in 0..=a.order() {
                assert_relative_eq!(back[k], a[k], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn sin_cos_satisfy_pythagoras() {
        let mut rng = StdRng::seed_from_u64(23);
        let a = random_poly(&mut rng, 12);
        let (s, c) = a.sin_cos();
        let unit = &(&s * &s) + &(&c * &c);
        assert_relative_eq!(unit[0], 1.0, epsilon = 1e-13);
        for k in 1..=a.order() {
            assert_relative_eq!(unit[k], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn sqrt_squares_back() {
        let mut rng = StdRng::seed_from_u64(29);
        for _ in 0..10 {
            let mut a = random_poly(&mut rng, 10);
            a[0] += 2.0;
            let r = a.checked_sqrt().unwrap();
            let sq = &r * &r;
            for k in 0..=a.order() {
                assert_relative_eq!(sq[k], a[k], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn integer_powers_reduce_to_products() {
        let mut rng = StdRng::seed_from_u64(31);
        let a = random_poly(&mut rng, 8);
        let cubed = a.checked_pow(3.0).unwrap();
        let manual = &(&a * &a) * &a;
        for k in 0..=a.order() {
            assert_relative_eq!(cubed[k], manual[k], epsilon = 1e-12);
        }
        // powi accepts a vanishing constant term
        let t = Taylor::<f64>::variable(0.0, 4);
        assert_eq!(t.powi(2).coeffs(), &[0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn half_power_matches_sqrt() {
        let mut rng = StdRng::seed_from_u64(37);
        let mut a = random_poly(&mut rng, 8);
        a[0] += 2.0;
        let p = a.checked_pow(0.5).unwrap();
        let s = a.checked_sqrt().unwrap();
        for k in 0..=a.order() {
            assert_relative_eq!(p[k], s[k], epsilon = 1e-12);
        }
    }

    #[test]
    fn negative_power_matches_reciprocal() {
        let mut rng = StdRng::seed_from_u64(41);
        let mut a = random_poly(&mut rng, 8);
        a[0] += 2.0;
        let inv = a.checked_pow(-1.0).unwrap();
        let one = Taylor::constant(1.0, 8);
        let div = one.checked_div(&a).unwrap();
        for k in 0..=a.order() {
            assert_relative_eq!(inv[k], div[k], epsilon = 1e-12);
        }
    }

    #[test]
    fn domain_failures_are_explicit() {
        let neg = Taylor::constant(-1.0, 4);
        assert_eq!(neg.checked_ln(), Err(Error::DomainError("log")));
        assert_eq!(neg.checked_sqrt(), Err(Error::DomainError("sqrt")));
        let t = Taylor::<f64>::variable(0.0, 4);
        assert_eq!(
            t.checked_pow(0.5),
            Err(Error::DomainError("non-integer power"))
        );
        // the unchecked trait surface poisons instead
        assert!(Coefficient::ln(&neg)[0].is_nan());
    }

    #[test]
    fn nested_coefficients_expand_both_levels() {
        // exp(t + d) = e^d * e^t: outer coefficient k is e^d / k!,
        // which to first order in d is [1/k!, 1/k!].
        type Inner = Taylor<f64>;
        let x = Taylor::<Inner>::from_coeffs(vec![
            Inner::variable(0.0, 1), // d
            Inner::constant(1.0, 1), // + t
            Inner::zeros(1),
            Inner::zeros(1),
        ]);
        let e = x.exp();
        let mut factorial = 1.0;
        for k in 0..=3 {
            if k > 0 {
                factorial *= k as f64;
            }
            assert_relative_eq!(e[k][0], 1.0 / factorial, epsilon = 1e-14);
            assert_relative_eq!(e[k][1], 1.0 / factorial, epsilon = 1e-14);
        }
    }
}
