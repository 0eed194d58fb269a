use std::fmt::{Debug, Display};
use std::ops::{AddAssign, Div, DivAssign, MulAssign, Neg, Sub, SubAssign};

use num_complex::Complex;
use num_traits::{One, Zero};

pub mod dual;

/// The capability set required of Taylor coefficients.
///
/// This is deliberately a trait rather than a concrete numeric type: the
/// recurrences in [`crate::taylor`] only need the field operations, a norm
/// to the real axis and the elementary transcendentals the right-hand side
/// actually calls. Anything providing those plugs in — `f64`,
/// `Complex<f64>`, the first-order multivariate expansion [`dual::Dual`]
/// used by the variational equations, or a whole [`crate::taylor::Taylor`]
/// again for nested jets.
///
/// The transcendentals here mirror IEEE float semantics: outside their
/// domain they produce NaNs rather than failing. The error-surfacing path
/// is the `checked_*` family on [`crate::taylor::Taylor`].
pub trait Coefficient:
    Clone
    + Debug
    + Display
    + PartialEq
    + 'static
    + Zero
    + One
    + Neg<Output = Self>
    + Sub<Output = Self>
    + Div<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    /// Embeds a value from the real axis.
    fn from_re(re: f64) -> Self;

    /// Norm to the real axis, used by the step controller and the domain
    /// checks. For composite coefficients this is the infinity norm over
    /// all components.
    fn modulus(&self) -> f64;

    fn exp(&self) -> Self;
    fn ln(&self) -> Self;
    fn sqrt(&self) -> Self;
    /// Sine and cosine together; the jet recurrences always need the pair.
    fn sin_cos(&self) -> (Self, Self);
    fn powf(&self, p: f64) -> Self;

    /// True when `ln` is defined at this value.
    fn supports_ln(&self) -> bool;
    /// True when `sqrt` is defined at this value.
    fn supports_sqrt(&self) -> bool;
}

impl Coefficient for f64 {
    fn from_re(re: f64) -> Self {
        re
    }

    fn modulus(&self) -> f64 {
        self.abs()
    }

    fn exp(&self) -> Self {
        f64::exp(*self)
    }

    fn ln(&self) -> Self {
        f64::ln(*self)
    }

    fn sqrt(&self) -> Self {
        f64::sqrt(*self)
    }

    fn sin_cos(&self) -> (Self, Self) {
        f64::sin_cos(*self)
    }

    fn powf(&self, p: f64) -> Self {
        f64::powf(*self, p)
    }

    fn supports_ln(&self) -> bool {
        *self > 0.0
    }

    fn supports_sqrt(&self) -> bool {
        *self >= 0.0
    }
}

impl Coefficient for Complex<f64> {
    fn from_re(re: f64) -> Self {
        Complex::new(re, 0.0)
    }

    fn modulus(&self) -> f64 {
        self.norm()
    }

    fn exp(&self) -> Self {
        Complex::exp(*self)
    }

    fn ln(&self) -> Self {
        Complex::ln(*self)
    }

    fn sqrt(&self) -> Self {
        Complex::sqrt(*self)
    }

    fn sin_cos(&self) -> (Self, Self) {
        (Complex::sin(*self), Complex::cos(*self))
    }

    fn powf(&self, p: f64) -> Self {
        Complex::powf(*self, p)
    }

    fn supports_ln(&self) -> bool {
        !self.is_zero()
    }

    fn supports_sqrt(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn real_capabilities() {
        assert_eq!(f64::from_re(2.5), 2.5);
        assert_eq!((-3.0f64).modulus(), 3.0);
        let (s, c) = Coefficient::sin_cos(&0.5f64);
        assert_relative_eq!(s, 0.5f64.sin(), epsilon = 1e-15);
        assert_relative_eq!(c, 0.5f64.cos(), epsilon = 1e-15);
        assert!(1.0f64.supports_ln());
        assert!(!0.0f64.supports_ln());
        assert!(!(-1.0f64).supports_ln());
        assert!(0.0f64.supports_sqrt());
        assert!(!(-1.0f64).supports_sqrt());
    }

    #[test]
    fn complex_capabilities() {
        let z = Complex::new(3.0, 4.0);
        assert_relative_eq!(z.modulus(), 5.0);
        // ln is defined everywhere except the origin on the complex plane
        assert!(Complex::new(-1.0, 0.0).supports_ln());
        assert!(!Complex::new(0.0, 0.0).supports_ln());
        let e = Coefficient::exp(&Complex::new(0.0, std::f64::consts::PI));
        assert_relative_eq!(e.re, -1.0, max_relative = 1e-15);
        assert!(e.im.abs() < 1e-15);
    }
}
