//! Truncated univariate polynomials with coefficient-recurrence operators.
//!
//! Every operator comes in two forms: an allocating form returning a fresh
//! polynomial, and an order-k mutating form that writes coefficient `k` of
//! the output assuming coefficients `0..k` of all operands (and the output)
//! are already valid. Repeated application of the order-k forms is what
//! lifts a 0-th order state to a full jet inside the driver.

use std::fmt;
use std::ops::{Index, IndexMut};

use nalgebra::DVector;

use crate::scalar::Coefficient;

mod arithmetic;
mod transcendental;

/// A univariate polynomial of fixed degree bound over coefficients `T`,
/// stored as a contiguous buffer of exactly `order + 1` coefficients.
///
/// The degree bound is immutable: arithmetic between equal-order
/// polynomials stays at that order (products are truncated), and binary
/// operations between mismatched orders zero-pad the shorter operand.
#[derive(Clone, Debug, PartialEq)]
pub struct Taylor<T> {
    coeffs: Vec<T>,
}

impl<T: Coefficient> Taylor<T> {
    /// The constant `c` at the given order: `[c, 0, 0, …]`.
    pub fn constant(c: T, order: usize) -> Self {
        let mut coeffs = vec![T::zero(); order + 1];
        coeffs[0] = c;
        Self { coeffs }
    }

    /// The independent variable displaced by `c`: `[c, 1, 0, …]`.
    ///
    /// # Panics
    /// Panics if `order` is zero; a degree-0 polynomial cannot hold the
    /// linear term.
    pub fn variable(c: T, order: usize) -> Self {
        assert!(order >= 1, "order 0 cannot represent the identity");
        let mut coeffs = vec![T::zero(); order + 1];
        coeffs[0] = c;
        coeffs[1] = T::one();
        Self { coeffs }
    }

    /// All coefficients zero at the given order.
    pub fn zeros(order: usize) -> Self {
        Self {
            coeffs: vec![T::zero(); order + 1],
        }
    }

    /// Takes ownership of a coefficient buffer; the order is `len - 1`.
    ///
    /// # Panics
    /// Panics on an empty buffer.
    pub fn from_coeffs(coeffs: Vec<T>) -> Self {
        assert!(!coeffs.is_empty(), "a polynomial needs a constant term");
        Self { coeffs }
    }

    pub fn order(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn coeffs(&self) -> &[T] {
        &self.coeffs
    }

    pub(crate) fn coeff_or_zero(&self, k: usize) -> T {
        self.coeffs.get(k).cloned().unwrap_or_else(T::zero)
    }

    /// The zero-padded copy at a (not smaller) order.
    pub fn padded(&self, order: usize) -> Self {
        assert!(order >= self.order());
        let mut coeffs = self.coeffs.clone();
        coeffs.resize(order + 1, T::zero());
        Self { coeffs }
    }

    /// Overwrites this polynomial with the first `len` coefficients of
    /// `src`, zeroing everything above. Both must share the same order.
    pub(crate) fn assign_prefix(&mut self, src: &Self, len: usize) {
        debug_assert_eq!(self.order(), src.order());
        for (k, c) in self.coeffs.iter_mut().enumerate() {
            *c = if k < len {
                src.coeffs[k].clone()
            } else {
                T::zero()
            };
        }
    }

    pub(crate) fn set_constant_term(&mut self, c: T) {
        self.coeffs[0] = c;
    }

    /// Horner evaluation at `x`.
    pub fn eval(&self, x: T) -> T {
        self.coeffs
            .iter()
            .rev()
            .fold(T::zero(), |acc, c| acc * x.clone() + c.clone())
    }

    /// Infinity norm of the coefficient moduli. NaN coefficients poison the
    /// norm instead of disappearing into `f64::max`.
    pub fn inf_norm(&self) -> f64 {
        let mut m = 0.0_f64;
        for c in &self.coeffs {
            let v = c.modulus();
            if v.is_nan() {
                return f64::NAN;
            }
            if v > m {
                m = v;
            }
        }
        m
    }

    /// All coefficients NaN; the quiet result of the unchecked operator
    /// sugar when the checked form would have failed.
    pub(crate) fn nan_like(&self) -> Self {
        Self {
            coeffs: vec![T::from_re(f64::NAN); self.coeffs.len()],
        }
    }
}

/// Evaluates every polynomial of a state vector at the scalar `dt`.
pub fn eval_state<T: Coefficient>(x: &[Taylor<T>], dt: f64) -> DVector<T> {
    DVector::from_iterator(x.len(), x.iter().map(|p| p.eval(T::from_re(dt))))
}

impl<T> Index<usize> for Taylor<T> {
    type Output = T;

    fn index(&self, k: usize) -> &T {
        &self.coeffs[k]
    }
}

impl<T> IndexMut<usize> for Taylor<T> {
    fn index_mut(&mut self, k: usize) -> &mut T {
        &mut self.coeffs[k]
    }
}

impl<T: Coefficient> fmt::Display for Taylor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut any = false;
        for (k, c) in self.coeffs.iter().enumerate() {
            if c.is_zero() {
                continue;
            }
            if any {
                write!(f, " + ")?;
            }
            match k {
                0 => write!(f, "{c}")?,
                1 => write!(f, "({c}) t")?,
                _ => write!(f, "({c}) t^{k}")?,
            }
            any = true;
        }
        if !any {
            write!(f, "0")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constructors_fix_the_order() {
        let c = Taylor::constant(2.0, 4);
        assert_eq!(c.order(), 4);
        assert_eq!(c.coeffs(), &[2.0, 0.0, 0.0, 0.0, 0.0]);
        let v = Taylor::variable(2.0, 4);
        assert_eq!(v.coeffs(), &[2.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn horner_eval() {
        // 1 + 2t + 3t^2 at t = 0.5
        let p = Taylor::from_coeffs(vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(p.eval(0.5), 2.75);
        assert_relative_eq!(p.eval(0.0), 1.0);
    }

    #[test]
    fn eval_state_is_componentwise() {
        let x = vec![
            Taylor::variable(1.0, 2),
            Taylor::from_coeffs(vec![0.0, 0.0, 2.0]),
        ];
        let v = eval_state(&x, 0.5);
        assert_relative_eq!(v[0], 1.5);
        assert_relative_eq!(v[1], 0.5);
    }

    #[test]
    fn display_skips_zero_terms() {
        let p = Taylor::from_coeffs(vec![1.0, 2.0, 0.0, -3.0]);
        insta::assert_snapshot!(p.to_string(), @"1 + (2) t + (-3) t^3");
        let z = Taylor::<f64>::zeros(2);
        insta::assert_snapshot!(z.to_string(), @"0");
    }
}
