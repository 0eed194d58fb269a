//! Ring operations: order-k recurrences and the allocating operator sugar.

use std::borrow::Cow;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

use super::Taylor;
use crate::error::Error;
use crate::scalar::Coefficient;

// Order-k mutating forms. Each writes coefficient `k` of the output from
// coefficients `0..=k` of the operands (and `0..k` of the output where the
// recurrence is self-referential). All operands must share the order.
impl<T: Coefficient> Taylor<T> {
    /// `(a + b)[k] = a[k] + b[k]`
    pub fn add_coeff(&mut self, a: &Self, b: &Self, k: usize) {
        self.coeffs[k] = a.coeffs[k].clone() + b.coeffs[k].clone();
    }

    /// `(a - b)[k] = a[k] - b[k]`
    pub fn sub_coeff(&mut self, a: &Self, b: &Self, k: usize) {
        self.coeffs[k] = a.coeffs[k].clone() - b.coeffs[k].clone();
    }

    /// `(a · b)[k] = Σ_{j=0..=k} a[j] · b[k−j]`
    pub fn mul_coeff(&mut self, a: &Self, b: &Self, k: usize) {
        let mut acc = T::zero();
        for j in 0..=k {
            acc += a.coeffs[j].clone() * b.coeffs[k - j].clone();
        }
        self.coeffs[k] = acc;
    }

    /// `(a / b)[k] = (a[k] − Σ_{j=0..k} self[j] · b[k−j]) / b[0]`
    ///
    /// Requires `b[0] ≠ 0` and coefficients `0..k` of `self` already valid.
    pub fn div_coeff(&mut self, a: &Self, b: &Self, k: usize) -> Result<(), Error> {
        if b.coeffs[0].is_zero() {
            return Err(Error::DivByZero);
        }
        let mut acc = a.coeffs[k].clone();
        for j in 0..k {
            acc -= self.coeffs[j].clone() * b.coeffs[k - j].clone();
        }
        self.coeffs[k] = acc / b.coeffs[0].clone();
        Ok(())
    }
}

impl<T: Coefficient> Taylor<T> {
    /// Quotient of two polynomials; fails with [`Error::DivByZero`] when the
    /// divisor's constant term vanishes.
    pub fn checked_div(&self, rhs: &Self) -> Result<Self, Error> {
        let (a, b) = conformed(self, rhs);
        let n = a.order();
        let mut out = Taylor::zeros(n);
        for k in 0..=n {
            out.div_coeff(&a, &b, k)?;
        }
        Ok(out)
    }
}

/// Zero-pads the shorter operand so both share an order.
fn conformed<'a, T: Coefficient>(
    a: &'a Taylor<T>,
    b: &'a Taylor<T>,
) -> (Cow<'a, Taylor<T>>, Cow<'a, Taylor<T>>) {
    use std::cmp::Ordering::*;
    match a.order().cmp(&b.order()) {
        Equal => (Cow::Borrowed(a), Cow::Borrowed(b)),
        Less => (Cow::Owned(a.padded(b.order())), Cow::Borrowed(b)),
        Greater => (Cow::Borrowed(a), Cow::Owned(b.padded(a.order()))),
    }
}

impl<'a, T: Coefficient> Add for &'a Taylor<T> {
    type Output = Taylor<T>;

    fn add(self, rhs: &'a Taylor<T>) -> Taylor<T> {
        let (a, b) = conformed(self, rhs);
        let n = a.order();
        let mut out = Taylor::zeros(n);
        for k in 0..=n {
            out.add_coeff(&a, &b, k);
        }
        out
    }
}

impl<'a, T: Coefficient> Sub for &'a Taylor<T> {
    type Output = Taylor<T>;

    fn sub(self, rhs: &'a Taylor<T>) -> Taylor<T> {
        let (a, b) = conformed(self, rhs);
        let n = a.order();
        let mut out = Taylor::zeros(n);
        for k in 0..=n {
            out.sub_coeff(&a, &b, k);
        }
        out
    }
}

impl<'a, T: Coefficient> Mul for &'a Taylor<T> {
    type Output = Taylor<T>;

    fn mul(self, rhs: &'a Taylor<T>) -> Taylor<T> {
        let (a, b) = conformed(self, rhs);
        let n = a.order();
        let mut out = Taylor::zeros(n);
        for k in 0..=n {
            out.mul_coeff(&a, &b, k);
        }
        out
    }
}

/// Quotient with float semantics: where [`Taylor::checked_div`] would fail,
/// the result is NaN-filled, exactly as the underlying scalar division by
/// zero would poison a plain float computation.
impl<'a, T: Coefficient> Div for &'a Taylor<T> {
    type Output = Taylor<T>;

    fn div(self, rhs: &'a Taylor<T>) -> Taylor<T> {
        self.checked_div(rhs)
            .unwrap_or_else(|_| self.padded(self.order().max(rhs.order())).nan_like())
    }
}

impl<'a, T: Coefficient> Neg for &'a Taylor<T> {
    type Output = Taylor<T>;

    fn neg(self) -> Taylor<T> {
        Taylor {
            coeffs: self.coeffs.iter().map(|c| -c.clone()).collect(),
        }
    }
}

macro_rules! forward_value_binop {
    ($trait:ident, $method:ident) => {
        impl<T: Coefficient> $trait for Taylor<T> {
            type Output = Taylor<T>;

            fn $method(self, rhs: Taylor<T>) -> Taylor<T> {
                $trait::$method(&self, &rhs)
            }
        }
    };
}

forward_value_binop!(Add, add);
forward_value_binop!(Sub, sub);
forward_value_binop!(Mul, mul);
forward_value_binop!(Div, div);

impl<T: Coefficient> Neg for Taylor<T> {
    type Output = Taylor<T>;

    fn neg(self) -> Taylor<T> {
        -&self
    }
}

// Scalar right-operands: `&p + c`, `&p * c`, …
impl<'a, T: Coefficient> Add<T> for &'a Taylor<T> {
    type Output = Taylor<T>;

    fn add(self, rhs: T) -> Taylor<T> {
        let mut out = self.clone();
        out.coeffs[0] += rhs;
        out
    }
}

impl<'a, T: Coefficient> Sub<T> for &'a Taylor<T> {
    type Output = Taylor<T>;

    fn sub(self, rhs: T) -> Taylor<T> {
        let mut out = self.clone();
        out.coeffs[0] -= rhs;
        out
    }
}

impl<'a, T: Coefficient> Mul<T> for &'a Taylor<T> {
    type Output = Taylor<T>;

    fn mul(self, rhs: T) -> Taylor<T> {
        Taylor {
            coeffs: self
                .coeffs
                .iter()
                .map(|c| c.clone() * rhs.clone())
                .collect(),
        }
    }
}

impl<'a, T: Coefficient> Div<T> for &'a Taylor<T> {
    type Output = Taylor<T>;

    fn div(self, rhs: T) -> Taylor<T> {
        Taylor {
            coeffs: self
                .coeffs
                .iter()
                .map(|c| c.clone() / rhs.clone())
                .collect(),
        }
    }
}

macro_rules! forward_value_scalar_binop {
    ($trait:ident, $method:ident) => {
        impl<T: Coefficient> $trait<T> for Taylor<T> {
            type Output = Taylor<T>;

            fn $method(self, rhs: T) -> Taylor<T> {
                $trait::$method(&self, rhs)
            }
        }
    };
}

forward_value_scalar_binop!(Add, add);
forward_value_scalar_binop!(Sub, sub);
forward_value_scalar_binop!(Mul, mul);
forward_value_scalar_binop!(Div, div);

impl<T: Coefficient> AddAssign for Taylor<T> {
    fn add_assign(&mut self, rhs: Taylor<T>) {
        *self = &*self + &rhs;
    }
}

impl<T: Coefficient> SubAssign for Taylor<T> {
    fn sub_assign(&mut self, rhs: Taylor<T>) {
        *self = &*self - &rhs;
    }
}

impl<T: Coefficient> MulAssign for Taylor<T> {
    fn mul_assign(&mut self, rhs: Taylor<T>) {
        *self = &*self * &rhs;
    }
}

impl<T: Coefficient> DivAssign for Taylor<T> {
    fn div_assign(&mut self, rhs: Taylor<T>) {
        *self = &*self / &rhs;
    }
}

impl<T: Coefficient> Zero for Taylor<T> {
    fn zero() -> Self {
        Taylor::zeros(0)
    }

    fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|c| c.is_zero())
    }
}

impl<T: Coefficient> One for Taylor<T> {
    fn one() -> Self {
        Taylor::constant(T::one(), 0)
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

    // Evaluating the truncated result must match the scalar operation on
    // the evaluations up to the dropped O(dt^{N+1}) tail.
    #[test]
    fn ring_ops_round_trip_through_evaluation() {
        let mut rng = StdRng::seed_from_u64(7);
        let dt = 0.01;
        for _ in 0..20 {
            let a = random_poly(&mut rng, 8);
            let b = random_poly(&mut rng, 8);
            let av = a.eval(dt);
            let bv = b.eval(dt);
            assert_relative_eq!((&a + &b).eval(dt), av + bv, epsilon = 1e-12);
            assert_relative_eq!((&a - &b).eval(dt), av - bv, epsilon = 1e-12);
            assert_relative_eq!((&a * &b).eval(dt), av * bv, epsilon = 1e-12);
            assert_relative_eq!((-&a).eval(dt), -av, epsilon = 1e-12);
        }
    }

    #[test]
    fn division_inverts_multiplication() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let mut a = random_poly(&mut rng, 10);
            let mut b = random_poly(&mut rng, 10);
            // keep the divisor away from a vanishing constant term
            b[0] += 2.0;
            a[0] += 2.0;
            let q = (&a * &b).checked_div(&b).unwrap();
            for k in 0..=a.order() {
                assert_relative_eq!(q[k], a[k], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn division_by_zero_constant_term_fails() {
        let a = Taylor::constant(1.0, 3);
        let b = Taylor::from_coeffs(vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(a.checked_div(&b), Err(Error::DivByZero));
        // the operator sugar poisons instead
        assert!((&a / &b)[0].is_nan());
    }

    #[test]
    fn mismatched_orders_are_zero_padded() {
        let a = Taylor::from_coeffs(vec![1.0, 1.0, 1.0]);
        let b = Taylor::constant(2.0, 0);
        let s = &a + &b;
        assert_eq!(s.order(), 2);
        assert_eq!(s.coeffs(), &[3.0, 1.0, 1.0]);
        let p = &a * &b;
        assert_eq!(p.coeffs(), &[2.0, 2.0, 2.0]);
    }

    #[test]
    fn scalar_operands_act_on_the_right() {
        let a = Taylor::variable(1.0, 2);
        assert_eq!((&a + 2.0).coeffs(), &[3.0, 1.0, 0.0]);
        assert_eq!((&a - 2.0).coeffs(), &[-1.0, 1.0, 0.0]);
        assert_eq!((&a * 2.0).coeffs(), &[2.0, 2.0, 0.0]);
        assert_eq!((&a / 2.0).coeffs(), &[0.5, 0.5, 0.0]);
    }

    #[test]
    fn order_k_forms_match_the_allocating_forms() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = random_poly(&mut rng, 6);
        let b = random_poly(&mut rng, 6);
        let full = &a * &b;
        let mut incremental = Taylor::zeros(6);
        for k in 0..=6 {
            incremental.mul_coeff(&a, &b, k);
        }
        assert_eq!(incremental, full);
    }
}
