use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use nalgebra::DVector;
use num_traits::{One, Zero};

use super::Coefficient;

/// A first-order multivariate expansion: a value on the trajectory plus its
/// gradient along a set of variational directions.
///
/// This is the inner level of the two-level nesting used by the variational
/// equations: the jet driver runs on `Taylor<Dual>` and the gradient parts
/// of the resulting coefficients are the Jacobian of the right-hand side,
/// order by order in time.
///
/// Gradients broadcast: a `Dual` built with [`Dual::constant`] carries an
/// empty gradient that acts as zero against any direction count, so
/// `Zero::zero()` and `One::one()` need no knowledge of the active
/// direction set.
#[derive(Clone, Debug, PartialEq)]
pub struct Dual {
    re: f64,
    dx: DVector<f64>,
}

impl Dual {
    /// A value with zero gradient.
    pub fn constant(re: f64) -> Self {
        Self {
            re,
            dx: DVector::zeros(0),
        }
    }

    /// A value seeded as the `j`-th of `ndirs` variational directions.
    pub fn variable(re: f64, j: usize, ndirs: usize) -> Self {
        assert!(j < ndirs, "direction index out of range");
        let mut dx = DVector::zeros(ndirs);
        dx[j] = 1.0;
        Self { re, dx }
    }

    pub fn re(&self) -> f64 {
        self.re
    }

    /// Gradient component along direction `j`; zero beyond the stored span.
    pub fn grad(&self, j: usize) -> f64 {
        self.dx.get(j).copied().unwrap_or(0.0)
    }

    /// Chain rule: a new value `v` whose gradient is `d` times this one's.
    fn chain(&self, v: f64, d: f64) -> Self {
        Self {
            re: v,
            dx: &self.dx * d,
        }
    }
}

fn zip(a: &DVector<f64>, b: &DVector<f64>, f: impl Fn(f64, f64) -> f64) -> DVector<f64> {
    let n = a.len().max(b.len());
    DVector::from_fn(n, |i, _| {
        f(
            a.get(i).copied().unwrap_or(0.0),
            b.get(i).copied().unwrap_or(0.0),
        )
    })
}

impl Add for Dual {
    type Output = Dual;
    fn add(self, rhs: Dual) -> Dual {
        Dual {
            re: self.re + rhs.re,
            dx: zip(&self.dx, &rhs.dx, |a, b| a + b),
        }
    }
}

impl Sub for Dual {
    type Output = Dual;
    fn sub(self, rhs: Dual) -> Dual {
        Dual {
            re: self.re - rhs.re,
            dx: zip(&self.dx, &rhs.dx, |a, b| a - b),
        }
    }
}

impl Mul for Dual {
    type Output = Dual;
    fn mul(self, rhs: Dual) -> Dual {
        // (a + a')(b + b') = ab + (a b' + b a')
        Dual {
            re: self.re * rhs.re,
            dx: zip(&self.dx, &rhs.dx, |a, b| a * rhs.re + b * self.re),
        }
    }
}

impl Div for Dual {
    type Output = Dual;
    fn div(self, rhs: Dual) -> Dual {
        let den = rhs.re * rhs.re;
        Dual {
            re: self.re / rhs.re,
            dx: zip(&self.dx, &rhs.dx, |a, b| (a * rhs.re - b * self.re) / den),
        }
    }
}

impl Neg for Dual {
    type Output = Dual;
    fn neg(self) -> Dual {
        Dual {
            re: -self.re,
            dx: -self.dx,
        }
    }
}

impl AddAssign for Dual {
    fn add_assign(&mut self, rhs: Dual) {
        *self = self.clone() + rhs;
    }
}

impl SubAssign for Dual {
    fn sub_assign(&mut self, rhs: Dual) {
        *self = self.clone() - rhs;
    }
}

impl MulAssign for Dual {
    fn mul_assign(&mut self, rhs: Dual) {
        *self = self.clone() * rhs;
    }
}

impl DivAssign for Dual {
    fn div_assign(&mut self, rhs: Dual) {
        *self = self.clone() / rhs;
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Dual::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.re == 0.0 && self.dx.iter().all(|v| *v == 0.0)
    }
}

impl One for Dual {
    fn one() -> Self {
        Dual::constant(1.0)
    }
}

impl fmt::Display for Dual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.re)?;
        for (j, v) in self.dx.iter().enumerate() {
            if *v != 0.0 {
                write!(f, " + {v}∂{j}")?;
            }
        }
        Ok(())
    }
}

impl Coefficient for Dual {
    fn from_re(re: f64) -> Self {
        Dual::constant(re)
    }

    fn modulus(&self) -> f64 {
        let mut m = self.re.abs();
        for v in self.dx.iter() {
            let a = v.abs();
            if a.is_nan() {
                return f64::NAN;
            }
            if a > m {
                m = a;
            }
        }
        m
    }

    fn exp(&self) -> Self {
        let e = self.re.exp();
        self.chain(e, e)
    }

    fn ln(&self) -> Self {
        self.chain(self.re.ln(), 1.0 / self.re)
    }

    fn sqrt(&self) -> Self {
        let s = self.re.sqrt();
        self.chain(s, 0.5 / s)
    }

    fn sin_cos(&self) -> (Self, Self) {
        let (s, c) = self.re.sin_cos();
        (self.chain(s, c), self.chain(c, -s))
    }

    fn powf(&self, p: f64) -> Self {
        self.chain(self.re.powf(p), p * self.re.powf(p - 1.0))
    }

    fn supports_ln(&self) -> bool {
        self.re > 0.0
    }

    fn supports_sqrt(&self) -> bool {
        self.re >= 0.0
    }
}
