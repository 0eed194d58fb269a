use nalgebra::DVector;

use crate::error::Error;
use crate::ode_solver::OdeRhs;
use crate::scalar::Coefficient;
use crate::taylor::Taylor;

/// The planar Kepler problem `q'' = -q/|q|³` as a first-order system over
/// `(qx, qy, vx, vy)`, in units with GM = 1.
pub struct Kepler;

impl<T: Coefficient> OdeRhs<T> for Kepler {
    fn rhs_inplace(&self, _t: f64, x: &[Taylor<T>], dx: &mut [Taylor<T>]) -> Result<(), Error> {
        let r2 = (&x[0] * &x[0]) + (&x[1] * &x[1]);
        let r = r2.checked_sqrt()?;
        let r3 = &r2 * &r;
        dx[0] = x[2].clone();
        dx[1] = x[3].clone();
        dx[2] = (-&x[0]).checked_div(&r3)?;
        dx[3] = (-&x[1]).checked_div(&r3)?;
        Ok(())
    }
}

pub fn energy(y: &DVector<f64>) -> f64 {
    let r = (y[0] * y[0] + y[1] * y[1]).sqrt();
    0.5 * (y[2] * y[2] + y[3] * y[3]) - 1.0 / r
}

pub fn angular_momentum(y: &DVector<f64>) -> f64 {
    y[0] * y[3] - y[1] * y[2]
}
