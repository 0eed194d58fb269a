use crate::error::Error;
use crate::ode_solver::OdeRhs;
use crate::scalar::Coefficient;
use crate::taylor::Taylor;

/// `x' = -λ x`, solution `x0 e^{-λ t}`.
pub struct ExponentialDecay {
    pub lambda: f64,
}

impl<T: Coefficient> OdeRhs<T> for ExponentialDecay {
    fn rhs_inplace(&self, _t: f64, x: &[Taylor<T>], dx: &mut [Taylor<T>]) -> Result<(), Error> {
        dx[0] = &x[0] * T::from_re(-self.lambda);
        Ok(())
    }
}
