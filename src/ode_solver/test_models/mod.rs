//! Reference systems shared by the test-suite and the benches.

pub mod exponential_decay;
pub mod kepler;
pub mod lorenz;
pub mod pendulum;
