//! Tanh-sinh (double exponential) quadrature in one, two and three dimensions.
//!
//! Integrals over finite, semi-infinite and infinite intervals are computed by mapping the
//! interval onto the reference interval `[-1, 1]` and applying the tanh-sinh rule, which
//! concentrates sample points near the endpoints. This makes it well suited for integrands with
//! endpoint singularities or steep decay, without having to characterize the singularity.
//!
//! The step size of the rule is halved level by level until two consecutive estimates agree to
//! within the configured tolerance. Every level only evaluates the points that are new at that
//! level, so no function value is ever computed twice.
//!
//! ```
//! use fermi::{Integrator1D, IntegratorConfig};
//!
//! let integrator = Integrator1D::<f64>::new(IntegratorConfig::default()).unwrap();
//! let result = integrator
//!     .integrate(|x: f64| x * (-x / 5.0).exp(), 0.0, 1.0)
//!     .unwrap();
//! let exact = 25.0 - 30.0 * (-0.2f64).exp();
//! assert!(result.converged());
//! assert!((result.value - exact).abs() < 1e-10);
//! ```
//!
//! Multi-dimensional integrals are computed by nesting one-dimensional integrations, see
//! [`Integrator2D`] and [`Integrator3D`].
use nalgebra::RealField;

pub mod domain;
pub mod error;
pub mod evaluate;
pub mod function;
pub mod integrate;
pub mod quadrature;

pub use error::{ConfigurationError, EvaluationError, IntegrationError};
pub use evaluate::Backend;
pub use function::{BatchFn, Integrand, TryFn};
pub use integrate::nested::{Integrator2D, Integrator3D};
pub use integrate::{ConvergenceStatus, IntegrationResult, Integrator1D, IntegratorConfig};

pub extern crate nalgebra;

/// Real scalar types the integrators operate on.
///
/// Used as a trait alias for the traits needed by generic `fermi` routines.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

/// Converts a scalar to `f64` for reporting purposes.
pub(crate) fn to_f64<T: Real>(value: T) -> f64 {
    nalgebra::try_convert::<T, f64>(value).unwrap_or(f64::NAN)
}
