//! Two- and three-dimensional integration by nesting one-dimensional integrations.
//!
//! Every point of the outer integration runs a complete inner integration, so the cost is the
//! product of the costs in each dimension. Inner integrations are independent of each other.
//! When the outer integrator uses [`Backend::Native`](crate::Backend::Native), they run in
//! parallel on the rayon thread pool.
use crate::domain::DomainTransform;
use crate::error::{ConfigurationError, EvaluationError, IntegrationError};
use crate::function::TryFn;
use crate::integrate::{ConvergenceStatus, IntegrationResult, Integrator1D, IntegratorConfig};
use crate::Real;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Bookkeeping shared by all inner integrations of one nested integration.
#[derive(Debug)]
struct NestedStatistics {
    evaluations: AtomicUsize,
    inner_converged: AtomicBool,
}

impl NestedStatistics {
    fn new() -> Self {
        Self {
            evaluations: AtomicUsize::new(0),
            inner_converged: AtomicBool::new(true),
        }
    }

    fn record<T>(&self, result: &IntegrationResult<T>) {
        self.evaluations.fetch_add(result.evaluations, Ordering::Relaxed);
        if !result.converged() {
            self.inner_converged.store(false, Ordering::Relaxed);
        }
    }

    /// Combines the outer result with the statistics of the inner integrations.
    fn finish<T>(self, outer: IntegrationResult<T>) -> IntegrationResult<T> {
        let status = if self.inner_converged.into_inner() {
            outer.status
        } else {
            ConvergenceStatus::MaxLevelReached
        };
        IntegrationResult {
            evaluations: self.evaluations.into_inner(),
            status,
            ..outer
        }
    }
}

/// Recovers an error raised by an inner integration from the evaluation error of the outer
/// integration that wraps it.
fn unwrap_nested_error(error: IntegrationError) -> IntegrationError {
    match error {
        IntegrationError::Evaluation(EvaluationError::Function { point, source }) => {
            match source.downcast::<IntegrationError>() {
                Ok(inner) => inner,
                Err(source) => IntegrationError::Evaluation(EvaluationError::Function { point, source }),
            }
        }
        error => error,
    }
}

/// Integrator for functions of two variables over a rectangle.
///
/// The rectangle may be unbounded in either direction.
#[derive(Debug, Clone)]
pub struct Integrator2D<T> {
    outer: Integrator1D<T>,
    inner: Integrator1D<T>,
}

impl<T: Real> Default for Integrator2D<T> {
    fn default() -> Self {
        Self::from_integrators(Integrator1D::default(), Integrator1D::default())
    }
}

impl<T: Real> Integrator2D<T> {
    /// Creates an integrator that uses the same configuration in both dimensions.
    pub fn new(config: IntegratorConfig) -> Result<Self, ConfigurationError> {
        Ok(Self::from_integrators(Integrator1D::new(config)?, Integrator1D::new(config)?))
    }

    /// Creates an integrator from the integrators for the outer (`x`) and inner (`y`) dimension.
    pub fn from_integrators(outer: Integrator1D<T>, inner: Integrator1D<T>) -> Self {
        Self { outer, inner }
    }

    pub fn outer(&self) -> &Integrator1D<T> {
        &self.outer
    }

    pub fn inner(&self) -> &Integrator1D<T> {
        &self.inner
    }

    /// Integrates `f(x, y)` over `x_limits × y_limits`.
    pub fn integrate<F>(&self, f: F, x_limits: (T, T), y_limits: (T, T)) -> Result<IntegrationResult<T>, IntegrationError>
    where
        F: Sync + Fn(T, T) -> T,
    {
        self.try_integrate(|x, y| Ok(f(x, y)), x_limits, y_limits)
    }

    /// Integrates a fallible function `f(x, y)` over `x_limits × y_limits`.
    ///
    /// The first failure of `f` aborts the integration, and the error is returned as reported by
    /// the inner integration.
    pub fn try_integrate<F>(
        &self,
        f: F,
        x_limits: (T, T),
        y_limits: (T, T),
    ) -> Result<IntegrationResult<T>, IntegrationError>
    where
        F: Sync + Fn(T, T) -> eyre::Result<T>,
    {
        let x_transform = DomainTransform::new(x_limits.0, x_limits.1)?;
        let y_transform = DomainTransform::new(y_limits.0, y_limits.1)?;
        self.integrate_transformed(&f, &x_transform, &y_transform)
    }

    pub(crate) fn integrate_transformed<F>(
        &self,
        f: &F,
        x_transform: &DomainTransform<T>,
        y_transform: &DomainTransform<T>,
    ) -> Result<IntegrationResult<T>, IntegrationError>
    where
        F: ?Sized + Sync + Fn(T, T) -> eyre::Result<T>,
    {
        let statistics = NestedStatistics::new();
        let inner_backend = self.inner.config().backend;
        let integrate_y = |x: T| -> eyre::Result<T> {
            let integrand = TryFn(|y: T| f(x, y));
            let result = self
                .inner
                .integrate_transformed(&integrand, y_transform, inner_backend)?;
            statistics.record(&result);
            Ok(result.value)
        };

        let outer = self
            .outer
            .integrate_transformed(&TryFn(integrate_y), x_transform, self.outer.config().backend)
            .map_err(unwrap_nested_error)?;
        debug!(
            "2D integration finished after {} outer levels with {} outer points.",
            outer.levels, outer.evaluations
        );
        Ok(statistics.finish(outer))
    }
}

/// Integrator for functions of three variables over a box.
///
/// The box may be unbounded in any direction.
#[derive(Debug, Clone)]
pub struct Integrator3D<T> {
    outer: Integrator1D<T>,
    inner: Integrator2D<T>,
}

impl<T: Real> Default for Integrator3D<T> {
    fn default() -> Self {
        Self::from_integrators(Integrator1D::default(), Integrator2D::default())
    }
}

impl<T: Real> Integrator3D<T> {
    /// Creates an integrator that uses the same configuration in all three dimensions.
    pub fn new(config: IntegratorConfig) -> Result<Self, ConfigurationError> {
        Ok(Self::from_integrators(Integrator1D::new(config)?, Integrator2D::new(config)?))
    }

    /// Creates an integrator from the integrator for the outer (`x`) dimension and the
    /// integrator for the inner (`y`, `z`) dimensions.
    pub fn from_integrators(outer: Integrator1D<T>, inner: Integrator2D<T>) -> Self {
        Self { outer, inner }
    }

    pub fn outer(&self) -> &Integrator1D<T> {
        &self.outer
    }

    pub fn inner(&self) -> &Integrator2D<T> {
        &self.inner
    }

    /// Integrates `f(x, y, z)` over `x_limits × y_limits × z_limits`.
    pub fn integrate<F>(
        &self,
        f: F,
        x_limits: (T, T),
        y_limits: (T, T),
        z_limits: (T, T),
    ) -> Result<IntegrationResult<T>, IntegrationError>
    where
        F: Sync + Fn(T, T, T) -> T,
    {
        self.try_integrate(|x, y, z| Ok(f(x, y, z)), x_limits, y_limits, z_limits)
    }

    /// Integrates a fallible function `f(x, y, z)` over `x_limits × y_limits × z_limits`.
    pub fn try_integrate<F>(
        &self,
        f: F,
        x_limits: (T, T),
        y_limits: (T, T),
        z_limits: (T, T),
    ) -> Result<IntegrationResult<T>, IntegrationError>
    where
        F: Sync + Fn(T, T, T) -> eyre::Result<T>,
    {
        let x_transform = DomainTransform::new(x_limits.0, x_limits.1)?;
        let y_transform = DomainTransform::new(y_limits.0, y_limits.1)?;
        let z_transform = DomainTransform::new(z_limits.0, z_limits.1)?;

        let statistics = NestedStatistics::new();
        let integrate_yz = |x: T| -> eyre::Result<T> {
            let integrand = |y: T, z: T| f(x, y, z);
            let result = self
                .inner
                .integrate_transformed(&integrand, &y_transform, &z_transform)?;
            statistics.record(&result);
            Ok(result.value)
        };

        let outer = self
            .outer
            .integrate_transformed(&TryFn(integrate_yz), &x_transform, self.outer.config().backend)
            .map_err(unwrap_nested_error)?;
        debug!(
            "3D integration finished after {} outer levels with {} outer points.",
            outer.levels, outer.evaluations
        );
        Ok(statistics.finish(outer))
    }
}
