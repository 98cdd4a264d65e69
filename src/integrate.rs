//! One-dimensional tanh-sinh integration with level-doubling refinement.
//!
//! An integration starts at level 0 and halves the step size at every subsequent level. Each
//! level only evaluates the points that are new at that level, and the estimate is updated with
//!
//! $$ I_k = \frac{1}{2} I_{k - 1} + \sum_{i \in \text{level } k} s_i f(x_i), $$
//!
//! where $s_i$ combines the quadrature weight and the Jacobian of the domain substitution.
//!
//! The error estimate at level $k$ is $|I_k - I_{k-1}|$. Refinement stops as soon as
//!
//! - the error estimate is at most `tolerance` times $|I_k|$, or
//! - the error estimate has dropped to the level of round-off in the sum, which is bounded by a
//!   small multiple of machine epsilon times the estimate of $\int |f|$. Further refinement cannot
//!   improve the result in this case.
//!
//! If neither happens before `max_level`, the last estimate is returned with the status
//! [`ConvergenceStatus::MaxLevelReached`].
use crate::domain::DomainTransform;
use crate::error::{ConfigurationError, IntegrationError};
use crate::evaluate::Backend;
use crate::function::Integrand;
use crate::quadrature::QuadratureTable;
use crate::Real;
use fermi_quadrature::tanh_sinh::TanhSinh;
use itertools::izip;
use log::{debug, trace, warn};
use nalgebra::convert;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

pub mod nested;

/// Multiple of machine epsilon, relative to the integral of `|f|`, below which differences
/// between consecutive levels are considered round-off.
const ROUNDOFF_FACTOR: f64 = 50.0;

/// Settings for an integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegratorConfig {
    /// The finest refinement level. The step size at level `n` is `initial_step / 2^n`.
    ///
    /// The number of points roughly doubles with every level, so levels beyond 20 are only
    /// reachable for integrands with very little work per point. The step size of the finest
    /// level must be a normal number, which caps this at about `1022 + log2(initial_step)`.
    pub max_level: usize,
    /// The step size of level 0 in the tanh-sinh variable.
    pub initial_step: f64,
    /// Relative tolerance for the difference between consecutive level estimates.
    pub tolerance: f64,
    pub backend: Backend,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            max_level: 12,
            initial_step: 1.0,
            tolerance: 1e-10,
            backend: Backend::default(),
        }
    }
}

impl IntegratorConfig {
    pub fn with_max_level(self, max_level: usize) -> Self {
        Self { max_level, ..self }
    }

    pub fn with_initial_step(self, initial_step: f64) -> Self {
        Self { initial_step, ..self }
    }

    pub fn with_tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    pub fn with_backend(self, backend: Backend) -> Self {
        Self { backend, ..self }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_level == 0 {
            return Err(ConfigurationError::ZeroMaxLevel);
        }
        let generator = TanhSinh::new(self.initial_step)?;
        if self.max_level > generator.max_level() {
            Err(ConfigurationError::MaxLevelTooLarge {
                max_level: self.max_level,
                limit: generator.max_level(),
            })
        } else if !(self.tolerance >= 0.0) {
            Err(ConfigurationError::InvalidTolerance(self.tolerance))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// The error estimate satisfied the tolerance, or reached the round-off level.
    Converged,
    /// The maximum level was reached first. The value is the best available estimate.
    MaxLevelReached,
}

/// The outcome of an integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationResult<T> {
    pub value: T,
    /// The difference between the estimates of the last two levels.
    pub error_estimate: T,
    /// The finest level that was evaluated.
    pub levels: usize,
    /// The number of integrand evaluations.
    pub evaluations: usize,
    pub status: ConvergenceStatus,
    /// The estimate after each level, starting at level 0.
    pub level_estimates: Vec<T>,
}

impl<T> IntegrationResult<T> {
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

/// Running state of a single integration, with one entry per evaluated level.
#[derive(Debug)]
struct LevelAccumulator<T> {
    estimates: Vec<T>,
    /// Estimates of the integral of `|f|`.
    absolute_estimates: Vec<T>,
    evaluations: usize,
}

impl<T: Real> LevelAccumulator<T> {
    fn with_capacity(levels: usize) -> Self {
        Self {
            estimates: Vec::with_capacity(levels),
            absolute_estimates: Vec::with_capacity(levels),
            evaluations: 0,
        }
    }

    /// Adds the contributions of the new points of the next level.
    ///
    /// Returns the number of contributions that overflowed and were replaced by zero.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn push_level(&mut self, scales: &[T], values: &[T]) -> usize {
        assert_eq!(scales.len(), values.len());
        let mut sum = T::zero();
        let mut absolute_sum = T::zero();
        let mut overflowed = 0;

        for (&scale, &value) in izip!(scales, values) {
            let contribution = scale * value;
            if contribution.is_finite() {
                sum += contribution;
                absolute_sum += contribution.abs();
            } else {
                overflowed += 1;
            }
        }

        let (estimate, absolute_estimate) = match (self.estimates.last(), self.absolute_estimates.last()) {
            (Some(&previous), Some(&previous_absolute)) => {
                (0.5 * previous + sum, 0.5 * previous_absolute + absolute_sum)
            }
            _ => (sum, absolute_sum),
        };

        self.estimates.push(estimate);
        self.absolute_estimates.push(absolute_estimate);
        self.evaluations += values.len();
        overflowed
    }

    fn estimate(&self) -> T {
        self.estimates.last().copied().unwrap_or_else(T::zero)
    }

    fn absolute_estimate(&self) -> T {
        self.absolute_estimates.last().copied().unwrap_or_else(T::zero)
    }

    fn error_estimate(&self) -> Option<T> {
        match self.estimates.as_slice() {
            [.., previous, current] => Some((*current - *previous).abs()),
            _ => None,
        }
    }

    fn into_result(self, status: ConvergenceStatus) -> IntegrationResult<T> {
        IntegrationResult {
            value: self.estimate(),
            error_estimate: self.error_estimate().unwrap_or_else(T::zero),
            levels: self.estimates.len().saturating_sub(1),
            evaluations: self.evaluations,
            status,
            level_estimates: self.estimates,
        }
    }
}

/// Tanh-sinh integrator for finite, semi-infinite and infinite intervals.
///
/// The integrator owns a cache of quadrature levels for its configuration. The cache is filled
/// on demand and is safe to share, so one integrator may serve concurrent integrations.
#[derive(Debug, Clone)]
pub struct Integrator1D<T> {
    config: IntegratorConfig,
    table: QuadratureTable<T>,
}

impl<T: Real> Default for Integrator1D<T> {
    fn default() -> Self {
        Self::new(IntegratorConfig::default()).expect("Internal error: default configuration must be valid")
    }
}

impl<T: Real> Integrator1D<T> {
    pub fn new(config: IntegratorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let table = QuadratureTable::new(config.initial_step, config.max_level)?;
        Ok(Self { config, table })
    }

    /// Creates an integrator with default settings apart from the maximum level.
    pub fn with_max_level(max_level: usize) -> Result<Self, ConfigurationError> {
        Self::new(IntegratorConfig::default().with_max_level(max_level))
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    pub fn table(&self) -> &QuadratureTable<T> {
        &self.table
    }

    /// Integrates `f` from `lower` to `upper` with the configured backend.
    ///
    /// Either limit may be infinite.
    pub fn integrate<F>(&self, f: F, lower: T, upper: T) -> Result<IntegrationResult<T>, IntegrationError>
    where
        F: Integrand<T>,
    {
        self.integrate_with_backend(f, lower, upper, self.config.backend)
    }

    /// Same as [`integrate`](Self::integrate), but with an explicitly chosen backend.
    pub fn integrate_with_backend<F>(
        &self,
        f: F,
        lower: T,
        upper: T,
        backend: Backend,
    ) -> Result<IntegrationResult<T>, IntegrationError>
    where
        F: Integrand<T>,
    {
        let transform = DomainTransform::new(lower, upper)?;
        self.integrate_transformed(&f, &transform, backend)
    }

    pub(crate) fn integrate_transformed<F>(
        &self,
        f: &F,
        transform: &DomainTransform<T>,
        backend: Backend,
    ) -> Result<IntegrationResult<T>, IntegrationError>
    where
        F: ?Sized + Integrand<T>,
    {
        let max_level = self.config.max_level;
        let tolerance: T = convert(self.config.tolerance);
        let roundoff = convert::<f64, T>(ROUNDOFF_FACTOR) * T::default_epsilon();
        let mut accumulator = LevelAccumulator::with_capacity(max_level + 1);

        for level in 0..=max_level {
            let mapped = transform.map_rule(self.table.points(level));
            let values = backend.evaluate(f, mapped.points())?;
            let overflowed = accumulator.push_level(mapped.scales(), &values);

            if mapped.skipped() > 0 || overflowed > 0 {
                trace!(
                    "Level {}: skipped {} points and {} overflowing contributions",
                    level,
                    mapped.skipped(),
                    overflowed
                );
            }

            let estimate = accumulator.estimate();
            match accumulator.error_estimate() {
                Some(error) => {
                    debug!(
                        "Level {}: {} new points, estimate {}, error estimate {}",
                        level,
                        mapped.len(),
                        estimate,
                        error
                    );
                    let within_tolerance = error <= tolerance * estimate.abs();
                    let at_roundoff = error <= roundoff * accumulator.absolute_estimate();
                    if within_tolerance || at_roundoff {
                        return Ok(accumulator.into_result(ConvergenceStatus::Converged));
                    }
                }
                None => debug!("Level {}: {} new points, estimate {}", level, mapped.len(), estimate),
            }
        }

        let result = accumulator.into_result(ConvergenceStatus::MaxLevelReached);
        warn!(
            "Tanh-sinh integration did not converge within {} levels (estimate {}, error estimate {}).",
            max_level, result.value, result.error_estimate
        );
        Ok(result)
    }
}
