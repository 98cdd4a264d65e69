//! Errors reported by the integrators.
//!
//! Invalid configuration and failing integrands are reported as errors. Numerical edge cases,
//! such as weights that overflow far out in the tails of a semi-infinite interval, are absorbed
//! by the integrators and never surface here. Failure to reach the requested tolerance is not an
//! error either, see [`ConvergenceStatus`](crate::ConvergenceStatus).
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Invalid parameters given when constructing an integrator or requesting an integral.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// The initial step size is not finite and strictly positive.
    NonPositiveStep(f64),
    /// At least one refinement level is needed to estimate the error.
    ZeroMaxLevel,
    /// The maximum level exceeds the deepest level whose step size is a normal number.
    MaxLevelTooLarge { max_level: usize, limit: usize },
    /// The tolerance is negative or not a number.
    InvalidTolerance(f64),
    /// The integration limits do not describe a non-empty interval.
    InvalidInterval { lower: f64, upper: f64 },
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveStep(step) => {
                write!(f, "Initial step must be finite and strictly positive, got {}.", step)
            }
            Self::ZeroMaxLevel => write!(f, "Maximum refinement level must be at least 1."),
            Self::MaxLevelTooLarge { max_level, limit } => write!(
                f,
                "Maximum refinement level {} exceeds {}, the deepest level with a representable step size.",
                max_level, limit
            ),
            Self::InvalidTolerance(tolerance) => {
                write!(f, "Tolerance must be non-negative, got {}.", tolerance)
            }
            Self::InvalidInterval { lower, upper } => {
                write!(f, "Invalid integration interval [{}, {}].", lower, upper)
            }
        }
    }
}

impl Error for ConfigurationError {}

impl From<fermi_quadrature::Error> for ConfigurationError {
    fn from(err: fermi_quadrature::Error) -> Self {
        match err {
            fermi_quadrature::Error::InvalidStepSize(step) => Self::NonPositiveStep(step),
            // Step sizes are the only input the rules crate validates
            _ => Self::NonPositiveStep(f64::NAN),
        }
    }
}

/// Failure to evaluate the integrand.
#[derive(Debug)]
#[non_exhaustive]
pub enum EvaluationError {
    /// The integrand returned an error at the given point.
    Function { point: f64, source: eyre::Report },
    /// The integrand returned NaN at the given point.
    NotANumber { point: f64 },
    /// A batched integrand returned the wrong number of values.
    BatchShapeMismatch { expected: usize, actual: usize },
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function { point, source } => {
                write!(f, "Integrand failed at x = {}: {}", point, source)
            }
            Self::NotANumber { point } => write!(f, "Integrand returned NaN at x = {}.", point),
            Self::BatchShapeMismatch { expected, actual } => write!(
                f,
                "Batched integrand returned {} values for {} points.",
                actual, expected
            ),
        }
    }
}

impl Error for EvaluationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Function { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

/// Library-wide error type.
#[derive(Debug)]
pub enum IntegrationError {
    Configuration(ConfigurationError),
    Evaluation(EvaluationError),
}

impl Display for IntegrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "Invalid configuration: {}", err),
            Self::Evaluation(err) => write!(f, "Evaluation failed: {}", err),
        }
    }
}

impl Error for IntegrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::Evaluation(err) => Some(err),
        }
    }
}

impl From<ConfigurationError> for IntegrationError {
    fn from(err: ConfigurationError) -> Self {
        Self::Configuration(err)
    }
}

impl From<EvaluationError> for IntegrationError {
    fn from(err: EvaluationError) -> Self {
        Self::Evaluation(err)
    }
}
