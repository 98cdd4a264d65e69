//! Tanh-sinh quadrature rules for the reference interval `[-1, 1]`.
//!
//! The main purpose of this crate is to support the `fermi` integration library. However, the
//! rules only depend on the step size and the refinement level, so they may be used completely
//! independently of `fermi`, for example to integrate functions that are already expressed in
//! the reference variable.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod tanh_sinh;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The step size is not a finite, strictly positive number.
    InvalidStepSize(f64),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStepSize(step) => {
                write!(f, "Step size must be finite and strictly positive, got {}", step)
            }
        }
    }
}

impl std::error::Error for Error {}

/// A one-dimensional rule on `[-1, 1]`, stored as `(weights, points)`.
pub type Rule = (Vec<f64>, Vec<f64>);

/// Approximates the integral of `f` over `[-1, 1]` with the given rule.
pub fn integrate(rule: &Rule, f: impl Fn(f64) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, x)| w * f(*x)).sum()
}
