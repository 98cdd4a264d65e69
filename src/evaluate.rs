//! Strategies for evaluating an integrand at the points of one refinement level.
//!
//! Both strategies return the values in the order of the points, and both apply the same checks
//! to the values. The weighted sum is formed by the integrator afterwards, so the choice of
//! strategy never changes how the estimate is accumulated.
use crate::error::EvaluationError;
use crate::function::Integrand;
use crate::{to_f64, Real};
use nalgebra::DVector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Evaluates an integrand at a set of points.
pub trait Evaluator<T: Real> {
    /// Returns the values of `f` at `points`, in the same order.
    ///
    /// Fails on the first point at which `f` fails or returns NaN. No partial results are
    /// returned.
    fn evaluate<F>(&self, f: &F, points: &[T]) -> Result<Vec<T>, EvaluationError>
    where
        F: ?Sized + Integrand<T>;
}

fn check_value<T: Real>(point: T, value: T) -> Result<T, EvaluationError> {
    // NaN is the only value that is unordered with respect to itself
    if value.partial_cmp(&value).is_none() {
        Err(EvaluationError::NotANumber { point: to_f64(point) })
    } else {
        Ok(value)
    }
}

/// Passes all points to [`Integrand::evaluate_batch`] in a single call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorizedEvaluator;

impl<T: Real> Evaluator<T> for VectorizedEvaluator {
    fn evaluate<F>(&self, f: &F, points: &[T]) -> Result<Vec<T>, EvaluationError>
    where
        F: ?Sized + Integrand<T>,
    {
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let x = DVector::from_column_slice(points);
        let values = f
            .evaluate_batch(&x)
            .map_err(|source| EvaluationError::Function {
                // A batch failure cannot be attributed to a single point
                point: f64::NAN,
                source,
            })?;

        if values.len() != points.len() {
            return Err(EvaluationError::BatchShapeMismatch {
                expected: points.len(),
                actual: values.len(),
            });
        }

        points
            .iter()
            .zip(values.iter())
            .map(|(&x_i, &f_i)| check_value(x_i, f_i))
            .collect()
    }
}

/// Calls [`Integrand::evaluate`] once per point, distributing the points across the rayon
/// thread pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeEvaluator {
    /// The minimum number of points handled by a single rayon task.
    pub min_points_per_task: usize,
}

impl Default for NativeEvaluator {
    fn default() -> Self {
        Self {
            min_points_per_task: 16,
        }
    }
}

impl<T: Real> Evaluator<T> for NativeEvaluator {
    fn evaluate<F>(&self, f: &F, points: &[T]) -> Result<Vec<T>, EvaluationError>
    where
        F: ?Sized + Integrand<T>,
    {
        points
            .par_iter()
            .with_min_len(self.min_points_per_task.max(1))
            .map(|&x| {
                let value = f.evaluate(x).map_err(|source| EvaluationError::Function {
                    point: to_f64(x),
                    source,
                })?;
                check_value(x, value)
            })
            .collect()
    }
}

/// Selects how the integrand is evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    /// One call per point, in parallel.
    #[default]
    Native,
    /// One call per refinement level with all new points as a vector.
    Vectorized,
}

impl Backend {
    /// Evaluates `f` at `points` with the evaluator selected by this backend.
    pub fn evaluate<T, F>(&self, f: &F, points: &[T]) -> Result<Vec<T>, EvaluationError>
    where
        T: Real,
        F: ?Sized + Integrand<T>,
    {
        match self {
            Self::Native => NativeEvaluator::default().evaluate(f, points),
            Self::Vectorized => VectorizedEvaluator.evaluate(f, points),
        }
    }
}
