//! Integrands that can be evaluated one point at a time or in batches.
//!
//! Plain closures `Fn(T) -> T` are integrands out of the box. Closures that may fail are
//! wrapped in [`TryFn`], and closures that operate on a whole vector of points at once are
//! wrapped in [`BatchFn`].
use nalgebra::{DVector, Scalar};

/// A scalar function $f: \mathbb{R} \rightarrow \mathbb{R}$ to be integrated.
///
/// Implementations must be free of side effects: evaluating the same point twice must give the
/// same value, since values computed at coarse levels are reused at finer levels.
pub trait Integrand<T: Scalar>: Sync {
    fn evaluate(&self, x: T) -> eyre::Result<T>;

    /// Evaluates the integrand at every point in `x`.
    ///
    /// The default implementation calls [`evaluate`](Self::evaluate) for each point in order.
    fn evaluate_batch(&self, x: &DVector<T>) -> eyre::Result<DVector<T>> {
        let values = x
            .iter()
            .map(|x_i| self.evaluate(x_i.clone()))
            .collect::<eyre::Result<Vec<T>>>()?;
        Ok(DVector::from_vec(values))
    }
}

impl<T, F> Integrand<T> for F
where
    T: Scalar,
    F: Sync + Fn(T) -> T,
{
    fn evaluate(&self, x: T) -> eyre::Result<T> {
        Ok(self(x))
    }
}

/// An integrand given by a fallible closure.
#[derive(Debug, Clone, Copy)]
pub struct TryFn<F>(pub F);

impl<T, F> Integrand<T> for TryFn<F>
where
    T: Scalar,
    F: Sync + Fn(T) -> eyre::Result<T>,
{
    fn evaluate(&self, x: T) -> eyre::Result<T> {
        (self.0)(x)
    }
}

/// An integrand given by a closure that is applied to a whole vector of points at once.
///
/// The closure must return one value per point, in the same order.
#[derive(Debug, Clone, Copy)]
pub struct BatchFn<F>(pub F);

impl<T, F> Integrand<T> for BatchFn<F>
where
    T: Scalar,
    F: Sync + Fn(&DVector<T>) -> DVector<T>,
{
    fn evaluate(&self, x: T) -> eyre::Result<T> {
        let values = (self.0)(&DVector::from_element(1, x));
        match values.as_slice() {
            [value] => Ok(value.clone()),
            values => Err(eyre::eyre!(
                "Batched integrand returned {} values for a single point",
                values.len()
            )),
        }
    }

    fn evaluate_batch(&self, x: &DVector<T>) -> eyre::Result<DVector<T>> {
        Ok((self.0)(x))
    }
}
