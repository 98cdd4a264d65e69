//! Tanh-sinh quadrature levels in the scalar type of the integrator.
//!
//! The levels themselves are generated in double precision by [`fermi_quadrature`] and converted
//! once per level. A [`QuadratureTable`] caches the converted levels for a fixed initial step.
use crate::error::ConfigurationError;
use crate::Real;
use fermi_quadrature::tanh_sinh::{LevelRule, TanhSinh};
use nalgebra::convert;
use std::iter::FusedIterator;
use std::slice;
use std::sync::OnceLock;

/// A one-dimensional quadrature rule on `[-1, 1]` consisting of weights, points and data.
pub trait Quadrature<T: Real> {
    type Data;

    fn weights(&self) -> &[T];
    fn points(&self) -> &[T];
    fn data(&self) -> &[Self::Data];

    /// Approximates the integral of the given function using this quadrature rule.
    fn integrate<F>(&self, f: F) -> T
    where
        F: Fn(T) -> T,
    {
        let mut integral = T::zero();
        for (w, p) in self.weights().iter().zip(self.points()) {
            integral += f(*p) * *w;
        }
        integral
    }

    fn iter(&self) -> QuadratureIter<T, Self::Data> {
        QuadratureIter {
            weights_iter: self.weights().iter(),
            points_iter: self.points().iter(),
            data_iter: self.data().iter(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuadratureIter<'a, T, Data> {
    weights_iter: slice::Iter<'a, T>,
    points_iter: slice::Iter<'a, T>,
    data_iter: slice::Iter<'a, Data>,
}

impl<'a, T, Data> Iterator for QuadratureIter<'a, T, Data> {
    type Item = (&'a T, &'a T, &'a Data);

    fn next(&mut self) -> Option<Self::Item> {
        Some((
            self.weights_iter.next()?,
            self.points_iter.next()?,
            self.data_iter.next()?,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.weights_iter.size_hint()
    }
}

impl<'a, T, Data> FusedIterator for QuadratureIter<'a, T, Data> {}

/// The points that are new at one refinement level of the tanh-sinh rule.
///
/// The per-point data of the rule is the complement `1 - |x|` of each abscissa, which
/// resolves points close to the endpoints far better than the abscissa itself.
///
/// Applying the rule through [`Quadrature::integrate`] yields only the contribution of the new
/// points. The complete estimate at level `n` is `I_n = I_{n - 1} / 2 + contribution`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureLevel<T> {
    level: usize,
    step: T,
    offsets: Vec<T>,
    abscissas: Vec<T>,
    complements: Vec<T>,
    weights: Vec<T>,
}

impl<T: Real> QuadratureLevel<T> {
    fn from_rule(rule: LevelRule) -> Self {
        let convert_all = |values: Vec<f64>| values.into_iter().map(convert::<f64, T>).collect();
        Self {
            level: rule.index,
            step: convert(rule.step),
            offsets: convert_all(rule.offsets),
            abscissas: convert_all(rule.abscissas),
            complements: convert_all(rule.complements),
            weights: convert_all(rule.weights),
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn step(&self) -> T {
        self.step
    }

    /// The sample locations `t` in the unbounded tanh-sinh variable.
    pub fn offsets(&self) -> &[T] {
        &self.offsets
    }

    pub fn complements(&self) -> &[T] {
        &self.complements
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl<T: Real> Quadrature<T> for QuadratureLevel<T> {
    type Data = T;

    fn weights(&self) -> &[T] {
        &self.weights
    }

    fn points(&self) -> &[T] {
        &self.abscissas
    }

    fn data(&self) -> &[T] {
        &self.complements
    }
}

/// Lazily populated cache of tanh-sinh levels for a fixed initial step.
///
/// Levels are generated on first access and never change afterwards. Population is
/// synchronized per level, so a table may be shared between threads.
#[derive(Debug, Clone)]
pub struct QuadratureTable<T> {
    generator: TanhSinh,
    levels: Vec<OnceLock<QuadratureLevel<T>>>,
}

impl<T: Real> QuadratureTable<T> {
    /// Creates an empty table for the levels `0..=max_level`.
    ///
    /// The step size of `max_level` must be a normal number, see [`TanhSinh::max_level`].
    pub fn new(initial_step: f64, max_level: usize) -> Result<Self, ConfigurationError> {
        let generator = TanhSinh::new(initial_step)?;
        let limit = generator.max_level();
        if max_level > limit {
            return Err(ConfigurationError::MaxLevelTooLarge { max_level, limit });
        }
        let levels = (0..=max_level).map(|_| OnceLock::new()).collect();
        Ok(Self { generator, levels })
    }

    pub fn initial_step(&self) -> f64 {
        self.generator.initial_step()
    }

    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Returns the points that are new at the given level.
    ///
    /// # Panics
    ///
    /// Panics if `level` exceeds the maximum level of the table.
    pub fn points(&self, level: usize) -> &QuadratureLevel<T> {
        assert!(
            level <= self.max_level(),
            "Level {} exceeds maximum level {} of quadrature table.",
            level,
            self.max_level()
        );
        self.levels[level].get_or_init(|| QuadratureLevel::from_rule(self.generator.level(level)))
    }

    /// The number of levels that have been generated so far.
    pub fn cached_levels(&self) -> usize {
        self.levels.iter().filter(|level| level.get().is_some()).count()
    }
}
