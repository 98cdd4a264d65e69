//! Mapping of integration intervals onto the reference interval `[-1, 1]`.
//!
//! Every interval is mapped by a substitution $x = \phi(u)$ with $u \in (-1, 1)$:
//!
//! | Interval              | $\phi(u)$                   | $\phi'(u)$                      |
//! |-----------------------|-----------------------------|---------------------------------|
//! | $[a, b]$              | $\frac{a+b}{2} + \frac{b-a}{2} u$ | $\frac{b-a}{2}$           |
//! | $[a, \infty)$         | $a + \frac{1+u}{1-u}$       | $\frac{2}{(1-u)^2}$             |
//! | $(-\infty, b]$        | $b - \frac{1-u}{1+u}$       | $\frac{2}{(1+u)^2}$             |
//! | $(-\infty, \infty)$   | $\frac{u}{1-u^2}$           | $\frac{1+u^2}{(1-u^2)^2}$       |
//!
//! The factors $1 \pm u$ are taken from the complement $1 - |u|$ of each quadrature point,
//! so that points close to the endpoints keep their full relative accuracy.
use crate::error::ConfigurationError;
use crate::quadrature::Quadrature;
use crate::{to_f64, Real};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// The kind of an integration interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalKind {
    Finite,
    /// An interval of the form `[a, ∞)`.
    LowerBounded,
    /// An interval of the form `(-∞, b]`.
    UpperBounded,
    Unbounded,
}

/// A non-empty integration interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interval<T> {
    Finite { lower: T, upper: T },
    LowerBounded { lower: T },
    UpperBounded { upper: T },
    Unbounded,
}

impl<T: Real> Interval<T> {
    /// Classifies the interval between the given limits. Infinite limits select the
    /// semi-infinite and infinite substitutions.
    pub fn new(lower: T, upper: T) -> Result<Self, ConfigurationError> {
        // Comparisons with NaN are false, so this also rejects NaN limits
        if !(lower < upper) {
            return Err(ConfigurationError::InvalidInterval {
                lower: to_f64(lower),
                upper: to_f64(upper),
            });
        }

        let interval = match (lower.is_finite(), upper.is_finite()) {
            (true, true) => Self::Finite { lower, upper },
            (true, false) => Self::LowerBounded { lower },
            (false, true) => Self::UpperBounded { upper },
            (false, false) => Self::Unbounded,
        };
        Ok(interval)
    }

    pub fn kind(&self) -> IntervalKind {
        match self {
            Self::Finite { .. } => IntervalKind::Finite,
            Self::LowerBounded { .. } => IntervalKind::LowerBounded,
            Self::UpperBounded { .. } => IntervalKind::UpperBounded,
            Self::Unbounded => IntervalKind::Unbounded,
        }
    }

    /// Whether `x` is a finite point strictly inside the interval.
    pub fn contains_strictly(&self, x: T) -> bool {
        let inside = match *self {
            Self::Finite { lower, upper } => lower < x && x < upper,
            Self::LowerBounded { lower } => lower < x,
            Self::UpperBounded { upper } => x < upper,
            Self::Unbounded => true,
        };
        inside && x.is_finite()
    }
}

/// Points of a quadrature rule mapped to an integration interval.
///
/// Each point carries its scale factor `w · φ'(u)`, so that the contribution of the point is
/// `scale · f(x)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappedPoints<T> {
    points: Vec<T>,
    scales: Vec<T>,
    skipped: usize,
}

impl<T> MappedPoints<T> {
    pub fn points(&self) -> &[T] {
        &self.points
    }

    pub fn scales(&self) -> &[T] {
        &self.scales
    }

    /// The number of rule points that were skipped because they cannot contribute.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Substitution between the reference interval and an integration interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainTransform<T> {
    interval: Interval<T>,
}

impl<T: Real> DomainTransform<T> {
    pub fn new(lower: T, upper: T) -> Result<Self, ConfigurationError> {
        Ok(Self::from_interval(Interval::new(lower, upper)?))
    }

    pub fn from_interval(interval: Interval<T>) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> &Interval<T> {
        &self.interval
    }

    pub fn kind(&self) -> IntervalKind {
        self.interval.kind()
    }

    /// Maps the reference point `u` with complement `1 - |u|` to the pair `(x, φ'(u))`.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn map(&self, u: T, complement: T) -> (T, T) {
        let c = complement;
        // (1 + u, 1 - u), computed without cancellation
        let (one_plus_u, one_minus_u) = if u < 0.0 { (c, 2.0 - c) } else { (2.0 - c, c) };

        match self.interval {
            Interval::Finite { lower, upper } => {
                // The width itself may overflow
                let half_width = 0.5 * upper - 0.5 * lower;
                let x = if u < 0.0 {
                    lower + half_width * c
                } else {
                    upper - half_width * c
                };
                (x, half_width)
            }
            Interval::LowerBounded { lower } => {
                let x = lower + one_plus_u / one_minus_u;
                (x, 2.0 / (one_minus_u * one_minus_u))
            }
            Interval::UpperBounded { upper } => {
                let x = upper - one_minus_u / one_plus_u;
                (x, 2.0 / (one_plus_u * one_plus_u))
            }
            Interval::Unbounded => {
                let one_minus_u2 = one_plus_u * one_minus_u;
                let x = u / one_minus_u2;
                (x, (1.0 + u * u) / (one_minus_u2 * one_minus_u2))
            }
        }
    }

    /// Maps all points of a rule to the interval.
    ///
    /// Points whose scale factor overflows or vanishes, and points that round onto a finite
    /// bound of the interval, contribute nothing and are skipped. The integrand is therefore
    /// never evaluated at an endpoint.
    pub fn map_rule<Q>(&self, rule: &Q) -> MappedPoints<T>
    where
        Q: Quadrature<T, Data = T>,
    {
        let capacity = rule.weights().len();
        let mut mapped = MappedPoints {
            points: Vec::with_capacity(capacity),
            scales: Vec::with_capacity(capacity),
            skipped: 0,
        };

        for (&w, &u, &c) in rule.iter() {
            let (x, jacobian) = self.map(u, c);
            let scale = w * jacobian;
            if self.interval.contains_strictly(x) && scale.is_finite() && scale > T::zero() {
                mapped.points.push(x);
                mapped.scales.push(scale);
            } else {
                mapped.skipped += 1;
            }
        }

        mapped
    }
}
