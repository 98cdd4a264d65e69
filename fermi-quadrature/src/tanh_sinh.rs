//! Tanh-sinh (double exponential) rules for the reference interval `[-1, 1]`.
//!
//! The substitution $x(t) = \tanh(\frac{\pi}{2} \sinh t)$ maps the real line onto $(-1, 1)$,
//! and the transformed integrand $f(x(t)) x'(t)$ decays double exponentially as $|t| \to \infty$.
//! The trapezoidal rule with step $h$ applied in the variable $t$ therefore converges very
//! rapidly, even for integrands with singularities at the endpoints of the interval.
//!
//! Rules are organized in *levels*. Level 0 samples all multiples $k h_0$ of the initial step.
//! Level $n > 0$ uses the step $h_n = h_0 / 2^n$, but only stores the odd multiples of $h_n$,
//! i.e. exactly the points that are not already present at a coarser level. The complete
//! point set of level $n$ is the union of the levels $0, \dots, n$, so no point is ever discarded
//! when refining.
//!
//! Weights are stored as $w_i = h_n x'(t_i)$. With this scaling the trapezoidal estimates satisfy
//!
//! $$ I_n = \frac{1}{2} I_{n - 1} + \sum_{i \in \text{level } n} w_i f(x_i), $$
//!
//! which lets callers refine an estimate by evaluating only the new points.
//!
//! Far out in the tails the abscissa rounds to $\pm 1$, but the complement $1 - |x|$ is still
//! accurate, so such points are kept. A point is only dropped once its complement or its
//! derivative underflows to zero. Both decay monotonically in $|t|$, so all points further out are
//! dropped as well, which bounds the number of points at every level.

use crate::{Error, Rule};
use std::f64::consts::FRAC_PI_2;

/// Generator for tanh-sinh levels with a fixed initial step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TanhSinh {
    initial_step: f64,
}

/// The points that are new at a given refinement level, ordered by increasing offset `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRule {
    pub index: usize,
    pub step: f64,
    /// The sample locations `t` in the unbounded variable.
    pub offsets: Vec<f64>,
    /// The abscissas `x(t)` in `[-1, 1]`. Abscissas far out in the tails round to `±1`.
    pub abscissas: Vec<f64>,
    /// The distance `1 - |x(t)|` to the nearest endpoint, computed without cancellation.
    pub complements: Vec<f64>,
    pub weights: Vec<f64>,
}

impl LevelRule {
    fn with_capacity(index: usize, step: f64, capacity: usize) -> Self {
        Self {
            index,
            step,
            offsets: Vec::with_capacity(capacity),
            abscissas: Vec::with_capacity(capacity),
            complements: Vec::with_capacity(capacity),
            weights: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, offset: f64, abscissa: f64, complement: f64, weight: f64) {
        self.offsets.push(offset);
        self.abscissas.push(abscissa);
        self.complements.push(complement);
        self.weights.push(weight);
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// A sample of the substitution at a non-negative offset.
#[derive(Debug, Clone, Copy)]
struct Sample {
    abscissa: f64,
    complement: f64,
    derivative: f64,
}

impl Sample {
    fn at(t: f64) -> Option<Self> {
        debug_assert!(t >= 0.0);
        let s = FRAC_PI_2 * t.sinh();
        let cosh_s = s.cosh();
        let abscissa = s.tanh();
        // For s >= 0 we have 1 - tanh(s) = exp(-s) / cosh(s)
        let complement = (-s).exp() / cosh_s;
        let derivative = FRAC_PI_2 * t.cosh() / (cosh_s * cosh_s);

        if !(complement > 0.0) || !(derivative > 0.0) || !derivative.is_finite() {
            None
        } else {
            Some(Self {
                abscissa,
                complement,
                derivative,
            })
        }
    }
}

impl TanhSinh {
    /// Creates a generator with the given step size for level 0.
    pub fn new(initial_step: f64) -> Result<Self, Error> {
        if initial_step.is_finite() && initial_step > 0.0 {
            Ok(Self { initial_step })
        } else {
            Err(Error::InvalidStepSize(initial_step))
        }
    }

    pub fn initial_step(&self) -> f64 {
        self.initial_step
    }

    /// The deepest level whose step size `h_0 / 2^level` is still a normal number.
    pub fn max_level(&self) -> usize {
        let mut level = 0;
        let mut step = self.initial_step;
        while 0.5 * step >= f64::MIN_POSITIVE {
            step *= 0.5;
            level += 1;
        }
        level
    }

    /// The step size `h_0 / 2^level` used at the given level.
    pub fn step(&self, level: usize) -> f64 {
        let halvings = i32::try_from(level).unwrap_or(i32::MAX);
        self.initial_step * 0.5f64.powi(halvings)
    }

    /// Returns the points that are new at the given level.
    ///
    /// The result is a pure function of the initial step and the level.
    ///
    /// # Panics
    ///
    /// Panics if the level is so deep that its step size underflows to zero.
    pub fn level(&self, level: usize) -> LevelRule {
        let step = self.step(level);
        assert!(
            step > 0.0,
            "step size underflows at level {} (initial step {})",
            level,
            self.initial_step
        );

        // Level 0 contains every multiple of the step, finer levels only the odd multiples
        let (first, stride) = if level == 0 { (0u64, 1u64) } else { (1u64, 2u64) };

        let mut positive = Vec::new();
        let mut multiple = first;
        loop {
            let t = multiple as f64 * step;
            match Sample::at(t) {
                Some(sample) => positive.push((t, sample)),
                None => break,
            }
            multiple += stride;
        }

        let mut rule = LevelRule::with_capacity(level, step, 2 * positive.len());
        for &(t, sample) in positive.iter().rev().filter(|(t, _)| *t > 0.0) {
            rule.push(-t, -sample.abscissa, sample.complement, step * sample.derivative);
        }
        for &(t, sample) in &positive {
            rule.push(t, sample.abscissa, sample.complement, step * sample.derivative);
        }
        rule
    }

    /// Returns the complete rule at the given level, i.e. all points of the levels `0..=level`
    /// with weights for the step size of `level`, sorted by abscissa.
    pub fn rule(&self, level: usize) -> Rule {
        let mut pairs = Vec::new();
        for coarse_level in 0..=level {
            let rule = self.level(coarse_level);
            // Points of coarser levels are weighted with the finest step
            let scale = 0.5f64.powi((level - coarse_level) as i32);
            pairs.extend(
                rule.weights
                    .iter()
                    .zip(&rule.abscissas)
                    .map(|(w, x)| (scale * w, *x)),
            );
        }
        pairs.sort_by(|(_, x1), (_, x2)| x1.total_cmp(x2));
        pairs.into_iter().unzip()
    }
}
