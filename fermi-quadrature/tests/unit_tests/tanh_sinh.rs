use fermi_quadrature::tanh_sinh::TanhSinh;
use fermi_quadrature::{integrate, Error};
use itertools::izip;
use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::f64::consts::PI;

fn offsets_through(generator: &TanhSinh, level: usize) -> BTreeSet<u64> {
    (0..=level)
        .flat_map(|l| generator.level(l).offsets)
        .map(f64::to_bits)
        .collect()
}

#[test]
fn invalid_step_sizes_are_rejected() {
    assert_eq!(TanhSinh::new(0.0), Err(Error::InvalidStepSize(0.0)));
    assert_eq!(TanhSinh::new(-1.0), Err(Error::InvalidStepSize(-1.0)));
    assert!(TanhSinh::new(f64::NAN).is_err());
    assert!(TanhSinh::new(f64::INFINITY).is_err());
    assert!(TanhSinh::new(0.5).is_ok());
}

#[test]
fn level_zero_samples_all_multiples_of_initial_step() {
    let generator = TanhSinh::new(1.0).unwrap();
    let level = generator.level(0);

    // The derivative at t = 7 underflows, the one at t = 6 does not
    let expected: Vec<_> = (-6..=6).map(f64::from).collect();
    assert_eq!(level.offsets, expected);
    assert_eq!(level.abscissas[6], 0.0);
    assert_scalar_eq!(level.weights[6], PI / 2.0, comp = float);

    // Abscissas in the tails round to +/- 1, while the complements stay positive
    assert_eq!(level.abscissas[12], 1.0);
    assert_eq!(level.abscissas[0], -1.0);
    assert!(level.complements[0] > 0.0);
    assert!(level.complements[12] > 0.0);
}

#[test]
fn max_level_keeps_step_size_normal() {
    let generator = TanhSinh::new(1.0).unwrap();
    assert_eq!(generator.max_level(), 1022);
    assert_eq!(generator.step(1022), f64::MIN_POSITIVE);
    assert!(generator.step(1023) < f64::MIN_POSITIVE);

    assert_eq!(TanhSinh::new(0.75).unwrap().max_level(), 1021);
    assert_eq!(TanhSinh::new(3.17).unwrap().max_level(), 1023);
    assert_eq!(TanhSinh::new(f64::MAX).unwrap().max_level(), 2045);
    assert_eq!(TanhSinh::new(f64::MIN_POSITIVE).unwrap().max_level(), 0);
}

#[test]
fn finer_levels_only_contain_new_odd_multiples() {
    let generator = TanhSinh::new(1.0).unwrap();

    for n in 1..=6 {
        let level = generator.level(n);
        let step = generator.step(n);
        assert_eq!(level.step, step);
        assert!(!level.is_empty());

        let previous = offsets_through(&generator, n - 1);
        for &t in &level.offsets {
            let multiple = (t / step).round();
            assert_eq!(multiple * step, t);
            assert_eq!(multiple.abs() % 2.0, 1.0, "offset {} is not an odd multiple of {}", t, step);
            assert!(!previous.contains(&t.to_bits()));
        }
    }
}

#[test]
fn full_rules_are_nested() {
    let generator = TanhSinh::new(1.0).unwrap();

    for n in 1..=6 {
        let (_, coarse_points) = generator.rule(n - 1);
        let (_, fine_points) = generator.rule(n);
        let fine: BTreeSet<u64> = fine_points.iter().copied().map(f64::to_bits).collect();

        assert!(fine_points.len() > coarse_points.len());
        for x in coarse_points {
            assert!(fine.contains(&x.to_bits()), "point {} was dropped at level {}", x, n);
        }
    }
}

#[test]
fn levels_are_deterministic() {
    let generator = TanhSinh::new(0.75).unwrap();
    for n in 0..=5 {
        assert_eq!(generator.level(n), generator.level(n));
    }
}

#[test]
fn full_rule_integrates_monomials() {
    let rule = TanhSinh::new(1.0).unwrap().rule(5);

    for alpha in 0..=20 {
        let monomial_integral = (1.0 - (-1.0f64).powi(alpha + 1)) / (alpha as f64 + 1.0);
        let estimated_integral = integrate(&rule, |x| x.powi(alpha));
        assert_scalar_eq!(estimated_integral, monomial_integral, comp = abs, tol = 1e-13);
    }
}

#[test]
fn incremental_estimates_match_full_rules() {
    let generator = TanhSinh::new(1.0).unwrap();
    let f = |x: f64| (2.0 * x).cos() + x.exp();

    let mut estimate = 0.0;
    for n in 0..=6 {
        let level = generator.level(n);
        let level_sum: f64 = izip!(&level.weights, &level.abscissas)
            .map(|(w, x)| w * f(*x))
            .sum();
        estimate = if n == 0 { level_sum } else { 0.5 * estimate + level_sum };

        let full = integrate(&generator.rule(n), f);
        assert_scalar_eq!(estimate, full, comp = abs, tol = 1e-14);
    }
}

#[test]
fn complements_resolve_endpoint_singularities() {
    // The integral of (1 - x^2)^(-1/2) over [-1, 1] is pi. Near the endpoints we have
    // 1 - x^2 = c (2 - c) with the complement c, which does not suffer from cancellation
    let generator = TanhSinh::new(1.0).unwrap();

    let mut estimate = 0.0;
    for n in 0..=6 {
        let level = generator.level(n);
        let level_sum: f64 = izip!(&level.weights, &level.complements)
            .map(|(w, c)| w / (c * (2.0 - c)).sqrt())
            .sum();
        estimate = if n == 0 { level_sum } else { 0.5 * estimate + level_sum };
    }

    assert_scalar_eq!(estimate, PI, comp = abs, tol = 1e-12);
}

proptest! {
    #[test]
    fn levels_are_symmetric_with_positive_weights(step in 0.05..3.0f64, n in 0usize..5) {
        let generator = TanhSinh::new(step).unwrap();
        let level = generator.level(n);
        let len = level.len();

        for i in 0..len {
            let j = len - 1 - i;
            prop_assert_eq!(level.offsets[i], -level.offsets[j]);
            prop_assert_eq!(level.abscissas[i], -level.abscissas[j]);
            prop_assert_eq!(level.weights[i], level.weights[j]);
            prop_assert!(level.weights[i] > 0.0);
            prop_assert!(level.abscissas[i].abs() <= 1.0);
            prop_assert!(level.complements[i] > 0.0);
        }

        for (t1, t2) in level.offsets.iter().zip(level.offsets.iter().skip(1)) {
            prop_assert!(t1 < t2);
        }
    }
}
