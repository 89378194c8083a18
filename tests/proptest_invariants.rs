use ee_targeting::assessment::target_value;
use ee_targeting::benchmark::rate;
use ee_targeting::{
    ChangePointFitter, Coefficient, CoefficientStats, CoefficientValidation, ModelType,
    ObservationSeries, Rating, TargetLevel,
};
use ee_targeting_test_util::SyntheticBuilding;
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

const FIT_CASES: u32 = 24;

fn coefficient() -> impl Strategy<Value = Coefficient> {
    prop::sample::select(Coefficient::ALL.to_vec())
}

fn stats() -> impl Strategy<Value = CoefficientStats> {
    (-50.0..50.0f64, 1e-3..20.0f64).prop_map(|(median, std)| CoefficientStats::new(median, std))
}

fn mirrored(rating: Rating) -> Rating {
    match rating {
        Rating::Good => Rating::Poor,
        Rating::Typical => Rating::Typical,
        Rating::Poor => Rating::Good,
    }
}

/// Ordering of targets from the most to the least strict, per coefficient direction
fn at_least_as_strict(coefficient: Coefficient, a: f64, b: f64) -> bool {
    if coefficient.higher_is_better() {
        a >= b
    } else {
        a <= b
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    #[test]
    fn cooling_change_point_rating_is_mirrored(
        coefficient in coefficient().prop_filter("lower is better", |c| !c.higher_is_better()),
        stats in stats(),
        value in -100.0..100.0f64,
    ) {
        prop_assert_eq!(
            rate(Coefficient::CoolingChangePoint, value, stats),
            mirrored(rate(coefficient, value, stats))
        );
    }

    #[test]
    fn zero_spread_rates_typical(
        coefficient in coefficient(),
        median in -50.0..50.0f64,
        value in -100.0..100.0f64,
    ) {
        prop_assert_eq!(
            rate(coefficient, value, CoefficientStats::new(median, 0.0)),
            Rating::Typical
        );
    }

    #[test]
    fn median_rates_typical(coefficient in coefficient(), stats in stats()) {
        prop_assert_eq!(rate(coefficient, stats.median, stats), Rating::Typical);
    }

    #[test]
    fn targets_are_monotonic_in_level(
        coefficient in coefficient(),
        stats in stats(),
        site in -100.0..100.0f64,
    ) {
        let target = |level| target_value(coefficient, site, stats, level);
        let conservative = target(TargetLevel::Conservative);
        let nominal = target(TargetLevel::Nominal);
        let aggressive = target(TargetLevel::Aggressive);
        prop_assert!(at_least_as_strict(coefficient, aggressive, nominal));
        prop_assert!(at_least_as_strict(coefficient, nominal, conservative));
        // Targets never ask for a worse coefficient than the site already has
        prop_assert!(at_least_as_strict(coefficient, conservative, site));
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: FIT_CASES,
        .. ProptestConfig::default()
    })]

    #[test]
    fn fitted_models_are_consistent(
        hcp in 0.0..20.0f64,
        ccp in 5.0..30.0f64,
        base in 0.1..3.0f64,
        hsl in -0.5..0.0f64,
        csl in 0.0..0.5f64,
        noise in 0.01..0.2f64,
        seed in any::<u64>(),
    ) {
        let arrays = SyntheticBuilding::new([hcp, ccp, base, hsl, csl])
            .noise(noise)
            .seed(seed)
            .arrays();
        let series = ObservationSeries::new(arrays.temperature, arrays.eui, arrays.days).unwrap();
        let Ok(model) = ChangePointFitter::default().fit(&series) else {
            // Solver failures are reported as errors, nothing to check
            return Ok(());
        };

        prop_assert_eq!(model.validation, CoefficientValidation::for_model_type(model.model_type));
        prop_assert_eq!(model.is_fit(), model.model_type != ModelType::NoFit);
        if let Some(coefficients) = model.coefficients {
            prop_assert!(coefficients.hcp <= coefficients.ccp);
        }
        for (coefficient, value) in model.site_values().iter() {
            prop_assert_eq!(value.is_some(), model.validation[coefficient], "{}", coefficient);
        }
    }
}
