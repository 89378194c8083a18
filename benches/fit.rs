use criterion::Criterion;
use ee_targeting::{
    BuildingInput, ChangePointFitter, CobylaCurveFit, CurveFitAlgorithm, FitterConfig,
    LmCurveFit, ObservationSeries, Pipeline, UtilityInput, UtilityType,
};
use ee_targeting_test_util::{BUILDINGS, SyntheticBuilding};
use std::hint::black_box;

pub fn bench_change_point_fit(c: &mut Criterion) {
    let arrays = SyntheticBuilding::new([10.0, 22.0, 2.0, -0.3, 0.4]).arrays();
    let series = ObservationSeries::new(arrays.temperature, arrays.eui, arrays.days).unwrap();

    let algorithms: Vec<(_, CurveFitAlgorithm)> = vec![
        ("5P fit: LM", LmCurveFit::default().into()),
        ("5P fit: COBYLA", CobylaCurveFit::default().into()),
        (
            "5P fit: COBYLA + LM",
            CobylaCurveFit::new(500, 0.5, 1e-6, Some(LmCurveFit::default().into())).into(),
        ),
    ];

    for (name, algorithm) in algorithms {
        let fitter = ChangePointFitter::new(FitterConfig {
            algorithm,
            ..Default::default()
        });
        c.bench_function(name, |b| {
            b.iter(|| fitter.fit(black_box(&series)));
        });
    }
}

pub fn bench_pipeline(c: &mut Criterion) {
    let buildings: Vec<_> = BUILDINGS
        .iter()
        .map(|(name, _, arrays)| BuildingInput {
            id: (*name).to_owned(),
            area: 1000.0,
            utilities: vec![UtilityInput {
                utility: UtilityType::Electricity,
                series: ObservationSeries::new(
                    arrays.temperature.clone(),
                    arrays.eui.clone(),
                    arrays.days.clone(),
                )
                .unwrap(),
                unit_price: None,
            }],
        })
        .collect();
    let pipeline = Pipeline::default();

    c.bench_function("Portfolio: sequential", |b| {
        b.iter(|| pipeline.run_portfolio(black_box(&buildings)));
    });
    c.bench_function("Portfolio: rayon", |b| {
        b.iter(|| pipeline.run_portfolio_parallel(black_box(&buildings)));
    });
}
