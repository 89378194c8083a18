use crate::change_point::ChangePointModel;
use crate::coefficients::{
    Coefficient, ModelCoefficients, PerCoefficient, SiteCoefficients, UtilityType,
};
use crate::data::SortedArray;
use crate::error::PopulationError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::io;

/// Gaussian consistency factor of the median absolute deviation
pub const MAD_TO_STD: f64 = 1.4826;

/// Standardized positions are clamped to this magnitude
pub const Z_SCORE_LIMIT: f64 = 3.45;

/// Population median and robust standard deviation of one coefficient
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CoefficientStats {
    #[serde(rename = "beta_median")]
    pub median: f64,
    #[serde(rename = "beta_standard_deviation")]
    pub std: f64,
}

impl CoefficientStats {
    pub fn new(median: f64, std: f64) -> Self {
        Self { median, std }
    }
}

/// Reference distribution of the five coefficients over a peer population
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PopulationStatistics(pub PerCoefficient<CoefficientStats>);

#[derive(Debug, Deserialize, Serialize)]
struct PopulationRecord {
    coefficient: String,
    beta_median: f64,
    beta_standard_deviation: f64,
}

impl PopulationStatistics {
    /// Reference table for electricity, derived from simulated buildings
    pub fn default_electricity() -> Self {
        Self(PerCoefficient {
            baseload: CoefficientStats::new(0.356550675, 0.023339094),
            cooling_slope: CoefficientStats::new(0.0115249, 0.005313114),
            cooling_change_point: CoefficientStats::new(14.99895357, 4.323367826),
            heating_slope: CoefficientStats::new(0.013061297, 0.005181999),
            heating_change_point: CoefficientStats::new(14.37165836, 4.838926188),
        })
    }

    /// Reference table for fossil fuel, derived from simulated buildings
    pub fn default_fossil_fuel() -> Self {
        Self(PerCoefficient {
            baseload: CoefficientStats::new(0.107, 0.0125),
            cooling_slope: CoefficientStats::new(0.0, 0.0),
            cooling_change_point: CoefficientStats::new(4.493517689, 0.34410526),
            heating_slope: CoefficientStats::new(0.072, 0.0386),
            heating_change_point: CoefficientStats::new(12.4, 5.7),
        })
    }

    pub fn default_for(utility: UtilityType) -> Self {
        match utility {
            UtilityType::Electricity => Self::default_electricity(),
            UtilityType::FossilFuel => Self::default_fossil_fuel(),
        }
    }

    pub fn get(&self, coefficient: Coefficient) -> CoefficientStats {
        self.0[coefficient]
    }

    pub fn medians(&self) -> PerCoefficient<f64> {
        self.0.map(|_, stats| stats.median)
    }

    /// Model of a building with median coefficients, the heating slope is the negated median
    /// heating sensitivity
    pub fn typical_coefficients(&self) -> ModelCoefficients {
        ModelCoefficients::from_site_values(&self.0.map(|_, stats| Some(stats.median)))
    }

    /// Load a `coefficient,beta_median,beta_standard_deviation` table
    ///
    /// Every coefficient must be present, later rows override earlier ones.
    pub fn from_csv_reader(reader: impl io::Read) -> Result<Self, PopulationError> {
        let mut table: PerCoefficient<Option<CoefficientStats>> = PerCoefficient::default();
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        for record in csv_reader.deserialize() {
            let record: PopulationRecord = record?;
            let coefficient = Coefficient::from_name(&record.coefficient)
                .ok_or(PopulationError::UnknownCoefficient(record.coefficient))?;
            table[coefficient] = Some(CoefficientStats::new(
                record.beta_median,
                record.beta_standard_deviation,
            ));
        }
        let mut stats = PerCoefficient::default();
        for coefficient in Coefficient::ALL {
            stats[coefficient] =
                table[coefficient].ok_or(PopulationError::MissingCoefficient(coefficient))?;
        }
        Ok(Self(stats))
    }

    pub fn to_csv_writer(&self, writer: impl io::Write) -> Result<(), PopulationError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for (coefficient, stats) in self.0.iter() {
            csv_writer.serialize(PopulationRecord {
                coefficient: coefficient.name().to_owned(),
                beta_median: stats.median,
                beta_standard_deviation: stats.std,
            })?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Statistics of raw per-coefficient samples, NaN marks an absent coefficient
    pub fn from_samples(samples: &PerCoefficient<Vec<f64>>) -> Result<Self, PopulationError> {
        let mut stats = PerCoefficient::default();
        for (coefficient, values) in samples.iter() {
            stats[coefficient] = compute_stats(coefficient, values)?;
        }
        Ok(Self(stats))
    }

    /// Statistics of the site-facing coefficients of a population of fitted models
    pub fn from_models<'a>(
        models: impl IntoIterator<Item = &'a ChangePointModel>,
    ) -> Result<Self, PopulationError> {
        let mut samples: PerCoefficient<Vec<f64>> = PerCoefficient::default();
        for model in models {
            for (coefficient, value) in model.site_values().iter() {
                samples[coefficient].push(value.unwrap_or(f64::NAN));
            }
        }
        Self::from_samples(&samples)
    }
}

/// Median absolute deviation, ignoring NaN
pub fn median_absolute_deviation(values: &[f64]) -> f64 {
    let median = SortedArray::from_non_nan(values.iter().copied()).median();
    SortedArray::from_non_nan(values.iter().map(|x| (x - median).abs())).median()
}

/// Median and robust standard deviation of population samples
///
/// NaN samples are ignored, except for the heating slope where a building without a heating
/// branch counts as zero heating sensitivity.
pub fn compute_stats(
    coefficient: Coefficient,
    samples: &[f64],
) -> Result<CoefficientStats, PopulationError> {
    let samples: Vec<f64> = match coefficient {
        Coefficient::HeatingSlope => samples
            .iter()
            .map(|&x| if x.is_nan() { 0.0 } else { x })
            .collect(),
        _ => samples.to_vec(),
    };
    let median = SortedArray::from_non_nan(samples.iter().copied()).median();
    if median.is_nan() {
        return Err(PopulationError::EmptyPopulation { coefficient });
    }
    Ok(CoefficientStats::new(
        median,
        MAD_TO_STD * median_absolute_deviation(&samples),
    ))
}

/// Benchmark rating of a site coefficient
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Rating {
    Good,
    Typical,
    Poor,
}

impl Rating {
    fn inverted(self) -> Self {
        match self {
            Self::Good => Self::Poor,
            Self::Typical => Self::Typical,
            Self::Poor => Self::Good,
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Good => "Good",
            Self::Typical => "Typical",
            Self::Poor => "Poor",
        })
    }
}

/// Rate `value` against one standard deviation around the population median
///
/// Lower is better for every coefficient but the cooling change-point. Without population spread
/// every value is [Rating::Typical].
pub fn rate(coefficient: Coefficient, value: f64, stats: CoefficientStats) -> Rating {
    if stats.std == 0.0 {
        return Rating::Typical;
    }
    let rating = if value < stats.median - stats.std {
        Rating::Good
    } else if value > stats.median + stats.std {
        Rating::Poor
    } else {
        Rating::Typical
    };
    if coefficient.higher_is_better() {
        rating.inverted()
    } else {
        rating
    }
}

/// Position of a site value within the population
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Benchmark {
    pub coefficient: Coefficient,
    pub value: f64,
    pub rating: Rating,
    /// Standardized distance from the median, positive is better, clamped to ±3.45
    pub z_score: f64,
    /// Share of the population the site outperforms, in percent
    pub percentile: u8,
}

impl Benchmark {
    pub fn new(coefficient: Coefficient, value: f64, stats: CoefficientStats) -> Self {
        let z_score = standardize(coefficient, value, stats);
        let percentile = match Normal::new(0.0, 1.0) {
            Ok(normal) => (normal.cdf(z_score) * 100.0).round_ties_even(),
            Err(_) => f64::NAN,
        };
        Self {
            coefficient,
            value,
            rating: rate(coefficient, value, stats),
            z_score,
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            percentile: percentile.clamp(0.0, 100.0) as u8,
        }
    }
}

/// `(median - value) / std`, sign inverted for the cooling change-point
///
/// Without population spread the median itself is used.
pub fn standardize(coefficient: Coefficient, value: f64, stats: CoefficientStats) -> f64 {
    let z = if stats.std != 0.0 {
        (stats.median - value) / stats.std
    } else {
        stats.median
    };
    let z = if coefficient.higher_is_better() { -z } else { z };
    z.clamp(-Z_SCORE_LIMIT, Z_SCORE_LIMIT)
}

/// Benchmark every valid site coefficient, absent coefficients are not rated
pub fn benchmark_site(
    site: &SiteCoefficients,
    population: &PopulationStatistics,
) -> PerCoefficient<Option<Benchmark>> {
    site.map(|coefficient, value| {
        value.map(|value| Benchmark::new(coefficient, value, population.get(coefficient)))
    })
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficients::{CoefficientValidation, ModelType};

    use approx::assert_relative_eq;

    const TABLE: &str = "coefficient,beta_median,beta_standard_deviation
beta_base,0.356550675,0.023339094
beta_cdd,0.0115249,0.005313114
beta_betc,14.99895357,4.323367826
beta_hdd,0.013061297,0.005181999
beta_beth,14.37165836,4.838926188
";

    #[test]
    fn stats_of_samples() {
        let stats = compute_stats(Coefficient::Baseload, &[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_relative_eq!(stats.std, MAD_TO_STD * 1.0);
    }

    #[test]
    fn nan_samples_are_skipped_except_heating_slope() {
        let samples = [f64::NAN, f64::NAN, f64::NAN, 1.0, 2.0];
        let stats = compute_stats(Coefficient::Baseload, &samples).unwrap();
        assert_eq!(stats.median, 1.5);
        let stats = compute_stats(Coefficient::HeatingSlope, &samples).unwrap();
        assert_eq!(stats.median, 0.0);
    }

    #[test]
    fn empty_population() {
        assert!(matches!(
            compute_stats(Coefficient::CoolingSlope, &[f64::NAN]),
            Err(PopulationError::EmptyPopulation {
                coefficient: Coefficient::CoolingSlope
            })
        ));
    }

    #[test]
    fn rating_directions() {
        let stats = CoefficientStats::new(10.0, 2.0);
        assert_eq!(rate(Coefficient::Baseload, 7.0, stats), Rating::Good);
        assert_eq!(rate(Coefficient::Baseload, 12.0, stats), Rating::Typical);
        assert_eq!(rate(Coefficient::Baseload, 12.5, stats), Rating::Poor);
        assert_eq!(rate(Coefficient::CoolingChangePoint, 7.0, stats), Rating::Poor);
        assert_eq!(rate(Coefficient::CoolingChangePoint, 12.5, stats), Rating::Good);
    }

    #[test]
    fn zero_spread_is_typical() {
        let stats = CoefficientStats::new(0.0, 0.0);
        assert_eq!(rate(Coefficient::CoolingSlope, 5.0, stats), Rating::Typical);
        let benchmark = Benchmark::new(Coefficient::CoolingSlope, 5.0, stats);
        assert_eq!(benchmark.z_score, 0.0);
        assert_eq!(benchmark.percentile, 50);
    }

    #[test]
    fn standardized_position() {
        let stats = CoefficientStats::new(10.0, 2.0);
        assert_eq!(standardize(Coefficient::Baseload, 8.0, stats), 1.0);
        assert_eq!(standardize(Coefficient::CoolingChangePoint, 8.0, stats), -1.0);
        assert_eq!(standardize(Coefficient::Baseload, -100.0, stats), Z_SCORE_LIMIT);
        let benchmark = Benchmark::new(Coefficient::Baseload, 8.0, stats);
        // Φ(1) = 0.8413
        assert_eq!(benchmark.percentile, 84);
    }

    #[test]
    fn csv_round_trip() {
        let stats = PopulationStatistics::from_csv_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(stats, PopulationStatistics::default_electricity());
        let mut buffer = Vec::new();
        stats.to_csv_writer(&mut buffer).unwrap();
        let restored = PopulationStatistics::from_csv_reader(buffer.as_slice()).unwrap();
        assert_eq!(restored, stats);
    }

    #[test]
    fn csv_missing_and_unknown() {
        let table: String = TABLE.lines().take(5).map(|l| format!("{l}\n")).collect();
        assert!(matches!(
            PopulationStatistics::from_csv_reader(table.as_bytes()),
            Err(PopulationError::MissingCoefficient(Coefficient::HeatingChangePoint))
        ));
        let table = format!("{TABLE}beta_other,1.0,1.0\n");
        assert!(matches!(
            PopulationStatistics::from_csv_reader(table.as_bytes()),
            Err(PopulationError::UnknownCoefficient(name)) if name == "beta_other"
        ));
    }

    #[test]
    fn typical_model() {
        let typical = PopulationStatistics::default_fossil_fuel().typical_coefficients();
        assert_eq!(typical.hsl, -0.072);
        assert_eq!(typical.hcp, 12.4);
        assert_eq!(typical.ccp, 4.493517689);
        assert_eq!(typical.base, 0.107);
    }

    #[test]
    fn invalid_coefficients_are_not_benchmarked() {
        let coefficients = ModelCoefficients::from_array([15.0, 15.0, 0.4, 0.0, 0.02]);
        let site = coefficients.site_values(&CoefficientValidation::for_model_type(
            ModelType::ThreePointCooling,
        ));
        let benchmarks = benchmark_site(&site, &PopulationStatistics::default_electricity());
        assert!(benchmarks.heating_slope.is_none());
        assert!(benchmarks.heating_change_point.is_none());
        assert_eq!(benchmarks.cooling_slope.unwrap().rating, Rating::Poor);
    }
}
