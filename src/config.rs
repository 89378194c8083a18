use crate::assessment::{MeasureThresholds, TargetAssessor, TargetLevel};
use crate::benchmark::PopulationStatistics;
use crate::change_point::FitterConfig;
use crate::coefficients::UtilityType;
use crate::error::ConfigError;
use crate::savings::SavingsProjector;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io;

/// Configuration of the whole assessment pipeline
///
/// Every field is optional in the serialized form, missing fields take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AssessmentConfig {
    pub fitter: FitterConfig,
    pub target_level: TargetLevel,
    pub thresholds: MeasureThresholds,
    pub electricity_population: PopulationStatistics,
    pub fossil_fuel_population: PopulationStatistics,
    /// Price per unit of energy used when a utility has no price of its own
    pub electricity_unit_price: f64,
    pub fossil_fuel_unit_price: f64,
    /// Number of most recent billing periods savings are projected for
    pub recent_periods: usize,
}

impl AssessmentConfig {
    #[inline]
    pub fn default_electricity_unit_price() -> f64 {
        0.93
    }

    #[inline]
    pub fn default_fossil_fuel_unit_price() -> f64 {
        0.32
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_reader(reader: impl io::Read) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(io::BufReader::new(reader))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fitter.validate()?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON schema of the serialized configuration
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AssessmentConfig)
    }

    pub fn population(&self, utility: UtilityType) -> &PopulationStatistics {
        match utility {
            UtilityType::Electricity => &self.electricity_population,
            UtilityType::FossilFuel => &self.fossil_fuel_population,
        }
    }

    pub fn default_unit_price(&self, utility: UtilityType) -> f64 {
        match utility {
            UtilityType::Electricity => self.electricity_unit_price,
            UtilityType::FossilFuel => self.fossil_fuel_unit_price,
        }
    }

    pub fn assessor(&self) -> TargetAssessor {
        TargetAssessor::new(self.target_level, self.thresholds)
    }

    pub fn projector(&self) -> SavingsProjector {
        SavingsProjector::new(self.recent_periods)
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            fitter: FitterConfig::default(),
            target_level: TargetLevel::default(),
            thresholds: MeasureThresholds::default(),
            electricity_population: PopulationStatistics::default_electricity(),
            fossil_fuel_population: PopulationStatistics::default_fossil_fuel(),
            electricity_unit_price: Self::default_electricity_unit_price(),
            fossil_fuel_unit_price: Self::default_fossil_fuel_unit_price(),
            recent_periods: SavingsProjector::default_recent_periods(),
        }
    }
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;
    use crate::nl_fit::{CobylaCurveFit, CurveFitAlgorithm};

    #[test]
    fn empty_json_is_default() {
        let config = AssessmentConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AssessmentConfig::default());
    }

    #[test]
    fn partial_json() {
        let config = AssessmentConfig::from_json_str(
            r#"{
                "target_level": "Aggressive",
                "fitter": {"r2_threshold": 0.2, "algorithm": {"Cobyla": {
                    "niterations": 500, "rhobeg": 0.1, "ftol_rel": 1e-6,
                    "fine_tuning_algorithm": null
                }}},
                "electricity_population": {
                    "beta_base": {"beta_median": 1.0, "beta_standard_deviation": 0.1},
                    "beta_cdd": {"beta_median": 0.01, "beta_standard_deviation": 0.005},
                    "beta_betc": {"beta_median": 15.0, "beta_standard_deviation": 4.0},
                    "beta_hdd": {"beta_median": 0.01, "beta_standard_deviation": 0.005},
                    "beta_beth": {"beta_median": 14.0, "beta_standard_deviation": 5.0}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.target_level, TargetLevel::Aggressive);
        assert_eq!(config.fitter.r2_threshold, 0.2);
        assert_eq!(config.fitter.p_value_threshold, 0.05);
        assert_eq!(
            config.fitter.algorithm,
            CurveFitAlgorithm::Cobyla(CobylaCurveFit::new(500, 0.1, 1e-6, None))
        );
        assert_eq!(
            config
                .population(UtilityType::Electricity)
                .0
                .baseload
                .median,
            1.0
        );
        assert_eq!(
            config.population(UtilityType::FossilFuel),
            &PopulationStatistics::default_fossil_fuel()
        );
        assert_eq!(config.default_unit_price(UtilityType::FossilFuel), 0.32);
    }

    #[test]
    fn json_round_trip() {
        let config = AssessmentConfig {
            target_level: TargetLevel::Conservative,
            thresholds: MeasureThresholds::percentage(),
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        let restored = AssessmentConfig::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            AssessmentConfig::from_json_str(r#"{"recent_periods": "twelve"}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn out_of_domain_fitter_settings_are_rejected() {
        for json in [
            r#"{"fitter": {"min_observations": 0}}"#,
            r#"{"fitter": {"left_window_starts": [10.0, 120.0]}}"#,
            r#"{"fitter": {"right_window_starts": []}}"#,
            r#"{"fitter": {"initial_percentiles": [55.0, 45.0]}}"#,
        ] {
            assert!(
                matches!(
                    AssessmentConfig::from_json_str(json),
                    Err(ConfigError::Invalid(InputError::InvalidFitterConfig(_)))
                ),
                "{json}"
            );
        }
    }

    #[test]
    fn schema_mentions_fields() {
        let schema = serde_json::to_string(&AssessmentConfig::json_schema()).unwrap();
        assert!(schema.contains("target_level"));
        assert!(schema.contains("beta_betc"));
    }
}
