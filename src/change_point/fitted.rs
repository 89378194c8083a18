use crate::change_point::significance::PValues;
use crate::coefficients::{CoefficientValidation, ModelCoefficients, ModelType, SiteCoefficients};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

const DAYS_PER_YEAR: f64 = 365.0;

/// Why a series produced no usable model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum NoFitReason {
    /// Initial R² below the acceptance threshold or undefined
    BelowSignificanceThreshold,
    /// Neither slope is significant, consumption does not depend on temperature
    NoSignificantSlope,
    /// The least-squares solver failed
    NonConvergence,
}

/// Outcome of [crate::ChangePointFitter::fit]
///
/// For [ModelType::NoFit] no coefficients are exposed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChangePointModel {
    pub model_type: ModelType,
    pub coefficients: Option<ModelCoefficients>,
    pub validation: CoefficientValidation,
    pub r_squared: f64,
    pub adjusted_r_squared: f64,
    pub rmse: f64,
    pub p_values: PValues,
    pub n_observations: usize,
    pub no_fit_reason: Option<NoFitReason>,
}

impl ChangePointModel {
    pub fn no_fit(reason: NoFitReason, r_squared: f64, n_observations: usize) -> Self {
        Self {
            model_type: ModelType::NoFit,
            coefficients: None,
            validation: CoefficientValidation::for_model_type(ModelType::NoFit),
            r_squared,
            adjusted_r_squared: f64::NAN,
            rmse: f64::NAN,
            p_values: PValues::UNKNOWN,
            n_observations,
            no_fit_reason: Some(reason),
        }
    }

    pub fn is_fit(&self) -> bool {
        self.coefficients.is_some()
    }

    /// Site-facing coefficients, all absent for [ModelType::NoFit]
    pub fn site_values(&self) -> SiteCoefficients {
        match &self.coefficients {
            Some(coefficients) => coefficients.site_values(&self.validation),
            None => SiteCoefficients::default(),
        }
    }

    /// Daily energy-use intensity predicted at temperature `t`, `None` for [ModelType::NoFit]
    pub fn predict(&self, t: f64) -> Option<f64> {
        self.coefficients.map(|c| c.eval(t))
    }

    /// Whole-building summary for a floor `area`
    pub fn describe(&self, area: f64) -> ModelDescription {
        let site = self.site_values();
        ModelDescription {
            model_type: self.model_type,
            baseload_per_day: site.baseload.map(|b| b * area),
            baseload_per_year: site.baseload.map(|b| b * area * DAYS_PER_YEAR),
            heating_change_point: site.heating_change_point,
            heating_sensitivity: site.heating_slope.map(|s| s * area),
            cooling_change_point: site.cooling_change_point,
            cooling_sensitivity: site.cooling_slope.map(|s| s * area),
            r_squared: self.r_squared,
        }
    }
}

/// Human-readable whole-building model summary
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelDescription {
    pub model_type: ModelType,
    pub baseload_per_day: Option<f64>,
    pub baseload_per_year: Option<f64>,
    pub heating_change_point: Option<f64>,
    /// Consumption increase per day per degree below the heating change-point
    pub heating_sensitivity: Option<f64>,
    pub cooling_change_point: Option<f64>,
    /// Consumption increase per day per degree above the cooling change-point
    pub cooling_sensitivity: Option<f64>,
    pub r_squared: f64,
}

impl fmt::Display for ModelDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.model_type == ModelType::NoFit {
            return write!(f, "No fit");
        }
        write!(f, "{} model (R² = {:.3})", self.model_type, self.r_squared)?;
        if let (Some(day), Some(year)) = (self.baseload_per_day, self.baseload_per_year) {
            write!(f, "\n  baseload: {day:.1} per day, {year:.0} per year")?;
        }
        if let (Some(cp), Some(s)) = (self.heating_change_point, self.heating_sensitivity) {
            write!(
                f,
                "\n  heating: starts below {cp:.1} °C, {s:.2} per day per °C"
            )?;
        }
        if let (Some(cp), Some(s)) = (self.cooling_change_point, self.cooling_sensitivity) {
            write!(
                f,
                "\n  cooling: starts above {cp:.1} °C, {s:.2} per day per °C"
            )?;
        }
        Ok(())
    }
}
