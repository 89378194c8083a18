use crate::coefficients::ModelCoefficients;
use crate::data::ObservationSeries;
use crate::error::InputError;

use itertools::izip;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Consumption split into temperature-independent and temperature-driven parts
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConsumptionBreakdown {
    pub baseload: f64,
    pub heating: f64,
    pub cooling: f64,
}

impl ConsumptionBreakdown {
    pub fn total(&self) -> f64 {
        self.baseload + self.heating + self.cooling
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            baseload: self.baseload * factor,
            heating: self.heating * factor,
            cooling: self.cooling * factor,
        }
    }
}

impl Add for ConsumptionBreakdown {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            baseload: self.baseload + rhs.baseload,
            heating: self.heating + rhs.heating,
            cooling: self.cooling + rhs.cooling,
        }
    }
}

/// Coefficient sets compared by [SavingsProjector::project]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionModels<'a> {
    /// Fitted model of the building
    pub old: &'a ModelCoefficients,
    /// Model after the recommended improvements
    pub new: &'a ModelCoefficients,
    /// Model of a typical building of the population
    pub typical: &'a ModelCoefficients,
}

/// Projected consumption and savings of one utility
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SavingsResult {
    /// Number of recent periods the totals cover
    pub periods: usize,
    pub old_consumption: f64,
    pub new_consumption: f64,
    pub typical_consumption: f64,
    pub energy_savings: f64,
    /// Energy savings relative to the old consumption in percent, zero without old consumption
    pub energy_savings_percent: f64,
    pub cost_savings: f64,
    pub old_breakdown: ConsumptionBreakdown,
    pub new_breakdown: ConsumptionBreakdown,
    pub typical_breakdown: ConsumptionBreakdown,
    pub old_cost_breakdown: ConsumptionBreakdown,
    pub new_cost_breakdown: ConsumptionBreakdown,
    pub typical_cost_breakdown: ConsumptionBreakdown,
    /// Modelled consumption of every billing period
    pub old_per_period: Vec<f64>,
    /// Consumption of every billing period with the improvements
    pub new_per_period: Vec<f64>,
}

/// Evaluates fitted, improved and typical models over the billing history
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SavingsProjector {
    pub recent_periods: usize,
}

impl SavingsProjector {
    pub fn new(recent_periods: usize) -> Self {
        Self { recent_periods }
    }

    #[inline]
    pub fn default_recent_periods() -> usize {
        12
    }

    pub fn project(
        &self,
        series: &ObservationSeries,
        area: f64,
        unit_price: f64,
        models: ProjectionModels<'_>,
    ) -> Result<SavingsResult, InputError> {
        if area.is_nan() || area <= 0.0 {
            return Err(InputError::NonPositiveArea);
        }
        if unit_price.is_nan() || unit_price < 0.0 {
            return Err(InputError::NegativeUnitPrice);
        }

        let old_per_period = consumption(series.temperature(), series.days(), models.old, area);
        let new_per_period = consumption(series.temperature(), series.days(), models.new, area);
        let start = series.len().saturating_sub(self.recent_periods);
        let recent = series.last_periods(self.recent_periods);

        let old_consumption: f64 = old_per_period[start..].iter().sum();
        let new_consumption: f64 = new_per_period[start..].iter().sum();
        let typical_consumption: f64 =
            consumption(recent.temperature, recent.days, models.typical, area)
                .iter()
                .sum();
        let energy_savings = old_consumption - new_consumption;
        let energy_savings_percent = if old_consumption > 0.0 {
            energy_savings / old_consumption * 100.0
        } else {
            0.0
        };

        let old_breakdown = disaggregate(recent.temperature, recent.days, models.old, area);
        let new_breakdown = disaggregate(recent.temperature, recent.days, models.new, area);
        let typical_breakdown =
            disaggregate(recent.temperature, recent.days, models.typical, area);

        Ok(SavingsResult {
            periods: recent.days.len(),
            old_consumption,
            new_consumption,
            typical_consumption,
            energy_savings,
            energy_savings_percent,
            cost_savings: energy_savings * unit_price,
            old_breakdown,
            new_breakdown,
            typical_breakdown,
            old_cost_breakdown: old_breakdown.scaled(unit_price),
            new_cost_breakdown: new_breakdown.scaled(unit_price),
            typical_cost_breakdown: typical_breakdown.scaled(unit_price),
            old_per_period,
            new_per_period,
        })
    }
}

impl Default for SavingsProjector {
    fn default() -> Self {
        Self::new(Self::default_recent_periods())
    }
}

fn consumption(
    temperature: &[f64],
    days: &[f64],
    coefficients: &ModelCoefficients,
    area: f64,
) -> Vec<f64> {
    temperature
        .iter()
        .zip(days)
        .map(|(&t, &d)| coefficients.eval(t) * d * area)
        .collect()
}

/// Split modelled consumption into baseload, heating and cooling
///
/// Heating is the consumption above baseload in periods colder than the heating change-point,
/// cooling likewise above the cooling change-point. A regime with fewer than two such periods
/// contributes nothing.
pub fn disaggregate(
    temperature: &[f64],
    days: &[f64],
    coefficients: &ModelCoefficients,
    area: f64,
) -> ConsumptionBreakdown {
    let base = coefficients.base;
    let baseload = days.iter().map(|d| base * d * area).sum();
    let regime = |in_regime: &dyn Fn(f64) -> bool| -> f64 {
        let periods: Vec<(f64, f64)> = izip!(temperature, days)
            .filter(|&(&t, _)| in_regime(t))
            .map(|(&t, &d)| (t, d))
            .collect();
        if periods.len() < 2 {
            return 0.0;
        }
        periods
            .iter()
            .map(|&(t, d)| (coefficients.eval(t) - base) * d * area)
            .sum()
    };
    ConsumptionBreakdown {
        baseload,
        heating: regime(&|t| t < coefficients.hcp),
        cooling: regime(&|t| t > coefficients.ccp),
    }
}
