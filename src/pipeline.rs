use crate::assessment::{Assessment, Measure};
use crate::benchmark::{Benchmark, PopulationStatistics};
use crate::change_point::{ChangePointFitter, ChangePointModel, ModelDescription, NoFitReason};
use crate::coefficients::{ModelCoefficients, PerCoefficient, UtilityType};
use crate::config::AssessmentConfig;
use crate::data::ObservationSeries;
use crate::error::{FitError, PipelineError};
use crate::savings::{ProjectionModels, SavingsResult};

use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Billing history of one utility of a building
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UtilityInput {
    pub utility: UtilityType,
    pub series: ObservationSeries,
    /// Price per unit of energy, [AssessmentConfig] default is used when absent
    pub unit_price: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingInput {
    pub id: String,
    /// Floor area the energy-use intensity is normalized by
    pub area: f64,
    pub utilities: Vec<UtilityInput>,
}

/// Results of one utility of a building
///
/// Assessment and savings are present only when a model was fitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UtilityReport {
    pub utility: UtilityType,
    pub model: ChangePointModel,
    pub description: ModelDescription,
    pub benchmarks: PerCoefficient<Option<Benchmark>>,
    pub assessment: Option<Assessment>,
    pub savings: Option<SavingsResult>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BuildingReport {
    pub id: String,
    pub area: f64,
    pub utilities: Vec<UtilityReport>,
    /// Union of the measures recommended for every utility, in catalog order
    pub measures: Vec<Measure>,
    pub old_consumption: f64,
    pub energy_savings: f64,
    pub cost_savings: f64,
    pub energy_savings_percent: f64,
}

impl BuildingReport {
    pub fn utility(&self, utility: UtilityType) -> Option<&UtilityReport> {
        self.utilities.iter().find(|r| r.utility == utility)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BuildingFailure {
    pub id: String,
    pub error: String,
}

/// Reports of a batch run, a failed building never stops the others
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PortfolioReport {
    pub reports: Vec<BuildingReport>,
    pub failures: Vec<BuildingFailure>,
}

/// Fit, benchmark, assess and project savings for buildings
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    config: AssessmentConfig,
    fitter: ChangePointFitter,
}

impl Pipeline {
    pub fn new(config: AssessmentConfig) -> Self {
        let fitter = ChangePointFitter::new(config.fitter.clone());
        Self { config, fitter }
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    /// Fit a change-point model, shared by site assessment and population generation
    pub fn fit(&self, series: &ObservationSeries) -> Result<ChangePointModel, FitError> {
        self.fitter.fit(series)
    }

    /// Solver failures become a [NoFitReason::NonConvergence] model, input errors are returned
    fn fit_or_no_fit(&self, series: &ObservationSeries) -> Result<ChangePointModel, FitError> {
        match self.fit(series) {
            Err(FitError::NonConvergence { stage }) => {
                warn!(stage, "change-point fit did not converge");
                Ok(ChangePointModel::no_fit(
                    NoFitReason::NonConvergence,
                    f64::NAN,
                    series.len(),
                ))
            }
            result => result,
        }
    }

    pub fn run_utility(
        &self,
        input: &UtilityInput,
        area: f64,
    ) -> Result<UtilityReport, PipelineError> {
        let utility = input.utility;
        let population = self.config.population(utility);
        let model = self.fit_or_no_fit(&input.series)?;
        let site = model.site_values();
        let benchmarks = crate::benchmark::benchmark_site(&site, population);

        let (assessment, savings) = match &model.coefficients {
            Some(fitted) => {
                let assessment = self.config.assessor().assess(utility, &site, population);
                let improved = ModelCoefficients::from_site_values(&assessment.savings_coefficients);
                let typical = population.typical_coefficients();
                let unit_price = input
                    .unit_price
                    .unwrap_or_else(|| self.config.default_unit_price(utility));
                let savings = self.config.projector().project(
                    &input.series,
                    area,
                    unit_price,
                    ProjectionModels {
                        old: fitted,
                        new: &improved,
                        typical: &typical,
                    },
                )?;
                debug!(
                    %utility,
                    energy_savings = savings.energy_savings,
                    cost_savings = savings.cost_savings,
                    "projected savings"
                );
                (Some(assessment), Some(savings))
            }
            None => {
                debug!(%utility, reason = ?model.no_fit_reason, "no model, skipping assessment");
                (None, None)
            }
        };

        Ok(UtilityReport {
            utility,
            description: model.describe(area),
            model,
            benchmarks,
            assessment,
            savings,
        })
    }

    pub fn run_building(&self, input: &BuildingInput) -> Result<BuildingReport, PipelineError> {
        let utilities = input
            .utilities
            .iter()
            .map(|u| self.run_utility(u, input.area))
            .collect::<Result<Vec<_>, _>>()?;

        let measures: Vec<_> = Measure::CATALOG
            .into_iter()
            .filter(|&measure| {
                utilities
                    .iter()
                    .filter_map(|r| r.assessment.as_ref())
                    .any(|a| a.recommends(measure))
            })
            .collect();

        let (old_consumption, energy_savings, cost_savings) = utilities
            .iter()
            .filter_map(|r| r.savings.as_ref())
            .fold((0.0, 0.0, 0.0), |(old, energy, cost), s| {
                (
                    old + s.old_consumption,
                    energy + s.energy_savings,
                    cost + s.cost_savings,
                )
            });
        let energy_savings_percent = if old_consumption > 0.0 {
            energy_savings / old_consumption * 100.0
        } else {
            0.0
        };
        info!(
            building = %input.id,
            n_measures = measures.len(),
            energy_savings,
            cost_savings,
            "building assessed"
        );

        Ok(BuildingReport {
            id: input.id.clone(),
            area: input.area,
            utilities,
            measures,
            old_consumption,
            energy_savings,
            cost_savings,
            energy_savings_percent,
        })
    }

    /// Run buildings one after another
    pub fn run_portfolio<'a>(
        &self,
        buildings: impl IntoIterator<Item = &'a BuildingInput>,
    ) -> PortfolioReport {
        let results = buildings
            .into_iter()
            .map(|building| (building, self.run_building(building)));
        collect_portfolio(results)
    }

    /// Same as [Pipeline::run_portfolio] with buildings processed on the rayon thread pool
    pub fn run_portfolio_parallel(&self, buildings: &[BuildingInput]) -> PortfolioReport {
        let results: Vec<_> = buildings
            .par_iter()
            .map(|building| (building, self.run_building(building)))
            .collect();
        collect_portfolio(results)
    }

    /// Population table of a peer group, buildings without a model are skipped
    pub fn population_statistics<'a>(
        &self,
        population: impl IntoIterator<Item = &'a ObservationSeries>,
    ) -> Result<PopulationStatistics, PipelineError> {
        let mut models = vec![];
        for (i, series) in population.into_iter().enumerate() {
            match self.fit(series) {
                Ok(model) if model.is_fit() => models.push(model),
                Ok(model) => {
                    debug!(index = i, reason = ?model.no_fit_reason, "population member not fitted")
                }
                Err(error) => warn!(index = i, %error, "population member skipped"),
            }
        }
        info!(n_models = models.len(), "population models fitted");
        Ok(PopulationStatistics::from_models(&models)?)
    }
}

fn collect_portfolio<'a>(
    results: impl IntoIterator<Item = (&'a BuildingInput, Result<BuildingReport, PipelineError>)>,
) -> PortfolioReport {
    let mut portfolio = PortfolioReport::default();
    for (building, result) in results {
        match result {
            Ok(report) => portfolio.reports.push(report),
            Err(error) => {
                warn!(building = %building.id, %error, "building failed");
                portfolio.failures.push(BuildingFailure {
                    id: building.id.clone(),
                    error: error.to_string(),
                });
            }
        }
    }
    portfolio
}
