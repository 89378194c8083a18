//! Target coefficients and efficiency measure recommendations

pub mod measures;
pub use measures::{Diagnosis, Measure, MeasureThresholds};

pub mod target;
pub use target::{TargetLevel, compute_targets, savings_coefficients, target_value};

use crate::benchmark::PopulationStatistics;
use crate::coefficients::{SiteCoefficients, UtilityType};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of [TargetAssessor::assess]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Assessment {
    pub utility: UtilityType,
    pub level: TargetLevel,
    pub site: SiteCoefficients,
    pub targets: SiteCoefficients,
    /// Better of site and target per coefficient, used for savings projection
    pub savings_coefficients: SiteCoefficients,
    pub diagnosis: Diagnosis,
    /// Recommended measures in catalog order
    pub measures: Vec<Measure>,
}

impl Assessment {
    pub fn recommends(&self, measure: Measure) -> bool {
        self.measures.contains(&measure)
    }
}

/// Compares site coefficients with population-derived targets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TargetAssessor {
    pub level: TargetLevel,
    pub thresholds: MeasureThresholds,
}

impl TargetAssessor {
    pub fn new(level: TargetLevel, thresholds: MeasureThresholds) -> Self {
        Self { level, thresholds }
    }

    pub fn assess(
        &self,
        utility: UtilityType,
        site: &SiteCoefficients,
        population: &PopulationStatistics,
    ) -> Assessment {
        let targets = compute_targets(site, population, self.level);
        let diagnosis = Diagnosis::new(utility, site, &targets, &self.thresholds);
        let measures = measures::recommend(&diagnosis);
        debug!(%utility, level = %self.level, ?measures, "recommended measures");
        Assessment {
            utility,
            level: self.level,
            site: *site,
            targets,
            savings_coefficients: savings_coefficients(site, &targets),
            diagnosis,
            measures,
        }
    }
}

impl Default for TargetAssessor {
    fn default() -> Self {
        Self::new(TargetLevel::default(), MeasureThresholds::default())
    }
}
