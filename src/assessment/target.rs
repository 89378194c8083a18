use crate::benchmark::{CoefficientStats, PopulationStatistics};
use crate::coefficients::{Coefficient, SiteCoefficients};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far past the population median a target coefficient is moved
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum TargetLevel {
    /// One standard deviation short of the median
    Conservative,
    /// The median
    #[default]
    Nominal,
    /// Half a standard deviation past the median
    Aggressive,
}

impl TargetLevel {
    pub const ALL: [Self; 3] = [Self::Conservative, Self::Nominal, Self::Aggressive];

    /// Reference value before comparing with the site, written for lower-is-better coefficients
    fn reference(self, stats: CoefficientStats, higher_is_better: bool) -> f64 {
        let offset = match self {
            Self::Conservative => stats.std,
            Self::Nominal => 0.0,
            Self::Aggressive => -0.5 * stats.std,
        };
        if higher_is_better {
            stats.median - offset
        } else {
            stats.median + offset
        }
    }
}

impl fmt::Display for TargetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Conservative => "Conservative",
            Self::Nominal => "Nominal",
            Self::Aggressive => "Aggressive",
        })
    }
}

/// Target of a single site coefficient
///
/// A target never makes the site worse: the cooling change-point target is the larger of the site
/// value and the reference value, every other target is the smaller of the two.
pub fn target_value(
    coefficient: Coefficient,
    site: f64,
    stats: CoefficientStats,
    level: TargetLevel,
) -> f64 {
    let reference = level.reference(stats, coefficient.higher_is_better());
    more_conservative(coefficient, site, reference)
}

/// Targets of all present site coefficients, absent coefficients have no target
pub fn compute_targets(
    site: &SiteCoefficients,
    population: &PopulationStatistics,
    level: TargetLevel,
) -> SiteCoefficients {
    site.map(|coefficient, value| {
        value.map(|value| target_value(coefficient, value, population.get(coefficient), level))
    })
}

/// Per coefficient the better of the site and target values, fed to savings projection
pub fn savings_coefficients(site: &SiteCoefficients, targets: &SiteCoefficients) -> SiteCoefficients {
    site.map(|coefficient, value| {
        value
            .zip(targets[coefficient])
            .map(|(site, target)| more_conservative(coefficient, site, target))
    })
}

fn more_conservative(coefficient: Coefficient, a: f64, b: f64) -> f64 {
    if coefficient.higher_is_better() {
        a.max(b)
    } else {
        a.min(b)
    }
}
