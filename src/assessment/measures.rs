use crate::coefficients::{SiteCoefficients, UtilityType};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Facility improvement measure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Measure {
    IncreaseCoolingSetpoints,
    DecreaseHeatingSetpoints,
    ReduceEquipmentSchedules,
    DecreaseVentilation,
    EliminateElectricHeating,
    DecreaseInfiltration,
    ReduceLightingLoad,
    ReducePlugLoads,
    AddFixEconomizers,
    IncreaseCoolingSystemEfficiency,
    IncreaseHeatingSystemEfficiency,
    AddWallCeilingInsulation,
    UpgradeWindows,
    CheckFossilBaseload,
}

impl Measure {
    /// Catalog order, recommendations are always reported in this order
    pub const CATALOG: [Self; 14] = [
        Self::IncreaseCoolingSetpoints,
        Self::DecreaseHeatingSetpoints,
        Self::ReduceEquipmentSchedules,
        Self::DecreaseVentilation,
        Self::EliminateElectricHeating,
        Self::DecreaseInfiltration,
        Self::ReduceLightingLoad,
        Self::ReducePlugLoads,
        Self::AddFixEconomizers,
        Self::IncreaseCoolingSystemEfficiency,
        Self::IncreaseHeatingSystemEfficiency,
        Self::AddWallCeilingInsulation,
        Self::UpgradeWindows,
        Self::CheckFossilBaseload,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::IncreaseCoolingSetpoints => "Increase Cooling Setpoints",
            Self::DecreaseHeatingSetpoints => "Decrease Heating Setpoints",
            Self::ReduceEquipmentSchedules => "Reduce Equipment Schedules",
            Self::DecreaseVentilation => "Decrease Ventilation",
            Self::EliminateElectricHeating => "Eliminate Electric Heating",
            Self::DecreaseInfiltration => "Decrease Infiltration",
            Self::ReduceLightingLoad => "Reduce Lighting Load",
            Self::ReducePlugLoads => "Reduce Plug Loads",
            Self::AddFixEconomizers => "Add/Fix Economizers",
            Self::IncreaseCoolingSystemEfficiency => "Increase Cooling System Efficiency",
            Self::IncreaseHeatingSystemEfficiency => "Increase Heating System Efficiency",
            Self::AddWallCeilingInsulation => "Add Wall/Ceiling Insulation",
            Self::UpgradeWindows => "Upgrade Windows",
            Self::CheckFossilBaseload => "Check Fossil Baseload",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Relative gaps a site coefficient must exceed its target by
///
/// A gap test passes when `gap >= threshold * target`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MeasureThresholds {
    /// Cooling and heating change-points
    pub change_point: f64,
    /// Cooling and heating slopes
    pub slope: f64,
    pub baseload: f64,
    /// Absolute heating sensitivity of electricity use that indicates electric heating
    pub electric_heating: f64,
}

impl MeasureThresholds {
    /// Near-zero tolerance applied to every relative gap
    #[inline]
    pub fn default_tolerance() -> f64 {
        0.001
    }

    #[inline]
    pub fn default_electric_heating() -> f64 {
        0.01
    }

    /// Percentage thresholds: 20% for change-points, 10% for slopes, 0.1% for baseload
    pub fn percentage() -> Self {
        Self {
            change_point: 0.2,
            slope: 0.1,
            baseload: 0.001,
            electric_heating: Self::default_electric_heating(),
        }
    }
}

impl Default for MeasureThresholds {
    fn default() -> Self {
        Self {
            change_point: Self::default_tolerance(),
            slope: Self::default_tolerance(),
            baseload: Self::default_tolerance(),
            electric_heating: Self::default_electric_heating(),
        }
    }
}

/// Coefficient deviations the measure rules are expressed in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnosis {
    pub electricity: bool,
    pub fossil_fuel: bool,
    /// Cooling starts at a lower temperature than targeted
    pub low_cooling_change_point: bool,
    /// Heating continues to a higher temperature than targeted
    pub high_heating_change_point: bool,
    pub high_baseload: bool,
    pub high_cooling_slope: bool,
    pub high_heating_slope: bool,
    /// Heating sensitivity above the absolute electric-heating threshold
    pub electric_heating_slope: bool,
}

fn gap_exceeds(gap: f64, threshold: f64, target: f64) -> bool {
    gap >= threshold * target
}

impl Diagnosis {
    pub fn new(
        utility: UtilityType,
        site: &SiteCoefficients,
        targets: &SiteCoefficients,
        thresholds: &MeasureThresholds,
    ) -> Self {
        // Site value above its target by at least the relative threshold
        let above = |site: Option<f64>, target: Option<f64>, threshold: f64, positive: bool| {
            site.zip(target).is_some_and(|(site, target)| {
                (!positive || site > 0.0) && gap_exceeds(site - target, threshold, target)
            })
        };
        Self {
            electricity: utility == UtilityType::Electricity,
            fossil_fuel: utility == UtilityType::FossilFuel,
            low_cooling_change_point: site
                .cooling_change_point
                .zip(targets.cooling_change_point)
                .is_some_and(|(site, target)| {
                    gap_exceeds(target - site, thresholds.change_point, target)
                }),
            high_heating_change_point: above(
                site.heating_change_point,
                targets.heating_change_point,
                thresholds.change_point,
                false,
            ),
            high_baseload: above(site.baseload, targets.baseload, thresholds.baseload, true),
            high_cooling_slope: above(
                site.cooling_slope,
                targets.cooling_slope,
                thresholds.slope,
                true,
            ),
            high_heating_slope: above(
                site.heating_slope,
                targets.heating_slope,
                thresholds.slope,
                true,
            ),
            electric_heating_slope: site
                .heating_slope
                .is_some_and(|hdd| hdd > thresholds.electric_heating),
        }
    }

    fn setpoints(&self) -> bool {
        self.low_cooling_change_point || self.high_heating_change_point
    }

    fn envelope_votes(&self) -> usize {
        [
            self.high_cooling_slope,
            self.high_heating_slope,
            self.high_heating_change_point,
        ]
        .into_iter()
        .filter(|&x| x)
        .count()
    }
}

type Rule = fn(&Diagnosis) -> bool;

const RULES: [(Measure, Rule); 14] = [
    (Measure::IncreaseCoolingSetpoints, |d| d.low_cooling_change_point),
    (Measure::DecreaseHeatingSetpoints, |d| d.high_heating_change_point),
    (Measure::ReduceEquipmentSchedules, |d| {
        (d.electricity && d.high_baseload) || d.setpoints()
    }),
    (Measure::DecreaseVentilation, |d| d.envelope_votes() >= 2),
    (Measure::EliminateElectricHeating, |d| {
        d.electricity && d.electric_heating_slope
    }),
    (Measure::DecreaseInfiltration, |d| d.envelope_votes() >= 2),
    (Measure::ReduceLightingLoad, |d| d.electricity && d.high_baseload),
    (Measure::ReducePlugLoads, |d| d.electricity && d.high_baseload),
    (Measure::AddFixEconomizers, |d| d.low_cooling_change_point),
    (Measure::IncreaseCoolingSystemEfficiency, |d| d.high_cooling_slope),
    (Measure::IncreaseHeatingSystemEfficiency, |d| d.high_heating_slope),
    (Measure::AddWallCeilingInsulation, |d| d.envelope_votes() >= 2),
    (Measure::UpgradeWindows, |d| {
        d.high_cooling_slope && d.high_heating_slope && d.low_cooling_change_point
    }),
    (Measure::CheckFossilBaseload, |d| d.fossil_fuel && d.high_baseload),
];

/// Recommended measures in catalog order
pub fn recommend(diagnosis: &Diagnosis) -> Vec<Measure> {
    RULES
        .iter()
        .filter(|(_, rule)| rule(diagnosis))
        .map(|&(measure, _)| measure)
        .collect()
}
