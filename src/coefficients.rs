use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Utility type of an observation series
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum UtilityType {
    Electricity,
    FossilFuel,
}

impl UtilityType {
    pub const ALL: [Self; 2] = [Self::Electricity, Self::FossilFuel];

    pub fn name(self) -> &'static str {
        match self {
            Self::Electricity => "Electricity",
            Self::FossilFuel => "Fossil Fuel",
        }
    }
}

impl fmt::Display for UtilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the five benchmarked change-point model coefficients
///
/// Serialized names follow the benchmark tables: `beta_base`, `beta_cdd`, `beta_betc`,
/// `beta_hdd` and `beta_beth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Coefficient {
    /// Baseload, energy per area per day
    #[serde(rename = "beta_base")]
    Baseload,
    /// Cooling sensitivity, energy per area per day per °C
    #[serde(rename = "beta_cdd")]
    CoolingSlope,
    /// Cooling change-point, °C
    #[serde(rename = "beta_betc")]
    CoolingChangePoint,
    /// Heating sensitivity, positive, energy per area per day per °C
    #[serde(rename = "beta_hdd")]
    HeatingSlope,
    /// Heating change-point, °C
    #[serde(rename = "beta_beth")]
    HeatingChangePoint,
}

impl Coefficient {
    pub const ALL: [Self; 5] = [
        Self::Baseload,
        Self::CoolingSlope,
        Self::CoolingChangePoint,
        Self::HeatingSlope,
        Self::HeatingChangePoint,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Baseload => "beta_base",
            Self::CoolingSlope => "beta_cdd",
            Self::CoolingChangePoint => "beta_betc",
            Self::HeatingSlope => "beta_hdd",
            Self::HeatingChangePoint => "beta_beth",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Baseload => "Baseload",
            Self::CoolingSlope => "Cooling Sensitivity",
            Self::CoolingChangePoint => "Cooling Change-point",
            Self::HeatingSlope => "Heating Sensitivity",
            Self::HeatingChangePoint => "Heating Change-point",
        }
    }

    /// A higher cooling change-point is better, lower is better for all other coefficients
    pub fn higher_is_better(self) -> bool {
        matches!(self, Self::CoolingChangePoint)
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value for each of the five [Coefficient]s
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PerCoefficient<T> {
    #[serde(rename = "beta_base")]
    pub baseload: T,
    #[serde(rename = "beta_cdd")]
    pub cooling_slope: T,
    #[serde(rename = "beta_betc")]
    pub cooling_change_point: T,
    #[serde(rename = "beta_hdd")]
    pub heating_slope: T,
    #[serde(rename = "beta_beth")]
    pub heating_change_point: T,
}

impl<T> PerCoefficient<T> {
    pub fn from_fn(mut f: impl FnMut(Coefficient) -> T) -> Self {
        Self {
            baseload: f(Coefficient::Baseload),
            cooling_slope: f(Coefficient::CoolingSlope),
            cooling_change_point: f(Coefficient::CoolingChangePoint),
            heating_slope: f(Coefficient::HeatingSlope),
            heating_change_point: f(Coefficient::HeatingChangePoint),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Coefficient, &T) -> U) -> PerCoefficient<U> {
        PerCoefficient::from_fn(|c| f(c, &self[c]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coefficient, &T)> {
        Coefficient::ALL.into_iter().map(move |c| (c, &self[c]))
    }
}

impl<T> Index<Coefficient> for PerCoefficient<T> {
    type Output = T;

    fn index(&self, c: Coefficient) -> &T {
        match c {
            Coefficient::Baseload => &self.baseload,
            Coefficient::CoolingSlope => &self.cooling_slope,
            Coefficient::CoolingChangePoint => &self.cooling_change_point,
            Coefficient::HeatingSlope => &self.heating_slope,
            Coefficient::HeatingChangePoint => &self.heating_change_point,
        }
    }
}

impl<T> IndexMut<Coefficient> for PerCoefficient<T> {
    fn index_mut(&mut self, c: Coefficient) -> &mut T {
        match c {
            Coefficient::Baseload => &mut self.baseload,
            Coefficient::CoolingSlope => &mut self.cooling_slope,
            Coefficient::CoolingChangePoint => &mut self.cooling_change_point,
            Coefficient::HeatingSlope => &mut self.heating_slope,
            Coefficient::HeatingChangePoint => &mut self.heating_change_point,
        }
    }
}

/// Site-facing coefficient values, `None` marks a coefficient absent from the model
pub type SiteCoefficients = PerCoefficient<Option<f64>>;

/// Which coefficients are structurally meaningful for a [ModelType]
pub type CoefficientValidation = PerCoefficient<bool>;

impl PerCoefficient<bool> {
    pub fn for_model_type(model_type: ModelType) -> Self {
        let (heating, cooling) = match model_type {
            ModelType::NoFit => {
                return Self::from_fn(|_| false);
            }
            ModelType::ThreePointHeating => (true, false),
            ModelType::ThreePointCooling => (false, true),
            ModelType::FourPoint | ModelType::FivePoint => (true, true),
        };
        Self {
            baseload: true,
            cooling_slope: cooling,
            cooling_change_point: cooling,
            heating_slope: heating,
            heating_change_point: heating,
        }
    }
}

/// Classified shape of a fitted change-point model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ModelType {
    #[serde(rename = "No fit")]
    NoFit,
    #[serde(rename = "3P Heating")]
    ThreePointHeating,
    #[serde(rename = "3P Cooling")]
    ThreePointCooling,
    #[serde(rename = "4P")]
    FourPoint,
    #[serde(rename = "5P")]
    FivePoint,
}

impl ModelType {
    pub fn name(self) -> &'static str {
        match self {
            Self::NoFit => "No fit",
            Self::ThreePointHeating => "3P Heating",
            Self::ThreePointCooling => "3P Cooling",
            Self::FourPoint => "4P",
            Self::FivePoint => "5P",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coefficients of the five-parameter piecewise-linear model
///
/// $$
/// y(T) = \begin{cases}
///   \mathrm{hsl}\,(T - \mathrm{hcp}) + \mathrm{base}, & T < \mathrm{hcp}, \\\\
///   \mathrm{base}, & \mathrm{hcp} \le T \le \mathrm{ccp}, \\\\
///   \mathrm{csl}\,(T - \mathrm{ccp}) + \mathrm{base}, & T > \mathrm{ccp}.
/// \end{cases}
/// $$
///
/// The heating slope `hsl` is non-positive here, the site-facing [SiteCoefficients] report its
/// magnitude as the heating sensitivity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelCoefficients {
    /// Heating change-point, °C
    pub hcp: f64,
    /// Cooling change-point, °C
    pub ccp: f64,
    /// Baseload
    pub base: f64,
    /// Heating slope, non-positive
    pub hsl: f64,
    /// Cooling slope, non-negative
    pub csl: f64,
}

impl ModelCoefficients {
    pub const NPARAMS: usize = 5;

    pub fn from_array(p: [f64; Self::NPARAMS]) -> Self {
        let [hcp, ccp, base, hsl, csl] = p;
        Self {
            hcp,
            ccp,
            base,
            hsl,
            csl,
        }
    }

    pub fn to_array(&self) -> [f64; Self::NPARAMS] {
        [self.hcp, self.ccp, self.base, self.hsl, self.csl]
    }

    /// Daily energy-use intensity at temperature `t`
    ///
    /// If the change-points are crossed the cooling branch takes precedence above `ccp`.
    pub fn eval(&self, t: f64) -> f64 {
        crate::change_point::piecewise_linear(t, &self.to_array())
    }

    /// Site-facing values: invalid coefficients are `None` and the heating slope is reported as a
    /// positive sensitivity
    pub fn site_values(&self, validation: &CoefficientValidation) -> SiteCoefficients {
        let values = PerCoefficient {
            baseload: self.base,
            cooling_slope: self.csl,
            cooling_change_point: self.ccp,
            heating_slope: self.hsl.abs(),
            heating_change_point: self.hcp,
        };
        values.map(|c, &v| validation[c].then_some(v))
    }

    /// Inverse of [ModelCoefficients::site_values]
    ///
    /// An absent heating branch is modelled as `hcp = ccp, hsl = 0`, an absent cooling branch as
    /// `ccp = hcp, csl = 0`. Absent baseload is zero.
    pub fn from_site_values(values: &SiteCoefficients) -> Self {
        let heating = values.heating_slope.zip(values.heating_change_point);
        let cooling = values.cooling_slope.zip(values.cooling_change_point);
        let base = values.baseload.unwrap_or(0.0);
        match (heating, cooling) {
            (Some((hdd, hcp)), Some((csl, ccp))) => Self {
                hcp,
                ccp,
                base,
                hsl: -hdd,
                csl,
            },
            (Some((hdd, hcp)), None) => Self {
                hcp,
                ccp: hcp,
                base,
                hsl: -hdd,
                csl: 0.0,
            },
            (None, Some((csl, ccp))) => Self {
                hcp: ccp,
                ccp,
                base,
                hsl: 0.0,
                csl,
            },
            (None, None) => Self {
                hcp: 0.0,
                ccp: 0.0,
                base,
                hsl: 0.0,
                csl: 0.0,
            },
        }
    }
}
