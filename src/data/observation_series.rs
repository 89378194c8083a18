use crate::data::sorted_array::SortedArray;
use crate::error::InputError;

use itertools::izip;
use serde::{Deserialize, Serialize};

/// Billing-period observations of one utility type for one building
///
/// The three sequences are parallel: `temperature[i]` is the mean outdoor temperature (°C) of the
/// `i`-th billing period, `eui[i]` is the daily energy-use intensity (energy per unit floor area
/// per day) and `days[i]` is the period length. Periods are expected in chronological order, the
/// most recent periods are used by [crate::SavingsProjector].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObservationSeriesParameters")]
pub struct ObservationSeries {
    temperature: Vec<f64>,
    eui: Vec<f64>,
    days: Vec<f64>,
}

/// The most recent billing periods of an [ObservationSeries]
#[derive(Clone, Copy, Debug)]
pub struct SeriesTail<'a> {
    pub temperature: &'a [f64],
    pub eui: &'a [f64],
    pub days: &'a [f64],
}

impl ObservationSeries {
    /// Construct a series, checking that all three sequences have the same length, all values are
    /// finite and every period is longer than zero days
    pub fn new(
        temperature: impl Into<Vec<f64>>,
        eui: impl Into<Vec<f64>>,
        days: impl Into<Vec<f64>>,
    ) -> Result<Self, InputError> {
        let temperature = temperature.into();
        let eui = eui.into();
        let days = days.into();

        if temperature.len() != eui.len() || eui.len() != days.len() {
            return Err(InputError::LengthMismatch {
                temperature: temperature.len(),
                eui: eui.len(),
                days: days.len(),
            });
        }
        check_finite("temperature", &temperature)?;
        check_finite("eui", &eui)?;
        check_finite("days", &days)?;
        if let Some(index) = days.iter().position(|&d| d <= 0.0) {
            return Err(InputError::NonPositiveDays { index });
        }

        Ok(Self {
            temperature,
            eui,
            days,
        })
    }

    /// Construct a series from total consumption per billing period
    ///
    /// Daily energy-use intensity is `consumption / days / area`.
    pub fn from_consumption(
        temperature: impl Into<Vec<f64>>,
        consumption: &[f64],
        days: impl Into<Vec<f64>>,
        area: f64,
    ) -> Result<Self, InputError> {
        if area.is_nan() || area <= 0.0 {
            return Err(InputError::NonPositiveArea);
        }
        let days = days.into();
        if consumption.len() != days.len() {
            let temperature = temperature.into();
            return Err(InputError::LengthMismatch {
                temperature: temperature.len(),
                eui: consumption.len(),
                days: days.len(),
            });
        }
        if let Some(index) = days.iter().position(|&d| d <= 0.0) {
            return Err(InputError::NonPositiveDays { index });
        }
        let eui: Vec<_> = consumption
            .iter()
            .zip(days.iter())
            .map(|(&c, &d)| c / d / area)
            .collect();
        Self::new(temperature, eui, days)
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    pub fn eui(&self) -> &[f64] {
        &self.eui
    }

    pub fn days(&self) -> &[f64] {
        &self.days
    }

    pub fn sorted_temperature(&self) -> SortedArray {
        SortedArray::from_non_nan(self.temperature.iter().copied())
    }

    /// The last `n` periods, or all of them if the series is shorter
    pub fn last_periods(&self, n: usize) -> SeriesTail<'_> {
        let start = self.len().saturating_sub(n);
        SeriesTail {
            temperature: &self.temperature[start..],
            eui: &self.eui[start..],
            days: &self.days[start..],
        }
    }

    /// Iterator over `(temperature, eui, days)` triples
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        izip!(&self.temperature, &self.eui, &self.days).map(|(&t, &e, &d)| (t, e, d))
    }
}

fn check_finite(name: &'static str, values: &[f64]) -> Result<(), InputError> {
    match values.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(InputError::NonFiniteValue { name, index }),
        None => Ok(()),
    }
}

#[derive(Deserialize)]
#[serde(rename = "ObservationSeries")]
struct ObservationSeriesParameters {
    temperature: Vec<f64>,
    eui: Vec<f64>,
    days: Vec<f64>,
}

impl TryFrom<ObservationSeriesParameters> for ObservationSeries {
    type Error = InputError;

    fn try_from(p: ObservationSeriesParameters) -> Result<Self, Self::Error> {
        Self::new(p.temperature, p.eui, p.days)
    }
}
