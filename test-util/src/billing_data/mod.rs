use record::BillingRecord;

mod csv_parser;
pub(crate) mod buildings;
pub(crate) mod population;
mod record;

// Plain vectors: the library types cannot be returned without a cyclic crate dependency
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BillingArrays {
    pub temperature: Vec<f64>,
    pub eui: Vec<f64>,
    pub days: Vec<f64>,
}

impl BillingArrays {
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }
}

/// Ground truth `[hcp, ccp, base, hsl, csl]` of a bundled or synthetic building
pub type ChangePointTruth = [f64; 5];

#[derive(Debug, thiserror::Error)]
pub(super) enum Error {
    #[error(transparent)]
    CsvError(#[from] csv::Error),
}
