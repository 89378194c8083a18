use crate::coefficients::Coefficient;

/// Invalid observation series or building metadata
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("series length {actual} is smaller than the minimum required length {minimum}")]
    ShortSeries { actual: usize, minimum: usize },

    #[error("series lengths differ: temperature {temperature}, eui {eui}, days {days}")]
    LengthMismatch {
        temperature: usize,
        eui: usize,
        days: usize,
    },

    #[error("billing period {index} has a non-positive number of days")]
    NonPositiveDays { index: usize },

    #[error("{name} value at index {index} is not finite")]
    NonFiniteValue { name: &'static str, index: usize },

    #[error("building area must be positive")]
    NonPositiveArea,

    #[error("unit price must be non-negative")]
    NegativeUnitPrice,

    #[error("invalid fitter configuration: {0}")]
    InvalidFitterConfig(&'static str),
}

/// Error returned from [crate::ChangePointFitter]
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FitError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("least-squares solver did not converge during {stage}")]
    NonConvergence { stage: &'static str },
}

/// Error building a [crate::PopulationStatistics] table
#[derive(Debug, thiserror::Error)]
pub enum PopulationError {
    #[error("coefficient {0} is missing from the population table")]
    MissingCoefficient(Coefficient),

    #[error("no finite samples for coefficient {coefficient}")]
    EmptyPopulation { coefficient: Coefficient },

    #[error("unknown coefficient name {0:?}")]
    UnknownCoefficient(String),

    #[error("population table CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Error loading an [crate::AssessmentConfig]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Invalid(#[from] InputError),
}

/// Error of a single building pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    Population(#[from] PopulationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
