#![doc = include_str!("../README.md")]

pub mod assessment;
pub use assessment::{Assessment, Measure, MeasureThresholds, TargetAssessor, TargetLevel};

pub mod benchmark;
pub use benchmark::{Benchmark, CoefficientStats, PopulationStatistics, Rating};

pub mod change_point;
pub use change_point::{
    ChangePointFitter, ChangePointModel, FitterConfig, ModelDescription, NoFitReason,
};

mod coefficients;
pub use coefficients::{
    Coefficient, CoefficientValidation, ModelCoefficients, ModelType, PerCoefficient,
    SiteCoefficients, UtilityType,
};

mod config;
pub use config::AssessmentConfig;

mod data;
pub use data::{ObservationSeries, SeriesTail, SortedArray};

mod error;
pub use error::{ConfigError, FitError, InputError, PipelineError, PopulationError};

pub mod nl_fit;
pub use nl_fit::{CobylaCurveFit, CurveFitAlgorithm, LmCurveFit};

mod pipeline;
pub use pipeline::{
    BuildingFailure, BuildingInput, BuildingReport, Pipeline, PortfolioReport, UtilityInput,
    UtilityReport,
};

pub mod savings;
pub use savings::{ConsumptionBreakdown, ProjectionModels, SavingsProjector, SavingsResult};

pub use ndarray;
