//! Bounded non-linear least squares
//!
//! Models are plain functions `model(t, &params) -> value` with analytic
//! `derivatives(t, &params, &mut jacobian_row)`. A [CurveFitAlgorithm] minimizes the weighted sum
//! of squared residuals within per-parameter bounds and reports the solution together with its
//! covariance estimate.

pub mod bounds;
pub use bounds::feasible_initial_guess;

pub mod cobyla;
pub use cobyla::CobylaCurveFit;

pub mod covariance;

pub mod curve_fit;
pub use curve_fit::{CurveFitAlgorithm, CurveFitResult, CurveFitTrait};

pub mod data;
pub use data::Data;

pub mod lm;
pub use lm::LmCurveFit;
