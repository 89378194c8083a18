//! Piecewise-linear change-point regression of energy-use intensity against temperature

pub mod fitted;
pub use fitted::{ChangePointModel, ModelDescription, NoFitReason};

pub mod fitter;
pub use fitter::{ChangePointFitter, FitterConfig};

pub mod goodness;

pub mod model;
pub use model::{piecewise_linear, piecewise_linear_derivatives};

pub mod significance;
pub use significance::PValues;
