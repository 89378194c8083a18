use crate::nl_fit::cobyla::CobylaCurveFit;
use crate::nl_fit::data::Data;
use crate::nl_fit::lm::LmCurveFit;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct CurveFitResult<const NPARAMS: usize> {
    pub x: [f64; NPARAMS],
    /// `None` when the problem has no residual degrees of freedom
    pub covariance: Option<[[f64; NPARAMS]; NPARAMS]>,
    /// Weighted sum of squared residuals
    pub ssr: f64,
    pub reduced_chi2: f64,
    pub success: bool,
}

impl<const NPARAMS: usize> CurveFitResult<NPARAMS> {
    /// Diagonal of the covariance matrix, NaN if it is unavailable
    pub fn variances(&self) -> [f64; NPARAMS] {
        match &self.covariance {
            Some(cov) => std::array::from_fn(|i| cov[i][i]),
            None => [f64::NAN; NPARAMS],
        }
    }
}

pub trait CurveFitTrait: Clone + Debug + Serialize + DeserializeOwned {
    /// Minimize the weighted sum of squared residuals of `model` within `bounds`
    ///
    /// `derivatives` fills the partial derivatives of `model` with respect to each parameter.
    fn curve_fit<F, DF, const NPARAMS: usize>(
        &self,
        ts: Rc<Data>,
        x0: &[f64; NPARAMS],
        bounds: (&[f64; NPARAMS], &[f64; NPARAMS]),
        model: F,
        derivatives: DF,
    ) -> CurveFitResult<NPARAMS>
    where
        F: 'static + Clone + Fn(f64, &[f64; NPARAMS]) -> f64,
        DF: 'static + Clone + Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]);
}

/// Optimization algorithm for bounded non-linear least squares
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum CurveFitAlgorithm {
    Lm(LmCurveFit),
    Cobyla(CobylaCurveFit),
}

impl CurveFitTrait for CurveFitAlgorithm {
    fn curve_fit<F, DF, const NPARAMS: usize>(
        &self,
        ts: Rc<Data>,
        x0: &[f64; NPARAMS],
        bounds: (&[f64; NPARAMS], &[f64; NPARAMS]),
        model: F,
        derivatives: DF,
    ) -> CurveFitResult<NPARAMS>
    where
        F: 'static + Clone + Fn(f64, &[f64; NPARAMS]) -> f64,
        DF: 'static + Clone + Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]),
    {
        match self {
            Self::Lm(fit) => fit.curve_fit(ts, x0, bounds, model, derivatives),
            Self::Cobyla(fit) => fit.curve_fit(ts, x0, bounds, model, derivatives),
        }
    }
}

impl Default for CurveFitAlgorithm {
    fn default() -> Self {
        LmCurveFit::default().into()
    }
}

impl From<LmCurveFit> for CurveFitAlgorithm {
    fn from(fit: LmCurveFit) -> Self {
        Self::Lm(fit)
    }
}

impl From<CobylaCurveFit> for CurveFitAlgorithm {
    fn from(fit: CobylaCurveFit) -> Self {
        Self::Cobyla(fit)
    }
}
