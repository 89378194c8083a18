use crate::nl_fit::covariance::covariance;
use crate::nl_fit::curve_fit::{CurveFitAlgorithm, CurveFitResult, CurveFitTrait};
use crate::nl_fit::data::Data;

use cobyla::{Func, RhoBeg, StopTols, minimize};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// COBYLA (Constrained Optimization BY Linear Approximations) non-linear least-squares wrapper
///
/// COBYLA is a derivative-free algorithm, parameter bounds are passed to it as constraints. The
/// derivatives are used only for the covariance estimate at the solution.
///
/// Optionally, if `fine_tuning_algorithm` is `Some`, the best guess from COBYLA is used as the
/// initial guess of the next optimization and its result is returned, whatever the COBYLA
/// termination status was.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Cobyla")]
pub struct CobylaCurveFit {
    pub niterations: u32,
    pub rhobeg: f64,
    pub ftol_rel: f64,
    pub fine_tuning_algorithm: Option<Box<CurveFitAlgorithm>>,
}

impl CobylaCurveFit {
    /// Create a new [CobylaCurveFit].
    ///
    /// # Arguments
    /// - `niterations`: maximum number of function evaluations
    /// - `rhobeg`: initial change to parameters
    /// - `ftol_rel`: relative tolerance on function value for convergence
    /// - `fine_tuning_algorithm`: optional algorithm to refine COBYLA's result
    pub fn new(
        niterations: u32,
        rhobeg: f64,
        ftol_rel: f64,
        fine_tuning_algorithm: Option<CurveFitAlgorithm>,
    ) -> Self {
        assert!(niterations > 0, "niterations must be positive");
        assert!(
            rhobeg > 0.0 && rhobeg.is_finite(),
            "rhobeg must be finite and positive"
        );
        assert!(
            ftol_rel >= 0.0 && ftol_rel.is_finite(),
            "ftol_rel must be finite and non-negative"
        );
        Self {
            niterations,
            rhobeg,
            ftol_rel,
            fine_tuning_algorithm: fine_tuning_algorithm.map(Box::new),
        }
    }

    #[inline]
    pub fn default_niterations() -> u32 {
        2000
    }

    #[inline]
    pub fn default_rhobeg() -> f64 {
        0.5
    }

    #[inline]
    pub fn default_ftol_rel() -> f64 {
        1e-8
    }

    #[inline]
    pub fn default_fine_tuning_algorithm() -> Option<CurveFitAlgorithm> {
        None
    }
}

impl Default for CobylaCurveFit {
    fn default() -> Self {
        Self::new(
            Self::default_niterations(),
            Self::default_rhobeg(),
            Self::default_ftol_rel(),
            Self::default_fine_tuning_algorithm(),
        )
    }
}

impl CurveFitTrait for CobylaCurveFit {
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
        let nsamples = ts.len();

        let objective = {
            let ts = ts.clone();
            let model = model.clone();
            move |x: &[f64], _user_data: &mut ()| -> f64 {
                match <[f64; NPARAMS]>::try_from(x) {
                    Ok(params) => ts.ssr(&model, &params),
                    Err(_) => f64::INFINITY,
                }
            }
        };

        let cobyla_bounds: Vec<(f64, f64)> = bounds
            .0
            .iter()
            .zip(bounds.1.iter())
            .map(|(&lower, &upper)| (lower, upper))
            .collect();

        // Bounds are the only constraints
        let constraints: Vec<&dyn Func<()>> = vec![];

        let stop_tol = StopTols {
            ftol_rel: self.ftol_rel,
            ..StopTols::default()
        };

        let result = minimize(
            objective,
            x0,
            &cobyla_bounds,
            &constraints,
            (),
            self.niterations as usize,
            RhoBeg::All(self.rhobeg),
            Some(stop_tol),
        );

        // Running out of evaluations or hitting the roundoff limit still leaves the best point
        // found so far, which is usable as long as the objective is finite
        let (x_vec, ssr, success) = match result {
            Ok((_status, x_vec, ssr)) => (x_vec, ssr, ssr.is_finite()),
            Err((status, x_vec, ssr)) => {
                let usable = matches!(status, cobyla::FailStatus::RoundoffLimited) && ssr.is_finite();
                (x_vec, ssr, usable)
            }
        };
        let Ok(x) = <[f64; NPARAMS]>::try_from(x_vec.as_slice()) else {
            return CurveFitResult {
                x: *x0,
                covariance: None,
                ssr: f64::INFINITY,
                reduced_chi2: f64::INFINITY,
                success: false,
            };
        };

        if let Some(fine_tuning_algorithm) = &self.fine_tuning_algorithm {
            return fine_tuning_algorithm.curve_fit(ts, &x, bounds, model, derivatives);
        }

        let reduced_chi2 = if nsamples > NPARAMS {
            ssr / ((nsamples - NPARAMS) as f64)
        } else {
            f64::NAN
        };
        CurveFitResult {
            x,
            covariance: covariance(&ts, &x, &derivatives, ssr),
            ssr,
            reduced_chi2,
            success,
        }
    }
}
