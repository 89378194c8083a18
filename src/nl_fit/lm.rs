use crate::nl_fit::bounds::{BoundTransform, clamp_to_bounds};
use crate::nl_fit::covariance::covariance;
use crate::nl_fit::curve_fit::{CurveFitResult, CurveFitTrait};
use crate::nl_fit::data::Data;

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, TerminationReason};
use nalgebra::storage::Owned;
use nalgebra::{Const, DVector, Dyn, OMatrix, SVector};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Levenberg-Marquardt non-linear least-squares wrapper
///
/// Backed by the MINPACK port of the `levenberg-marquardt` crate and uses the supplied
/// derivatives. The solver itself is unconstrained, bounded parameters are optimized through
/// smooth internal variables, see [BoundTransform].
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Lm")]
pub struct LmCurveFit {
    #[serde(default = "LmCurveFit::default_patience")]
    pub patience: usize,
    #[serde(default = "LmCurveFit::default_ftol")]
    pub ftol: f64,
    #[serde(default = "LmCurveFit::default_xtol")]
    pub xtol: f64,
    #[serde(default = "LmCurveFit::default_gtol")]
    pub gtol: f64,
}

impl LmCurveFit {
    /// Create a new [LmCurveFit].
    ///
    /// # Arguments
    /// - `patience`: the solver stops after `patience * (NPARAMS + 1)` residual evaluations
    /// - `ftol`: relative decrease of the sum of squares to stop at
    /// - `xtol`: relative step length to stop at
    /// - `gtol`: orthogonality of the residuals and the Jacobian columns to stop at
    pub fn new(patience: usize, ftol: f64, xtol: f64, gtol: f64) -> Self {
        assert!(patience > 0, "patience must be positive");
        assert!(ftol >= 0.0 && ftol.is_finite(), "ftol must be finite and non-negative");
        assert!(xtol >= 0.0 && xtol.is_finite(), "xtol must be finite and non-negative");
        assert!(gtol >= 0.0 && gtol.is_finite(), "gtol must be finite and non-negative");
        Self {
            patience,
            ftol,
            xtol,
            gtol,
        }
    }

    #[inline]
    pub fn default_patience() -> usize {
        200
    }

    #[inline]
    pub fn default_ftol() -> f64 {
        1e-10
    }

    #[inline]
    pub fn default_xtol() -> f64 {
        1e-10
    }

    #[inline]
    pub fn default_gtol() -> f64 {
        0.0
    }

    fn solver(&self) -> LevenbergMarquardt<f64> {
        LevenbergMarquardt::new()
            .with_patience(self.patience)
            .with_ftol(self.ftol)
            .with_xtol(self.xtol)
            .with_gtol(self.gtol)
    }
}

impl Default for LmCurveFit {
    fn default() -> Self {
        Self::new(
            Self::default_patience(),
            Self::default_ftol(),
            Self::default_xtol(),
            Self::default_gtol(),
        )
    }
}

/// Weighted residuals of `model` as a function of the internal variables
struct Problem<F, DF, const NPARAMS: usize> {
    ts: Rc<Data>,
    transforms: [BoundTransform; NPARAMS],
    u: SVector<f64, NPARAMS>,
    model: F,
    derivatives: DF,
}

impl<F, DF, const NPARAMS: usize> Problem<F, DF, NPARAMS> {
    fn external(&self) -> [f64; NPARAMS] {
        std::array::from_fn(|i| self.transforms[i].to_external(self.u[i]))
    }
}

impl<F, DF, const NPARAMS: usize> LeastSquaresProblem<f64, Dyn, Const<NPARAMS>>
    for Problem<F, DF, NPARAMS>
where
    F: Fn(f64, &[f64; NPARAMS]) -> f64,
    DF: Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]),
{
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Const<NPARAMS>>;
    type ParameterStorage = Owned<f64, Const<NPARAMS>>;

    fn set_params(&mut self, u: &SVector<f64, NPARAMS>) {
        self.u = *u;
    }

    fn params(&self) -> SVector<f64, NPARAMS> {
        self.u
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let x = self.external();
        let residuals = DVector::from_iterator(
            self.ts.len(),
            self.ts
                .t
                .iter()
                .zip(self.ts.m.iter())
                .zip(self.ts.inv_err.iter())
                .map(|((&t, &m), &inv_err)| ((self.model)(t, &x) - m) * inv_err),
        );
        residuals.iter().all(|r| r.is_finite()).then_some(residuals)
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, Const<NPARAMS>>> {
        let x = self.external();
        let chain: [f64; NPARAMS] = std::array::from_fn(|j| self.transforms[j].derivative(self.u[j]));
        let mut jacobian = OMatrix::<f64, Dyn, Const<NPARAMS>>::zeros(self.ts.len());
        for (i, (&t, &inv_err)) in self.ts.t.iter().zip(self.ts.inv_err.iter()).enumerate() {
            let mut der = [0.0; NPARAMS];
            (self.derivatives)(t, &x, &mut der);
            for j in 0..NPARAMS {
                jacobian[(i, j)] = der[j] * chain[j] * inv_err;
            }
        }
        jacobian.iter().all(|v| v.is_finite()).then_some(jacobian)
    }
}

/// Stalled or exhausted searches still leave a usable point behind
fn is_usable(termination: &TerminationReason) -> bool {
    termination.was_successful()
        || matches!(
            termination,
            TerminationReason::NoImprovementPossible(_) | TerminationReason::LostPatience
        )
}

impl CurveFitTrait for LmCurveFit {
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
        let (lower, upper) = bounds;
        let transforms: [BoundTransform; NPARAMS] =
            std::array::from_fn(|i| BoundTransform::new(lower[i], upper[i]));
        let u0 = SVector::<f64, NPARAMS>::from_fn(|i, _| transforms[i].to_internal(x0[i]));

        let problem = Problem {
            ts: ts.clone(),
            transforms,
            u: u0,
            model: model.clone(),
            derivatives: derivatives.clone(),
        };
        let (problem, report) = self.solver().minimize(problem);

        let mut x = problem.external();
        clamp_to_bounds(&mut x, lower, upper);
        let ssr = ts.ssr(&model, &x);

        let nsamples = ts.len();
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
            success: is_usable(&report.termination) && ssr.is_finite(),
        }
    }
}
