use statrs::distribution::{ContinuousCDF, StudentsT};

/// One-sided p-values of the fitted baseload and slopes
///
/// NaN when the covariance estimate is unavailable or degenerate.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct PValues {
    pub base: f64,
    pub hsl: f64,
    pub csl: f64,
}

impl PValues {
    pub const UNKNOWN: Self = Self {
        base: f64::NAN,
        hsl: f64::NAN,
        csl: f64::NAN,
    };

    /// `parameters` and `variances` are in `[hcp, ccp, base, hsl, csl]` order
    ///
    /// The t statistic is `value / sqrt(variance / n)` with `n - 2` degrees of freedom. The
    /// heating slope is tested for being negative, baseload and cooling slope for being positive.
    pub fn new(parameters: &[f64; 5], variances: &[f64; 5], n: usize) -> Self {
        let [_, _, base, hsl, csl] = *parameters;
        let [_, _, var_base, var_hsl, var_csl] = *variances;
        let Some(dist) = n
            .checked_sub(2)
            .filter(|&dof| dof > 0)
            .and_then(|dof| StudentsT::new(0.0, 1.0, dof as f64).ok())
        else {
            return Self::UNKNOWN;
        };
        let n = n as f64;
        let t_stat = |value: f64, var: f64| value / (var / n).sqrt();
        Self {
            base: upper_tail(&dist, t_stat(base, var_base)),
            hsl: lower_tail(&dist, t_stat(hsl, var_hsl)),
            csl: upper_tail(&dist, t_stat(csl, var_csl)),
        }
    }
}

fn lower_tail(dist: &StudentsT, t: f64) -> f64 {
    if t.is_nan() {
        f64::NAN
    } else if t == f64::INFINITY {
        1.0
    } else if t == f64::NEG_INFINITY {
        0.0
    } else {
        dist.cdf(t)
    }
}

fn upper_tail(dist: &StudentsT, t: f64) -> f64 {
    if t.is_nan() {
        f64::NAN
    } else if t == f64::INFINITY {
        0.0
    } else if t == f64::NEG_INFINITY {
        1.0
    } else {
        dist.sf(t)
    }
}

/// NaN p-values are never significant
pub fn is_significant(p_value: f64, threshold: f64) -> bool {
    p_value <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn zero_slope_is_half() {
        let p = PValues::new(&[0.0, 0.0, 1.0, 0.0, 0.0], &[1.0; 5], 24);
        assert_abs_diff_eq!(p.hsl, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p.csl, 0.5, epsilon = 1e-12);
        assert!(p.base < 0.5);
    }

    #[test]
    fn steep_slopes_are_significant() {
        let p = PValues::new(&[10.0, 20.0, 2.0, -0.3, 0.4], &[1e-3; 5], 36);
        assert!(is_significant(p.hsl, 0.05));
        assert!(is_significant(p.csl, 0.05));
    }

    #[test]
    fn wrong_sign_is_insignificant() {
        let p = PValues::new(&[10.0, 20.0, 2.0, 0.3, -0.4], &[1e-3; 5], 36);
        assert!(!is_significant(p.hsl, 0.05));
        assert!(!is_significant(p.csl, 0.05));
    }

    #[test]
    fn nan_is_insignificant() {
        let p = PValues::new(&[10.0, 20.0, 2.0, 0.0, 0.0], &[0.0; 5], 36);
        assert!(p.hsl.is_nan());
        assert!(!is_significant(p.hsl, 0.05));
        // Zero variance of a non-zero estimate
        assert_eq!(p.base, 0.0);
    }

    #[test]
    fn too_few_observations() {
        let p = PValues::new(&[10.0, 20.0, 2.0, -1.0, 1.0], &[1.0; 5], 2);
        assert!(p.base.is_nan() && p.hsl.is_nan() && p.csl.is_nan());
    }
}
