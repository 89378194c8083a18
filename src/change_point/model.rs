/// Parameter vector layout: `[hcp, ccp, base, hsl, csl]`
pub const NPARAMS: usize = 5;

/// Piecewise-linear change-point model
///
/// The cooling branch takes precedence over the heating branch, so the model stays well defined
/// for crossed change-points (`hcp > ccp`).
pub fn piecewise_linear(t: f64, p: &[f64; NPARAMS]) -> f64 {
    let [hcp, ccp, base, hsl, csl] = *p;
    if t > ccp {
        csl * (t - ccp) + base
    } else if t < hcp {
        hsl * (t - hcp) + base
    } else {
        base
    }
}

pub fn piecewise_linear_derivatives(t: f64, p: &[f64; NPARAMS], jac: &mut [f64; NPARAMS]) {
    let [hcp, ccp, _base, hsl, csl] = *p;
    *jac = [0.0, 0.0, 1.0, 0.0, 0.0];
    if t > ccp {
        jac[1] = -csl;
        jac[4] = t - ccp;
    } else if t < hcp {
        jac[0] = -hsl;
        jac[3] = t - hcp;
    }
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    const P: [f64; NPARAMS] = [10.0, 22.0, 2.0, -0.3, 0.4];

    #[test]
    fn regimes() {
        assert_relative_eq!(piecewise_linear(0.0, &P), 5.0, max_relative = 1e-12);
        assert_eq!(piecewise_linear(10.0, &P), 2.0);
        assert_eq!(piecewise_linear(15.0, &P), 2.0);
        assert_eq!(piecewise_linear(22.0, &P), 2.0);
        assert_relative_eq!(piecewise_linear(32.0, &P), 6.0, max_relative = 1e-12);
    }

    #[test]
    fn crossed_change_points_prefer_cooling() {
        let p = [20.0, 10.0, 1.0, -1.0, 1.0];
        assert_eq!(piecewise_linear(15.0, &p), 6.0);
        assert_eq!(piecewise_linear(5.0, &p), 16.0);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        const H: f64 = 1e-6;
        for t in [-5.0, 3.0, 15.0, 25.0, 35.0] {
            let mut jac = [0.0; NPARAMS];
            piecewise_linear_derivatives(t, &P, &mut jac);
            for i in 0..NPARAMS {
                let mut p_plus = P;
                let mut p_minus = P;
                p_plus[i] += H;
                p_minus[i] -= H;
                let numeric =
                    (piecewise_linear(t, &p_plus) - piecewise_linear(t, &p_minus)) / (2.0 * H);
                assert_relative_eq!(jac[i], numeric, epsilon = 1e-6, max_relative = 1e-6);
            }
        }
    }
}
