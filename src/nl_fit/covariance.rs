use crate::nl_fit::data::Data;

use nalgebra::DMatrix;

/// Parameter covariance estimate at the least-squares solution `x`
///
/// Computed as the Moore-Penrose pseudo-inverse of `JᵀJ` using the SVD of the weighted Jacobian
/// `J`, singular values below `ε·max(n, p)·s_max` are discarded. The result is scaled by the
/// residual variance `ssr / (n - p)`. Returns `None` if there are no degrees of freedom left or
/// the Jacobian is not finite.
pub fn covariance<DF, const NPARAMS: usize>(
    ts: &Data,
    x: &[f64; NPARAMS],
    derivatives: &DF,
    ssr: f64,
) -> Option<[[f64; NPARAMS]; NPARAMS]>
where
    DF: Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]),
{
    let n = ts.len();
    if n <= NPARAMS || !ssr.is_finite() {
        return None;
    }

    let mut jacobian = DMatrix::<f64>::zeros(n, NPARAMS);
    for (i, (&t, &inv_err)) in ts.t.iter().zip(ts.inv_err.iter()).enumerate() {
        let mut der = [0.0; NPARAMS];
        derivatives(t, x, &mut der);
        for (j, d) in der.into_iter().enumerate() {
            jacobian[(i, j)] = d * inv_err;
        }
    }
    if jacobian.iter().any(|x| !x.is_finite()) {
        return None;
    }

    let svd = jacobian.svd(false, true);
    let v_t = svd.v_t?;
    let s = &svd.singular_values;
    let s_max = s.max();
    let threshold = f64::EPSILON * (n.max(NPARAMS) as f64) * s_max;
    let scale = ssr / ((n - NPARAMS) as f64);

    let mut cov = [[0.0; NPARAMS]; NPARAMS];
    for (k, &s_k) in s.iter().enumerate() {
        if s_k <= threshold {
            continue;
        }
        let inv_s2 = 1.0 / (s_k * s_k);
        for a in 0..NPARAMS {
            for b in 0..NPARAMS {
                cov[a][b] += v_t[(k, a)] * v_t[(k, b)] * inv_s2;
            }
        }
    }
    for row in cov.iter_mut() {
        for value in row.iter_mut() {
            *value *= scale;
        }
    }
    Some(cov)
}
