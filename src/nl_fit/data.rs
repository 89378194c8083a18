use ndarray::Array1;

/// Observations prepared for least-squares fitting
#[derive(Clone, Debug)]
pub struct Data {
    pub t: Array1<f64>,
    pub m: Array1<f64>,
    pub inv_err: Array1<f64>,
}

impl Data {
    /// Data with unity weights
    pub fn unweighted(t: &[f64], m: &[f64]) -> Self {
        assert_eq!(t.len(), m.len(), "t and m must have the same length");
        Self {
            t: Array1::from_vec(t.to_vec()),
            m: Array1::from_vec(m.to_vec()),
            inv_err: Array1::ones(t.len()),
        }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Weighted sum of squared residuals
    pub fn ssr<F, const NPARAMS: usize>(&self, model: &F, x: &[f64; NPARAMS]) -> f64
    where
        F: Fn(f64, &[f64; NPARAMS]) -> f64,
    {
        ndarray::Zip::from(&self.t)
            .and(&self.m)
            .and(&self.inv_err)
            .fold(0.0, |acc, &t, &m, &inv_err| {
                acc + ((model(t, x) - m) * inv_err).powi(2)
            })
    }
}
