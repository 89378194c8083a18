use itertools::Itertools;

/// Coefficient of determination, NaN if the observations have zero variance
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    assert_eq!(observed.len(), predicted.len());
    if observed.is_empty() {
        return f64::NAN;
    }
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return f64::NAN;
    }
    1.0 - sum_squared_residuals(observed, predicted) / ss_tot
}

/// Adjusted R² for `nparams` explanatory coefficients
///
/// Falls back to the unadjusted value when there are not enough observations.
pub fn adjusted_r_squared(r_squared: f64, n: usize, nparams: usize) -> f64 {
    if n <= nparams + 1 {
        return r_squared;
    }
    1.0 - (1.0 - r_squared) * ((n - 1) as f64) / ((n - nparams - 1) as f64)
}

pub fn rmse(observed: &[f64], predicted: &[f64]) -> f64 {
    if observed.is_empty() {
        return f64::NAN;
    }
    (sum_squared_residuals(observed, predicted) / observed.len() as f64).sqrt()
}

fn sum_squared_residuals(observed: &[f64], predicted: &[f64]) -> f64 {
    observed
        .iter()
        .zip_eq(predicted)
        .map(|(y, y_hat)| (y - y_hat).powi(2))
        .sum()
}
