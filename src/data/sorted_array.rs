use ndarray::Array1;
use std::ops::Deref;

// Underlying array is guaranteed to be sorted, contiguous and NaN-free
#[derive(Clone, Debug, PartialEq)]
pub struct SortedArray(Array1<f64>);

impl SortedArray {
    /// Sorts finite and infinite values, skipping NaNs
    pub fn from_non_nan(values: impl IntoIterator<Item = f64>) -> Self {
        let mut v: Vec<_> = values.into_iter().filter(|x| !x.is_nan()).collect();
        v.sort_unstable_by(f64::total_cmp);
        Self(Array1::from_vec(v))
    }

    pub fn maximum(&self) -> f64 {
        self[self.len() - 1]
    }

    /// Median, NaN for an empty array
    pub fn median(&self) -> f64 {
        if self.is_empty() {
            return f64::NAN;
        }
        let i = (self.len() - 1) / 2;
        if self.len() % 2 == 0 {
            0.5 * (self[i] + self[i + 1])
        } else {
            self[i]
        }
    }

    /// Percentile with linear interpolation between closest ranks, `q` is in percents
    ///
    /// This is the default method of `numpy.percentile`, position of `q` is `q / 100 * (n - 1)`.
    pub fn percentile(&self, q: f64) -> f64 {
        assert_ne!(self.len(), 0);
        assert!(
            (0.0..=100.0).contains(&q),
            "percentile should be between zero and one hundred"
        );
        let h = q / 100.0 * ((self.len() - 1) as f64);
        let h_floor = h.floor();
        #[allow(clippy::cast_sign_loss)]
        let i = h_floor as usize;
        if i >= self.len() - 1 {
            self.maximum()
        } else {
            self[i] + (h - h_floor) * (self[i + 1] - self[i])
        }
    }
}

impl Deref for SortedArray {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        // Constructors only produce standard-layout arrays
        self.0.as_slice().unwrap_or(&[])
    }
}
