//! Standardization.

use ndarray::{ArrayView2, ArrayViewMut1};

use super::PreprocessError;

/// Per-feature standardization: `(x - mean) / scale`.
///
/// Either statistic may be absent (`with_mean=False` / `with_std=False` at fit
/// time), in which case that step is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    n_features: usize,
    mean: Option<Vec<f64>>,
    scale: Option<Vec<f64>>,
    feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    /// Build from fitted statistics. Vectors that are present must have length `n_features`.
    pub fn new(n_features: usize, mean: Option<Vec<f64>>, scale: Option<Vec<f64>>) -> Self {
        Self {
            n_features,
            mean,
            scale,
            feature_names: None,
        }
    }

    /// Scaler that centers and scales with the given statistics.
    pub fn from_stats(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self::new(mean.len(), Some(mean), Some(scale))
    }

    /// Record the feature names the scaler was fitted with.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    /// Fit mean and population standard deviation on `[n_samples, n_features]`.
    ///
    /// Zero-variance features get scale 1.
    pub fn fit(data: ArrayView2<'_, f64>) -> Result<Self, PreprocessError> {
        let n = data.nrows();
        if n == 0 {
            return Err(PreprocessError::EmptyFit { transform: "scaler" });
        }
        let mut mean = Vec::with_capacity(data.ncols());
        let mut scale = Vec::with_capacity(data.ncols());
        for col in data.columns() {
            let mu = col.sum() / n as f64;
            let var = col.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / n as f64;
            let sd = var.sqrt();
            mean.push(mu);
            scale.push(if sd == 0.0 { 1.0 } else { sd });
        }
        Ok(Self::from_stats(mean, scale))
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn mean(&self) -> Option<&[f64]> {
        self.mean.as_deref()
    }

    pub fn scale(&self) -> Option<&[f64]> {
        self.scale.as_deref()
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Standardize in place.
    pub fn transform_inplace(&self, mut row: ArrayViewMut1<'_, f64>) -> Result<(), PreprocessError> {
        if row.len() != self.n_features {
            return Err(PreprocessError::FeatureCountMismatch {
                transform: "scaler",
                expected: self.n_features,
                got: row.len(),
            });
        }
        if let Some(mean) = &self.mean {
            for (value, mu) in row.iter_mut().zip(mean) {
                *value -= mu;
            }
        }
        if let Some(scale) = &self.scale {
            for (value, s) in row.iter_mut().zip(scale) {
                *value /= s;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn fit_population_std() {
        let data = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(data.view()).unwrap();
        assert_eq!(scaler.mean(), Some(&[2.0, 5.0][..]));
        // second column is constant
        assert_eq!(scaler.scale(), Some(&[1.0, 1.0][..]));
    }

    #[test]
    fn fitted_data_is_standardized() {
        let data = array![[1.0], [2.0], [3.0], [4.0]];
        let scaler = StandardScaler::fit(data.view()).unwrap();
        let mut total = 0.0;
        let mut sq = 0.0;
        for x in data.column(0) {
            let mut row = array![*x];
            scaler.transform_inplace(row.view_mut()).unwrap();
            total += row[0];
            sq += row[0] * row[0];
        }
        assert_abs_diff_eq!(total, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sq / 4.0, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn optional_steps_are_skipped() {
        let center_only = StandardScaler::new(2, Some(vec![1.0, 1.0]), None);
        let mut row = array![3.0, 5.0];
        center_only.transform_inplace(row.view_mut()).unwrap();
        assert_eq!(row, array![2.0, 4.0]);

        let scale_only = StandardScaler::new(2, None, Some(vec![2.0, 4.0]));
        let mut row = array![3.0, 5.0];
        scale_only.transform_inplace(row.view_mut()).unwrap();
        assert_eq!(row, array![1.5, 1.25]);
    }

    #[test]
    fn width_mismatch() {
        let scaler = StandardScaler::from_stats(vec![0.0; 3], vec![1.0; 3]);
        let mut row = array![1.0, 2.0];
        assert!(scaler.transform_inplace(row.view_mut()).is_err());
    }
}
