//! Median imputation.

use ndarray::{ArrayView2, ArrayViewMut1};

use super::PreprocessError;

/// Replaces missing (NaN) values with the per-feature training median.
#[derive(Debug, Clone, PartialEq)]
pub struct MedianImputer {
    statistics: Vec<f64>,
    feature_names: Option<Vec<String>>,
}

impl MedianImputer {
    /// Build from already-fitted statistics.
    pub fn from_statistics(statistics: Vec<f64>) -> Self {
        Self {
            statistics,
            feature_names: None,
        }
    }

    /// Record the feature names the imputer was fitted with.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    /// Fit on a sample-major matrix `[n_samples, n_features]`.
    ///
    /// NaN entries are ignored. A column with no observed value gets a NaN
    /// statistic and stays missing after transform.
    pub fn fit(data: ArrayView2<'_, f64>) -> Result<Self, PreprocessError> {
        if data.nrows() == 0 {
            return Err(PreprocessError::EmptyFit { transform: "imputer" });
        }
        let statistics = data
            .columns()
            .into_iter()
            .map(|col| {
                let mut observed: Vec<f64> = col.iter().copied().filter(|v| !v.is_nan()).collect();
                median(&mut observed)
            })
            .collect();
        Ok(Self::from_statistics(statistics))
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.statistics.len()
    }

    /// Per-feature fill values.
    #[inline]
    pub fn statistics(&self) -> &[f64] {
        &self.statistics
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Fill NaN entries in place.
    pub fn transform_inplace(&self, mut row: ArrayViewMut1<'_, f64>) -> Result<(), PreprocessError> {
        if row.len() != self.n_features() {
            return Err(PreprocessError::FeatureCountMismatch {
                transform: "imputer",
                expected: self.n_features(),
                got: row.len(),
            });
        }
        for (value, &fill) in row.iter_mut().zip(&self.statistics) {
            if value.is_nan() {
                *value = fill;
            }
        }
        Ok(())
    }
}

/// Median of the values (sorted in place). Even lengths average the middle pair.
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}
