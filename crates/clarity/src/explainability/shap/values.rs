//! SHAP values container.

use serde::Serialize;

/// Per-feature SHAP contributions for one sample, plus the base value.
///
/// Contributions are in the explained row's feature order. The sum property
/// holds: `Σ values + base_value ≈ prediction`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attribution {
    values: Vec<f64>,
    base_value: f64,
}

impl Attribution {
    pub fn new(values: Vec<f64>, base_value: f64) -> Self {
        Self { values, base_value }
    }

    /// Number of features (not including base value).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.values.len()
    }

    /// Feature contributions.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Expected model output the contributions are measured against.
    #[inline]
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// `base_value + Σ values`: the prediction reconstructed from the attribution.
    pub fn total(&self) -> f64 {
        self.base_value + self.values.iter().sum::<f64>()
    }

    /// Verify the sum property against `prediction` within `tolerance`.
    pub fn verify(&self, prediction: f64, tolerance: f64) -> bool {
        (self.total() - prediction).abs() <= tolerance
    }

    pub fn into_parts(self) -> (Vec<f64>, f64) {
        (self.values, self.base_value)
    }
}
