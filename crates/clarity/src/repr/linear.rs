//! Linear model data structure.

use ndarray::{Array1, ArrayView1};

/// Linear regression model (weights + bias).
///
/// `predict(x) = weights · x + bias`
///
/// # Example
///
/// ```
/// use clarity::repr::LinearModel;
/// use ndarray::array;
///
/// let model = LinearModel::new(array![2.0, 3.0], 0.5);
/// assert_eq!(model.n_features(), 2);
/// assert_eq!(model.predict_row(array![1.0, 1.0].view()), 5.5);
/// ```
#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Array1<f64>,
    bias: f64,
}

impl LinearModel {
    /// Create a linear model from coefficients and an intercept.
    pub fn new(weights: Array1<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    /// Create a zero-initialized linear model.
    pub fn zeros(n_features: usize) -> Self {
        Self::new(Array1::zeros(n_features), 0.0)
    }

    /// Number of input features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Get weight for a feature.
    #[inline]
    pub fn weight(&self, feature: usize) -> f64 {
        self.weights[feature]
    }

    #[inline]
    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Coefficients as a view.
    #[inline]
    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    /// Predict for a single row. `features.len()` must equal `n_features()`.
    #[inline]
    pub fn predict_row(&self, features: ArrayView1<'_, f64>) -> f64 {
        self.weights.dot(&features) + self.bias
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn predict_adds_bias() {
        let model = LinearModel::new(array![1.0, -2.0, 0.5], 3.0);
        let pred = model.predict_row(array![2.0, 1.0, 4.0].view());
        assert_eq!(pred, 2.0 - 2.0 + 2.0 + 3.0);
    }

    #[test]
    fn zeros_predicts_zero() {
        let model = LinearModel::zeros(4);
        assert_eq!(model.n_features(), 4);
        assert_eq!(model.predict_row(array![1.0, 2.0, 3.0, 4.0].view()), 0.0);
    }
}
