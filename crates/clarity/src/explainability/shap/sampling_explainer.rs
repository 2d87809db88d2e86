//! Model-agnostic SHAP explainer.
//!
//! Estimates interventional Shapley values of the model's prediction function
//! against a background sample: features outside a coalition take the values
//! of each background row in turn, and the coalition's value is the mean
//! prediction over the background.
//!
//! Small feature counts enumerate every coalition (exact); larger ones walk
//! seeded random feature permutations. Both are additive:
//! `Σ φ + base_value = f(x)`.

use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::explainability::ExplainError;
use crate::explainability::shap::Attribution;
use crate::model::{Model, ModelError};

/// Tuning for the sampling explainer.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingOptions {
    /// Enumerate every coalition when `n_features <= max_exact_features`.
    ///
    /// Capped at [`SamplingOptions::EXACT_FEATURE_LIMIT`].
    pub max_exact_features: usize,
    /// Permutations walked per explained row otherwise.
    pub n_permutations: usize,
    /// Seed for permutation sampling.
    pub seed: u64,
}

impl SamplingOptions {
    /// Largest feature count explained by full enumeration (`2^20` coalitions).
    pub const EXACT_FEATURE_LIMIT: usize = 20;
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            max_exact_features: 12,
            n_permutations: 64,
            seed: 0,
        }
    }
}

/// Sampling-based explainer around a model's prediction function.
#[derive(Debug, Clone)]
pub struct SamplingExplainer {
    model: Arc<Model>,
    background: Array2<f64>,
    base_value: f64,
    options: SamplingOptions,
}

impl SamplingExplainer {
    /// Build an explainer over `background` (`[n_rows, n_features]`).
    ///
    /// # Errors
    ///
    /// - [`ExplainError::EmptyBackground`] when `background` has no rows
    /// - [`ExplainError::FeatureCountMismatch`] when its width differs from the model's
    /// - [`ExplainError::Model`] when the model is non-finite on the background
    pub fn new(
        model: Arc<Model>,
        background: Array2<f64>,
        options: SamplingOptions,
    ) -> Result<Self, ExplainError> {
        if background.nrows() == 0 {
            return Err(ExplainError::EmptyBackground);
        }
        if background.ncols() != model.n_features() {
            return Err(ExplainError::FeatureCountMismatch {
                expected: model.n_features(),
                got: background.ncols(),
            });
        }
        let base_value = mean_prediction(&model, background.view())?;
        Ok(Self {
            model,
            background,
            base_value,
            options,
        })
    }

    /// Mean prediction over the background sample.
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub fn n_features(&self) -> usize {
        self.background.ncols()
    }

    /// Number of background rows the explainer integrates over.
    pub fn n_background(&self) -> usize {
        self.background.nrows()
    }

    /// The background subsample, `[n_background, n_features]`.
    pub fn background(&self) -> ArrayView2<'_, f64> {
        self.background.view()
    }

    pub fn options(&self) -> &SamplingOptions {
        &self.options
    }

    /// Whether rows are explained by full coalition enumeration.
    pub fn is_exact(&self) -> bool {
        let limit = self
            .options
            .max_exact_features
            .min(SamplingOptions::EXACT_FEATURE_LIMIT);
        self.n_features() <= limit
    }

    /// Compute SHAP values for a single sample.
    pub fn shap_values(&self, x: ArrayView1<'_, f64>) -> Result<Attribution, ExplainError> {
        if x.len() != self.n_features() {
            return Err(ExplainError::FeatureCountMismatch {
                expected: self.n_features(),
                got: x.len(),
            });
        }
        let phi = if self.is_exact() {
            self.exact(x)?
        } else {
            self.permutation(x)?
        };
        Ok(Attribution::new(phi, self.base_value))
    }

    /// Shapley formula over all `2^M` coalitions.
    fn exact(&self, x: ArrayView1<'_, f64>) -> Result<Vec<f64>, ExplainError> {
        let m = self.n_features();
        let n_masks = 1usize << m;

        // v(S) for every coalition bitmask S
        let mut values = Vec::with_capacity(n_masks);
        let mut z = self.background.clone();
        for mask in 0..n_masks {
            z.assign(&self.background);
            for j in (0..m).filter(|&j| mask & (1usize << j) != 0) {
                z.column_mut(j).fill(x[j]);
            }
            values.push(mean_prediction(&self.model, z.view())?);
        }

        let weights = coalition_weights(m);
        let mut phi = vec![0.0; m];
        for (i, phi_i) in phi.iter_mut().enumerate() {
            let bit = 1usize << i;
            for mask in (0..n_masks).filter(|mask| mask & bit == 0) {
                let size = mask.count_ones() as usize;
                *phi_i += weights[size] * (values[mask | bit] - values[mask]);
            }
        }
        Ok(phi)
    }

    /// Permutation sampling: add features one at a time in random order and
    /// credit each with the change in prediction.
    fn permutation(&self, x: ArrayView1<'_, f64>) -> Result<Vec<f64>, ExplainError> {
        let m = self.n_features();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.options.seed);
        let mut order: Vec<usize> = (0..m).collect();
        let mut phi = vec![0.0; m];
        let mut z = vec![0.0; m];

        for _ in 0..self.options.n_permutations {
            order.shuffle(&mut rng);
            for row in self.background.rows() {
                z.iter_mut().zip(row).for_each(|(dst, src)| *dst = *src);
                let mut prev = self.predict(&z)?;
                for &j in &order {
                    z[j] = x[j];
                    let cur = self.predict(&z)?;
                    phi[j] += cur - prev;
                    prev = cur;
                }
            }
        }

        let walks = (self.options.n_permutations * self.n_background()) as f64;
        if walks > 0.0 {
            phi.iter_mut().for_each(|v| *v /= walks);
        }
        Ok(phi)
    }

    fn predict(&self, z: &[f64]) -> Result<f64, ExplainError> {
        Ok(self.model.predict_row(z)?)
    }
}

/// Mean model output over `rows`, rejecting non-finite predictions.
fn mean_prediction(model: &Model, rows: ArrayView2<'_, f64>) -> Result<f64, ExplainError> {
    let preds = model.predict_rows(rows)?;
    if let Some(bad) = preds.iter().find(|p| !p.is_finite()) {
        return Err(ModelError::NonFinite(*bad).into());
    }
    Ok(preds.mean().unwrap_or(0.0))
}

/// Shapley weight `s! (M - s - 1)! / M!` for each coalition size `s < M`.
fn coalition_weights(m: usize) -> Vec<f64> {
    // 1 / (M * C(M-1, s)), with the binomial built incrementally
    let mut weights = Vec::with_capacity(m);
    let mut binom = 1.0;
    for s in 0..m {
        weights.push(1.0 / (m as f64 * binom));
        binom = binom * (m - 1 - s) as f64 / (s + 1) as f64;
    }
    weights
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};

    use super::*;
    use crate::model::{ModelMeta, Regressor};
    use crate::repr::LinearModel;

    fn linear(weights: Array1<f64>, bias: f64) -> Arc<Model> {
        let n = weights.len();
        Arc::new(Model::new(
            Regressor::Linear(LinearModel::new(weights, bias)),
            ModelMeta::new(n),
        ))
    }

    #[test]
    fn weights_sum_over_sizes() {
        // Σ_s C(M-1, s) * w(s) = 1
        let m = 5;
        let w = coalition_weights(m);
        let mut total = 0.0;
        let mut binom = 1.0;
        for (s, ws) in w.iter().enumerate() {
            total += binom * ws;
            binom = binom * (m - 1 - s) as f64 / (s + 1) as f64;
        }
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(w[0], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn exact_on_linear_model_is_closed_form() {
        let model = linear(array![2.0, -1.0, 0.5], 0.3);
        let background = array![[0.0, 1.0, 2.0], [1.0, 3.0, 0.0], [2.0, 2.0, 1.0]];
        let explainer =
            SamplingExplainer::new(model.clone(), background.clone(), SamplingOptions::default())
                .unwrap();
        assert!(explainer.is_exact());

        let x = array![1.5, -2.0, 4.0];
        let attribution = explainer.shap_values(x.view()).unwrap();
        let means = background.mean_axis(ndarray::Axis(0)).unwrap();
        for (i, w) in [2.0, -1.0, 0.5].iter().enumerate() {
            assert_abs_diff_eq!(attribution.values()[i], w * (x[i] - means[i]), epsilon = 1e-9);
        }
        assert!(attribution.verify(model.predict_row(x.as_slice().unwrap()).unwrap(), 1e-9));
    }

    #[test]
    fn permutation_on_linear_model_is_exact_and_deterministic() {
        let model = linear(array![1.0, 2.0, 3.0, 4.0], -1.0);
        let background = array![[0.0, 0.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0]];
        let options = SamplingOptions {
            max_exact_features: 2,
            n_permutations: 8,
            seed: 7,
        };
        let explainer = SamplingExplainer::new(model, background, options).unwrap();
        assert!(!explainer.is_exact());

        let x = array![1.0, 1.0, 0.0, 2.0];
        let a = explainer.shap_values(x.view()).unwrap();
        let b = explainer.shap_values(x.view()).unwrap();
        assert_eq!(a, b);
        // Linear models have no interactions, so every permutation agrees.
        for (i, expected) in [0.5, 1.0, -1.5, 6.0].iter().enumerate() {
            assert_abs_diff_eq!(a.values()[i], *expected, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(a.base_value(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn exact_enumeration_is_capped() {
        let options = SamplingOptions {
            max_exact_features: usize::MAX,
            n_permutations: 2,
            seed: 3,
        };
        let limit = SamplingOptions::EXACT_FEATURE_LIMIT;

        let at_limit = SamplingExplainer::new(
            linear(Array1::ones(limit), 0.0),
            Array2::zeros((1, limit)),
            options.clone(),
        )
        .unwrap();
        assert!(at_limit.is_exact());

        let wide = SamplingExplainer::new(
            linear(Array1::ones(64), 0.0),
            Array2::zeros((2, 64)),
            options,
        )
        .unwrap();
        assert!(!wide.is_exact());
        let x = Array1::from_elem(64, 0.5);
        let attribution = wide.shap_values(x.view()).unwrap();
        assert!(attribution.verify(32.0, 1e-9));
        assert_abs_diff_eq!(attribution.values()[63], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn rejects_empty_and_misshaped_background() {
        let model = linear(array![1.0, 1.0], 0.0);
        assert!(matches!(
            SamplingExplainer::new(model.clone(), Array2::zeros((0, 2)), SamplingOptions::default()),
            Err(ExplainError::EmptyBackground)
        ));
        assert!(matches!(
            SamplingExplainer::new(model, Array2::zeros((3, 5)), SamplingOptions::default()),
            Err(ExplainError::FeatureCountMismatch { expected: 2, got: 5 })
        ));
    }
}
