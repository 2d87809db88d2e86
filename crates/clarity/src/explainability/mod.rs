//! Model explainability.
//!
//! [`Explainer::select`] picks the explainer once per model: exact TreeSHAP
//! when the model is a tree ensemble with cover statistics, otherwise the
//! sampling explainer over a subsample of [`BackgroundData`].
//!
//! ```
//! use std::sync::Arc;
//! use clarity::explainability::{BackgroundData, Explainer, SamplingOptions};
//! use clarity::model::{Model, ModelMeta, Regressor};
//! use clarity::repr::LinearModel;
//! use clarity::schema::FeatureSchema;
//! use ndarray::array;
//!
//! let model = Arc::new(Model::new(
//!     Regressor::Linear(LinearModel::new(array![1.0, -1.0], 0.0)),
//!     ModelMeta::new(2),
//! ));
//! let schema = FeatureSchema::from_names(["a", "b"]);
//! let background = BackgroundData::synthetic(&schema, 100, 42)?;
//!
//! let explainer = Explainer::select(&model, Some(&background), 20, &SamplingOptions::default())?;
//! assert_eq!(explainer.kind(), "sampling");
//!
//! let attribution = explainer.explain(array![0.5, 0.5].view())?;
//! assert!(attribution.verify(0.0, 1e-9));
//! # Ok::<(), clarity::explainability::ExplainError>(())
//! ```

mod background;
pub mod shap;

pub use background::BackgroundData;
pub use shap::{Attribution, SamplingExplainer, SamplingOptions, TreeExplainer};

use std::sync::Arc;

use ndarray::ArrayView1;

use crate::model::{Model, ModelError};

/// Errors raised while building or applying an explainer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExplainError {
    /// The tree ensemble lacks the per-node statistics TreeSHAP needs.
    #[error("missing node statistics: {0}")]
    MissingNodeStats(&'static str),
    #[error("explainer expects {expected} features, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },
    #[error("background sample is empty")]
    EmptyBackground,
    /// An assembly precondition was not met.
    #[error("invalid state: {0}")]
    State(&'static str),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// The explainer chosen for a model.
#[derive(Debug, Clone)]
pub enum Explainer {
    Tree(TreeExplainer),
    Sampling(SamplingExplainer),
}

impl Explainer {
    /// Choose and build the explainer for `model`.
    ///
    /// Tree ensembles get [`TreeExplainer`]. If that fails because trees lack
    /// cover statistics, or the model is not a tree ensemble, a
    /// [`SamplingExplainer`] is built over `sample_size` rows drawn without
    /// replacement from `background` (seeded with `options.seed`).
    ///
    /// # Errors
    ///
    /// - [`ExplainError::State`] when the sampling explainer is needed but no
    ///   background was supplied
    /// - any other tree-explainer failure is returned as is
    pub fn select(
        model: &Arc<Model>,
        background: Option<&BackgroundData>,
        sample_size: usize,
        options: &SamplingOptions,
    ) -> Result<Self, ExplainError> {
        if let Some(forest) = model.as_forest() {
            match TreeExplainer::new(Arc::clone(forest), model.n_features()) {
                Ok(explainer) => {
                    tracing::info!(
                        n_trees = forest.n_trees(),
                        base_value = explainer.base_value(),
                        "TreeExplainer initialized"
                    );
                    return Ok(Self::Tree(explainer));
                }
                Err(err @ ExplainError::MissingNodeStats(_)) => {
                    tracing::warn!(error = %err, "TreeExplainer failed, falling back to sampling explainer");
                }
                Err(err) => return Err(err),
            }
        } else {
            tracing::info!(
                model = model.regressor().kind(),
                "model is not a tree ensemble, using sampling explainer"
            );
        }

        let background = background.ok_or(ExplainError::State(
            "background data is required for the sampling explainer",
        ))?;
        let sample = background.sample(sample_size, options.seed);
        tracing::debug!(
            rows = sample.nrows(),
            available = background.n_rows(),
            "sampled background for explainer"
        );
        let explainer = SamplingExplainer::new(Arc::clone(model), sample, options.clone())?;
        tracing::info!(
            base_value = explainer.base_value(),
            exact = explainer.is_exact(),
            "SamplingExplainer initialized"
        );
        Ok(Self::Sampling(explainer))
    }

    /// `"tree"` or `"sampling"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tree(_) => "tree",
            Self::Sampling(_) => "sampling",
        }
    }

    /// Expected model output the attributions are measured against.
    pub fn base_value(&self) -> f64 {
        match self {
            Self::Tree(e) => e.base_value(),
            Self::Sampling(e) => e.base_value(),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Self::Tree(e) => e.n_features(),
            Self::Sampling(e) => e.n_features(),
        }
    }

    /// Explain one row, given in the order the model was trained with.
    pub fn explain(&self, row: ArrayView1<'_, f64>) -> Result<Attribution, ExplainError> {
        if row.len() != self.n_features() {
            return Err(ExplainError::FeatureCountMismatch {
                expected: self.n_features(),
                got: row.len(),
            });
        }
        match self {
            Self::Tree(e) => Ok(match row.as_slice() {
                Some(features) => e.shap_values(features),
                None => e.shap_values(&row.to_vec()),
            }),
            Self::Sampling(e) => e.shap_values(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::model::{ModelMeta, Regressor};
    use crate::repr::{Forest, LinearModel};
    use crate::scalar_tree;
    use crate::schema::FeatureSchema;

    fn forest_model(with_covers: bool) -> Arc<Model> {
        let tree = scalar_tree! {
            0 => num(0, 0.5, L) -> 1, 2,
            1 => leaf(1.0),
            2 => leaf(3.0),
        };
        let tree = if with_covers {
            tree.with_covers(vec![4.0, 2.0, 2.0])
        } else {
            tree
        };
        let mut forest = Forest::new();
        forest.push_tree(tree);
        Arc::new(Model::new(
            Regressor::TreeEnsemble(Arc::new(forest)),
            ModelMeta::new(2),
        ))
    }

    fn background() -> BackgroundData {
        BackgroundData::synthetic(&FeatureSchema::from_names(["a", "b"]), 40, 42).unwrap()
    }

    #[test]
    fn forest_with_covers_uses_tree_explainer() {
        let explainer =
            Explainer::select(&forest_model(true), None, 10, &SamplingOptions::default()).unwrap();
        assert_eq!(explainer.kind(), "tree");
        assert_eq!(explainer.base_value(), 2.0);
    }

    #[test]
    fn forest_without_covers_falls_back() {
        let bg = background();
        let explainer =
            Explainer::select(&forest_model(false), Some(&bg), 10, &SamplingOptions::default())
                .unwrap();
        let Explainer::Sampling(sampling) = &explainer else {
            panic!("expected sampling explainer, got {}", explainer.kind());
        };
        assert_eq!(sampling.n_background(), 10);

        let attribution = explainer.explain(array![0.9, 0.1].view()).unwrap();
        assert!(attribution.verify(3.0, 1e-9));
        assert_eq!(attribution.values()[1], 0.0);
    }

    #[test]
    fn fallback_without_background_is_a_state_error() {
        let result = Explainer::select(&forest_model(false), None, 10, &SamplingOptions::default());
        assert!(matches!(result, Err(ExplainError::State(_))));
    }

    #[test]
    fn linear_model_uses_sampling() {
        let model = Arc::new(Model::new(
            Regressor::Linear(LinearModel::new(array![1.0, 1.0], 0.0)),
            ModelMeta::new(2),
        ));
        let bg = background();
        let explainer =
            Explainer::select(&model, Some(&bg), 100, &SamplingOptions::default()).unwrap();
        assert_eq!(explainer.kind(), "sampling");
    }

    #[test]
    fn explain_checks_width() {
        let explainer =
            Explainer::select(&forest_model(true), None, 10, &SamplingOptions::default()).unwrap();
        assert!(matches!(
            explainer.explain(array![1.0].view()),
            Err(ExplainError::FeatureCountMismatch { expected: 2, got: 1 })
        ));
    }
}
