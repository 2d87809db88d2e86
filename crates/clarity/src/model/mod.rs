//! High-level model wrapper.
//!
//! - [`Regressor`]: the trained function (linear or tree ensemble)
//! - [`Model`]: regressor plus [`ModelMeta`], the unit loaded from disk
//!
//! # Example
//!
//! ```
//! use clarity::model::{Model, ModelMeta, Regressor};
//! use clarity::repr::LinearModel;
//! use ndarray::array;
//!
//! let model = Model::new(
//!     Regressor::Linear(LinearModel::new(array![1.0, 2.0], 0.0)),
//!     ModelMeta::new(2),
//! );
//! assert_eq!(model.predict_row(&[1.0, 1.0]).unwrap(), 3.0);
//! assert!(model.as_forest().is_none());
//! ```

mod meta;

pub use meta::ModelMeta;

use std::sync::Arc;

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::repr::{Forest, LinearModel};

/// Errors raised while applying a model to data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("model expects {expected} features, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },
    #[error("model produced a non-finite prediction: {0}")]
    NonFinite(f64),
}

/// A trained regression function.
#[derive(Debug, Clone)]
pub enum Regressor {
    /// Ordinary linear regression.
    Linear(LinearModel),
    /// Additive tree ensemble (random forest, gradient boosting).
    ///
    /// Shared so that a tree explainer can hold the forest without borrowing
    /// the model.
    TreeEnsemble(Arc<Forest>),
}

impl Regressor {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Linear(_) => "linear",
            Self::TreeEnsemble(_) => "tree_ensemble",
        }
    }

    fn predict_unchecked(&self, features: ArrayView1<'_, f64>) -> f64 {
        match self {
            Self::Linear(linear) => linear.predict_row(features),
            Self::TreeEnsemble(forest) => match features.as_slice() {
                Some(row) => forest.predict_row(row),
                None => forest.predict_row(&features.to_vec()),
            },
        }
    }
}

/// Trained model and its metadata. Immutable once built.
#[derive(Debug, Clone)]
pub struct Model {
    regressor: Regressor,
    meta: ModelMeta,
}

impl Model {
    /// Combine a regressor with its metadata.
    pub fn new(regressor: Regressor, meta: ModelMeta) -> Self {
        Self { regressor, meta }
    }

    #[inline]
    pub fn regressor(&self) -> &Regressor {
        &self.regressor
    }

    #[inline]
    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    /// Number of features the model consumes.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.meta.n_features
    }

    /// Feature names embedded in the artifact, if any.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.meta.feature_names.as_deref()
    }

    /// The forest, when this is a tree ensemble.
    pub fn as_forest(&self) -> Option<&Arc<Forest>> {
        match &self.regressor {
            Regressor::TreeEnsemble(forest) => Some(forest),
            Regressor::Linear(_) => None,
        }
    }

    /// Predict a single row.
    ///
    /// # Errors
    ///
    /// [`ModelError::FeatureCountMismatch`] when the row width is wrong,
    /// [`ModelError::NonFinite`] when the output is NaN or infinite.
    pub fn predict_row(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.predict_view(ArrayView1::from(features))
    }

    /// Predict a single row given as an ndarray view.
    pub fn predict_view(&self, features: ArrayView1<'_, f64>) -> Result<f64, ModelError> {
        self.check_width(features.len())?;
        let pred = self.regressor.predict_unchecked(features);
        if !pred.is_finite() {
            return Err(ModelError::NonFinite(pred));
        }
        Ok(pred)
    }

    /// Predict every row of a sample-major matrix `[n_samples, n_features]`.
    ///
    /// Non-finite outputs are passed through; callers decide how to treat them.
    pub fn predict_rows(&self, rows: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        self.check_width(rows.ncols())?;
        Ok(rows
            .rows()
            .into_iter()
            .map(|row| self.regressor.predict_unchecked(row))
            .collect())
    }

    fn check_width(&self, got: usize) -> Result<(), ModelError> {
        if got != self.n_features() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features(),
                got,
            });
        }
        Ok(())
    }
}
