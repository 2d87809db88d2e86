//! Model metadata.
//!
//! Introspection data carried alongside a trained regressor.

use serde::{Deserialize, Serialize};

/// Shared metadata for all model kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Feature names in training order (optional).
    pub feature_names: Option<Vec<String>>,
    /// Number of features the model consumes.
    pub n_features: usize,
    /// Estimator the artifact was exported from (e.g. `"XGBRegressor"`).
    pub estimator: Option<String>,
}

impl ModelMeta {
    /// Metadata for a model of the given width.
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            ..Default::default()
        }
    }

    /// Set feature names.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    /// Set the estimator name.
    pub fn with_estimator(mut self, estimator: impl Into<String>) -> Self {
        self.estimator = Some(estimator.into());
        self
    }
}
