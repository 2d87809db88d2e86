//! Schema types for artifact serialization.
//!
//! These types provide a stable on-disk format independent of runtime types.
//! Schema types are kept separate from runtime types so that the format can
//! evolve on its own and every load passes through validation
//! (see [`convert`](super::convert)).
//!
//! Every artifact carries a `"format"` tag; see [`FORMAT_TAG`].

use serde::{Deserialize, Serialize};

/// Format tag written into every artifact.
pub const FORMAT_TAG: &str = "clarity/v1";

/// Model metadata schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetaSchema {
    /// Number of features.
    pub n_features: usize,
    /// Feature names in training order (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    /// Estimator the artifact was exported from. Not used for inference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimator: Option<String>,
}

/// Tree schema in structure-of-arrays layout.
///
/// A node is a leaf when its `children_left` entry is 0 (the root is never a
/// child, so 0 doubles as the "no child" sentinel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSchema {
    /// Split feature per node (ignored for leaves).
    pub split_indices: Vec<u32>,
    /// Split threshold per node: `x < threshold` goes left.
    pub thresholds: Vec<f64>,
    pub children_left: Vec<u32>,
    pub children_right: Vec<u32>,
    /// Direction taken by missing values.
    pub default_left: Vec<bool>,
    /// Leaf value per node (ignored for internal nodes).
    pub leaf_values: Vec<f64>,
    /// Training sample weight per node. Required by the tree explainer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covers: Option<Vec<f64>>,
}

/// Regressor payload, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegressorSchema {
    /// `w·x + b`.
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// `base_score + Σ tree(x)`.
    TreeEnsemble {
        #[serde(default)]
        base_score: f64,
        trees: Vec<TreeSchema>,
    },
}

/// Top-level model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifactSchema {
    pub format: String,
    pub meta: ModelMetaSchema,
    pub regressor: RegressorSchema,
}

/// Median imputer artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputerSchema {
    pub format: String,
    /// Fill value per feature.
    pub statistics: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

/// Standard scaler artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerSchema {
    pub format: String,
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}
