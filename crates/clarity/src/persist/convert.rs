//! Conversion between runtime types and schema types.
//!
//! Writing is infallible (`From<&T>`); reading goes through `TryFrom` and
//! validates everything the runtime types assume: the format tag, vector
//! widths against `n_features`, and tree structure.

use std::sync::Arc;

use ndarray::Array1;

use super::error::ReadError;
use super::schema::{
    FORMAT_TAG, ImputerSchema, ModelArtifactSchema, ModelMetaSchema, RegressorSchema,
    ScalerSchema, TreeSchema,
};
use crate::model::{Model, ModelMeta, Regressor};
use crate::preprocess::{MedianImputer, StandardScaler};
use crate::repr::{Forest, LinearModel, Tree};

fn check_format(found: &str) -> Result<(), ReadError> {
    if found != FORMAT_TAG {
        return Err(ReadError::UnsupportedFormat {
            found: found.to_string(),
            expected: FORMAT_TAG,
        });
    }
    Ok(())
}

fn check_width(what: &str, len: usize, n_features: usize) -> Result<(), ReadError> {
    if len != n_features {
        return Err(ReadError::Validation(format!(
            "{what} has length {len}, expected {n_features}"
        )));
    }
    Ok(())
}

fn check_names(names: Option<&[String]>, n_features: usize) -> Result<(), ReadError> {
    match names {
        Some(names) => check_width("feature_names", names.len(), n_features),
        None => Ok(()),
    }
}

// =============================================================================
// ModelMeta conversions
// =============================================================================

impl From<&ModelMeta> for ModelMetaSchema {
    fn from(meta: &ModelMeta) -> Self {
        Self {
            n_features: meta.n_features,
            feature_names: meta.feature_names.clone(),
            estimator: meta.estimator.clone(),
        }
    }
}

impl TryFrom<ModelMetaSchema> for ModelMeta {
    type Error = ReadError;

    fn try_from(schema: ModelMetaSchema) -> Result<Self, Self::Error> {
        check_names(schema.feature_names.as_deref(), schema.n_features)?;
        Ok(Self {
            feature_names: schema.feature_names,
            n_features: schema.n_features,
            estimator: schema.estimator,
        })
    }
}

// =============================================================================
// Tree conversions
// =============================================================================

impl From<&Tree> for TreeSchema {
    fn from(tree: &Tree) -> Self {
        let n_nodes = tree.n_nodes();
        let mut schema = TreeSchema {
            split_indices: Vec::with_capacity(n_nodes),
            thresholds: Vec::with_capacity(n_nodes),
            children_left: Vec::with_capacity(n_nodes),
            children_right: Vec::with_capacity(n_nodes),
            default_left: Vec::with_capacity(n_nodes),
            leaf_values: Vec::with_capacity(n_nodes),
            covers: tree.covers().map(<[f64]>::to_vec),
        };
        for node in 0..n_nodes as u32 {
            if tree.is_leaf(node) {
                schema.split_indices.push(0);
                schema.thresholds.push(0.0);
                schema.children_left.push(0);
                schema.children_right.push(0);
                schema.default_left.push(false);
                schema.leaf_values.push(tree.leaf_value(node));
            } else {
                schema.split_indices.push(tree.split_index(node));
                schema.thresholds.push(tree.split_threshold(node));
                schema.children_left.push(tree.left_child(node));
                schema.children_right.push(tree.right_child(node));
                schema.default_left.push(tree.default_left(node));
                schema.leaf_values.push(0.0);
            }
        }
        schema
    }
}

impl TryFrom<TreeSchema> for Tree {
    type Error = ReadError;

    /// Structural checks happen at the forest level, where `n_features` is known.
    fn try_from(schema: TreeSchema) -> Result<Self, Self::Error> {
        // A node is a leaf if left_child == 0
        let is_leaf: Vec<bool> = schema.children_left.iter().map(|&left| left == 0).collect();

        let tree = Tree::new(
            schema.split_indices,
            schema.thresholds,
            schema.children_left,
            schema.children_right,
            schema.default_left,
            is_leaf,
            schema.leaf_values,
        );

        Ok(match schema.covers {
            Some(covers) => tree.with_covers(covers),
            None => tree,
        })
    }
}

// =============================================================================
// Model conversions
// =============================================================================

impl From<&Regressor> for RegressorSchema {
    fn from(regressor: &Regressor) -> Self {
        match regressor {
            Regressor::Linear(linear) => RegressorSchema::Linear {
                coefficients: linear.weights().to_vec(),
                intercept: linear.bias(),
            },
            Regressor::TreeEnsemble(forest) => RegressorSchema::TreeEnsemble {
                base_score: forest.base_score(),
                trees: forest.trees().map(TreeSchema::from).collect(),
            },
        }
    }
}

impl From<&Model> for ModelArtifactSchema {
    fn from(model: &Model) -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            meta: ModelMetaSchema::from(model.meta()),
            regressor: RegressorSchema::from(model.regressor()),
        }
    }
}

impl TryFrom<ModelArtifactSchema> for Model {
    type Error = ReadError;

    fn try_from(schema: ModelArtifactSchema) -> Result<Self, Self::Error> {
        check_format(&schema.format)?;
        let meta = ModelMeta::try_from(schema.meta)?;
        let n_features = meta.n_features;

        let regressor = match schema.regressor {
            RegressorSchema::Linear {
                coefficients,
                intercept,
            } => {
                check_width("coefficients", coefficients.len(), n_features)?;
                Regressor::Linear(LinearModel::new(Array1::from(coefficients), intercept))
            }
            RegressorSchema::TreeEnsemble { base_score, trees } => {
                let mut forest = Forest::new().with_base_score(base_score);
                for tree_schema in trees {
                    forest.push_tree(Tree::try_from(tree_schema)?);
                }
                forest
                    .validate(n_features)
                    .map_err(|e| ReadError::Validation(e.to_string()))?;
                Regressor::TreeEnsemble(Arc::new(forest))
            }
        };

        Ok(Model::new(regressor, meta))
    }
}

// =============================================================================
// Preprocessor conversions
// =============================================================================

impl From<&MedianImputer> for ImputerSchema {
    fn from(imputer: &MedianImputer) -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            statistics: imputer.statistics().to_vec(),
            feature_names: imputer.feature_names().map(<[String]>::to_vec),
        }
    }
}

impl TryFrom<ImputerSchema> for MedianImputer {
    type Error = ReadError;

    fn try_from(schema: ImputerSchema) -> Result<Self, Self::Error> {
        check_format(&schema.format)?;
        check_names(schema.feature_names.as_deref(), schema.statistics.len())?;
        let imputer = MedianImputer::from_statistics(schema.statistics);
        Ok(match schema.feature_names {
            Some(names) => imputer.with_feature_names(names),
            None => imputer,
        })
    }
}

impl From<&StandardScaler> for ScalerSchema {
    fn from(scaler: &StandardScaler) -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            n_features: scaler.n_features(),
            mean: scaler.mean().map(<[f64]>::to_vec),
            scale: scaler.scale().map(<[f64]>::to_vec),
            feature_names: scaler.feature_names().map(<[String]>::to_vec),
        }
    }
}

impl TryFrom<ScalerSchema> for StandardScaler {
    type Error = ReadError;

    fn try_from(schema: ScalerSchema) -> Result<Self, Self::Error> {
        check_format(&schema.format)?;
        let n_features = schema.n_features;
        if let Some(mean) = &schema.mean {
            check_width("mean", mean.len(), n_features)?;
        }
        if let Some(scale) = &schema.scale {
            check_width("scale", scale.len(), n_features)?;
            if let Some(pos) = scale.iter().position(|s| *s == 0.0 || !s.is_finite()) {
                return Err(ReadError::Validation(format!(
                    "scale[{pos}] must be finite and non-zero, got {}",
                    scale[pos]
                )));
            }
        }
        check_names(schema.feature_names.as_deref(), n_features)?;

        let scaler = StandardScaler::new(n_features, schema.mean, schema.scale);
        Ok(match schema.feature_names {
            Some(names) => scaler.with_feature_names(names),
            None => scaler,
        })
    }
}
