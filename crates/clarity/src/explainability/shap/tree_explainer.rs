//! TreeSHAP explainer for tree ensembles.
//!
//! Implements the path-dependent TreeSHAP algorithm from Lundberg et al. (2020):
//! "From local explanations to global understanding with explainable AI for trees"

use std::sync::Arc;

use crate::explainability::ExplainError;
use crate::explainability::shap::path::PathState;
use crate::explainability::shap::Attribution;
use crate::repr::{Forest, NodeId, Tree};

/// TreeSHAP explainer for tree-based models.
///
/// Computes exact SHAP values for tree ensembles in polynomial time. Requires
/// per-node cover statistics on every tree.
#[derive(Debug, Clone)]
pub struct TreeExplainer {
    forest: Arc<Forest>,
    /// Expected prediction under the training distribution encoded by covers
    base_value: f64,
    n_features: usize,
    max_depth: usize,
}

impl TreeExplainer {
    /// Create a new TreeExplainer for a forest over `n_features` features.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::MissingNodeStats`] if any tree lacks covers.
    pub fn new(forest: Arc<Forest>, n_features: usize) -> Result<Self, ExplainError> {
        let mut base_value = forest.base_score();
        for tree in forest.trees() {
            base_value += tree.expected_value().ok_or(ExplainError::MissingNodeStats(
                "cover statistics required for TreeSHAP",
            ))?;
        }
        let max_depth = forest.max_depth();
        Ok(Self {
            forest,
            base_value,
            n_features,
            max_depth,
        })
    }

    /// Get the base value (expected prediction).
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Compute SHAP values for a single sample.
    ///
    /// Features past the end of `features` are treated as missing.
    pub fn shap_values(&self, features: &[f64]) -> Attribution {
        let mut phi = vec![0.0; self.n_features];
        let path = PathState::with_capacity(self.max_depth);

        for tree in self.forest.trees() {
            // Checked in `new`.
            let Some(covers) = tree.covers() else { continue };
            let walk = TreeWalk {
                tree,
                covers,
                features,
            };
            walk.recurse(&mut phi, path.clone(), 0, 1.0, 1.0, -1);
        }

        Attribution::new(phi, self.base_value)
    }
}

/// Per-tree, per-sample recursion context.
struct TreeWalk<'a> {
    tree: &'a Tree,
    covers: &'a [f64],
    features: &'a [f64],
}

impl TreeWalk<'_> {
    fn recurse(
        &self,
        phi: &mut [f64],
        mut path: PathState,
        node: NodeId,
        parent_zero: f64,
        parent_one: f64,
        parent_feature: i32,
    ) {
        path.extend(parent_zero, parent_one, parent_feature);

        if self.tree.is_leaf(node) {
            let leaf_value = self.tree.leaf_value(node);
            for i in 1..path.len() {
                let weight = path.unwound_sum(i);
                let el = path.element(i);
                phi[el.feature_index as usize] +=
                    weight * (el.one_fraction - el.zero_fraction) * leaf_value;
            }
            return;
        }

        let feature = self.tree.split_index(node);
        let left = self.tree.left_child(node);
        let right = self.tree.right_child(node);

        let value = self.features.get(feature as usize).copied().unwrap_or(f64::NAN);
        let hot = self.tree.next_node(node, value);
        let cold = if hot == left { right } else { left };

        let total = self.covers[left as usize] + self.covers[right as usize];
        let (hot_zero, cold_zero) = if total > 0.0 {
            (
                self.covers[hot as usize] / total,
                self.covers[cold as usize] / total,
            )
        } else {
            (0.5, 0.5)
        };

        // A feature split on twice only appears once on the path.
        let mut incoming_zero = 1.0;
        let mut incoming_one = 1.0;
        if let Some(k) = path.find(feature as i32) {
            incoming_zero = path.element(k).zero_fraction;
            incoming_one = path.element(k).one_fraction;
            path.unwind(k);
        }

        self.recurse(
            phi,
            path.clone(),
            hot,
            hot_zero * incoming_zero,
            incoming_one,
            feature as i32,
        );
        self.recurse(phi, path, cold, cold_zero * incoming_zero, 0.0, feature as i32);
    }
}
