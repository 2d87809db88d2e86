//! Canonical forest representation (collection of regression trees).

use super::tree::TreeValidationError;
use super::Tree;

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestValidationError {
    #[error("forest has no trees")]
    Empty,
    #[error("tree {tree_idx}: {error}")]
    InvalidTree {
        tree_idx: usize,
        error: TreeValidationError,
    },
}

/// Additive ensemble of regression trees.
///
/// `predict(x) = base_score + Σ tree(x)`. Averaging ensembles (random
/// forests) are stored with their leaf values pre-divided by the tree count.
#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<Tree>,
    base_score: f64,
}

impl Forest {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self {
            trees: Vec::new(),
            base_score: 0.0,
        }
    }

    /// Set the base score.
    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = base_score;
        self
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Iterate over trees.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// True when every tree carries cover statistics.
    pub fn has_covers(&self) -> bool {
        self.trees.iter().all(Tree::has_covers)
    }

    /// Depth of the deepest tree.
    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(Tree::max_depth).max().unwrap_or(0)
    }

    /// Predict for a single row of features.
    pub fn predict_row(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + tree.predict_row(features))
    }

    /// Validate every tree against the model width.
    pub fn validate(&self, n_features: usize) -> Result<(), ForestValidationError> {
        if self.trees.is_empty() {
            return Err(ForestValidationError::Empty);
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| ForestValidationError::InvalidTree { tree_idx: i, error: e })?;
        }
        Ok(())
    }
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_simple_tree(left_val: f64, right_val: f64, threshold: f64) -> Tree {
        crate::scalar_tree! {
            0 => num(0, threshold, L) -> 1, 2,
            1 => leaf(left_val),
            2 => leaf(right_val),
        }
    }

    #[test]
    fn forest_single_tree_regression() {
        let mut forest = Forest::new();
        forest.push_tree(build_simple_tree(1.0, 2.0, 0.5));

        assert_eq!(forest.predict_row(&[0.3]), 1.0);
        assert_eq!(forest.predict_row(&[0.7]), 2.0);
    }

    #[test]
    fn forest_multiple_trees_sum() {
        let mut forest = Forest::new();
        forest.push_tree(build_simple_tree(1.0, 2.0, 0.5));
        forest.push_tree(build_simple_tree(0.5, 1.5, 0.5));

        assert_eq!(forest.predict_row(&[0.3]), 1.5);
        assert_eq!(forest.predict_row(&[0.7]), 3.5);
    }

    #[test]
    fn forest_with_base_score() {
        let mut forest = Forest::new().with_base_score(0.5);
        forest.push_tree(build_simple_tree(1.0, 2.0, 0.5));

        assert_eq!(forest.predict_row(&[0.3]), 1.5);
    }

    #[test]
    fn covers_required_on_every_tree() {
        let mut forest = Forest::new();
        forest.push_tree(build_simple_tree(1.0, 2.0, 0.5).with_covers(vec![2.0, 1.0, 1.0]));
        assert!(forest.has_covers());
        forest.push_tree(build_simple_tree(1.0, 2.0, 0.5));
        assert!(!forest.has_covers());
    }

    #[test]
    fn validate_reports_tree_index() {
        let mut forest = Forest::new();
        forest.push_tree(build_simple_tree(1.0, 2.0, 0.5));
        forest.push_tree(crate::scalar_tree! {
            0 => num(3, 0.5, L) -> 1, 2,
            1 => leaf(0.0),
            2 => leaf(0.0),
        });
        assert!(matches!(
            forest.validate(2),
            Err(ForestValidationError::InvalidTree { tree_idx: 1, .. })
        ));
        assert_eq!(Forest::new().validate(2), Err(ForestValidationError::Empty));
    }
}
