//! Canonical regression tree representation (SoA).
//!
//! Nodes live in flat parallel arrays indexed by [`NodeId`]; the root is node 0.
//! Leaf nodes ignore their split fields and internal nodes ignore their leaf
//! value.

// Allow many constructor arguments for creating trees with all their fields.
#![allow(clippy::too_many_arguments)]

use super::NodeId;

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    #[error("tree has no nodes")]
    EmptyTree,
    /// Parallel arrays disagree on the node count.
    #[error("{field} has {len} entries, expected {n_nodes}")]
    LenMismatch {
        field: &'static str,
        len: usize,
        n_nodes: usize,
    },
    /// A child pointer references an out-of-bounds node.
    #[error("node {node}: {side} child {child} out of bounds ({n_nodes} nodes)")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    #[error("node {node} references itself")]
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path.
    #[error("node {node} reached more than once")]
    DuplicateVisit { node: NodeId },
    /// A cycle was detected during traversal.
    #[error("cycle detected at node {node}")]
    CycleDetected { node: NodeId },
    /// A node exists in storage but is unreachable from the root.
    #[error("node {node} unreachable from root")]
    UnreachableNode { node: NodeId },
    /// A split references a feature outside the model's width.
    #[error("node {node} splits on feature {feature}, model has {n_features}")]
    FeatureOutOfRange {
        node: NodeId,
        feature: u32,
        n_features: usize,
    },
}

/// Structure-of-Arrays tree storage.
#[derive(Debug, Clone)]
pub struct Tree {
    split_indices: Box<[u32]>,
    split_thresholds: Box<[f64]>,
    left_children: Box<[NodeId]>,
    right_children: Box<[NodeId]>,
    default_left: Box<[bool]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f64]>,
    /// Optional cover (training sample weight) at each node, required by TreeSHAP.
    covers: Option<Box<[f64]>>,
}

impl Tree {
    /// Create a new tree from parallel arrays.
    ///
    /// All arrays must have the same length (number of nodes); see
    /// [`validate`](Self::validate).
    pub fn new(
        split_indices: Vec<u32>,
        split_thresholds: Vec<f64>,
        left_children: Vec<NodeId>,
        right_children: Vec<NodeId>,
        default_left: Vec<bool>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<f64>,
    ) -> Self {
        Self {
            split_indices: split_indices.into_boxed_slice(),
            split_thresholds: split_thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            default_left: default_left.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
            covers: None,
        }
    }

    /// Single-leaf tree returning `value` for every input.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![0], vec![0.0], vec![0], vec![0], vec![true], vec![true], vec![value])
    }

    /// Set the covers for this tree (builder pattern).
    pub fn with_covers(mut self, covers: Vec<f64>) -> Self {
        self.covers = Some(covers.into_boxed_slice());
        self
    }

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    pub fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    #[inline]
    pub fn split_threshold(&self, node: NodeId) -> f64 {
        self.split_thresholds[node as usize]
    }

    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    #[inline]
    pub fn default_left(&self, node: NodeId) -> bool {
        self.default_left[node as usize]
    }

    #[inline]
    pub fn leaf_value(&self, node: NodeId) -> f64 {
        self.leaf_values[node as usize]
    }

    /// Check if this tree has cover statistics.
    #[inline]
    pub fn has_covers(&self) -> bool {
        self.covers.is_some()
    }

    /// Get read-only access to covers slice.
    pub fn covers(&self) -> Option<&[f64]> {
        self.covers.as_deref()
    }

    /// Child taken by `value` at a split node.
    ///
    /// NaN follows the node's default direction.
    #[inline]
    pub fn next_node(&self, node: NodeId, value: f64) -> NodeId {
        let go_left = if value.is_nan() {
            self.default_left(node)
        } else {
            value < self.split_threshold(node)
        };
        if go_left {
            self.left_child(node)
        } else {
            self.right_child(node)
        }
    }

    /// Traverse from the root to the leaf reached by `features`.
    ///
    /// Features beyond the slice are treated as missing.
    pub fn traverse_to_leaf(&self, features: &[f64]) -> NodeId {
        let mut node = 0;
        while !self.is_leaf(node) {
            let fvalue = features
                .get(self.split_index(node) as usize)
                .copied()
                .unwrap_or(f64::NAN);
            node = self.next_node(node, fvalue);
        }
        node
    }

    /// Leaf value reached by `features`.
    pub fn predict_row(&self, features: &[f64]) -> f64 {
        self.leaf_value(self.traverse_to_leaf(features))
    }

    /// Cover-weighted mean of the leaf values (the tree's expected output).
    ///
    /// Returns `None` when the tree has no covers.
    pub fn expected_value(&self) -> Option<f64> {
        let covers = self.covers()?;
        Some(self.node_expectation(covers, 0))
    }

    fn node_expectation(&self, covers: &[f64], node: NodeId) -> f64 {
        if self.is_leaf(node) {
            return self.leaf_value(node);
        }
        let left = self.left_child(node);
        let right = self.right_child(node);
        let left_cover = covers[left as usize];
        let right_cover = covers[right as usize];
        let total = left_cover + right_cover;
        if total <= 0.0 {
            return 0.5 * (self.node_expectation(covers, left) + self.node_expectation(covers, right));
        }
        (left_cover * self.node_expectation(covers, left)
            + right_cover * self.node_expectation(covers, right))
            / total
    }

    /// Depth of the deepest leaf (a single leaf has depth 1).
    pub fn max_depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0 as NodeId, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            if self.is_leaf(node) {
                max_depth = max_depth.max(depth);
            } else {
                stack.push((self.left_child(node), depth + 1));
                stack.push((self.right_child(node), depth + 1));
            }
        }
        max_depth
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate structural invariants for this tree.
    ///
    /// `n_features` bounds the split feature indices.
    pub fn validate(&self, n_features: usize) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        let lens = [
            ("split_indices", self.split_indices.len()),
            ("split_thresholds", self.split_thresholds.len()),
            ("left_children", self.left_children.len()),
            ("right_children", self.right_children.len()),
            ("default_left", self.default_left.len()),
            ("leaf_values", self.leaf_values.len()),
            ("covers", self.covers.as_ref().map_or(n_nodes, |c| c.len())),
        ];
        for (field, len) in lens {
            if len != n_nodes {
                return Err(TreeValidationError::LenMismatch { field, len, n_nodes });
            }
        }

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(NodeId, u8)> = vec![(0, 0)];

        while let Some((node, phase)) = stack.pop() {
            let node_usize = node as usize;
            match phase {
                0 => {
                    match color[node_usize] {
                        0 => {}
                        1 => return Err(TreeValidationError::CycleDetected { node }),
                        _ => return Err(TreeValidationError::DuplicateVisit { node }),
                    }

                    color[node_usize] = 1;
                    stack.push((node, 1));

                    if !self.is_leaf(node) {
                        let feature = self.split_index(node);
                        if feature as usize >= n_features {
                            return Err(TreeValidationError::FeatureOutOfRange {
                                node,
                                feature,
                                n_features,
                            });
                        }

                        let left = self.left_child(node);
                        let right = self.right_child(node);

                        if left == node || right == node {
                            return Err(TreeValidationError::SelfLoop { node });
                        }
                        for (side, child) in [("left", left), ("right", right)] {
                            if child as usize >= n_nodes {
                                return Err(TreeValidationError::ChildOutOfBounds {
                                    node,
                                    side,
                                    child,
                                    n_nodes,
                                });
                            }
                        }

                        stack.push((right, 0));
                        stack.push((left, 0));
                    }
                }
                _ => {
                    color[node_usize] = 2;
                }
            }
        }

        if let Some(i) = color.iter().position(|&c| c == 0) {
            return Err(TreeValidationError::UnreachableNode { node: i as NodeId });
        }

        Ok(())
    }
}

/// Build a [`Tree`] from a compact node listing (tests and fixtures).
///
/// ```
/// use clarity::scalar_tree;
///
/// // feature 0 < 0.5 -> leaf(-1), else leaf(1); missing goes left
/// let tree = scalar_tree! {
///     0 => num(0, 0.5, L) -> 1, 2,
///     1 => leaf(-1.0),
///     2 => leaf(1.0),
/// };
/// assert_eq!(tree.predict_row(&[0.2]), -1.0);
/// ```
#[macro_export]
macro_rules! scalar_tree {
    (@dir L) => { true };
    (@dir R) => { false };
    (@node num ($f:expr, $t:expr, $d:ident) -> $l:literal, $r:literal;
        $si:ident, $th:ident, $le:ident, $ri:ident, $dl:ident, $il:ident, $va:ident) => {
        $si.push($f as u32);
        $th.push($t as f64);
        $le.push($l);
        $ri.push($r);
        $dl.push($crate::scalar_tree!(@dir $d));
        $il.push(false);
        $va.push(0.0);
    };
    (@node leaf ($v:expr);
        $si:ident, $th:ident, $le:ident, $ri:ident, $dl:ident, $il:ident, $va:ident) => {
        $si.push(0);
        $th.push(0.0);
        $le.push(0);
        $ri.push(0);
        $dl.push(true);
        $il.push(true);
        $va.push($v as f64);
    };
    ($($node:literal => $kind:ident ( $($args:tt)* ) $(-> $l:literal, $r:literal)?),+ $(,)?) => {{
        let mut split_indices = Vec::new();
        let mut thresholds = Vec::new();
        let mut lefts = Vec::new();
        let mut rights = Vec::new();
        let mut default_left = Vec::new();
        let mut is_leaf = Vec::new();
        let mut values = Vec::new();
        $(
            let _ = $node;
            $crate::scalar_tree!(@node $kind ($($args)*) $(-> $l, $r)?;
                split_indices, thresholds, lefts, rights, default_left, is_leaf, values);
        )+
        $crate::repr::Tree::new(split_indices, thresholds, lefts, rights, default_left, is_leaf, values)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        scalar_tree! {
            0 => num(0, 0.5, L) -> 1, 2,
            1 => leaf(-1.0),
            2 => leaf(1.0),
        }
    }

    #[test]
    fn traverse_numeric() {
        let tree = stump();
        assert_eq!(tree.predict_row(&[0.3]), -1.0);
        assert_eq!(tree.predict_row(&[0.5]), 1.0);
        assert_eq!(tree.predict_row(&[0.7]), 1.0);
    }

    #[test]
    fn missing_follows_default() {
        let tree = stump();
        assert_eq!(tree.predict_row(&[f64::NAN]), -1.0);

        let right = scalar_tree! {
            0 => num(0, 0.5, R) -> 1, 2,
            1 => leaf(-1.0),
            2 => leaf(1.0),
        };
        assert_eq!(right.predict_row(&[f64::NAN]), 1.0);
    }

    #[test]
    fn expected_value_weights_by_cover() {
        let tree = stump().with_covers(vec![100.0, 75.0, 25.0]);
        // 0.75 * -1 + 0.25 * 1
        assert_eq!(tree.expected_value(), Some(-0.5));
        assert_eq!(stump().expected_value(), None);
    }

    #[test]
    fn depth() {
        assert_eq!(Tree::constant(1.0).max_depth(), 1);
        assert_eq!(stump().max_depth(), 2);
    }

    #[test]
    fn validate_ok() {
        assert!(stump().validate(1).is_ok());
        assert!(Tree::constant(3.0).validate(0).is_ok());
    }

    #[test]
    fn validate_feature_out_of_range() {
        let tree = scalar_tree! {
            0 => num(4, 0.5, L) -> 1, 2,
            1 => leaf(0.0),
            2 => leaf(1.0),
        };
        assert!(matches!(
            tree.validate(3),
            Err(TreeValidationError::FeatureOutOfRange { feature: 4, .. })
        ));
    }

    #[test]
    fn validate_child_out_of_bounds() {
        let tree = Tree::new(
            vec![0, 0],
            vec![0.5, 0.0],
            vec![1, 0],
            vec![5, 0],
            vec![true, true],
            vec![false, true],
            vec![0.0, 1.0],
        );
        assert!(matches!(
            tree.validate(1),
            Err(TreeValidationError::ChildOutOfBounds { side: "right", child: 5, .. })
        ));
    }

    #[test]
    fn validate_unreachable() {
        let tree = Tree::new(
            vec![0, 0],
            vec![0.0, 0.0],
            vec![0, 0],
            vec![0, 0],
            vec![true, true],
            vec![true, true],
            vec![1.0, 2.0],
        );
        assert_eq!(
            tree.validate(1),
            Err(TreeValidationError::UnreachableNode { node: 1 })
        );
    }

    #[test]
    fn validate_cover_len() {
        let tree = stump().with_covers(vec![1.0, 1.0]);
        assert!(matches!(
            tree.validate(1),
            Err(TreeValidationError::LenMismatch { field: "covers", .. })
        ));
    }
}
