//! Canonical in-memory model representations.
//!
//! - [`Tree`] / [`Forest`]: regression tree ensembles (random forest, GBDT)
//! - [`LinearModel`]: ordinary linear regression

/// Canonical node identifier used by the tree representation.
///
/// Internally this is just an index into the tree's SoA arrays.
pub type NodeId = u32;

pub mod forest;
pub mod linear;
pub mod tree;

pub use forest::{Forest, ForestValidationError};
pub use linear::LinearModel;
pub use tree::{Tree, TreeValidationError};
