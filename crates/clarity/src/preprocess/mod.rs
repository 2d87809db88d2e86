//! Fitted preprocessing transforms.
//!
//! Both transforms are positional: they must receive features in the order
//! they were fitted with. Inference applies [`MedianImputer`] then
//! [`StandardScaler`], over the whole vector at once.

mod imputer;
mod scaler;

pub use imputer::MedianImputer;
pub use scaler::StandardScaler;

/// Errors raised by preprocessing transforms.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreprocessError {
    #[error("{transform} was fitted on {expected} features, got {got}")]
    FeatureCountMismatch {
        transform: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("cannot fit {transform} on an empty sample")]
    EmptyFit { transform: &'static str },
}
