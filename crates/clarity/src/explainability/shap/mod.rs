//! SHAP explainers.
//!
//! - [`TreeExplainer`]: exact path-dependent TreeSHAP for forests with covers
//! - [`SamplingExplainer`]: model-agnostic estimation against a background sample

mod path;
mod sampling_explainer;
mod tree_explainer;
mod values;

pub use sampling_explainer::{SamplingExplainer, SamplingOptions};
pub use tree_explainer::TreeExplainer;
pub use values::Attribution;
