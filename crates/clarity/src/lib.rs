//! clarity: biomarker risk prediction with SHAP explanations.
//!
//! Loads a trained regression model together with its fitted imputer and
//! scaler, normalizes raw biomarker records, predicts a risk score and
//! attributes it to the individual features.
//!
//! # Key Types
//!
//! - [`PredictionService`] - Owns the artifacts and exposes `run`
//! - [`ServiceConfig`] - Builder for construction parameters
//! - [`FeatureSchema`] - Ordered feature names every vector follows
//! - [`Explainer`] - Tree or sampling-based attribution
//! - [`PredictionResult`] - Bundle returned to the presentation layer
//!
//! # Example
//!
//! ```ignore
//! use clarity::{PredictionService, Record, ServiceConfig};
//!
//! let config = ServiceConfig::builder()
//!     .project_root("/srv/clarity")
//!     .model_path("models/model.json")
//!     .build()?;
//! let service = PredictionService::new(config)?;
//!
//! let record: Record = serde_json::from_str(r#"{"age": 45, "bmi": 24.5, ...}"#)?;
//! let result = service.run(&record)?;
//! println!("{} ({} + attributions)", result.prediction, result.base_value);
//! ```

// Re-export approx traits for users who want to compare attributions
pub use approx;

pub mod explainability;
pub mod model;
pub mod persist;
pub mod preprocess;
pub mod record;
pub mod repr;
pub mod schema;
pub mod service;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use explainability::{Attribution, BackgroundData, ExplainError, Explainer, SamplingOptions};
pub use model::{Model, ModelError, ModelMeta, Regressor};
pub use preprocess::{MedianImputer, StandardScaler};
pub use record::{RawValue, Record};
pub use schema::{FeatureSchema, SchemaSource, DEFAULT_FEATURES};
pub use service::{
    ConfigError, InputFrame, PredictionResult, PredictionService, ServiceConfig, ServiceError,
};
