//! Service construction parameters with builder pattern.
//!
//! [`ServiceConfig`] gathers everything [`PredictionService::new`] needs. It
//! uses the `bon` crate for builder generation with validation on `build()`.
//!
//! # Example
//!
//! ```
//! use clarity::ServiceConfig;
//!
//! let config = ServiceConfig::builder()
//!     .project_root("/srv/clarity")
//!     .model_path("models/model.json")
//!     .expected_features(vec!["age".into(), "bmi".into()])
//!     .background_sample_size(100)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.background_explainer_sample_size, 50);
//! assert_eq!(config.model_file(), std::path::Path::new("/srv/clarity/models/model.json"));
//! ```
//!
//! [`PredictionService::new`]: super::PredictionService::new

use std::path::{Path, PathBuf};

use bon::Builder;

use crate::explainability::{BackgroundData, SamplingOptions};

// =============================================================================
// ConfigError
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A size parameter that must be positive was zero.
    ZeroSize { field: &'static str },
    /// `model_path` was empty.
    EmptyModelPath,
    /// `max_exact_features` exceeds what full enumeration can handle.
    ExactFeaturesTooLarge { value: usize, max: usize },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroSize { field } => write!(f, "{} must be at least 1", field),
            Self::EmptyModelPath => write!(f, "model_path must not be empty"),
            Self::ExactFeaturesTooLarge { value, max } => {
                write!(f, "max_exact_features must be at most {}, got {}", max, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// ServiceConfig
// =============================================================================

/// Construction parameters for [`PredictionService`](super::PredictionService).
///
/// Artifact paths are relative to `project_root`.
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct ServiceConfig {
    // === Artifacts ===
    #[builder(default = PathBuf::from("."), into)]
    pub project_root: PathBuf,

    /// Model artifact, relative to `project_root`.
    #[builder(into)]
    pub model_path: PathBuf,

    #[builder(default = PathBuf::from("models/imputer.json"), into)]
    pub imputer_path: PathBuf,

    #[builder(default = PathBuf::from("models/scaler.json"), into)]
    pub scaler_path: PathBuf,

    // === Schema ===
    /// Overrides the model's own feature names when non-empty.
    pub expected_features: Option<Vec<String>>,

    // === Background data ===
    #[builder(default = 200)]
    pub background_sample_size: usize,

    /// Rows drawn from the background for the sampling explainer.
    #[builder(default = 50)]
    pub background_explainer_sample_size: usize,

    // === Sampling explainer ===
    #[builder(default = 12)]
    pub max_exact_features: usize,

    #[builder(default = 64)]
    pub n_permutations: usize,

    // === Reproducibility ===
    #[builder(default = BackgroundData::DEFAULT_SEED)]
    pub background_seed: u64,

    /// Seed for the explainer subsample and permutation sampling.
    #[builder(default = 0)]
    pub sample_seed: u64,

    // === Logging ===
    /// Subscriber used for everything the service logs. Falls back to the
    /// thread's default subscriber when unset.
    pub dispatch: Option<tracing::Dispatch>,
}

impl<S: service_config_builder::IsComplete> ServiceConfigBuilder<S> {
    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig {
    /// Check parameter ranges. Run by `build()` and again by the service,
    /// since fields stay public after building.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyModelPath);
        }
        if self.max_exact_features > SamplingOptions::EXACT_FEATURE_LIMIT {
            return Err(ConfigError::ExactFeaturesTooLarge {
                value: self.max_exact_features,
                max: SamplingOptions::EXACT_FEATURE_LIMIT,
            });
        }
        for (field, value) in [
            ("background_sample_size", self.background_sample_size),
            ("background_explainer_sample_size", self.background_explainer_sample_size),
            ("n_permutations", self.n_permutations),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroSize { field });
            }
        }
        Ok(())
    }

    /// Absolute (root-joined) model artifact path.
    pub fn model_file(&self) -> PathBuf {
        self.project_root.join(&self.model_path)
    }

    pub fn imputer_file(&self) -> PathBuf {
        self.project_root.join(&self.imputer_path)
    }

    pub fn scaler_file(&self) -> PathBuf {
        self.project_root.join(&self.scaler_path)
    }

    /// Explicit feature override, if any.
    pub fn expected_features(&self) -> Option<&[String]> {
        self.expected_features.as_deref()
    }

    /// Options handed to the sampling explainer.
    pub fn sampling_options(&self) -> SamplingOptions {
        SamplingOptions {
            max_exact_features: self.max_exact_features,
            n_permutations: self.n_permutations,
            seed: self.sample_seed,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServiceConfig::builder().model_path("m.json").build().unwrap();
        assert_eq!(config.project_root, PathBuf::from("."));
        assert_eq!(config.background_sample_size, 200);
        assert_eq!(config.background_explainer_sample_size, 50);
        assert_eq!(config.background_seed, 42);
        assert_eq!(config.scaler_file(), PathBuf::from("./models/scaler.json"));
        assert_eq!(config.imputer_file(), PathBuf::from("./models/imputer.json"));
        assert!(config.expected_features().is_none());
        assert!(config.dispatch.is_none());
    }

    #[test]
    fn zero_sizes_rejected() {
        let err = ServiceConfig::builder()
            .model_path("m.json")
            .background_sample_size(0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroSize { field: "background_sample_size" });

        let err = ServiceConfig::builder()
            .model_path("m.json")
            .background_explainer_sample_size(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("background_explainer_sample_size"));
    }

    #[test]
    fn empty_model_path_rejected() {
        let result = ServiceConfig::builder().model_path("").build();
        assert!(matches!(result, Err(ConfigError::EmptyModelPath)));
    }

    #[test]
    fn exact_feature_ceiling() {
        let at_limit = ServiceConfig::builder()
            .model_path("m.json")
            .max_exact_features(SamplingOptions::EXACT_FEATURE_LIMIT)
            .build();
        assert!(at_limit.is_ok());

        let err = ServiceConfig::builder()
            .model_path("m.json")
            .max_exact_features(usize::MAX)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ExactFeaturesTooLarge {
                value: usize::MAX,
                max: SamplingOptions::EXACT_FEATURE_LIMIT,
            }
        );
    }

    #[test]
    fn sampling_options_follow_config() {
        let config = ServiceConfig::builder()
            .model_path("m.json")
            .max_exact_features(4)
            .sample_seed(9)
            .build()
            .unwrap();
        let options = config.sampling_options();
        assert_eq!(options.max_exact_features, 4);
        assert_eq!(options.seed, 9);
        assert_eq!(options.n_permutations, 64);
    }
}
