//! Prediction service.
//!
//! [`PredictionService`] owns the loaded artifacts and exposes the inference
//! pipeline: [`prepare_input`](PredictionService::prepare_input) →
//! [`predict`](PredictionService::predict) →
//! [`explain`](PredictionService::explain), or all three via
//! [`run`](PredictionService::run).
//!
//! Construction runs in a fixed order: load model → load preprocessors →
//! resolve schema → build background → select explainer. A service that
//! exists is fully assembled; it is immutable afterwards and can be shared
//! across threads.

mod config;
mod error;
mod result;

pub use config::{ConfigError, ServiceConfig, ServiceConfigBuilder};
pub use error::ServiceError;
pub use result::{InputFrame, PredictionResult};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array1;
use tracing::{debug, error, info, warn};

use crate::explainability::{Attribution, BackgroundData, Explainer};
use crate::model::Model;
use crate::persist::{self, ReadError};
use crate::preprocess::{MedianImputer, StandardScaler};
use crate::record::Record;
use crate::schema::{FeatureSchema, SchemaSource};

/// Loads artifacts once and serves predictions with attributions.
#[derive(Debug)]
pub struct PredictionService {
    model: Arc<Model>,
    imputer: MedianImputer,
    scaler: StandardScaler,
    schema: FeatureSchema,
    background: BackgroundData,
    explainer: Explainer,
    dispatch: Option<tracing::Dispatch>,
}

impl PredictionService {
    /// Load artifacts and assemble the service.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the model, imputer or scaler file is absent
    /// - [`ServiceError::Artifact`] if an artifact is malformed or its width
    ///   disagrees with the resolved schema
    /// - [`ServiceError::State`] if explainer assembly preconditions fail
    /// - [`ServiceError::Config`] if the config was modified out of range after building
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let dispatch = config.dispatch.clone();
        match &dispatch {
            Some(d) => tracing::dispatcher::with_default(d, || Self::assemble(config)),
            None => Self::assemble(config),
        }
    }

    fn assemble(config: ServiceConfig) -> Result<Self, ServiceError> {
        let model_file = config.model_file();
        info!(model_path = %model_file.display(), "Initializing PredictionService");

        let model = load_artifact(&model_file, |p| persist::load_model(p))?;
        info!(
            kind = model.regressor().kind(),
            estimator = model.meta().estimator.as_deref().unwrap_or("unknown"),
            n_features = model.n_features(),
            "Model loaded successfully"
        );
        let model = Arc::new(model);

        let (imputer, scaler) = load_preprocessors(&config)?;

        let schema = FeatureSchema::resolve(config.expected_features(), model.feature_names());
        match schema.source() {
            SchemaSource::Explicit => {
                info!(features = ?schema.names(), "Using explicitly provided expected_features")
            }
            SchemaSource::ModelMetadata => {
                info!(features = ?schema.names(), "Inferred expected_features from model")
            }
            SchemaSource::Fallback => warn!(
                features = ?schema.names(),
                "Model has no feature names, falling back to default expected_features"
            ),
        }
        check_preprocessor_width(
            &config.imputer_file(),
            imputer.n_features(),
            imputer.feature_names(),
            &schema,
        )?;
        check_preprocessor_width(
            &config.scaler_file(),
            scaler.n_features(),
            scaler.feature_names(),
            &schema,
        )?;

        info!(
            rows = config.background_sample_size,
            features = schema.len(),
            "Initializing synthetic background data"
        );
        let background = BackgroundData::synthetic(
            &schema,
            config.background_sample_size,
            config.background_seed,
        )?;

        info!("Initializing SHAP explainer");
        let explainer = Explainer::select(
            &model,
            Some(&background),
            config.background_explainer_sample_size,
            &config.sampling_options(),
        )?;

        Ok(Self {
            model,
            imputer,
            scaler,
            schema,
            background,
            explainer,
            dispatch: config.dispatch,
        })
    }

    /// Run `f` under the injected subscriber, if any.
    fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(d) => tracing::dispatcher::with_default(d, f),
            None => f(),
        }
    }

    /// The resolved feature order every vector follows.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn explainer(&self) -> &Explainer {
        &self.explainer
    }

    pub fn background(&self) -> &BackgroundData {
        &self.background
    }

    /// Normalize a raw record into an [`InputFrame`].
    ///
    /// Keys outside the schema are ignored. Values that do not coerce to a
    /// number (text, booleans, null) become missing and are imputed.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] listing every absent schema feature, in
    /// schema order.
    pub fn prepare_input(&self, record: &Record) -> Result<InputFrame, ServiceError> {
        self.in_scope(|| {
            debug!(?record, "Preparing input data");
            let missing: Vec<String> = self
                .schema
                .names()
                .iter()
                .filter(|name| !record.contains_key(name.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                warn!(?missing, "Rejecting input with missing features");
                return Err(ServiceError::Validation { missing });
            }

            let mut values: Array1<f64> = self
                .schema
                .names()
                .iter()
                .map(|name| record.get(name).map_or(f64::NAN, |v| v.to_numeric()))
                .collect();
            let n_coerced = values.iter().filter(|v| v.is_nan()).count();
            if n_coerced > 0 {
                debug!(n_coerced, "Imputing missing or non-numeric values");
            }

            self.imputer.transform_inplace(values.view_mut())?;
            self.scaler.transform_inplace(values.view_mut())?;
            Ok(InputFrame::new(self.schema.clone(), values))
        })
    }

    /// Apply the model to a prepared frame.
    pub fn predict(&self, frame: &InputFrame) -> Result<f64, ServiceError> {
        self.in_scope(|| {
            debug!(n_features = frame.len(), "Running prediction");
            let prediction = self.model.predict_view(frame.values())?;
            info!(prediction, "Prediction result");
            Ok(prediction)
        })
    }

    /// Attribute the model output for a prepared frame to its features.
    ///
    /// Recomputed on every call.
    pub fn explain(&self, frame: &InputFrame) -> Result<Attribution, ServiceError> {
        self.in_scope(|| {
            debug!(
                explainer = self.explainer.kind(),
                n_features = frame.len(),
                "Computing SHAP values"
            );
            Ok(self.explainer.explain(frame.values())?)
        })
    }

    /// Full pipeline: prepare, predict and explain one record.
    ///
    /// Returns the complete bundle or an error, never a partial result.
    pub fn run(&self, record: &Record) -> Result<PredictionResult, ServiceError> {
        let frame = self.prepare_input(record)?;
        let prediction = self.predict(&frame)?;
        let attribution = self.explain(&frame)?;
        let (shap_values, base_value) = attribution.into_parts();
        self.in_scope(|| {
            info!(prediction, base_value, "Prediction pipeline complete");
        });
        Ok(PredictionResult {
            input_df: frame,
            prediction,
            shap_values,
            base_value,
            feature_names: self.schema.names().to_vec(),
        })
    }
}

/// Load an artifact, distinguishing a missing file from a broken one.
fn load_artifact<T>(
    path: &Path,
    load: impl FnOnce(&Path) -> Result<T, ReadError>,
) -> Result<T, ServiceError> {
    if !path.exists() {
        error!(path = %path.display(), "Artifact file not found");
        return Err(ServiceError::NotFound {
            path: path.to_path_buf(),
        });
    }
    load(path).map_err(|e| ServiceError::artifact(path.to_path_buf(), e))
}

/// Both files must exist before either is loaded.
fn load_preprocessors(
    config: &ServiceConfig,
) -> Result<(MedianImputer, StandardScaler), ServiceError> {
    let scaler_file = config.scaler_file();
    let imputer_file = config.imputer_file();
    for path in [&scaler_file, &imputer_file] {
        if !path.exists() {
            error!(path = %path.display(), "Preprocessor file not found");
            return Err(ServiceError::NotFound { path: PathBuf::clone(path) });
        }
    }

    let scaler = load_artifact(&scaler_file, |p| persist::load_scaler(p))?;
    info!(n_features = scaler.n_features(), "Scaler loaded");
    let imputer = load_artifact(&imputer_file, |p| persist::load_imputer(p))?;
    info!(n_features = imputer.n_features(), "Imputer loaded");
    Ok((imputer, scaler))
}

/// Preprocessors are positional: their width must match the schema.
fn check_preprocessor_width(
    path: &Path,
    n_features: usize,
    names: Option<&[String]>,
    schema: &FeatureSchema,
) -> Result<(), ServiceError> {
    if n_features != schema.len() {
        return Err(ServiceError::Artifact {
            path: path.to_path_buf(),
            source: ReadError::Validation(format!(
                "fitted on {n_features} features, schema has {}",
                schema.len()
            )),
        });
    }
    if let Some(names) = names {
        if names != schema.names() {
            warn!(
                path = %path.display(),
                fitted = ?names,
                schema = ?schema.names(),
                "Preprocessor feature names differ from the schema; applying positionally"
            );
        }
    }
    Ok(())
}
