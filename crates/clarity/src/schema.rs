//! Canonical feature schema.
//!
//! Every numeric vector handed to the imputer, scaler, model and explainer is
//! positional. [`FeatureSchema`] is the single source of that order: it is
//! resolved once when the service is built and then shared (cheaply cloned)
//! by everything downstream.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Feature order used by the training pipeline and the prediction form.
pub const DEFAULT_FEATURES: [&str; 6] = ["age", "bmi", "glucose", "insulin", "hdl", "ldl"];

/// Where a resolved schema came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSource {
    /// Supplied by the caller at construction.
    Explicit,
    /// Read from the model artifact's metadata.
    ModelMetadata,
    /// Hardcoded training schema ([`DEFAULT_FEATURES`]).
    Fallback,
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::ModelMetadata => write!(f, "model metadata"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Ordered feature names with a name → position index.
///
/// Cloning shares the underlying storage.
#[derive(Clone)]
pub struct FeatureSchema {
    names: Arc<[String]>,
    positions: Arc<HashMap<String, usize>>,
    source: SchemaSource,
}

impl FeatureSchema {
    /// Build a schema from names in their canonical order.
    pub fn new(names: Vec<String>, source: SchemaSource) -> Self {
        let positions = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names: names.into(),
            positions: Arc::new(positions),
            source,
        }
    }

    /// Explicit schema from any list of names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Into::into).collect(), SchemaSource::Explicit)
    }

    /// The hardcoded training schema.
    pub fn fallback() -> Self {
        Self::new(
            DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect(),
            SchemaSource::Fallback,
        )
    }

    /// Resolve the schema by priority.
    ///
    /// 1. `explicit`, if present and non-empty (used verbatim)
    /// 2. `model_names`, if the model artifact carries feature names
    /// 3. [`DEFAULT_FEATURES`]
    ///
    /// Pure: the same inputs always produce the same schema.
    pub fn resolve(explicit: Option<&[String]>, model_names: Option<&[String]>) -> Self {
        if let Some(names) = explicit.filter(|names| !names.is_empty()) {
            return Self::new(names.to_vec(), SchemaSource::Explicit);
        }
        if let Some(names) = model_names {
            return Self::new(names.to_vec(), SchemaSource::ModelMetadata);
        }
        Self::fallback()
    }

    /// Number of features.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no feature names were resolved.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Feature names in canonical order.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Position of a feature, if it belongs to the schema.
    #[inline]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Which resolution branch produced this schema.
    #[inline]
    pub fn source(&self) -> SchemaSource {
        self.source
    }

    /// Iterate over `(position, name)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }

    /// True when both schemas share storage or list the same names in order.
    pub fn same_order(&self, other: &FeatureSchema) -> bool {
        Arc::ptr_eq(&self.names, &other.names) || self.names == other.names
    }
}

impl fmt::Debug for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureSchema")
            .field("names", &self.names)
            .field("source", &self.source)
            .finish()
    }
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.same_order(other)
    }
}
