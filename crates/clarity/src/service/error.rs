//! Service-level errors.

use std::path::PathBuf;

use crate::explainability::ExplainError;
use crate::model::ModelError;
use crate::persist::ReadError;
use crate::preprocess::PreprocessError;

use super::ConfigError;

/// Everything [`PredictionService`](super::PredictionService) can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A required artifact does not exist.
    #[error("artifact not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// An artifact exists but could not be read, parsed or reconciled with the schema.
    #[error("failed to load {}: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    /// The request lacks schema features. `missing` is in schema order.
    #[error("missing features: {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    /// An internal assembly precondition was violated.
    #[error("invalid state: {0}")]
    State(&'static str),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Explain(ExplainError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl From<ExplainError> for ServiceError {
    fn from(err: ExplainError) -> Self {
        match err {
            ExplainError::State(msg) => Self::State(msg),
            ExplainError::Model(e) => Self::Model(e),
            other => Self::Explain(other),
        }
    }
}

impl ServiceError {
    /// Wrap a read failure for `path`, promoting a missing file to [`ServiceError::NotFound`].
    pub(crate) fn artifact(path: PathBuf, source: ReadError) -> Self {
        if let ReadError::Io(e) = &source {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Self::NotFound { path };
            }
        }
        Self::Artifact { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_lists_every_name() {
        let err = ServiceError::Validation {
            missing: vec!["bmi".into(), "ldl".into()],
        };
        assert_eq!(err.to_string(), "missing features: bmi, ldl");
    }

    #[test]
    fn explain_state_becomes_service_state() {
        let err = ServiceError::from(ExplainError::State("no background"));
        assert!(matches!(err, ServiceError::State("no background")));

        let err = ServiceError::from(ExplainError::EmptyBackground);
        assert!(matches!(err, ServiceError::Explain(ExplainError::EmptyBackground)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ServiceError::artifact("m.json".into(), ReadError::Io(io));
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
