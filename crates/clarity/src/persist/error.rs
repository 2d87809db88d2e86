//! Artifact read/write errors.

use std::io;

/// Errors raised while reading an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported artifact format {found:?} (expected {expected:?})")]
    UnsupportedFormat {
        found: String,
        expected: &'static str,
    },
    #[error("invalid artifact: {0}")]
    Validation(String),
}

/// Errors raised while writing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
