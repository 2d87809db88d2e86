//! Artifact persistence.
//!
//! Artifacts are JSON documents following the types in [`schema`]. Reading
//! parses into the schema type and converts with `TryFrom`, which validates
//! the payload; writing goes the other way through `From<&T>`.
//!
//! ```no_run
//! use clarity::persist;
//!
//! let model = persist::load_model("models/model.json")?;
//! let scaler = persist::load_scaler("models/scaler.json")?;
//! assert_eq!(model.n_features(), scaler.n_features());
//! # Ok::<(), persist::ReadError>(())
//! ```

pub mod convert;
mod error;
pub mod schema;

pub use error::{ReadError, WriteError};

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::Model;
use crate::preprocess::{MedianImputer, StandardScaler};
use schema::{ImputerSchema, ModelArtifactSchema, ScalerSchema};

/// Read a schema type `S` from `path` and convert it into `T`.
pub fn read_json<S, T>(path: impl AsRef<Path>) -> Result<T, ReadError>
where
    S: DeserializeOwned,
    T: TryFrom<S, Error = ReadError>,
{
    let reader = BufReader::new(File::open(path)?);
    let schema: S = serde_json::from_reader(reader)?;
    T::try_from(schema)
}

/// Serialize `value` through its schema type and write it to `path`.
pub fn write_json<S, T>(value: &T, path: impl AsRef<Path>) -> Result<(), WriteError>
where
    S: Serialize + for<'a> From<&'a T>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &S::from(value))?;
    writer.flush()?;
    Ok(())
}

/// Load a model artifact.
pub fn load_model(path: impl AsRef<Path>) -> Result<Model, ReadError> {
    read_json::<ModelArtifactSchema, _>(path)
}

/// Load a median imputer artifact.
pub fn load_imputer(path: impl AsRef<Path>) -> Result<MedianImputer, ReadError> {
    read_json::<ImputerSchema, _>(path)
}

/// Load a standard scaler artifact.
pub fn load_scaler(path: impl AsRef<Path>) -> Result<StandardScaler, ReadError> {
    read_json::<ScalerSchema, _>(path)
}

pub fn save_model(model: &Model, path: impl AsRef<Path>) -> Result<(), WriteError> {
    write_json::<ModelArtifactSchema, _>(model, path)
}

pub fn save_imputer(imputer: &MedianImputer, path: impl AsRef<Path>) -> Result<(), WriteError> {
    write_json::<ImputerSchema, _>(imputer, path)
}

pub fn save_scaler(scaler: &StandardScaler, path: impl AsRef<Path>) -> Result<(), WriteError> {
    write_json::<ScalerSchema, _>(scaler, path)
}
