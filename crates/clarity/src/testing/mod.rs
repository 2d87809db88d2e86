//! Test utilities: synthetic biomarker data and artifact fixtures.
//!
//! Fixtures are produced the way the training pipeline produces artifacts:
//! fit the imputer on raw data, fit the scaler on imputed data, and attach a
//! model over the scaled space.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{Array1, Array2};
use rand::prelude::*;

use crate::model::{Model, ModelMeta, Regressor};
use crate::persist::{self, WriteError};
use crate::preprocess::{MedianImputer, StandardScaler};
use crate::repr::{Forest, LinearModel};
use crate::schema::DEFAULT_FEATURES;
use crate::scalar_tree;

/// Plausible `(min, max)` per default feature: age, bmi, glucose, insulin, hdl, ldl.
const BIOMARKER_RANGES: [(f64, f64); 6] = [
    (20.0, 80.0),
    (17.0, 40.0),
    (70.0, 200.0),
    (2.0, 40.0),
    (0.8, 2.5),
    (1.5, 5.5),
];

/// Coefficients of the linear fixture (scaled space).
pub const LINEAR_WEIGHTS: [f64; 6] = [0.3, 0.5, 0.8, 0.2, -0.6, 0.4];
pub const LINEAR_BIAS: f64 = 1.0;

/// Generate raw biomarker rows (`[rows, 6]`) with a fraction of missing values.
pub fn synthetic_biomarkers(rows: usize, seed: u64, missing_fraction: f64) -> Array2<f64> {
    assert!((0.0..1.0).contains(&missing_fraction));
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, BIOMARKER_RANGES.len()), |(_, col)| {
        if rng.r#gen::<f64>() < missing_fraction {
            return f64::NAN;
        }
        let (lo, hi) = BIOMARKER_RANGES[col];
        lo + rng.r#gen::<f64>() * (hi - lo)
    })
}

/// Fitted artifacts that can be written to a project directory.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub model: Model,
    pub imputer: MedianImputer,
    pub scaler: StandardScaler,
}

impl Fixture {
    /// Fit imputer and scaler on synthetic biomarkers and pair them with `regressor`.
    pub fn fitted(regressor: Regressor, estimator: &str) -> Self {
        let names: Vec<String> = DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect();
        let raw = synthetic_biomarkers(120, 7, 0.1);

        let imputer = MedianImputer::fit(raw.view())
            .expect("non-empty sample")
            .with_feature_names(names.clone());
        let mut imputed = raw;
        for row in imputed.rows_mut() {
            imputer.transform_inplace(row).expect("imputer width");
        }
        let scaler = StandardScaler::fit(imputed.view())
            .expect("non-empty sample")
            .with_feature_names(names.clone());

        let model = Model::new(
            regressor,
            ModelMeta::new(names.len())
                .with_feature_names(names)
                .with_estimator(estimator),
        );
        Self {
            model,
            imputer,
            scaler,
        }
    }

    /// Linear regression over the default features.
    pub fn linear() -> Self {
        let linear = LinearModel::new(Array1::from(LINEAR_WEIGHTS.to_vec()), LINEAR_BIAS);
        Self::fitted(Regressor::Linear(linear), "LinearRegression")
    }

    /// Two-tree ensemble over scaled glucose, bmi and hdl.
    ///
    /// Without covers the tree explainer cannot be built.
    pub fn forest(with_covers: bool) -> Self {
        let glucose_bmi = scalar_tree! {
            0 => num(2, 0.0, L) -> 1, 2,
            1 => num(1, 0.5, L) -> 3, 4,
            2 => leaf(1.2),
            3 => leaf(-0.8),
            4 => leaf(0.1),
        };
        let hdl = scalar_tree! {
            0 => num(4, -0.2, R) -> 1, 2,
            1 => leaf(0.4),
            2 => leaf(-0.3),
        };
        let (glucose_bmi, hdl) = if with_covers {
            (
                glucose_bmi.with_covers(vec![120.0, 60.0, 60.0, 40.0, 20.0]),
                hdl.with_covers(vec![120.0, 50.0, 70.0]),
            )
        } else {
            (glucose_bmi, hdl)
        };

        let mut forest = Forest::new().with_base_score(2.0);
        forest.push_tree(glucose_bmi);
        forest.push_tree(hdl);
        Self::fitted(Regressor::TreeEnsemble(Arc::new(forest)), "XGBRegressor")
    }

    /// Replace the model's metadata feature names.
    pub fn with_model_feature_names(mut self, names: Option<Vec<String>>) -> Self {
        let mut meta = self.model.meta().clone();
        meta.feature_names = names;
        self.model = Model::new(self.model.regressor().clone(), meta);
        self
    }

    /// Write `model.json`, `scaler.json` and `imputer.json` under `root/models/`.
    ///
    /// Returns the model path relative to `root`.
    pub fn write(&self, root: &Path) -> Result<PathBuf, WriteError> {
        let models = root.join("models");
        fs::create_dir_all(&models)?;
        persist::save_model(&self.model, models.join("model.json"))?;
        persist::save_scaler(&self.scaler, models.join("scaler.json"))?;
        persist::save_imputer(&self.imputer, models.join("imputer.json"))?;
        Ok(PathBuf::from("models/model.json"))
    }
}
