//! Normalized inputs and prediction bundles.

use ndarray::{Array1, ArrayView1};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::schema::FeatureSchema;

/// A request reordered into schema order, coerced, imputed and scaled.
///
/// Only [`PredictionService::prepare_input`](super::PredictionService::prepare_input)
/// creates frames, so a frame always matches its service's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFrame {
    schema: FeatureSchema,
    values: Array1<f64>,
}

impl InputFrame {
    pub(crate) fn new(schema: FeatureSchema, values: Array1<f64>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self { schema, values }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Values in schema order.
    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named feature.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.position(name).map(|i| self.values[i])
    }

    /// `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.schema.iter().map(|(i, name)| (name, self.values[i]))
    }
}

/// Serialized as a single row: `{name: value, ...}` in schema order.
impl Serialize for InputFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Everything the presentation layer needs for one prediction.
///
/// `shap_values[i]` is the contribution of `feature_names[i]`;
/// `base_value + Σ shap_values ≈ prediction`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub input_df: InputFrame,
    pub prediction: f64,
    pub shap_values: Vec<f64>,
    pub base_value: f64,
    pub feature_names: Vec<String>,
}

impl PredictionResult {
    /// `(feature, contribution)` pairs by descending absolute contribution.
    ///
    /// Ties keep schema order.
    pub fn ranked_contributions(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .feature_names
            .iter()
            .map(String::as_str)
            .zip(self.shap_values.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked
    }

    /// Contribution of a single feature.
    pub fn contribution(&self, name: &str) -> Option<f64> {
        self.input_df
            .schema()
            .position(name)
            .and_then(|i| self.shap_values.get(i).copied())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn result() -> PredictionResult {
        let schema = FeatureSchema::from_names(["age", "bmi", "ldl"]);
        PredictionResult {
            input_df: InputFrame::new(schema.clone(), array![0.5, -1.0, 2.0]),
            prediction: 0.7,
            shap_values: vec![0.1, -0.4, 0.4],
            base_value: 0.6,
            feature_names: schema.names().to_vec(),
        }
    }

    #[test]
    fn serializes_five_keys() {
        let json = serde_json::to_value(result()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(
            sorted,
            ["base_value", "feature_names", "input_df", "prediction", "shap_values"]
        );
        assert_eq!(json["input_df"]["bmi"], -1.0);
    }

    #[test]
    fn ranked_by_absolute_value_stable() {
        let r = result();
        let ranked = r.ranked_contributions();
        let names: Vec<&str> = ranked.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["bmi", "ldl", "age"]);
    }

    #[test]
    fn frame_lookup() {
        let r = result();
        assert_eq!(r.input_df.get("ldl"), Some(2.0));
        assert_eq!(r.input_df.get("hdl"), None);
        assert_eq!(r.contribution("age"), Some(0.1));
    }
}
