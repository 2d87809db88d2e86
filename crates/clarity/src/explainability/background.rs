//! Background data for the sampling explainer.

use ndarray::{Array2, ArrayView2, Axis};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::explainability::ExplainError;
use crate::schema::FeatureSchema;

/// Reference rows that stand in for "feature absent" when explaining.
///
/// Rows are in the post-preprocessing space the model consumes, one column
/// per schema feature.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundData {
    data: Array2<f64>,
}

impl BackgroundData {
    /// Seed used for the synthetic background unless overridden.
    pub const DEFAULT_SEED: u64 = 42;

    /// Wrap existing rows (`[n_rows, n_features]`).
    pub fn from_array(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Seeded uniform `[0, 1)` matrix of `n_rows × schema.len()`.
    ///
    /// # Errors
    ///
    /// [`ExplainError::State`] when the schema is empty.
    pub fn synthetic(schema: &FeatureSchema, n_rows: usize, seed: u64) -> Result<Self, ExplainError> {
        if schema.is_empty() {
            return Err(ExplainError::State(
                "feature schema must be resolved before building background data",
            ));
        }
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let data = Array2::from_shape_fn((n_rows, schema.len()), |_| rng.r#gen::<f64>());
        Ok(Self { data })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Draw `k` rows without replacement, in draw order.
    ///
    /// Returns every row (in original order) when `k >= n_rows`.
    pub fn sample(&self, k: usize, seed: u64) -> Array2<f64> {
        let n = self.n_rows();
        if k >= n {
            return self.data.clone();
        }
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let indices = rand::seq::index::sample(&mut rng, n, k).into_vec();
        self.data.select(Axis(0), &indices)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::schema::SchemaSource;

    fn schema(n: usize) -> FeatureSchema {
        FeatureSchema::new((0..n).map(|i| format!("f{i}")).collect(), SchemaSource::Explicit)
    }

    #[test]
    fn synthetic_shape_and_range() {
        let bg = BackgroundData::synthetic(&schema(3), 200, BackgroundData::DEFAULT_SEED).unwrap();
        assert_eq!((bg.n_rows(), bg.n_features()), (200, 3));
        assert!(bg.view().iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn synthetic_is_seeded() {
        let a = BackgroundData::synthetic(&schema(4), 10, 42).unwrap();
        let b = BackgroundData::synthetic(&schema(4), 10, 42).unwrap();
        let c = BackgroundData::synthetic(&schema(4), 10, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn empty_schema_is_a_state_error() {
        let empty = FeatureSchema::new(vec![], SchemaSource::Explicit);
        assert!(matches!(
            BackgroundData::synthetic(&empty, 10, 42),
            Err(ExplainError::State(_))
        ));
    }

    #[test]
    fn sample_without_replacement() {
        let bg = BackgroundData::from_array(
            Array2::from_shape_fn((20, 1), |(i, _)| i as f64),
        );
        let rows = bg.sample(8, 0);
        assert_eq!(rows.nrows(), 8);
        let distinct: HashSet<u64> = rows.column(0).iter().map(|v| v.to_bits()).collect();
        assert_eq!(distinct.len(), 8);
        assert_eq!(rows, bg.sample(8, 0));
    }

    #[test]
    fn oversized_sample_returns_everything() {
        let bg = BackgroundData::synthetic(&schema(2), 5, 1).unwrap();
        assert_eq!(bg.sample(50, 0), bg.view().to_owned());
    }
}
