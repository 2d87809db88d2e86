//! Attribution behavior on the bundled fixtures.

use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use clarity::testing::LINEAR_WEIGHTS;
use clarity::{Explainer, PredictionService, RawValue, Record, ServiceConfig};
use rstest::rstest;

fn service(kind: &str, model: &str) -> PredictionService {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/test-cases")
        .join(kind);
    let config = ServiceConfig::builder()
        .project_root(root)
        .model_path(format!("models/{model}"))
        .build()
        .unwrap();
    PredictionService::new(config).unwrap_or_else(|e| panic!("{kind}/{model}: {e}"))
}

fn patient(values: [f64; 6]) -> Record {
    clarity::DEFAULT_FEATURES
        .iter()
        .zip(values)
        .map(|(name, v)| (name.to_string(), RawValue::from(v)))
        .collect()
}

#[rstest]
#[case::high_glucose([60.0, 30.0, 120.0, 15.0, 1.0, 4.0])]
#[case::low_glucose([35.0, 22.0, 85.0, 6.0, 1.8, 2.2])]
#[case::at_medians([50.0, 25.0, 100.0, 10.0, 1.5, 3.0])]
#[case::low_bmi([71.0, 18.5, 150.0, 30.0, 1.3, 5.0])]
fn tree_attributions_are_additive(#[case] values: [f64; 6]) {
    let service = service("forest", "model.json");
    assert!(matches!(service.explainer(), Explainer::Tree(_)));

    let result = service.run(&patient(values)).unwrap();
    assert_abs_diff_eq!(
        result.base_value + result.shap_values.iter().sum::<f64>(),
        result.prediction,
        epsilon = 1e-9
    );
}

#[test]
fn tree_base_value_is_cover_weighted_mean() {
    let service = service("forest", "model.json");
    // Tree 0: 0.5 * -0.5 + 0.5 * (0.6 * 0.3 + 0.4 * 1.1); tree 1: 0.4 * 0.4 + 0.6 * -0.2.
    let expected = 2.0 + (-0.25 + 0.5 * (0.18 + 0.44)) + (0.16 - 0.12);
    assert_abs_diff_eq!(service.explainer().base_value(), expected, epsilon = 1e-12);
}

#[test]
fn forest_without_covers_explains_by_sampling() {
    let service = service("forest", "model_nocovers.json");
    let Explainer::Sampling(sampling) = service.explainer() else {
        panic!("expected sampling fallback");
    };
    assert_eq!(sampling.n_background(), 50);
    assert!(sampling.is_exact());

    let result = service.run(&patient([60.0, 30.0, 120.0, 15.0, 1.0, 4.0])).unwrap();
    assert_abs_diff_eq!(
        result.base_value + result.shap_values.iter().sum::<f64>(),
        result.prediction,
        epsilon = 1e-9
    );
    for name in ["age", "insulin", "ldl"] {
        assert_abs_diff_eq!(result.contribution(name).unwrap(), 0.0, epsilon = 1e-12);
    }
}

#[test]
fn linear_attributions_match_closed_form() {
    let service = service("linear", "model.json");
    let Explainer::Sampling(sampling) = service.explainer() else {
        panic!("linear models are explained by sampling");
    };
    let background = sampling.background();

    let result = service.run(&patient([60.0, 30.0, 120.0, 15.0, 1.0, 4.0])).unwrap();
    let x = result.input_df.values();
    for (i, &phi) in result.shap_values.iter().enumerate() {
        let mean = background.column(i).mean().unwrap();
        assert_abs_diff_eq!(phi, LINEAR_WEIGHTS[i] * (x[i] - mean), epsilon = 1e-9);
    }

    let mean_prediction = background
        .rows()
        .into_iter()
        .map(|row| service.model().predict_view(row).unwrap())
        .sum::<f64>()
        / background.nrows() as f64;
    assert_abs_diff_eq!(result.base_value, mean_prediction, epsilon = 1e-9);
}

#[test]
fn explanation_is_recomputed_per_request() {
    let service = service("linear", "model.json");
    let a = service.run(&patient([60.0, 30.0, 120.0, 15.0, 1.0, 4.0])).unwrap();
    let b = service.run(&patient([40.0, 20.0, 90.0, 5.0, 2.0, 2.0])).unwrap();
    assert_eq!(a.base_value, b.base_value);
    assert_ne!(a.shap_values, b.shap_values);
}
