//! Properties of the prediction orchestrator over generated records.

use approx::assert_abs_diff_eq;
use proptest::prelude::*;

use canopy::input::PredictInputValue;
use canopy::testing;
use canopy::{FeatureContributions, Model, PredictInput, PredictOptions, PredictOutput};

const WORDS: &[&str] = &["good", "bad", "movie", "not", "great", "plot", "!", "Good"];
const COLORS: &[&str] = &["red", "green", "blue", "purple"];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 0..8).prop_map(|words| words.join(" "))
}

fn arb_value() -> impl Strategy<Value = Option<PredictInputValue>> {
    prop_oneof![
        Just(None),
        (-1e4f64..1e5).prop_map(|v| Some(PredictInputValue::Number(v))),
        arb_text().prop_map(|v| Some(PredictInputValue::String(v))),
        any::<bool>().prop_map(|v| Some(PredictInputValue::Bool(v))),
    ]
}

fn arb_color() -> impl Strategy<Value = Option<PredictInputValue>> {
    prop::option::of(prop::sample::select(COLORS).prop_map(PredictInputValue::from))
}

/// Records over the fixture columns with any mix of missing and mistyped values.
fn arb_input() -> impl Strategy<Value = PredictInput> {
    (arb_value(), arb_value(), arb_color(), arb_text(), arb_value()).prop_map(
        |(age, income, color, review, title)| {
            let mut input = PredictInput::new().with("review", review);
            let optional = [("age", age), ("income", income), ("color", color), ("title", title)];
            for (column, value) in optional {
                if let Some(value) = value {
                    input.insert(column, value);
                }
            }
            input
        },
    )
}

fn contributions(output: &PredictOutput) -> Vec<&FeatureContributions> {
    match output {
        PredictOutput::Regression(o) => o.feature_contributions.iter().collect(),
        PredictOutput::BinaryClassification(o) => o.feature_contributions.iter().collect(),
        PredictOutput::MulticlassClassification(o) => o
            .feature_contributions
            .iter()
            .flat_map(|by_class| by_class.values())
            .collect(),
    }
}

fn explainable_models() -> Vec<Model> {
    testing::all_models()
        .into_iter()
        .filter(|model| !model.id().contains("no-covers"))
        .collect()
}

fn with_contributions() -> PredictOptions {
    PredictOptions::builder()
        .compute_feature_contributions(true)
        .build()
        .unwrap()
}

#[test]
fn batch_preserves_order_for_every_thread_count() {
    init_logging();
    let inputs: Vec<PredictInput> = testing::sample_inputs()
        .into_iter()
        .cycle()
        .take(64)
        .collect();
    let options = with_contributions();

    for model in explainable_models() {
        let expected: Vec<_> = inputs
            .iter()
            .map(|input| model.predict_one(input, &options))
            .collect();
        assert_eq!(model.predict(&inputs, &options), expected, "{}", model.id());
        for n_threads in [0, 1, 3] {
            assert_eq!(
                model.predict_with_threads(&inputs, &options, n_threads),
                expected,
                "{} with {n_threads} threads",
                model.id()
            );
        }
    }
}

#[test]
fn empty_batch_is_empty() {
    let model = testing::tree_binary_model();
    assert!(model.predict(&[], &PredictOptions::default()).is_empty());
    assert!(model
        .predict_with_threads(&[], &PredictOptions::default(), 4)
        .is_empty());
}

#[test]
fn contributions_are_absent_unless_requested() {
    for model in testing::all_models() {
        for input in testing::sample_inputs() {
            let output = model.predict_one(&input, &PredictOptions::default()).unwrap();
            assert!(contributions(&output).is_empty(), "{}", model.id());
        }
    }
}

#[test]
fn contribution_entries_follow_group_order() {
    let model = testing::linear_regression_model();
    let input = testing::sample_inputs().remove(0);
    let output = model.predict_one(&input, &with_contributions()).unwrap();
    let PredictOutput::Regression(output) = output else {
        panic!("expected regression output");
    };
    let contributions = output.feature_contributions.unwrap();
    assert_eq!(contributions.entries.len(), model.feature_groups().len());

    let json = serde_json::to_value(&contributions).unwrap();
    let kinds: Vec<&str> = json["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["type"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        [
            "identity",
            "normalized",
            "one_hot_encoded",
            "bag_of_words",
            "bag_of_words_cosine_similarity",
            "word_embedding"
        ]
    );
}

#[test]
fn numbers_beyond_f32_range_count_as_missing() {
    init_logging();
    let options = with_contributions();
    let oversized = PredictInput::new()
        .with("age", 1e300)
        .with("income", -1e300)
        .with("review", "good movie");
    let missing = PredictInput::new().with("review", "good movie");

    for model in explainable_models() {
        assert_eq!(model.compute_features(&oversized), model.compute_features(&missing));
        let output = model.predict_one(&oversized, &options).unwrap();
        for contributions in contributions(&output) {
            assert!(contributions.output_value.is_finite(), "{}", model.id());
            assert!(contributions.verify(1e-4), "{}", model.id());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn contributions_reconcile(input in arb_input()) {
        let options = with_contributions();
        for model in explainable_models() {
            let output = model.predict_one(&input, &options).unwrap();
            let explained = contributions(&output);
            prop_assert!(!explained.is_empty());
            for contributions in explained {
                prop_assert!(
                    contributions.verify(1e-4),
                    "{}: baseline {} + {} != {}",
                    model.id(),
                    contributions.baseline_value,
                    contributions.total_contribution(),
                    contributions.output_value
                );
            }
        }
    }

    #[test]
    fn features_are_deterministic(input in arb_input()) {
        let model = testing::tree_regression_model();
        let first = model.compute_features(&input);
        let second = model.compute_features(&input);
        prop_assert_eq!(first.len(), testing::N_FEATURES);
        prop_assert!(first.iter().all(|v| v.is_finite()));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn binary_threshold_decides_class(score in -6.0f32..6.0, threshold in 0.0f32..=1.0) {
        let model = testing::binary_model_with_score(score);
        let options = PredictOptions::builder().threshold(threshold).build().unwrap();
        let output = model.predict_one(&PredictInput::new(), &options).unwrap();
        let PredictOutput::BinaryClassification(output) = output else {
            panic!("expected binary output");
        };

        let p = canopy::inference::sigmoid(score);
        if p >= threshold {
            prop_assert_eq!(output.class_name.as_str(), "yes");
            assert_abs_diff_eq!(output.probability, p, epsilon = 1e-6);
        } else {
            prop_assert_eq!(output.class_name.as_str(), "no");
            assert_abs_diff_eq!(output.probability, 1.0 - p, epsilon = 1e-6);
        }
    }

    #[test]
    fn multiclass_output_is_a_distribution(input in arb_input()) {
        for model in [testing::tree_multiclass_model(), testing::linear_multiclass_model()] {
            let output = model.predict_one(&input, &PredictOptions::default()).unwrap();
            let PredictOutput::MulticlassClassification(output) = output else {
                panic!("expected multiclass output");
            };
            let classes: Vec<&str> = output.probabilities.keys().map(String::as_str).collect();
            prop_assert_eq!(classes, ["low", "medium", "high"]);
            let total: f32 = output.probabilities.values().sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-6);

            let best = output
                .probabilities
                .values()
                .fold(f32::NEG_INFINITY, |a, &b| a.max(b));
            prop_assert_eq!(output.probability, best);
            prop_assert_eq!(output.probabilities[&output.class_name], best);
        }
    }
}
