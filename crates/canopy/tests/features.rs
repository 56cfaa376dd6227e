//! Feature pipeline behavior seen through a model.

use approx::assert_abs_diff_eq;
use rstest::rstest;

use canopy::features::{
    BagOfWordsFeatureGroup, BagOfWordsStrategy, FeatureGroup, IdentityFeatureGroup,
    NormalizedFeatureGroup, OneHotEncodedFeatureGroup, Vocabulary,
};
use canopy::inference::Predictor;
use canopy::repr::linear::LinearModel;
use canopy::testing::{self, assert_slice_approx_eq, DEFAULT_TOLERANCE};
use canopy::text::{NGram, Tokenizer};
use canopy::{Model, PredictInput, Task};

fn regression_model(groups: Vec<FeatureGroup>) -> Model {
    let n_features = groups.iter().map(FeatureGroup::n_features).sum::<usize>();
    let predictor = LinearModel::new(vec![0.0; n_features + 1], n_features, 1).unwrap();
    Model::new("features", Task::Regression, groups, Predictor::Linear(predictor)).unwrap()
}

fn bag_of_words(strategy: BagOfWordsStrategy, vocabulary: &[&str]) -> FeatureGroup {
    FeatureGroup::BagOfWords(BagOfWordsFeatureGroup {
        source_column_name: "text".into(),
        strategy,
        tokenizer: Tokenizer::default(),
        vocabulary: Vocabulary::new(
            vocabulary
                .iter()
                .map(|token| (NGram::Unigram((*token).to_owned()), 1.0)),
        ),
    })
}

#[rstest]
#[case(BagOfWordsStrategy::Present, "a b", &[1.0, 1.0, 0.0])]
#[case(BagOfWordsStrategy::Present, "A a a", &[1.0, 0.0, 0.0])]
#[case(BagOfWordsStrategy::Count, "a b a", &[2.0, 1.0, 0.0])]
#[case(BagOfWordsStrategy::Count, "", &[0.0, 0.0, 0.0])]
#[case(BagOfWordsStrategy::TfIdf, "c c", &[0.0, 0.0, 1.0])]
fn bag_of_words_values(
    #[case] strategy: BagOfWordsStrategy,
    #[case] text: &str,
    #[case] expected: &[f32],
) {
    let model = regression_model(vec![bag_of_words(strategy, &["a", "b", "c"])]);
    let features = model.compute_features(&PredictInput::new().with("text", text));
    assert_slice_approx_eq(features.as_slice().unwrap(), expected, DEFAULT_TOLERANCE, text);
}

#[test]
fn tfidf_rows_are_unit_length() {
    let model = regression_model(vec![bag_of_words(BagOfWordsStrategy::TfIdf, &["a", "b", "c"])]);
    let features = model.compute_features(&PredictInput::new().with("text", "a b b c!"));
    let norm: f32 = features.iter().map(|v| v * v).sum::<f32>().sqrt();
    assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-6);
}

#[test]
fn missing_columns_take_group_baselines() {
    let model = testing::linear_regression_model();
    let features = model.compute_features(&PredictInput::new());
    assert!(features.iter().all(|&v| v == 0.0));
}

#[test]
fn groups_write_contiguous_blocks_in_order() {
    let model = regression_model(vec![
        FeatureGroup::Identity(IdentityFeatureGroup::new("x")),
        FeatureGroup::OneHotEncoded(OneHotEncodedFeatureGroup::new("c", ["u", "v"])),
        FeatureGroup::Normalized(NormalizedFeatureGroup::new("y", 10.0, 4.0)),
    ]);
    let input = PredictInput::new().with("x", "2.5").with("c", "v").with("y", 18);
    let features = model.compute_features(&input);
    assert_slice_approx_eq(
        features.as_slice().unwrap(),
        &[2.5, 0.0, 1.0, 2.0],
        DEFAULT_TOLERANCE,
        "identity, one-hot, normalized",
    );
}

#[test]
fn batch_features_match_single_records() {
    let model = testing::tree_multiclass_model();
    let inputs = testing::sample_inputs();
    for parallelism in [canopy::Parallelism::Sequential, canopy::Parallelism::Parallel] {
        let batch = model.compute_features_batch(&inputs, parallelism);
        assert_eq!(batch.nrows(), inputs.len());
        for (row, input) in batch.rows().into_iter().zip(&inputs) {
            assert_eq!(row, model.compute_features(input));
        }
    }
}
