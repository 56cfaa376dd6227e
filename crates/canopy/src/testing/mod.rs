//! Test fixtures and assertion helpers.
//!
//! Shared by unit tests, integration tests and benches. Every fixture is
//! deterministic and passes [`Model::new`] validation.
//!
//! ```ignore
//! use canopy::testing::{self, DEFAULT_TOLERANCE};
//!
//! let model = testing::tree_multiclass_model();
//! for input in testing::sample_inputs() {
//!     model.predict_one(&input, &Default::default()).unwrap();
//! }
//! ```

use crate::features::{
    BagOfWordsCosineSimilarityFeatureGroup, BagOfWordsFeatureGroup, BagOfWordsStrategy,
    FeatureGroup, IdentityFeatureGroup, NormalizedFeatureGroup, OneHotEncodedFeatureGroup,
    Vocabulary, WordEmbeddingFeatureGroup, WordEmbeddingModel,
};
use crate::inference::Predictor;
use crate::input::PredictInput;
use crate::model::{Model, Task};
use crate::repr::gbdt::{Forest, Tree};
use crate::repr::linear::LinearModel;
use crate::text::{NGram, Tokenizer};

// =============================================================================
// Constants
// =============================================================================

/// Default tolerance for f32 comparisons of values that are O(1).
pub const DEFAULT_TOLERANCE: f32 = 1e-5;

/// Default tolerance for f64 comparisons.
pub const DEFAULT_TOLERANCE_F64: f64 = 1e-9;

// =============================================================================
// Assertions
// =============================================================================

/// Assert that two slices have the same length and agree element-wise within `tolerance`.
///
/// NaN only matches NaN.
///
/// # Panics
///
/// Panics with the first mismatching index and `context`.
pub fn assert_slice_approx_eq(actual: &[f32], expected: &[f32], tolerance: f32, context: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{context}: length mismatch ({} vs {})",
        actual.len(),
        expected.len()
    );
    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        if a.is_nan() && e.is_nan() {
            continue;
        }
        let diff = (a - e).abs();
        assert!(
            diff <= tolerance,
            "{context}: mismatch at index {i}: {a} vs {e} (diff {diff} > {tolerance})"
        );
    }
}

// =============================================================================
// Trees
// =============================================================================

/// Single split on `feature`: `<= threshold` goes to `left`, else `right`.
///
/// Missing values go right. No covers.
pub fn stump(feature: u32, threshold: f32, left: f32, right: f32) -> Tree {
    Tree::new(
        vec![feature, 0, 0],
        vec![threshold, 0.0, 0.0],
        vec![1, 0, 0],
        vec![2, 0, 0],
        vec![false, false, false],
        vec![false, true, true],
        vec![0.0, left, right],
    )
}

/// Per-feature split points of the fixture trees, matched to [`feature_groups`].
const SPLIT_POINTS: [f32; N_FEATURES] = [
    35.0, // age
    0.0,  // income (normalized)
    0.5, 0.5, 0.5, // color
    0.1, 0.1, 0.1, 0.1, // review bag-of-words
    0.5, // title/review similarity
    0.0, 0.25, // review embedding
];

/// Number of features produced by [`feature_groups`].
pub const N_FEATURES: usize = 12;

/// Complete depth-2 tree number `t`, deterministic in `t`.
///
/// ```text
///            0
///        /       \
///       1         2
///     /   \     /   \
///    3     4   5     6
/// ```
fn fixture_tree(t: usize, with_covers: bool) -> Tree {
    let features = [(t * 5) % N_FEATURES, (t * 3 + 1) % N_FEATURES, (t * 7 + 2) % N_FEATURES];
    let scale = (t % 3 + 1) as f32;
    let leaves = [
        0.1 * scale,
        -0.2 + 0.03 * t as f32,
        0.3 - 0.05 * t as f32,
        -0.1 * (t % 4) as f32,
    ];

    let tree = Tree::new(
        vec![features[0] as u32, features[1] as u32, features[2] as u32, 0, 0, 0, 0],
        vec![
            SPLIT_POINTS[features[0]],
            SPLIT_POINTS[features[1]],
            SPLIT_POINTS[features[2]],
            0.0,
            0.0,
            0.0,
            0.0,
        ],
        vec![1, 3, 5, 0, 0, 0, 0],
        vec![2, 4, 6, 0, 0, 0, 0],
        vec![t % 2 == 0, true, false, false, false, false, false],
        vec![false, false, false, true, true, true, true],
        vec![0.0, 0.0, 0.0, leaves[0], leaves[1], leaves[2], leaves[3]],
    );
    if with_covers {
        let covers = [100.0, 60.0, 40.0, 35.0, 25.0, 10.0, 30.0];
        tree.with_covers(covers.iter().map(|c| c * scale).collect())
    } else {
        tree
    }
}

/// Forest with four trees per output group.
fn fixture_forest(base_score: Vec<f32>, with_covers: bool) -> Forest {
    let n_groups = base_score.len() as u32;
    let mut forest = Forest::new(n_groups).with_base_score(base_score);
    for t in 0..4 * n_groups as usize {
        forest.push_tree(fixture_tree(t, with_covers), t as u32 % n_groups);
    }
    forest
}

// =============================================================================
// Feature Pipeline
// =============================================================================

fn unigram(token: &str) -> NGram {
    NGram::Unigram(token.to_owned())
}

/// One group of every kind, [`N_FEATURES`] features in total.
///
/// Reads columns `age`, `income`, `color`, `review` and `title`.
pub fn feature_groups() -> Vec<FeatureGroup> {
    let review_vocabulary = Vocabulary::new([
        (unigram("good"), 1.2),
        (unigram("bad"), 1.5),
        (unigram("movie"), 0.8),
        (NGram::Bigram("not".into(), "good".into()), 2.0),
    ]);
    let title_vocabulary = Vocabulary::new(
        ["good", "bad", "movie", "great"]
            .into_iter()
            .map(|t| (unigram(t), 1.0)),
    );
    let embeddings = WordEmbeddingModel::new(
        vec!["good".into(), "bad".into(), "movie".into()],
        2,
        vec![1.0, 0.5, -1.0, 0.25, 0.0, 1.0],
    )
    .expect("embedding shape is consistent");

    vec![
        FeatureGroup::Identity(IdentityFeatureGroup::new("age")),
        FeatureGroup::Normalized(NormalizedFeatureGroup::new("income", 50_000.0, 20_000.0)),
        FeatureGroup::OneHotEncoded(OneHotEncodedFeatureGroup::new(
            "color",
            ["red", "green", "blue"],
        )),
        FeatureGroup::BagOfWords(BagOfWordsFeatureGroup {
            source_column_name: "review".into(),
            strategy: BagOfWordsStrategy::TfIdf,
            tokenizer: Tokenizer::default(),
            vocabulary: review_vocabulary,
        }),
        FeatureGroup::BagOfWordsCosineSimilarity(BagOfWordsCosineSimilarityFeatureGroup {
            source_column_name_a: "title".into(),
            source_column_name_b: "review".into(),
            strategy: BagOfWordsStrategy::Count,
            tokenizer: Tokenizer::default(),
            vocabulary: title_vocabulary,
        }),
        FeatureGroup::WordEmbedding(WordEmbeddingFeatureGroup {
            source_column_name: "review".into(),
            tokenizer: Tokenizer::default(),
            model: embeddings,
        }),
    ]
}

/// Records that exercise present, missing, unseen and mistyped values.
pub fn sample_inputs() -> Vec<PredictInput> {
    vec![
        PredictInput::new()
            .with("age", 42)
            .with("income", 61_000)
            .with("color", "green")
            .with("review", "Not good, not a good movie")
            .with("title", "A good movie"),
        PredictInput::new()
            .with("age", "29")
            .with("color", "purple")
            .with("review", "bad BAD movie")
            .with("title", "bad"),
        PredictInput::new(),
        PredictInput::new()
            .with("age", true)
            .with("income", "n/a")
            .with("color", 1.0)
            .with("review", "")
            .with("title", "great"),
        PredictInput::new()
            .with("age", 35)
            .with("income", 50_000)
            .with("color", "red")
            .with("review", "good")
            .with("title", "good")
            .with("unused", "ignored"),
    ]
}

// =============================================================================
// Models
// =============================================================================

/// Deterministic `[n_features + 1, n_groups]` weights, bias in the last row.
fn linear_weights(n_features: usize, n_groups: usize) -> LinearModel {
    let mut weights = Vec::with_capacity((n_features + 1) * n_groups);
    for feature in 0..n_features {
        for group in 0..n_groups {
            weights.push(((feature * 7 + group * 3) % 5) as f32 * 0.25 - 0.5);
        }
    }
    weights.extend((0..n_groups).map(|group| 0.1 * (group + 1) as f32 - 0.2));
    LinearModel::new(weights, n_features, n_groups).expect("weight buffer matches shape")
}

fn binary_task() -> Task {
    Task::BinaryClassification {
        negative_class: "no".into(),
        positive_class: "yes".into(),
    }
}

fn multiclass_task() -> Task {
    Task::MulticlassClassification {
        classes: vec!["low".into(), "medium".into(), "high".into()],
    }
}

fn build(id: &str, task: Task, groups: Vec<FeatureGroup>, predictor: Predictor) -> Model {
    Model::new(id, task, groups, predictor).expect("fixture model is valid")
}

pub fn linear_regression_model() -> Model {
    build(
        "linear-regression",
        Task::Regression,
        feature_groups(),
        Predictor::Linear(linear_weights(N_FEATURES, 1)),
    )
}

pub fn linear_binary_model() -> Model {
    build(
        "linear-binary",
        binary_task(),
        feature_groups(),
        Predictor::Linear(linear_weights(N_FEATURES, 1)),
    )
}

pub fn linear_multiclass_model() -> Model {
    build(
        "linear-multiclass",
        multiclass_task(),
        feature_groups(),
        Predictor::Linear(linear_weights(N_FEATURES, 3)),
    )
}

/// Binary model without features whose raw score is always `score`.
pub fn binary_model_with_score(score: f32) -> Model {
    let predictor = LinearModel::new(vec![score], 0, 1).expect("bias-only model");
    build("constant-binary", binary_task(), Vec::new(), Predictor::Linear(predictor))
}

pub fn tree_regression_model() -> Model {
    build(
        "tree-regression",
        Task::Regression,
        feature_groups(),
        Predictor::TreeEnsemble(fixture_forest(vec![0.5], true)),
    )
}

/// Same shape as [`tree_regression_model`] but without node covers.
pub fn tree_regression_model_without_covers() -> Model {
    build(
        "tree-regression-no-covers",
        Task::Regression,
        feature_groups(),
        Predictor::TreeEnsemble(fixture_forest(vec![0.5], false)),
    )
}

pub fn tree_binary_model() -> Model {
    build(
        "tree-binary",
        binary_task(),
        feature_groups(),
        Predictor::TreeEnsemble(fixture_forest(vec![-0.2], true)),
    )
}

/// Three classes (`low`, `medium`, `high`), with covers.
pub fn tree_multiclass_model() -> Model {
    build(
        "tree-multiclass",
        multiclass_task(),
        feature_groups(),
        Predictor::TreeEnsemble(fixture_forest(vec![0.1, 0.0, -0.1], true)),
    )
}

/// One model of every predictor and task combination.
pub fn all_models() -> Vec<Model> {
    vec![
        linear_regression_model(),
        linear_binary_model(),
        linear_multiclass_model(),
        binary_model_with_score(0.3),
        tree_regression_model(),
        tree_regression_model_without_covers(),
        tree_binary_model(),
        tree_multiclass_model(),
    ]
}
