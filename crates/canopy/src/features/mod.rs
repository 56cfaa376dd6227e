//! Feature pipeline: raw input records to numeric feature vectors.
//!
//! A model owns an ordered list of [`FeatureGroup`]s. Each group reads one or
//! two input columns and writes a fixed number of features; the concatenation
//! of all groups' outputs, in group order, is the predictor's input row.
//!
//! Every group has a baseline output used for missing input: 0 for identity,
//! normalized, cosine similarity and word embedding, the all-zero vector for
//! one-hot and bag-of-words.

mod bag_of_words;
mod bag_of_words_cosine_similarity;
mod identity;
mod normalized;
mod one_hot_encoded;
mod word_embedding;

use ndarray::{Array1, Array2, ArrayViewMut1, Axis};

pub use bag_of_words::{BagOfWordsFeatureGroup, BagOfWordsStrategy, Vocabulary};
pub use bag_of_words_cosine_similarity::BagOfWordsCosineSimilarityFeatureGroup;
pub use identity::IdentityFeatureGroup;
pub use normalized::NormalizedFeatureGroup;
pub use one_hot_encoded::OneHotEncodedFeatureGroup;
pub use word_embedding::{WordEmbeddingFeatureGroup, WordEmbeddingModel};

use crate::input::PredictInput;
use crate::utils::Parallelism;

/// A transform from input columns to a contiguous block of features.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGroup {
    Identity(IdentityFeatureGroup),
    Normalized(NormalizedFeatureGroup),
    OneHotEncoded(OneHotEncodedFeatureGroup),
    BagOfWords(BagOfWordsFeatureGroup),
    BagOfWordsCosineSimilarity(BagOfWordsCosineSimilarityFeatureGroup),
    WordEmbedding(WordEmbeddingFeatureGroup),
}

impl FeatureGroup {
    /// Number of features this group writes.
    pub fn n_features(&self) -> usize {
        match self {
            Self::Identity(_) | Self::Normalized(_) | Self::BagOfWordsCosineSimilarity(_) => 1,
            Self::OneHotEncoded(group) => group.n_features(),
            Self::BagOfWords(group) => group.n_features(),
            Self::WordEmbedding(group) => group.n_features(),
        }
    }

    /// Input columns this group reads.
    pub fn source_columns(&self) -> Vec<&str> {
        match self {
            Self::Identity(group) => vec![&group.source_column_name],
            Self::Normalized(group) => vec![&group.source_column_name],
            Self::OneHotEncoded(group) => vec![&group.source_column_name],
            Self::BagOfWords(group) => vec![&group.source_column_name],
            Self::BagOfWordsCosineSimilarity(group) => {
                vec![&group.source_column_name_a, &group.source_column_name_b]
            }
            Self::WordEmbedding(group) => vec![&group.source_column_name],
        }
    }

    /// Write this group's features for `input` into `out`.
    ///
    /// `out` must have exactly [`n_features`](Self::n_features) elements.
    pub fn compute(&self, input: &PredictInput, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.n_features());
        match self {
            Self::Identity(group) => group.compute(input, out),
            Self::Normalized(group) => group.compute(input, out),
            Self::OneHotEncoded(group) => group.compute(input, out),
            Self::BagOfWords(group) => group.compute(input, out),
            Self::BagOfWordsCosineSimilarity(group) => group.compute(input, out),
            Self::WordEmbedding(group) => group.compute(input, out),
        }
    }
}

/// Narrow a numeric feature to `f32`, or `None` if it is not representable.
pub(crate) fn to_feature(column: &str, value: f64) -> Option<f32> {
    let narrowed = value as f32;
    if !narrowed.is_finite() {
        log::debug!("column {column:?}: {value} overflows a feature value, treating as missing");
        return None;
    }
    Some(narrowed)
}

/// Total feature count of a group list.
pub fn n_features(groups: &[FeatureGroup]) -> usize {
    groups.iter().map(FeatureGroup::n_features).sum()
}

/// Compute the feature vector of one record.
pub fn compute_features(groups: &[FeatureGroup], input: &PredictInput) -> Array1<f32> {
    let mut row = Array1::zeros(n_features(groups));
    compute_features_into(groups, input, row.view_mut());
    row
}

/// Compute the feature vector of one record into an existing row.
///
/// # Panics
///
/// Panics if the length of `row` differs from [`n_features`].
pub fn compute_features_into(
    groups: &[FeatureGroup],
    input: &PredictInput,
    mut row: ArrayViewMut1<'_, f32>,
) {
    assert_eq!(row.len(), n_features(groups), "feature row length mismatch");
    if let Some(slice) = row.as_slice_mut() {
        write_groups(groups, input, slice);
        return;
    }
    let mut buffer = vec![0.0; row.len()];
    write_groups(groups, input, &mut buffer);
    row.iter_mut().zip(buffer).for_each(|(dst, v)| *dst = v);
}

fn write_groups(groups: &[FeatureGroup], input: &PredictInput, out: &mut [f32]) {
    let mut offset = 0;
    for group in groups {
        let width = group.n_features();
        group.compute(input, &mut out[offset..offset + width]);
        offset += width;
    }
}

/// Compute the feature matrix `[n_records, n_features]` of a batch.
pub fn compute_features_batch(
    groups: &[FeatureGroup],
    inputs: &[PredictInput],
    parallelism: Parallelism,
) -> Array2<f32> {
    let mut features = Array2::zeros((inputs.len(), n_features(groups)));
    parallelism.maybe_par_bridge_for_each(
        features.axis_iter_mut(Axis(0)).zip(inputs),
        |(row, input)| compute_features_into(groups, input, row),
    );
    features
}
