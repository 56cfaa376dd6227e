//! Per-feature-group contribution entries.
//!
//! Explainers attribute the raw score to individual features. Callers see one
//! entry per feature group instead, carrying the group's realized feature
//! values next to its net contribution, so each entry can be read without the
//! model at hand.

use serde::{Deserialize, Serialize};

use crate::features::FeatureGroup;
use crate::text::NGram;

/// Decomposition of one raw output into a baseline and per-group contributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContributions {
    /// Output with every feature at its baseline.
    pub baseline_value: f32,
    /// Actual raw output for the record.
    pub output_value: f32,
    /// One entry per feature group, in group order.
    pub entries: Vec<FeatureContributionEntry>,
}

impl FeatureContributions {
    /// Aggregate per-feature contributions into per-group entries.
    ///
    /// `features` and `contributions` are aligned with the model's feature
    /// vector.
    pub fn from_features(
        groups: &[FeatureGroup],
        features: &[f32],
        contributions: &[f64],
        baseline_value: f64,
        output_value: f32,
    ) -> Self {
        debug_assert_eq!(features.len(), contributions.len());
        let mut offset = 0;
        let entries = groups
            .iter()
            .map(|group| {
                let width = group.n_features();
                let range = offset..offset + width;
                offset += width;
                FeatureContributionEntry::new(group, &features[range.clone()], &contributions[range])
            })
            .collect();
        Self {
            baseline_value: baseline_value as f32,
            output_value,
            entries,
        }
    }

    /// Sum of all entries' contributions.
    pub fn total_contribution(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.feature_contribution_value() as f64)
            .sum()
    }

    /// Whether `baseline + contributions` reproduces the output within a
    /// relative `tolerance` (absolute for outputs smaller than 1).
    pub fn verify(&self, tolerance: f64) -> bool {
        let output = self.output_value as f64;
        let reconstructed = self.baseline_value as f64 + self.total_contribution();
        (reconstructed - output).abs() <= tolerance * output.abs().max(1.0)
    }
}

/// Contribution of one feature group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureContributionEntry {
    Identity(IdentityFeatureContribution),
    Normalized(NormalizedFeatureContribution),
    OneHotEncoded(OneHotEncodedFeatureContribution),
    BagOfWords(BagOfWordsFeatureContribution),
    BagOfWordsCosineSimilarity(BagOfWordsCosineSimilarityFeatureContribution),
    WordEmbedding(WordEmbeddingFeatureContribution),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityFeatureContribution {
    pub column_name: String,
    pub feature_value: f32,
    pub feature_contribution_value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeatureContribution {
    pub column_name: String,
    /// The normalized value, not the raw input.
    pub feature_value: f32,
    pub feature_contribution_value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncodedFeatureContribution {
    pub column_name: String,
    /// The variant the record matched, if any.
    pub variant: Option<String>,
    pub variants: Vec<VariantContribution>,
    pub feature_contribution_value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantContribution {
    pub variant: String,
    pub feature_value: bool,
    pub feature_contribution_value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagOfWordsFeatureContribution {
    pub column_name: String,
    /// N-grams with a non-zero value or contribution, in vocabulary order.
    pub ngrams: Vec<NGramContribution>,
    pub feature_contribution_value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NGramContribution {
    pub ngram: NGram,
    pub feature_value: f32,
    pub feature_contribution_value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagOfWordsCosineSimilarityFeatureContribution {
    pub column_name_a: String,
    pub column_name_b: String,
    pub feature_value: f32,
    pub feature_contribution_value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEmbeddingFeatureContribution {
    pub column_name: String,
    /// Pooled embedding, one value per dimension.
    pub feature_values: Vec<f32>,
    pub feature_contribution_values: Vec<f32>,
    pub feature_contribution_value: f32,
}

impl FeatureContributionEntry {
    /// Build the entry of `group` from its slice of features and contributions.
    pub fn new(group: &FeatureGroup, features: &[f32], contributions: &[f64]) -> Self {
        let total = contributions.iter().sum::<f64>() as f32;
        match group {
            FeatureGroup::Identity(group) => Self::Identity(IdentityFeatureContribution {
                column_name: group.source_column_name.clone(),
                feature_value: features[0],
                feature_contribution_value: total,
            }),
            FeatureGroup::Normalized(group) => Self::Normalized(NormalizedFeatureContribution {
                column_name: group.source_column_name.clone(),
                feature_value: features[0],
                feature_contribution_value: total,
            }),
            FeatureGroup::OneHotEncoded(group) => {
                let variants: Vec<VariantContribution> = group
                    .variants()
                    .zip(features.iter().zip(contributions))
                    .map(|(variant, (&value, &contribution))| VariantContribution {
                        variant: variant.to_owned(),
                        feature_value: value > 0.0,
                        feature_contribution_value: contribution as f32,
                    })
                    .collect();
                let variant = variants
                    .iter()
                    .find(|v| v.feature_value)
                    .map(|v| v.variant.clone());
                Self::OneHotEncoded(OneHotEncodedFeatureContribution {
                    column_name: group.source_column_name.clone(),
                    variant,
                    variants,
                    feature_contribution_value: total,
                })
            }
            FeatureGroup::BagOfWords(group) => {
                let ngrams = features
                    .iter()
                    .zip(contributions)
                    .enumerate()
                    .filter(|(_, (&value, &contribution))| value != 0.0 || contribution != 0.0)
                    .filter_map(|(index, (&value, &contribution))| {
                        group.vocabulary.ngram(index).map(|ngram| NGramContribution {
                            ngram: ngram.clone(),
                            feature_value: value,
                            feature_contribution_value: contribution as f32,
                        })
                    })
                    .collect();
                Self::BagOfWords(BagOfWordsFeatureContribution {
                    column_name: group.source_column_name.clone(),
                    ngrams,
                    feature_contribution_value: total,
                })
            }
            FeatureGroup::BagOfWordsCosineSimilarity(group) => {
                Self::BagOfWordsCosineSimilarity(BagOfWordsCosineSimilarityFeatureContribution {
                    column_name_a: group.source_column_name_a.clone(),
                    column_name_b: group.source_column_name_b.clone(),
                    feature_value: features[0],
                    feature_contribution_value: total,
                })
            }
            FeatureGroup::WordEmbedding(group) => {
                Self::WordEmbedding(WordEmbeddingFeatureContribution {
                    column_name: group.source_column_name.clone(),
                    feature_values: features.to_vec(),
                    feature_contribution_values: contributions.iter().map(|&c| c as f32).collect(),
                    feature_contribution_value: total,
                })
            }
        }
    }

    /// Net contribution of the group.
    pub fn feature_contribution_value(&self) -> f32 {
        match self {
            Self::Identity(entry) => entry.feature_contribution_value,
            Self::Normalized(entry) => entry.feature_contribution_value,
            Self::OneHotEncoded(entry) => entry.feature_contribution_value,
            Self::BagOfWords(entry) => entry.feature_contribution_value,
            Self::BagOfWordsCosineSimilarity(entry) => entry.feature_contribution_value,
            Self::WordEmbedding(entry) => entry.feature_contribution_value,
        }
    }
}
