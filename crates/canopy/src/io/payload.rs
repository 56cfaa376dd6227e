//! Payload structures for the native model format.
//!
//! These mirror the runtime types in a flat, Postcard-friendly shape: plain
//! structs, externally tagged enums and row-major vectors. They carry no
//! invariants of their own; [`super::convert`] validates them on the way in.

use serde::{Deserialize, Serialize};

use crate::features::BagOfWordsStrategy;
use crate::text::{NGram, Tokenizer};

// ============================================================================
// Top-Level Payload
// ============================================================================

/// Version-tagged payload.
///
/// New format versions add variants rather than changing existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    V1(PayloadV1),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadV1 {
    pub id: String,
    pub task: TaskPayload,
    pub feature_groups: Vec<FeatureGroupPayload>,
    pub predictor: PredictorPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPayload {
    Regression,
    BinaryClassification {
        negative_class: String,
        positive_class: String,
    },
    MulticlassClassification {
        classes: Vec<String>,
    },
}

// ============================================================================
// Feature Groups
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureGroupPayload {
    Identity {
        source_column_name: String,
    },
    Normalized {
        source_column_name: String,
        mean: f32,
        stddev: f32,
    },
    OneHotEncoded {
        source_column_name: String,
        variants: Vec<String>,
    },
    BagOfWords {
        source_column_name: String,
        strategy: BagOfWordsStrategy,
        tokenizer: Tokenizer,
        vocabulary: Vec<VocabularyEntryPayload>,
    },
    BagOfWordsCosineSimilarity {
        source_column_name_a: String,
        source_column_name_b: String,
        strategy: BagOfWordsStrategy,
        tokenizer: Tokenizer,
        vocabulary: Vec<VocabularyEntryPayload>,
    },
    WordEmbedding {
        source_column_name: String,
        tokenizer: Tokenizer,
        words: Vec<String>,
        /// Embedding dimension.
        size: u32,
        /// Row-major `[words.len(), size]`.
        values: Vec<f32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntryPayload {
    pub ngram: NGram,
    pub idf: f32,
}

// ============================================================================
// Predictors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PredictorPayload {
    Linear(LinearPayload),
    TreeEnsemble(ForestPayload),
}

/// Linear weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPayload {
    pub n_features: u32,
    pub n_outputs: u32,
    /// Row-major `[n_features + 1, n_outputs]`, biases in the last row.
    pub weights: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestPayload {
    pub n_groups: u32,
    pub base_scores: Vec<f32>,
    /// Output group of each tree.
    pub tree_groups: Vec<u32>,
    pub trees: Vec<TreePayload>,
}

/// One tree as parallel per-node arrays; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreePayload {
    pub split_features: Vec<u32>,
    pub thresholds: Vec<f32>,
    pub left_children: Vec<u32>,
    pub right_children: Vec<u32>,
    pub default_left: Vec<bool>,
    pub is_leaf: Vec<bool>,
    pub leaf_values: Vec<f32>,
    /// Training weight reaching each node, needed for contributions.
    pub covers: Option<Vec<f32>>,
}
