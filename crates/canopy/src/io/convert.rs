//! Conversion between runtime types and payload types.
//!
//! Encoding (`From<&Model>`) is infallible. Decoding (`TryFrom<PayloadV1>`)
//! rebuilds every runtime structure and runs the same structural checks as
//! [`Model::new`], so a decoded model is never partially valid.

use super::native::DecodeError;
use super::payload::{
    FeatureGroupPayload, ForestPayload, LinearPayload, PayloadV1, PredictorPayload, TaskPayload,
    TreePayload, VocabularyEntryPayload,
};
use crate::features::{
    BagOfWordsCosineSimilarityFeatureGroup, BagOfWordsFeatureGroup, FeatureGroup,
    IdentityFeatureGroup, NormalizedFeatureGroup, OneHotEncodedFeatureGroup, Vocabulary,
    WordEmbeddingFeatureGroup, WordEmbeddingModel,
};
use crate::inference::Predictor;
use crate::model::{Model, Task};
use crate::repr::gbdt::{Forest, Tree};
use crate::repr::linear::LinearModel;

fn corrupt(message: impl Into<String>) -> DecodeError {
    DecodeError::CorruptPayload(message.into())
}

// =============================================================================
// Task
// =============================================================================

impl From<&Task> for TaskPayload {
    fn from(task: &Task) -> Self {
        match task {
            Task::Regression => Self::Regression,
            Task::BinaryClassification {
                negative_class,
                positive_class,
            } => Self::BinaryClassification {
                negative_class: negative_class.clone(),
                positive_class: positive_class.clone(),
            },
            Task::MulticlassClassification { classes } => Self::MulticlassClassification {
                classes: classes.clone(),
            },
        }
    }
}

impl From<TaskPayload> for Task {
    fn from(payload: TaskPayload) -> Self {
        match payload {
            TaskPayload::Regression => Self::Regression,
            TaskPayload::BinaryClassification {
                negative_class,
                positive_class,
            } => Self::BinaryClassification {
                negative_class,
                positive_class,
            },
            TaskPayload::MulticlassClassification { classes } => {
                Self::MulticlassClassification { classes }
            }
        }
    }
}

// =============================================================================
// Feature groups
// =============================================================================

fn vocabulary_payload(vocabulary: &Vocabulary) -> Vec<VocabularyEntryPayload> {
    vocabulary
        .entries()
        .map(|(ngram, idf)| VocabularyEntryPayload {
            ngram: ngram.clone(),
            idf,
        })
        .collect()
}

fn vocabulary_from_payload(
    column: &str,
    entries: Vec<VocabularyEntryPayload>,
) -> Result<Vocabulary, DecodeError> {
    let n_entries = entries.len();
    if let Some(entry) = entries.iter().find(|e| !e.idf.is_finite()) {
        return Err(corrupt(format!("column {column:?}: non-finite idf for {}", entry.ngram)));
    }
    let vocabulary = Vocabulary::new(entries.into_iter().map(|e| (e.ngram, e.idf)));
    if vocabulary.len() != n_entries {
        return Err(corrupt(format!("column {column:?}: duplicate vocabulary entries")));
    }
    Ok(vocabulary)
}

impl From<&FeatureGroup> for FeatureGroupPayload {
    fn from(group: &FeatureGroup) -> Self {
        match group {
            FeatureGroup::Identity(group) => Self::Identity {
                source_column_name: group.source_column_name.clone(),
            },
            FeatureGroup::Normalized(group) => Self::Normalized {
                source_column_name: group.source_column_name.clone(),
                mean: group.mean,
                stddev: group.stddev,
            },
            FeatureGroup::OneHotEncoded(group) => Self::OneHotEncoded {
                source_column_name: group.source_column_name.clone(),
                variants: group.variants().map(str::to_owned).collect(),
            },
            FeatureGroup::BagOfWords(group) => Self::BagOfWords {
                source_column_name: group.source_column_name.clone(),
                strategy: group.strategy,
                tokenizer: group.tokenizer.clone(),
                vocabulary: vocabulary_payload(&group.vocabulary),
            },
            FeatureGroup::BagOfWordsCosineSimilarity(group) => Self::BagOfWordsCosineSimilarity {
                source_column_name_a: group.source_column_name_a.clone(),
                source_column_name_b: group.source_column_name_b.clone(),
                strategy: group.strategy,
                tokenizer: group.tokenizer.clone(),
                vocabulary: vocabulary_payload(&group.vocabulary),
            },
            FeatureGroup::WordEmbedding(group) => Self::WordEmbedding {
                source_column_name: group.source_column_name.clone(),
                tokenizer: group.tokenizer.clone(),
                words: group.model.words().map(str::to_owned).collect(),
                size: group.model.size() as u32,
                values: group.model.values().collect(),
            },
        }
    }
}

impl TryFrom<FeatureGroupPayload> for FeatureGroup {
    type Error = DecodeError;

    fn try_from(payload: FeatureGroupPayload) -> Result<Self, Self::Error> {
        Ok(match payload {
            FeatureGroupPayload::Identity { source_column_name } => {
                Self::Identity(IdentityFeatureGroup::new(source_column_name))
            }
            FeatureGroupPayload::Normalized {
                source_column_name,
                mean,
                stddev,
            } => {
                if !mean.is_finite() || !stddev.is_finite() {
                    return Err(corrupt(format!(
                        "column {source_column_name:?}: non-finite normalization parameters"
                    )));
                }
                Self::Normalized(NormalizedFeatureGroup::new(source_column_name, mean, stddev))
            }
            FeatureGroupPayload::OneHotEncoded {
                source_column_name,
                variants,
            } => {
                let n_variants = variants.len();
                let group = OneHotEncodedFeatureGroup::new(source_column_name, variants);
                if group.n_features() != n_variants {
                    return Err(corrupt(format!(
                        "column {:?}: duplicate one-hot variants",
                        group.source_column_name
                    )));
                }
                Self::OneHotEncoded(group)
            }
            FeatureGroupPayload::BagOfWords {
                source_column_name,
                strategy,
                tokenizer,
                vocabulary,
            } => {
                let vocabulary = vocabulary_from_payload(&source_column_name, vocabulary)?;
                Self::BagOfWords(BagOfWordsFeatureGroup {
                    source_column_name,
                    strategy,
                    tokenizer,
                    vocabulary,
                })
            }
            FeatureGroupPayload::BagOfWordsCosineSimilarity {
                source_column_name_a,
                source_column_name_b,
                strategy,
                tokenizer,
                vocabulary,
            } => {
                let vocabulary = vocabulary_from_payload(&source_column_name_a, vocabulary)?;
                Self::BagOfWordsCosineSimilarity(BagOfWordsCosineSimilarityFeatureGroup {
                    source_column_name_a,
                    source_column_name_b,
                    strategy,
                    tokenizer,
                    vocabulary,
                })
            }
            FeatureGroupPayload::WordEmbedding {
                source_column_name,
                tokenizer,
                words,
                size,
                values,
            } => {
                let model = WordEmbeddingModel::new(words, size as usize, values).ok_or_else(|| {
                    corrupt(format!(
                        "column {source_column_name:?}: embedding table does not match its words"
                    ))
                })?;
                Self::WordEmbedding(WordEmbeddingFeatureGroup {
                    source_column_name,
                    tokenizer,
                    model,
                })
            }
        })
    }
}

// =============================================================================
// Predictors
// =============================================================================

impl From<&Tree> for TreePayload {
    fn from(tree: &Tree) -> Self {
        let arrays = tree.arrays();
        Self {
            split_features: arrays.split_indices.to_vec(),
            thresholds: arrays.split_thresholds.to_vec(),
            left_children: arrays.left_children.to_vec(),
            right_children: arrays.right_children.to_vec(),
            default_left: arrays.default_left.to_vec(),
            is_leaf: arrays.is_leaf.to_vec(),
            leaf_values: arrays.leaf_values.to_vec(),
            covers: tree.covers().map(<[f32]>::to_vec),
        }
    }
}

impl From<TreePayload> for Tree {
    /// Structure is checked later by [`Forest::validate`].
    fn from(payload: TreePayload) -> Self {
        let tree = Tree::new(
            payload.split_features,
            payload.thresholds,
            payload.left_children,
            payload.right_children,
            payload.default_left,
            payload.is_leaf,
            payload.leaf_values,
        );
        match payload.covers {
            Some(covers) => tree.with_covers(covers),
            None => tree,
        }
    }
}

impl From<&Forest> for ForestPayload {
    fn from(forest: &Forest) -> Self {
        Self {
            n_groups: forest.n_groups(),
            base_scores: forest.base_score().to_vec(),
            tree_groups: forest.tree_groups().to_vec(),
            trees: forest.trees().map(TreePayload::from).collect(),
        }
    }
}

impl From<ForestPayload> for Forest {
    fn from(payload: ForestPayload) -> Self {
        Forest::from_parts(
            payload.trees.into_iter().map(Tree::from).collect(),
            payload.tree_groups,
            payload.n_groups,
            payload.base_scores,
        )
    }
}

impl From<&LinearModel> for LinearPayload {
    fn from(model: &LinearModel) -> Self {
        Self {
            n_features: model.n_features() as u32,
            n_outputs: model.n_groups() as u32,
            weights: model.as_array().iter().copied().collect(),
        }
    }
}

impl TryFrom<LinearPayload> for LinearModel {
    type Error = DecodeError;

    fn try_from(payload: LinearPayload) -> Result<Self, Self::Error> {
        let len = payload.weights.len();
        LinearModel::new(
            payload.weights,
            payload.n_features as usize,
            payload.n_outputs as usize,
        )
        .ok_or_else(|| {
            corrupt(format!(
                "linear weights: {len} values for {} features and {} outputs",
                payload.n_features, payload.n_outputs
            ))
        })
    }
}

impl From<&Predictor> for PredictorPayload {
    fn from(predictor: &Predictor) -> Self {
        match predictor {
            Predictor::Linear(model) => Self::Linear(model.into()),
            Predictor::TreeEnsemble(forest) => Self::TreeEnsemble(forest.into()),
        }
    }
}

impl TryFrom<PredictorPayload> for Predictor {
    type Error = DecodeError;

    fn try_from(payload: PredictorPayload) -> Result<Self, Self::Error> {
        Ok(match payload {
            PredictorPayload::Linear(linear) => Self::Linear(linear.try_into()?),
            PredictorPayload::TreeEnsemble(forest) => Self::TreeEnsemble(forest.into()),
        })
    }
}

// =============================================================================
// Model
// =============================================================================

impl From<&Model> for PayloadV1 {
    fn from(model: &Model) -> Self {
        Self {
            id: model.id().to_owned(),
            task: model.task().into(),
            feature_groups: model.feature_groups().iter().map(Into::into).collect(),
            predictor: model.predictor().into(),
        }
    }
}

impl TryFrom<PayloadV1> for Model {
    type Error = DecodeError;

    fn try_from(payload: PayloadV1) -> Result<Self, Self::Error> {
        let feature_groups = payload
            .feature_groups
            .into_iter()
            .map(FeatureGroup::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let predictor = Predictor::try_from(payload.predictor)?;
        Model::new(payload.id, payload.task.into(), feature_groups, predictor)
            .map_err(|e| corrupt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::text::{NGram, Tokenizer};

    #[test]
    fn model_round_trip() {
        for model in testing::all_models() {
            let payload = PayloadV1::from(&model);
            let decoded = Model::try_from(payload).unwrap();
            assert_eq!(decoded, model);
        }
    }

    #[test]
    fn duplicate_vocabulary_is_corrupt() {
        let payload = FeatureGroupPayload::BagOfWords {
            source_column_name: "text".into(),
            strategy: Default::default(),
            tokenizer: Tokenizer::default(),
            vocabulary: vec![
                VocabularyEntryPayload {
                    ngram: NGram::Unigram("a".into()),
                    idf: 1.0,
                },
                VocabularyEntryPayload {
                    ngram: NGram::Unigram("a".into()),
                    idf: 2.0,
                },
            ],
        };
        assert!(matches!(
            FeatureGroup::try_from(payload),
            Err(DecodeError::CorruptPayload(_))
        ));
    }

    #[test]
    fn duplicate_variants_are_corrupt() {
        let payload = FeatureGroupPayload::OneHotEncoded {
            source_column_name: "color".into(),
            variants: vec!["red".into(), "red".into()],
        };
        assert!(matches!(
            FeatureGroup::try_from(payload),
            Err(DecodeError::CorruptPayload(_))
        ));
    }

    #[test]
    fn embedding_shape_mismatch_is_corrupt() {
        let payload = FeatureGroupPayload::WordEmbedding {
            source_column_name: "text".into(),
            tokenizer: Tokenizer::default(),
            words: vec!["a".into(), "b".into()],
            size: 2,
            values: vec![0.0; 3],
        };
        assert!(matches!(
            FeatureGroup::try_from(payload),
            Err(DecodeError::CorruptPayload(_))
        ));
    }

    #[test]
    fn linear_length_mismatch_is_corrupt() {
        let payload = LinearPayload {
            n_features: 2,
            n_outputs: 1,
            weights: vec![1.0, 2.0],
        };
        assert!(matches!(
            LinearModel::try_from(payload),
            Err(DecodeError::CorruptPayload(_))
        ));
    }
}
