//! Feature contributions.
//!
//! Explainers attribute a raw score to individual features relative to the
//! all-baseline input; [`contributions`] folds those per-feature values into
//! one entry per feature group.

pub mod contributions;
pub mod shap;

use thiserror::Error;

use crate::inference::Predictor;

pub use contributions::{
    BagOfWordsCosineSimilarityFeatureContribution, BagOfWordsFeatureContribution,
    FeatureContributionEntry, FeatureContributions, IdentityFeatureContribution,
    NGramContribution, NormalizedFeatureContribution, OneHotEncodedFeatureContribution,
    VariantContribution, WordEmbeddingFeatureContribution,
};
pub use shap::{LinearExplainer, ShapValues, TreeExplainer};

/// Errors raised when a predictor cannot be explained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplainError {
    #[error("missing node statistics: {0}")]
    MissingNodeStats(&'static str),

    #[error("tree {tree_idx}: node {node} has a non-positive cover")]
    NonPositiveCover { tree_idx: usize, node: usize },

    #[error("tree {tree_idx} has depth {depth}, explainable depth is at most {max_depth}")]
    TreeTooDeep {
        tree_idx: usize,
        depth: usize,
        max_depth: usize,
    },
}

/// An explainer for any [`Predictor`].
#[derive(Debug, Clone)]
pub enum Explainer<'a> {
    Linear(LinearExplainer<'a>),
    Tree(TreeExplainer<'a>),
}

impl<'a> Explainer<'a> {
    pub fn new(predictor: &'a Predictor) -> Result<Self, ExplainError> {
        Ok(match predictor {
            Predictor::Linear(model) => Self::Linear(LinearExplainer::new(model)),
            Predictor::TreeEnsemble(forest) => Self::Tree(TreeExplainer::new(forest)?),
        })
    }

    pub fn base_value(&self, output: usize) -> f64 {
        match self {
            Self::Linear(explainer) => explainer.base_value(output),
            Self::Tree(explainer) => explainer.base_value(output),
        }
    }

    pub fn explain_row(&self, features: &[f32]) -> ShapValues {
        match self {
            Self::Linear(explainer) => explainer.explain_row(features),
            Self::Tree(explainer) => explainer.explain_row(features),
        }
    }
}
