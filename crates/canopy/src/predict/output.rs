//! Prediction outputs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::explainability::FeatureContributions;

/// The result of predicting one record, shaped by the model's task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredictOutput {
    Regression(RegressionPredictOutput),
    BinaryClassification(BinaryClassificationPredictOutput),
    MulticlassClassification(MulticlassClassificationPredictOutput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionPredictOutput {
    pub value: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_contributions: Option<FeatureContributions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryClassificationPredictOutput {
    pub class_name: String,
    /// Probability of `class_name`, not of the positive class.
    pub probability: f32,
    /// Contributions to the positive-class logit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_contributions: Option<FeatureContributions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MulticlassClassificationPredictOutput {
    pub class_name: String,
    pub probability: f32,
    /// Probability of every class, in model class order.
    pub probabilities: IndexMap<String, f32>,
    /// Contributions to every class's logit, in model class order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_contributions: Option<IndexMap<String, FeatureContributions>>,
}

impl PredictOutput {
    /// Predicted class name; `None` for regression.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Regression(_) => None,
            Self::BinaryClassification(output) => Some(&output.class_name),
            Self::MulticlassClassification(output) => Some(&output.class_name),
        }
    }
}
