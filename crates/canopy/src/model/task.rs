//! Task metadata.

use serde::{Deserialize, Serialize};

/// Kind of prediction task, without class names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    Regression,
    BinaryClassification,
    MulticlassClassification,
}

impl TaskKind {
    /// Header tag of this kind in the native format.
    pub fn tag(self) -> u8 {
        match self {
            Self::Regression => 0,
            Self::BinaryClassification => 1,
            Self::MulticlassClassification => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Regression),
            1 => Some(Self::BinaryClassification),
            2 => Some(Self::MulticlassClassification),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Regression => "regression",
            Self::BinaryClassification => "binary classification",
            Self::MulticlassClassification => "multiclass classification",
        })
    }
}

/// Prediction task of a model, including the class names it outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Task {
    Regression,
    BinaryClassification {
        negative_class: String,
        positive_class: String,
    },
    MulticlassClassification {
        /// Class names in output-group order.
        classes: Vec<String>,
    },
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Regression => TaskKind::Regression,
            Self::BinaryClassification { .. } => TaskKind::BinaryClassification,
            Self::MulticlassClassification { .. } => TaskKind::MulticlassClassification,
        }
    }

    /// Number of raw scores the predictor must produce for this task.
    pub fn n_outputs(&self) -> usize {
        match self {
            Self::Regression | Self::BinaryClassification { .. } => 1,
            Self::MulticlassClassification { classes } => classes.len(),
        }
    }
}
