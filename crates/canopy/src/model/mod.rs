//! Loaded models.
//!
//! A [`Model`] bundles a feature pipeline with the predictor trained on its
//! output. It is immutable once constructed and can be shared across threads
//! for concurrent prediction.

mod task;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use itertools::Itertools;
use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::features::{self, FeatureGroup};
use crate::inference::Predictor;
use crate::input::PredictInput;
use crate::io::native::{self, DecodeError, EncodeError, ReadOptions};
use crate::repr::gbdt::ForestValidationError;
use crate::utils::Parallelism;

pub use task::{Task, TaskKind};

/// Structural inconsistencies between the parts of a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("feature groups produce {groups} features but the predictor expects {predictor}")]
    FeatureWidthMismatch { groups: usize, predictor: usize },

    #[error("{task} task needs {expected} outputs, predictor has {actual}")]
    OutputCountMismatch {
        task: TaskKind,
        expected: usize,
        actual: usize,
    },

    #[error("multiclass task needs at least 2 classes, got {0}")]
    TooFewClasses(usize),

    #[error("class {0:?} is named more than once")]
    DuplicateClass(String),

    #[error("invalid forest: {0}")]
    InvalidForest(#[from] ForestValidationError),
}

/// A trained model ready for prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    id: String,
    task: Task,
    feature_groups: Vec<FeatureGroup>,
    predictor: Predictor,
    n_features: usize,
}

impl Model {
    /// Assemble a model from its parts, checking that they fit together.
    ///
    /// The feature groups must produce exactly as many features as the
    /// predictor consumes, the predictor must produce one output per task
    /// output and every tree must be traversable for that feature width.
    pub fn new(
        id: impl Into<String>,
        task: Task,
        feature_groups: Vec<FeatureGroup>,
        predictor: Predictor,
    ) -> Result<Self, ModelError> {
        match &task {
            Task::Regression => {}
            Task::BinaryClassification {
                negative_class,
                positive_class,
            } => {
                if negative_class == positive_class {
                    return Err(ModelError::DuplicateClass(positive_class.clone()));
                }
            }
            Task::MulticlassClassification { classes } => {
                if classes.len() < 2 {
                    return Err(ModelError::TooFewClasses(classes.len()));
                }
                if let Some(class) = classes.iter().duplicates().next() {
                    return Err(ModelError::DuplicateClass(class.clone()));
                }
            }
        }
        if task.n_outputs() != predictor.n_outputs() {
            return Err(ModelError::OutputCountMismatch {
                task: task.kind(),
                expected: task.n_outputs(),
                actual: predictor.n_outputs(),
            });
        }

        let n_features = features::n_features(&feature_groups);
        match &predictor {
            Predictor::Linear(linear) => {
                if linear.n_features() != n_features {
                    return Err(ModelError::FeatureWidthMismatch {
                        groups: n_features,
                        predictor: linear.n_features(),
                    });
                }
            }
            Predictor::TreeEnsemble(forest) => forest.validate(n_features)?,
        }

        Ok(Self {
            id: id.into(),
            task,
            feature_groups,
            predictor,
            n_features,
        })
    }

    // =========================================================================
    // Loading and saving
    // =========================================================================

    /// Decode a model from its native binary representation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes_with(bytes, &ReadOptions::default())
    }

    pub fn from_bytes_with(bytes: &[u8], options: &ReadOptions) -> Result<Self, DecodeError> {
        let model = native::decode_model(bytes, options)?;
        log::info!(
            "loaded model {:?}: {}, {} feature groups, {} features, {} bytes",
            model.id,
            model.task.kind(),
            model.feature_groups.len(),
            model.n_features,
            bytes.len()
        );
        Ok(model)
    }

    /// Load a model file.
    ///
    /// The file is memory-mapped and decoded exactly as [`from_bytes`](Self::from_bytes)
    /// would decode its contents. The mapping is released before returning.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        log::debug!("mapping model file {}", path.display());
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and dropped before this function
        // returns; the decoded model owns copies of everything it needs.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    /// Encode the model in the current native format version.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        native::encode_model(self)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), EncodeError> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    pub fn write_path(&self, path: impl AsRef<Path>) -> Result<(), EncodeError> {
        let mut file = File::create(path)?;
        self.write_to(&mut file)?;
        file.sync_all()?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn feature_groups(&self) -> &[FeatureGroup] {
        &self.feature_groups
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    /// Width of the feature vector the pipeline produces.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    // =========================================================================
    // Feature pipeline
    // =========================================================================

    /// Feature vector for one record.
    pub fn compute_features(&self, input: &PredictInput) -> Array1<f32> {
        features::compute_features(&self.feature_groups, input)
    }

    /// Feature matrix `[inputs.len(), n_features]`, rows in input order.
    pub fn compute_features_batch(
        &self,
        inputs: &[PredictInput],
        parallelism: Parallelism,
    ) -> Array2<f32> {
        features::compute_features_batch(&self.feature_groups, inputs, parallelism)
    }
}
