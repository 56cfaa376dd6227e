//! canopy: tabular model serving for Rust.
//!
//! Loads a trained model from its binary artifact, turns raw column-keyed
//! records into feature vectors, predicts with a linear model or a tree
//! ensemble, and explains predictions as per-feature-group contributions.
//!
//! # Key Types
//!
//! - [`Model`] - Feature pipeline plus predictor, loaded with [`Model::from_bytes`] or [`Model::from_path`]
//! - [`PredictInput`] - One record: column name to number, string or bool
//! - [`PredictOptions`] - Classification threshold and contribution switch
//! - [`PredictOutput`] - Regression value or class with probabilities
//! - [`EventQueue`] - Caller-owned buffer of prediction and outcome events
//!
//! # Predicting
//!
//! ```ignore
//! use canopy::{Model, PredictInput, PredictOptions};
//!
//! let model = Model::from_path("heart_disease.canopy")?;
//! let input = PredictInput::new().with("age", 63).with("chest_pain", "typical angina");
//! let output = model.predict_one(&input, &PredictOptions::default())?;
//! ```
//!
//! Batch prediction with [`Model::predict`] returns one result per record, in
//! input order; [`Model::predict_with_threads`] spreads the batch over a
//! scoped thread pool.

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod events;
pub mod explainability;
pub mod features;
pub mod inference;
pub mod input;
pub mod io;
pub mod model;
pub mod predict;
pub mod repr;
pub mod testing;
pub mod text;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Models and tasks
pub use model::{Model, ModelError, Task, TaskKind};

// Prediction
pub use input::{PredictInput, PredictInputValue};
pub use predict::{ConfigError, PredictError, PredictOptions, PredictOutput};

// Explanations
pub use explainability::{ExplainError, FeatureContributionEntry, FeatureContributions};

// Serialization
pub use io::{DecodeError, EncodeError, ModelInfo, ReadOptions};

// Events
pub use events::EventQueue;

// Shared utilities
pub use utils::{run_with_threads, Parallelism};
