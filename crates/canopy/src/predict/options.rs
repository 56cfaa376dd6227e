//! Prediction options with builder pattern.
//!
//! ```
//! use canopy::predict::PredictOptions;
//!
//! let options = PredictOptions::builder()
//!     .threshold(0.8)
//!     .compute_feature_contributions(true)
//!     .build()
//!     .unwrap();
//! assert_eq!(options.threshold, 0.8);
//!
//! assert!(PredictOptions::builder().threshold(1.5).build().is_err());
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

// =============================================================================
// ConfigError
// =============================================================================

/// Invalid option values.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Threshold must be a finite probability.
    InvalidThreshold(f32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidThreshold(v) => write!(f, "threshold must be in [0, 1], got {}", v),
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// PredictOptions
// =============================================================================

/// Per-call prediction options.
///
/// Serialized as-is into prediction events.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
pub struct PredictOptions {
    /// Binary classification decision boundary on the positive-class probability.
    #[builder(default = 0.5)]
    pub threshold: f32,

    /// Attach per-feature-group contributions to every output.
    #[builder(default)]
    pub compute_feature_contributions: bool,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            compute_feature_contributions: false,
        }
    }
}

impl<S: predict_options_builder::IsComplete> PredictOptionsBuilder<S> {
    /// Build and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreshold`] unless `0 <= threshold <= 1`.
    pub fn build(self) -> Result<PredictOptions, ConfigError> {
        let options = self.__build_internal();
        options.validate()?;
        Ok(options)
    }
}

impl PredictOptions {
    /// Check option values. Options assembled by hand or deserialized are
    /// validated again before use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}
