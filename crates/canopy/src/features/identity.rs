//! Identity feature group.

use super::to_feature;
use crate::input::PredictInput;

/// Passes a numeric column through unchanged.
///
/// Missing values, and values outside the `f32` range, become 0.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityFeatureGroup {
    pub source_column_name: String,
}

impl IdentityFeatureGroup {
    pub fn new(source_column_name: impl Into<String>) -> Self {
        Self {
            source_column_name: source_column_name.into(),
        }
    }

    pub(crate) fn compute(&self, input: &PredictInput, out: &mut [f32]) {
        out[0] = input
            .number(&self.source_column_name)
            .and_then(|value| to_feature(&self.source_column_name, value))
            .unwrap_or(0.0);
    }
}
