//! Normalized feature group.

use super::to_feature;
use crate::input::PredictInput;

/// Standardizes a numeric column: `(x - mean) / stddev`.
///
/// Missing values map to 0, the standardized mean. A zero `stddev` (a
/// constant column at training time) also yields 0, as does a result outside
/// the `f32` range.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeatureGroup {
    pub source_column_name: String,
    pub mean: f32,
    pub stddev: f32,
}

impl NormalizedFeatureGroup {
    pub fn new(source_column_name: impl Into<String>, mean: f32, stddev: f32) -> Self {
        Self {
            source_column_name: source_column_name.into(),
            mean,
            stddev,
        }
    }

    pub(crate) fn compute(&self, input: &PredictInput, out: &mut [f32]) {
        out[0] = match input.number(&self.source_column_name) {
            Some(value) if self.stddev != 0.0 => to_feature(
                &self.source_column_name,
                (value - f64::from(self.mean)) / f64::from(self.stddev),
            )
            .unwrap_or(0.0),
            _ => 0.0,
        };
    }
}
