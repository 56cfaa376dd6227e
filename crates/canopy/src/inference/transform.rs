//! Output transformation from raw scores to task outputs.
//!
//! - [`Identity`](OutputTransform::Identity): regression, the raw score is the value
//! - [`Sigmoid`](OutputTransform::Sigmoid): binary classification, positive-class probability
//! - [`Softmax`](OutputTransform::Softmax): multiclass classification, class distribution

use crate::model::TaskKind;

/// Inference-time output transformation, derived from the model's task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputTransform {
    #[default]
    Identity,
    Sigmoid,
    Softmax,
}

impl OutputTransform {
    pub fn for_task(task: TaskKind) -> Self {
        match task {
            TaskKind::Regression => Self::Identity,
            TaskKind::BinaryClassification => Self::Sigmoid,
            TaskKind::MulticlassClassification => Self::Softmax,
        }
    }

    /// Apply the transformation in-place to one row of raw scores.
    ///
    /// Sigmoid clamps its input to [-500, 500]; softmax subtracts the row
    /// maximum before exponentiating. NaN propagates.
    #[inline]
    pub fn transform_row(&self, row: &mut [f32]) {
        match self {
            Self::Identity => {}
            Self::Sigmoid => row.iter_mut().for_each(|x| *x = sigmoid(*x)),
            Self::Softmax => softmax_inplace(row),
        }
    }
}

/// Numerically stable logistic function.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    let clamped = x.clamp(-500.0, 500.0);
    if clamped >= 0.0 {
        1.0 / (1.0 + (-clamped).exp())
    } else {
        let e = clamped.exp();
        e / (1.0 + e)
    }
}

#[inline]
fn softmax_inplace(row: &mut [f32]) {
    if row.is_empty() {
        return;
    }
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    if sum > 0.0 {
        row.iter_mut().for_each(|x| *x /= sum);
    }
}

/// Index of the largest value; ties resolve to the lowest index.
///
/// NaN entries never win. Returns `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<usize> {
    if values.is_empty() {
        return None;
    }
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] || (values[best].is_nan() && !v.is_nan()) {
            best = i;
        }
    }
    Some(best)
}
