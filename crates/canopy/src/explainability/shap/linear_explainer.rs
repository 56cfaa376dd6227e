//! Exact contributions for linear models.
//!
//! Every feature's baseline is 0, so the base value is the bias and the
//! contribution of feature `i` to output `g` is `w[i, g] * x[i]`.

use ndarray::ArrayView2;

use crate::explainability::shap::ShapValues;
use crate::repr::linear::LinearModel;

/// Closed-form explainer for a [`LinearModel`].
#[derive(Debug, Clone, Copy)]
pub struct LinearExplainer<'a> {
    model: &'a LinearModel,
}

impl<'a> LinearExplainer<'a> {
    pub fn new(model: &'a LinearModel) -> Self {
        Self { model }
    }

    pub fn base_value(&self, output: usize) -> f64 {
        self.model.bias(output) as f64
    }

    /// Contributions for one feature row.
    pub fn explain_row(&self, features: &[f32]) -> ShapValues {
        let mut shap = ShapValues::zeros(1, self.model.n_features(), self.model.n_groups());
        self.write_row(&mut shap, 0, features);
        shap
    }

    /// Contributions for a `[n_samples, n_features]` matrix.
    pub fn shap_values(&self, features: ArrayView2<'_, f32>) -> ShapValues {
        let mut shap = ShapValues::zeros(features.nrows(), self.model.n_features(), self.model.n_groups());
        for (sample, row) in features.rows().into_iter().enumerate() {
            let row = row.to_vec();
            self.write_row(&mut shap, sample, &row);
        }
        shap
    }

    fn write_row(&self, shap: &mut ShapValues, sample: usize, features: &[f32]) {
        for output in 0..self.model.n_groups() {
            shap.set_base_value(sample, output, self.base_value(output));
            let contributions = shap.contributions_mut(sample, output);
            for (feature, (slot, &x)) in contributions.iter_mut().zip(features).enumerate() {
                *slot = self.model.weight(feature, output) as f64 * x as f64;
            }
        }
    }
}
