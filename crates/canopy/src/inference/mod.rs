//! Predictor evaluation.
//!
//! A [`Predictor`] turns feature rows into raw scores, one column per output
//! group. Task-specific transforms live in [`transform`].

pub mod transform;

use ndarray::{Array2, ArrayView2, Axis};

use crate::repr::gbdt::Forest;
use crate::repr::linear::LinearModel;
use crate::utils::Parallelism;

pub use transform::{argmax, sigmoid, OutputTransform};

/// The trained scoring function of a model.
#[derive(Debug, Clone, PartialEq)]
pub enum Predictor {
    Linear(LinearModel),
    TreeEnsemble(Forest),
}

/// Kind of a [`Predictor`], without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictorKind {
    Linear,
    TreeEnsemble,
}

impl Predictor {
    pub fn kind(&self) -> PredictorKind {
        match self {
            Self::Linear(_) => PredictorKind::Linear,
            Self::TreeEnsemble(_) => PredictorKind::TreeEnsemble,
        }
    }

    /// Number of raw score outputs per row.
    pub fn n_outputs(&self) -> usize {
        match self {
            Self::Linear(model) => model.n_groups(),
            Self::TreeEnsemble(forest) => forest.n_groups() as usize,
        }
    }

    /// Raw scores for one feature row.
    pub fn predict_row(&self, features: &[f32]) -> Vec<f32> {
        match self {
            Self::Linear(model) => model.predict_row(features),
            Self::TreeEnsemble(forest) => forest.predict_row(features),
        }
    }

    /// Raw scores for a `[n_rows, n_features]` matrix, shape `[n_rows, n_outputs]`.
    ///
    /// Rows are scored independently, so the parallel and sequential paths
    /// produce bit-identical results.
    pub fn predict(&self, features: ArrayView2<'_, f32>, parallelism: Parallelism) -> Array2<f32> {
        let mut output = Array2::zeros((features.nrows(), self.n_outputs()));
        parallelism.maybe_par_bridge_for_each(
            output.axis_iter_mut(Axis(0)).zip(features.axis_iter(Axis(0))),
            |(mut out, row)| {
                let row = row.to_vec();
                let scores = self.predict_row(&row);
                out.iter_mut().zip(scores).for_each(|(o, s)| *o = s);
            },
        );
        output
    }
}
