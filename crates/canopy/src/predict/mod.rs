//! Prediction orchestration.
//!
//! For every record: compute features, score them, map raw scores to the
//! task's output shape and optionally attach feature contributions. Records
//! are independent; batch results are aligned with inputs by index, and a
//! record's result does not depend on the rest of the batch.

mod options;
mod output;

use indexmap::IndexMap;
use thiserror::Error;

use crate::explainability::{ExplainError, Explainer, FeatureContributions};
use crate::inference::{argmax, OutputTransform};
use crate::input::PredictInput;
use crate::model::{Model, Task};
use crate::utils::{run_with_threads, Parallelism};

pub use options::{ConfigError, PredictOptions};
pub use output::{
    BinaryClassificationPredictOutput, MulticlassClassificationPredictOutput, PredictOutput,
    RegressionPredictOutput,
};

/// Errors reported for a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("invalid options: {0}")]
    InvalidOptions(#[from] ConfigError),

    /// Contributions were requested for a predictor that cannot provide them.
    #[error("feature contributions unavailable: {0}")]
    UnsupportedAttribution(#[from] ExplainError),
}

impl Model {
    /// Predict one record.
    pub fn predict_one(
        &self,
        input: &PredictInput,
        options: &PredictOptions,
    ) -> Result<PredictOutput, PredictError> {
        let explainer = self.prepare(options)?;
        let features = self.compute_features(input);
        let features = features.to_vec();
        let scores = self.predictor().predict_row(&features);
        Ok(self.finish(&features, scores, options, explainer.as_ref()))
    }

    /// Predict a batch on the calling thread, one result per input.
    pub fn predict(
        &self,
        inputs: &[PredictInput],
        options: &PredictOptions,
    ) -> Vec<Result<PredictOutput, PredictError>> {
        self.predict_with_parallelism(inputs, options, Parallelism::Sequential)
    }

    /// Predict a batch on `n_threads` threads (0 = global pool, 1 = sequential).
    ///
    /// Results are identical to [`predict`](Self::predict).
    pub fn predict_with_threads(
        &self,
        inputs: &[PredictInput],
        options: &PredictOptions,
        n_threads: usize,
    ) -> Vec<Result<PredictOutput, PredictError>> {
        run_with_threads(n_threads, |parallelism| {
            self.predict_with_parallelism(inputs, options, parallelism)
        })
    }

    fn predict_with_parallelism(
        &self,
        inputs: &[PredictInput],
        options: &PredictOptions,
        parallelism: Parallelism,
    ) -> Vec<Result<PredictOutput, PredictError>> {
        let explainer = match self.prepare(options) {
            Ok(explainer) => explainer,
            Err(e) => return vec![Err(e); inputs.len()],
        };

        let features = self.compute_features_batch(inputs, parallelism);
        let scores = self.predictor().predict(features.view(), parallelism);
        parallelism.maybe_par_map(0..inputs.len(), |i| {
            Ok(self.finish(
                &features.row(i).to_vec(),
                scores.row(i).to_vec(),
                options,
                explainer.as_ref(),
            ))
        })
    }

    /// Validate options and build the explainer they ask for.
    fn prepare(&self, options: &PredictOptions) -> Result<Option<Explainer<'_>>, PredictError> {
        options.validate()?;
        if !options.compute_feature_contributions {
            return Ok(None);
        }
        Explainer::new(self.predictor()).map(Some).map_err(|e| {
            log::warn!("model {:?}: cannot compute feature contributions: {e}", self.id());
            PredictError::UnsupportedAttribution(e)
        })
    }

    /// Map raw `scores` of one record to its output.
    fn finish(
        &self,
        features: &[f32],
        scores: Vec<f32>,
        options: &PredictOptions,
        explainer: Option<&Explainer<'_>>,
    ) -> PredictOutput {
        let mut contributions = explainer.map(|explainer| {
            let shap = explainer.explain_row(features);
            scores
                .iter()
                .enumerate()
                .map(|(output, &score)| {
                    FeatureContributions::from_features(
                        self.feature_groups(),
                        features,
                        shap.contributions(0, output),
                        shap.base_value(0, output),
                        score,
                    )
                })
                .collect::<Vec<_>>()
        });

        let mut outputs = scores;
        OutputTransform::for_task(self.task().kind()).transform_row(&mut outputs);

        match self.task() {
            Task::Regression => PredictOutput::Regression(RegressionPredictOutput {
                value: outputs[0],
                feature_contributions: contributions.as_mut().and_then(|c| c.pop()),
            }),
            Task::BinaryClassification {
                negative_class,
                positive_class,
            } => {
                let probability = outputs[0];
                let (class_name, probability) = if probability >= options.threshold {
                    (positive_class, probability)
                } else {
                    (negative_class, 1.0 - probability)
                };
                PredictOutput::BinaryClassification(BinaryClassificationPredictOutput {
                    class_name: class_name.clone(),
                    probability,
                    feature_contributions: contributions.as_mut().and_then(|c| c.pop()),
                })
            }
            Task::MulticlassClassification { classes } => {
                let best = argmax(&outputs).unwrap_or(0);
                PredictOutput::MulticlassClassification(MulticlassClassificationPredictOutput {
                    class_name: classes[best].clone(),
                    probability: outputs[best],
                    probabilities: classes.iter().cloned().zip(outputs).collect(),
                    feature_contributions: contributions.map(|c| {
                        classes.iter().cloned().zip(c).collect::<IndexMap<_, _>>()
                    }),
                })
            }
        }
    }
}
