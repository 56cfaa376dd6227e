//! Per-feature contribution container.

/// Contributions for a batch of rows.
///
/// Layout is `[samples × outputs × (features + 1)]`: for every sample and
/// output the feature contributions are contiguous, followed by the base
/// value at index `n_features`.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapValues {
    values: Vec<f64>,
    n_samples: usize,
    n_features: usize,
    n_outputs: usize,
}

impl ShapValues {
    pub fn zeros(n_samples: usize, n_features: usize, n_outputs: usize) -> Self {
        Self {
            values: vec![0.0; n_samples * n_outputs * (n_features + 1)],
            n_samples,
            n_features,
            n_outputs,
        }
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[inline]
    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    #[inline]
    fn offset(&self, sample: usize, output: usize) -> usize {
        (sample * self.n_outputs + output) * (self.n_features + 1)
    }

    #[inline]
    pub fn get(&self, sample: usize, feature: usize, output: usize) -> f64 {
        self.values[self.offset(sample, output) + feature]
    }

    #[inline]
    pub fn set(&mut self, sample: usize, feature: usize, output: usize, value: f64) {
        let idx = self.offset(sample, output) + feature;
        self.values[idx] = value;
    }

    #[inline]
    pub fn add(&mut self, sample: usize, feature: usize, output: usize, delta: f64) {
        let idx = self.offset(sample, output) + feature;
        self.values[idx] += delta;
    }

    /// Expected output when every feature is at its baseline.
    #[inline]
    pub fn base_value(&self, sample: usize, output: usize) -> f64 {
        self.get(sample, self.n_features, output)
    }

    #[inline]
    pub fn set_base_value(&mut self, sample: usize, output: usize, value: f64) {
        self.set(sample, self.n_features, output, value);
    }

    /// Feature contributions of one sample and output, excluding the base value.
    pub fn contributions(&self, sample: usize, output: usize) -> &[f64] {
        let start = self.offset(sample, output);
        &self.values[start..start + self.n_features]
    }

    pub fn contributions_mut(&mut self, sample: usize, output: usize) -> &mut [f64] {
        let start = self.offset(sample, output);
        &mut self.values[start..start + self.n_features]
    }

    /// Base value plus all contributions: the output these values explain.
    pub fn output_value(&self, sample: usize, output: usize) -> f64 {
        self.base_value(sample, output) + self.contributions(sample, output).iter().sum::<f64>()
    }

    /// Check that contributions add up to `predictions` (`[samples × outputs]`,
    /// row-major) within an absolute `tolerance`.
    pub fn verify(&self, predictions: &[f64], tolerance: f64) -> bool {
        if predictions.len() != self.n_samples * self.n_outputs {
            return false;
        }
        (0..self.n_samples).all(|sample| {
            (0..self.n_outputs).all(|output| {
                let expected = predictions[sample * self.n_outputs + output];
                (self.output_value(sample, output) - expected).abs() <= tolerance
            })
        })
    }
}
