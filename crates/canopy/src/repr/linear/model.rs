//! Linear model data structure.

use ndarray::{s, Array2, ArrayView1, ArrayView2};

/// Linear model (weights + bias).
///
/// Stores an `Array2<f32>` with shape `[n_features + 1, n_groups]`:
///
/// ```text
/// weights[[feature, group]] → coefficient
/// weights[[n_features, group]] → bias (last row)
/// ```
///
/// The raw score of group `g` is `bias[g] + Σ_i weights[i, g] * x[i]`.
/// Regression and binary classification use one group; multiclass uses one
/// group per class, all sharing the same feature vector.
///
/// # Example
///
/// ```
/// use canopy::repr::linear::LinearModel;
/// use ndarray::array;
///
/// // 2 features, 1 output group
/// let model = LinearModel::from_array(array![[0.5], [-1.0], [0.25]]).unwrap();
/// assert_eq!(model.n_features(), 2);
/// assert_eq!(model.bias(0), 0.25);
/// assert_eq!(model.predict_row(&[2.0, 1.0]), vec![0.25]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    /// Weight matrix: shape `[n_features + 1, n_groups]`, bias in the last row.
    weights: Array2<f32>,
}

impl LinearModel {
    /// Create from a flat row-major buffer of `(n_features + 1) * n_groups` values.
    ///
    /// Returns `None` if the length does not match or `n_groups` is 0.
    pub fn new(weights: Vec<f32>, n_features: usize, n_groups: usize) -> Option<Self> {
        if n_groups == 0 {
            return None;
        }
        Array2::from_shape_vec((n_features + 1, n_groups), weights)
            .ok()
            .map(|weights| Self { weights })
    }

    /// Create from a `[n_features + 1, n_groups]` array whose last row is the bias.
    ///
    /// Returns `None` if the array has no bias row or no groups.
    pub fn from_array(weights: Array2<f32>) -> Option<Self> {
        (weights.nrows() >= 1 && weights.ncols() >= 1).then_some(Self { weights })
    }

    /// Number of input features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.weights.nrows() - 1
    }

    /// Number of output groups.
    #[inline]
    pub fn n_groups(&self) -> usize {
        self.weights.ncols()
    }

    #[inline]
    pub fn weight(&self, feature: usize, group: usize) -> f32 {
        self.weights[[feature, group]]
    }

    #[inline]
    pub fn bias(&self, group: usize) -> f32 {
        self.weights[[self.n_features(), group]]
    }

    /// Bias row, one entry per group.
    pub fn biases(&self) -> ArrayView1<'_, f32> {
        self.weights.row(self.n_features())
    }

    /// Coefficients without the bias row: `[n_features, n_groups]`.
    pub fn weight_view(&self) -> ArrayView2<'_, f32> {
        self.weights.slice(s![..self.n_features(), ..])
    }

    /// Full matrix including the bias row.
    pub fn as_array(&self) -> ArrayView2<'_, f32> {
        self.weights.view()
    }

    /// Raw scores for one feature row.
    ///
    /// Features are accumulated in index order so results are reproducible.
    pub fn predict_row(&self, features: &[f32]) -> Vec<f32> {
        debug_assert_eq!(features.len(), self.n_features());
        (0..self.n_groups())
            .map(|group| {
                features
                    .iter()
                    .enumerate()
                    .fold(self.bias(group), |acc, (feature, &x)| {
                        acc + self.weight(feature, group) * x
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn new_from_flat_buffer() {
        // 2 features, 2 groups
        let model = LinearModel::new(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 2, 2).unwrap();
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.n_groups(), 2);
        assert_eq!(model.weight(0, 1), 0.2);
        assert_eq!(model.weight(1, 0), 0.3);
        assert_eq!(model.bias(0), 0.5);
        assert_eq!(model.bias(1), 0.6);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(LinearModel::new(vec![0.5, 0.3], 2, 1).is_none());
        assert!(LinearModel::new(vec![], 0, 0).is_none());
    }

    #[test]
    fn views() {
        let model = LinearModel::from_array(array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]]).unwrap();
        assert_eq!(model.weight_view().dim(), (2, 2));
        assert_eq!(model.biases().to_vec(), vec![0.5, 0.6]);
    }

    #[test]
    fn predict_row_per_group() {
        let model = LinearModel::from_array(array![[1.0, -1.0], [2.0, 0.0], [0.5, 1.0]]).unwrap();
        assert_eq!(model.predict_row(&[1.0, 1.0]), vec![3.5, 0.0]);
    }

    #[test]
    fn bias_only_model() {
        let model = LinearModel::new(vec![1.5], 0, 1).unwrap();
        assert_eq!(model.n_features(), 0);
        assert_eq!(model.predict_row(&[]), vec![1.5]);
    }
}
