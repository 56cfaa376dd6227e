//! Path-dependent TreeSHAP for tree ensembles.
//!
//! Follows Lundberg et al., "Consistent Individualized Feature Attribution for
//! Tree Ensembles" (algorithm 2). Node covers stand in for the training
//! distribution: when a feature is absent from a coalition, both branches of
//! its split are followed, weighted by the fraction of cover each received.
//!
//! The base value of output `g` is its bias plus the cover-weighted expected
//! leaf value of every tree tagged `g`.

use ndarray::ArrayView2;

use super::path::{self, PathBuffer, PathElement};
use crate::explainability::shap::ShapValues;
use crate::explainability::ExplainError;
use crate::repr::gbdt::{Forest, NodeId, Tree};

/// Deepest tree the explainer accepts, in edges.
///
/// The recursion and its path buffer grow with depth; trees from untrusted
/// artifacts are bounded here rather than by the stack.
pub const MAX_EXPLAIN_DEPTH: usize = 512;

/// TreeSHAP explainer over a [`Forest`] with cover statistics.
#[derive(Debug, Clone)]
pub struct TreeExplainer<'a> {
    forest: &'a Forest,
    base_values: Vec<f64>,
    max_depth: usize,
}

impl<'a> TreeExplainer<'a> {
    /// Prepare an explainer, computing the per-output base values.
    ///
    /// # Errors
    ///
    /// - [`ExplainError::MissingNodeStats`] if any tree lacks covers.
    /// - [`ExplainError::NonPositiveCover`] if a node's cover is not positive.
    /// - [`ExplainError::TreeTooDeep`] past [`MAX_EXPLAIN_DEPTH`].
    pub fn new(forest: &'a Forest) -> Result<Self, ExplainError> {
        let mut max_depth = 0;
        for (tree_idx, tree) in forest.trees().enumerate() {
            let covers = tree
                .covers()
                .ok_or(ExplainError::MissingNodeStats("cover statistics required for TreeSHAP"))?;
            if let Some(node) = covers.iter().position(|&c| c.is_nan() || c <= 0.0) {
                return Err(ExplainError::NonPositiveCover { tree_idx, node });
            }
            let depth = tree.max_depth();
            if depth > MAX_EXPLAIN_DEPTH {
                return Err(ExplainError::TreeTooDeep {
                    tree_idx,
                    depth,
                    max_depth: MAX_EXPLAIN_DEPTH,
                });
            }
            max_depth = max_depth.max(depth);
        }

        let mut base_values: Vec<f64> = forest.base_score().iter().map(|&b| b as f64).collect();
        for (tree, group) in forest.trees_with_groups() {
            base_values[group as usize] += expected_value(tree, 0);
        }

        Ok(Self {
            forest,
            base_values,
            max_depth,
        })
    }

    /// Expected raw score of `output` over the training distribution.
    pub fn base_value(&self, output: usize) -> f64 {
        self.base_values[output]
    }

    /// Contributions for one feature row.
    pub fn explain_row(&self, features: &[f32]) -> ShapValues {
        let mut shap = ShapValues::zeros(1, features.len(), self.base_values.len());
        let mut buffer = PathBuffer::new(self.max_depth);
        self.write_row(&mut shap, 0, features, &mut buffer);
        shap
    }

    /// Contributions for a `[n_samples, n_features]` matrix.
    pub fn shap_values(&self, features: ArrayView2<'_, f32>) -> ShapValues {
        let mut shap = ShapValues::zeros(features.nrows(), features.ncols(), self.base_values.len());
        let mut buffer = PathBuffer::new(self.max_depth);
        for (sample, row) in features.rows().into_iter().enumerate() {
            let row = row.to_vec();
            self.write_row(&mut shap, sample, &row, &mut buffer);
        }
        shap
    }

    fn write_row(&self, shap: &mut ShapValues, sample: usize, features: &[f32], buffer: &mut PathBuffer) {
        let mut phi = vec![0.0f64; features.len()];
        for output in 0..self.base_values.len() {
            shap.set_base_value(sample, output, self.base_values[output]);
        }
        for (tree, group) in self.forest.trees_with_groups() {
            phi.iter_mut().for_each(|p| *p = 0.0);
            let mut walk = TreeWalk {
                tree,
                features,
                phi: &mut phi,
            };
            walk.recurse(buffer.as_mut_slice(), 0, 0, 1.0, 1.0, None);
            shap.contributions_mut(sample, group as usize)
                .iter_mut()
                .zip(&phi)
                .for_each(|(slot, p)| *slot += p);
        }
    }
}

/// State shared across one tree's recursion.
struct TreeWalk<'t> {
    tree: &'t Tree,
    features: &'t [f32],
    phi: &'t mut [f64],
}

impl TreeWalk<'_> {
    fn cover(&self, node: NodeId) -> f64 {
        self.tree.covers().map_or(0.0, |covers| covers[node as usize] as f64)
    }

    /// `path` starts at this node's segment; entries `0..depth` hold the
    /// parent path.
    fn recurse(
        &mut self,
        path: &mut [PathElement],
        node: NodeId,
        depth: usize,
        zero_fraction: f64,
        one_fraction: f64,
        feature: Option<usize>,
    ) {
        path::extend(path, depth, zero_fraction, one_fraction, feature);

        if self.tree.is_leaf(node) {
            let leaf_value = self.tree.leaf_value(node) as f64;
            for i in 1..=depth {
                let element = path[i];
                if let Some(feature) = element.feature {
                    let weight = path::unwound_sum(path, depth, i);
                    self.phi[feature] += weight * (element.one_fraction - element.zero_fraction) * leaf_value;
                }
            }
            return;
        }

        let split_feature = self.tree.split_index(node) as usize;
        let hot = self.tree.next_node(node, self.features[split_feature]);
        let cold = if hot == self.tree.left_child(node) {
            self.tree.right_child(node)
        } else {
            self.tree.left_child(node)
        };
        let node_cover = self.cover(node);
        let hot_zero_fraction = self.cover(hot) / node_cover;
        let cold_zero_fraction = self.cover(cold) / node_cover;

        // A feature split on twice along the path keeps a single entry.
        let mut depth = depth;
        let mut incoming_zero_fraction = 1.0;
        let mut incoming_one_fraction = 1.0;
        if let Some(previous) = (1..=depth).find(|&i| path[i].feature == Some(split_feature)) {
            incoming_zero_fraction = path[previous].zero_fraction;
            incoming_one_fraction = path[previous].one_fraction;
            path::unwind(path, depth, previous);
            depth -= 1;
        }

        let (parent, child) = path.split_at_mut(depth + 1);
        for (next, side_zero_fraction, side_one_fraction) in [
            (hot, hot_zero_fraction, incoming_one_fraction),
            (cold, cold_zero_fraction, 0.0),
        ] {
            child[..parent.len()].copy_from_slice(parent);
            self.recurse(
                child,
                next,
                depth + 1,
                side_zero_fraction * incoming_zero_fraction,
                side_one_fraction,
                Some(split_feature),
            );
        }
    }
}

/// Cover-weighted mean leaf value below `node`.
fn expected_value(tree: &Tree, node: NodeId) -> f64 {
    if tree.is_leaf(node) {
        return tree.leaf_value(node) as f64;
    }
    let Some(covers) = tree.covers() else {
        return 0.0;
    };
    let left = tree.left_child(node);
    let right = tree.right_child(node);
    let cover = covers[node as usize] as f64;
    let left_weight = covers[left as usize] as f64 / cover;
    let right_weight = covers[right as usize] as f64 / cover;
    left_weight * expected_value(tree, left) + right_weight * expected_value(tree, right)
}
