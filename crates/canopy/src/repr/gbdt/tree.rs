//! Flattened decision tree (SoA) with structural validation.

use super::NodeId;

// ============================================================================
// TreeValidationError
// ============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    EmptyTree,
    /// A per-node array does not have one entry per node.
    ArrayLenMismatch {
        field: &'static str,
        len: usize,
        n_nodes: usize,
    },
    /// A child pointer references an out-of-bounds node.
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path.
    DuplicateVisit { node: NodeId },
    /// A cycle was detected during traversal.
    CycleDetected { node: NodeId },
    /// A node exists in storage but is unreachable from the root.
    UnreachableNode { node: NodeId },
    /// A split reads a feature beyond the model's input width.
    SplitFeatureOutOfRange {
        node: NodeId,
        feature: u32,
        n_features: usize,
    },
    /// A cover statistic is negative or not finite.
    InvalidCover { node: NodeId },
}

impl std::fmt::Display for TreeValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTree => write!(f, "tree has no nodes"),
            Self::ArrayLenMismatch { field, len, n_nodes } => {
                write!(f, "{field} has {len} entries, expected {n_nodes}")
            }
            Self::ChildOutOfBounds {
                node,
                side,
                child,
                n_nodes,
            } => write!(
                f,
                "node {node}: {side} child {child} out of bounds ({n_nodes} nodes)"
            ),
            Self::SelfLoop { node } => write!(f, "node {node} is its own child"),
            Self::DuplicateVisit { node } => write!(f, "node {node} has more than one parent"),
            Self::CycleDetected { node } => write!(f, "cycle through node {node}"),
            Self::UnreachableNode { node } => write!(f, "node {node} is unreachable from the root"),
            Self::SplitFeatureOutOfRange {
                node,
                feature,
                n_features,
            } => write!(
                f,
                "node {node}: split feature {feature} out of range ({n_features} features)"
            ),
            Self::InvalidCover { node } => write!(f, "node {node}: invalid cover"),
        }
    }
}

impl std::error::Error for TreeValidationError {}

// ============================================================================
// Tree
// ============================================================================

/// Structure-of-Arrays tree storage.
///
/// Node 0 is the root. Child references are indices into the same arrays,
/// never pointers. Split nodes send a sample left when
/// `feature <= threshold`; a NaN feature follows `default_left`.
///
/// Optional covers hold the training weight that reached each node; they
/// are required for path-dependent feature contributions.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    split_indices: Box<[u32]>,
    split_thresholds: Box<[f32]>,
    left_children: Box<[u32]>,
    right_children: Box<[u32]>,
    default_left: Box<[bool]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f32]>,
    covers: Option<Box<[f32]>>,
}

impl Tree {
    /// Create a tree from parallel arrays, one entry per node.
    ///
    /// Lengths are not checked here; call [`validate`](Self::validate) on
    /// trees that come from untrusted input.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        split_indices: Vec<u32>,
        split_thresholds: Vec<f32>,
        left_children: Vec<u32>,
        right_children: Vec<u32>,
        default_left: Vec<bool>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<f32>,
    ) -> Self {
        Self {
            split_indices: split_indices.into_boxed_slice(),
            split_thresholds: split_thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            default_left: default_left.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
            covers: None,
        }
    }

    /// A single-leaf tree.
    pub fn leaf(value: f32) -> Self {
        Self::new(vec![0], vec![0.0], vec![0], vec![0], vec![false], vec![true], vec![value])
    }

    /// Attach per-node covers (builder pattern).
    pub fn with_covers(mut self, covers: Vec<f32>) -> Self {
        self.covers = Some(covers.into_boxed_slice());
        self
    }

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.split_indices.len()
    }

    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    pub fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    #[inline]
    pub fn split_threshold(&self, node: NodeId) -> f32 {
        self.split_thresholds[node as usize]
    }

    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    #[inline]
    pub fn default_left(&self, node: NodeId) -> bool {
        self.default_left[node as usize]
    }

    #[inline]
    pub fn leaf_value(&self, node: NodeId) -> f32 {
        self.leaf_values[node as usize]
    }

    #[inline]
    pub fn has_covers(&self) -> bool {
        self.covers.is_some()
    }

    /// Per-node covers, if present.
    pub fn covers(&self) -> Option<&[f32]> {
        self.covers.as_deref()
    }

    /// Raw per-node arrays, in the order accepted by [`new`](Self::new).
    pub(crate) fn arrays(&self) -> TreeArrays<'_> {
        TreeArrays {
            split_indices: &self.split_indices,
            split_thresholds: &self.split_thresholds,
            left_children: &self.left_children,
            right_children: &self.right_children,
            default_left: &self.default_left,
            is_leaf: &self.is_leaf,
            leaf_values: &self.leaf_values,
        }
    }

    /// Child taken by a split node for `value`.
    #[inline]
    pub fn next_node(&self, node: NodeId, value: f32) -> NodeId {
        let go_left = if value.is_nan() {
            self.default_left(node)
        } else {
            value <= self.split_threshold(node)
        };
        if go_left {
            self.left_child(node)
        } else {
            self.right_child(node)
        }
    }

    /// Walk from the root to the leaf reached by `features`.
    #[inline]
    pub fn traverse_to_leaf(&self, features: &[f32]) -> NodeId {
        let mut node = 0;
        while !self.is_leaf(node) {
            let value = features[self.split_index(node) as usize];
            node = self.next_node(node, value);
        }
        node
    }

    /// Leaf value reached by `features`.
    #[inline]
    pub fn predict_row(&self, features: &[f32]) -> f32 {
        self.leaf_value(self.traverse_to_leaf(features))
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn max_depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0 as NodeId, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if self.is_leaf(node) {
                max_depth = max_depth.max(depth);
            } else {
                stack.push((self.left_child(node), depth + 1));
                stack.push((self.right_child(node), depth + 1));
            }
        }
        max_depth
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate structural invariants.
    ///
    /// Checks array lengths, child bounds, that the nodes form a tree rooted
    /// at 0 (no loops, cycles, shared or orphaned nodes), split features
    /// against `n_features`, and covers. A tree that passes can be traversed
    /// without out-of-bounds access for any input of `n_features` values.
    pub fn validate(&self, n_features: usize) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }
        self.validate_lengths()?;

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(NodeId, bool)> = vec![(0, false)];

        while let Some((node, finished)) = stack.pop() {
            let index = node as usize;
            if finished {
                color[index] = 2;
                continue;
            }
            match color[index] {
                0 => {}
                1 => return Err(TreeValidationError::CycleDetected { node }),
                _ => return Err(TreeValidationError::DuplicateVisit { node }),
            }
            color[index] = 1;
            stack.push((node, true));

            if self.is_leaf(node) {
                continue;
            }

            let feature = self.split_index(node);
            if feature as usize >= n_features {
                return Err(TreeValidationError::SplitFeatureOutOfRange {
                    node,
                    feature,
                    n_features,
                });
            }

            let left = self.left_child(node);
            let right = self.right_child(node);
            if left == node || right == node {
                return Err(TreeValidationError::SelfLoop { node });
            }
            for (side, child) in [("left", left), ("right", right)] {
                if child as usize >= n_nodes {
                    return Err(TreeValidationError::ChildOutOfBounds {
                        node,
                        side,
                        child,
                        n_nodes,
                    });
                }
            }

            stack.push((right, false));
            stack.push((left, false));
        }

        if let Some(node) = color.iter().position(|&c| c == 0) {
            return Err(TreeValidationError::UnreachableNode { node: node as NodeId });
        }

        if let Some(covers) = self.covers() {
            if let Some(node) = covers.iter().position(|c| !c.is_finite() || *c < 0.0) {
                return Err(TreeValidationError::InvalidCover { node: node as NodeId });
            }
        }

        Ok(())
    }

    fn validate_lengths(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        let lengths = [
            ("split_thresholds", self.split_thresholds.len()),
            ("left_children", self.left_children.len()),
            ("right_children", self.right_children.len()),
            ("default_left", self.default_left.len()),
            ("is_leaf", self.is_leaf.len()),
            ("leaf_values", self.leaf_values.len()),
            ("covers", self.covers.as_ref().map_or(n_nodes, |c| c.len())),
        ];
        for (field, len) in lengths {
            if len != n_nodes {
                return Err(TreeValidationError::ArrayLenMismatch { field, len, n_nodes });
            }
        }
        Ok(())
    }
}

/// Borrowed per-node arrays of a [`Tree`].
pub(crate) struct TreeArrays<'a> {
    pub split_indices: &'a [u32],
    pub split_thresholds: &'a [f32],
    pub left_children: &'a [u32],
    pub right_children: &'a [u32],
    pub default_left: &'a [bool],
    pub is_leaf: &'a [bool],
    pub leaf_values: &'a [f32],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::stump;

    /// Depth-2 tree:
    /// ```text
    ///          0: f0 <= 0.5
    ///         /            \
    ///   1: f1 <= 1.0     2: leaf 3.0
    ///    /       \
    /// 3: 1.0   4: 2.0
    /// ```
    fn depth_two() -> Tree {
        Tree::new(
            vec![0, 1, 0, 0, 0],
            vec![0.5, 1.0, 0.0, 0.0, 0.0],
            vec![1, 3, 0, 0, 0],
            vec![2, 4, 0, 0, 0],
            vec![true, false, false, false, false],
            vec![false, false, true, true, true],
            vec![0.0, 0.0, 3.0, 1.0, 2.0],
        )
    }

    #[test]
    fn traversal_uses_less_or_equal() {
        let tree = stump(0, 0.5, -1.0, 1.0);
        assert_eq!(tree.predict_row(&[0.5]), -1.0);
        assert_eq!(tree.predict_row(&[0.50001]), 1.0);
    }

    #[test]
    fn nan_follows_default_direction() {
        let tree = depth_two();
        // Root defaults left, node 1 defaults right.
        assert_eq!(tree.predict_row(&[f32::NAN, f32::NAN]), 2.0);
        assert_eq!(tree.predict_row(&[0.0, 0.0]), 1.0);
        assert_eq!(tree.predict_row(&[1.0, 0.0]), 3.0);
    }

    #[test]
    fn max_depth_counts_edges() {
        assert_eq!(Tree::leaf(1.0).max_depth(), 0);
        assert_eq!(depth_two().max_depth(), 2);
    }

    #[test]
    fn valid_tree_passes() {
        assert_eq!(depth_two().validate(2), Ok(()));
        assert_eq!(Tree::leaf(0.0).validate(0), Ok(()));
    }

    #[test]
    fn rejects_out_of_bounds_child() {
        let tree = Tree::new(
            vec![0, 0, 0],
            vec![0.0; 3],
            vec![1, 0, 0],
            vec![7, 0, 0],
            vec![false; 3],
            vec![false, true, true],
            vec![0.0; 3],
        );
        assert!(matches!(
            tree.validate(1),
            Err(TreeValidationError::ChildOutOfBounds { side: "right", child: 7, .. })
        ));
    }

    #[test]
    fn rejects_cycle_and_self_loop() {
        let self_loop = Tree::new(
            vec![0, 0],
            vec![0.0; 2],
            vec![0, 0],
            vec![1, 0],
            vec![false; 2],
            vec![false, true],
            vec![0.0; 2],
        );
        assert_eq!(self_loop.validate(1), Err(TreeValidationError::SelfLoop { node: 0 }));

        let cycle = Tree::new(
            vec![0, 0, 0],
            vec![0.0; 3],
            vec![1, 0, 0],
            vec![2, 2, 0],
            vec![false; 3],
            vec![false, false, true],
            vec![0.0; 3],
        );
        assert!(cycle.validate(1).is_err());
    }

    #[test]
    fn rejects_unreachable_node() {
        let tree = Tree::new(
            vec![0; 4],
            vec![0.0; 4],
            vec![1, 0, 0, 0],
            vec![2, 0, 0, 0],
            vec![false; 4],
            vec![false, true, true, true],
            vec![0.0; 4],
        );
        assert_eq!(tree.validate(1), Err(TreeValidationError::UnreachableNode { node: 3 }));
    }

    #[test]
    fn rejects_feature_out_of_range() {
        let tree = stump(3, 0.5, -1.0, 1.0);
        assert!(matches!(
            tree.validate(2),
            Err(TreeValidationError::SplitFeatureOutOfRange { feature: 3, .. })
        ));
    }

    #[test]
    fn rejects_length_mismatch_and_bad_cover() {
        let tree = stump(0, 0.5, -1.0, 1.0).with_covers(vec![1.0, 1.0]);
        assert!(matches!(
            tree.validate(1),
            Err(TreeValidationError::ArrayLenMismatch { field: "covers", .. })
        ));
        let tree = stump(0, 0.5, -1.0, 1.0).with_covers(vec![2.0, -1.0, 3.0]);
        assert_eq!(tree.validate(1), Err(TreeValidationError::InvalidCover { node: 1 }));
    }
}
