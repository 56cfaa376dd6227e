//! Forest of decision trees with per-tree output group tags.

use super::tree::TreeValidationError;
use super::Tree;

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestValidationError {
    NoGroups,
    BaseScoreLenMismatch { n_groups: u32, len: usize },
    TreeGroupsLenMismatch { n_trees: usize, len: usize },
    TreeGroupOutOfRange { tree_idx: usize, group: u32, n_groups: u32 },
    InvalidTree { tree_idx: usize, error: TreeValidationError },
}

impl std::fmt::Display for ForestValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoGroups => write!(f, "forest has no output groups"),
            Self::BaseScoreLenMismatch { n_groups, len } => {
                write!(f, "base score has {len} entries for {n_groups} groups")
            }
            Self::TreeGroupsLenMismatch { n_trees, len } => {
                write!(f, "{len} tree group tags for {n_trees} trees")
            }
            Self::TreeGroupOutOfRange {
                tree_idx,
                group,
                n_groups,
            } => write!(f, "tree {tree_idx}: group {group} out of range ({n_groups} groups)"),
            Self::InvalidTree { tree_idx, error } => write!(f, "tree {tree_idx}: {error}"),
        }
    }
}

impl std::error::Error for ForestValidationError {}

/// Additive tree ensemble.
///
/// Every tree is tagged with the output group (class) it contributes to.
/// The raw score of group `g` is `base_score[g]` plus the leaf values of all
/// trees tagged `g`, accumulated in tree order.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    tree_groups: Vec<u32>,
    n_groups: u32,
    base_score: Vec<f32>,
}

impl Forest {
    /// Create an empty forest with `n_groups` zero-initialized base scores.
    pub fn new(n_groups: u32) -> Self {
        Self {
            trees: Vec::new(),
            tree_groups: Vec::new(),
            n_groups,
            base_score: vec![0.0; n_groups as usize],
        }
    }

    /// Create a forest for a single output group.
    pub fn for_regression() -> Self {
        Self::new(1)
    }

    /// Create a forest from its parts. Use [`validate`](Self::validate) on untrusted parts.
    pub fn from_parts(
        trees: Vec<Tree>,
        tree_groups: Vec<u32>,
        n_groups: u32,
        base_score: Vec<f32>,
    ) -> Self {
        Self {
            trees,
            tree_groups,
            n_groups,
            base_score,
        }
    }

    /// Set the base score for all groups.
    pub fn with_base_score(mut self, base_score: Vec<f32>) -> Self {
        self.base_score = base_score;
        self
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree, group: u32) {
        debug_assert!(group < self.n_groups, "group out of range");
        self.trees.push(tree);
        self.tree_groups.push(group);
    }

    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[inline]
    pub fn n_groups(&self) -> u32 {
        self.n_groups
    }

    #[inline]
    pub fn base_score(&self) -> &[f32] {
        &self.base_score
    }

    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    #[inline]
    pub fn tree_groups(&self) -> &[u32] {
        &self.tree_groups
    }

    pub fn trees(&self) -> impl ExactSizeIterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Iterate over trees with their group assignments.
    pub fn trees_with_groups(&self) -> impl Iterator<Item = (&Tree, u32)> {
        self.trees.iter().zip(self.tree_groups.iter().copied())
    }

    /// Whether every tree carries cover statistics.
    pub fn has_covers(&self) -> bool {
        self.trees.iter().all(Tree::has_covers)
    }

    /// Validate group tags, base scores and every tree against `n_features`.
    pub fn validate(&self, n_features: usize) -> Result<(), ForestValidationError> {
        if self.n_groups == 0 {
            return Err(ForestValidationError::NoGroups);
        }
        if self.base_score.len() != self.n_groups as usize {
            return Err(ForestValidationError::BaseScoreLenMismatch {
                n_groups: self.n_groups,
                len: self.base_score.len(),
            });
        }
        if self.tree_groups.len() != self.trees.len() {
            return Err(ForestValidationError::TreeGroupsLenMismatch {
                n_trees: self.trees.len(),
                len: self.tree_groups.len(),
            });
        }
        for (tree_idx, &group) in self.tree_groups.iter().enumerate() {
            if group >= self.n_groups {
                return Err(ForestValidationError::TreeGroupOutOfRange {
                    tree_idx,
                    group,
                    n_groups: self.n_groups,
                });
            }
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|error| ForestValidationError::InvalidTree { tree_idx, error })?;
        }
        Ok(())
    }

    /// Raw scores for one feature row, written into `output` (length `n_groups`).
    pub fn predict_row_into(&self, features: &[f32], output: &mut [f32]) {
        output.copy_from_slice(&self.base_score);
        for (tree, group) in self.trees_with_groups() {
            output[group as usize] += tree.predict_row(features);
        }
    }

    /// Raw scores for one feature row.
    pub fn predict_row(&self, features: &[f32]) -> Vec<f32> {
        let mut output = vec![0.0; self.n_groups as usize];
        self.predict_row_into(features, &mut output);
        output
    }
}
