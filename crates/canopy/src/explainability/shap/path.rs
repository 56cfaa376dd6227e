//! Feature path bookkeeping for TreeSHAP.
//!
//! The path records, for every distinct feature split on between the root and
//! the current node, the fraction of "absent" coverage flowing through
//! (`zero_fraction`), whether the sample itself takes this branch
//! (`one_fraction`), and the permutation weights of all coalition sizes.
//!
//! Recursion gives each depth its own segment of one flat buffer: a child copies
//! the parent's path into the next segment, so siblings never see each other's
//! updates.

/// One element of the unique feature path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PathElement {
    /// `None` only for the root sentinel at position 0.
    pub feature: Option<usize>,
    pub zero_fraction: f64,
    pub one_fraction: f64,
    pub weight: f64,
}

/// Scratch buffer large enough for every recursion segment of one tree.
#[derive(Debug, Clone)]
pub(crate) struct PathBuffer {
    elements: Vec<PathElement>,
}

impl PathBuffer {
    /// Allocate for trees with at most `max_depth` edges on any path.
    pub fn new(max_depth: usize) -> Self {
        let len = max_depth + 2;
        Self {
            elements: vec![PathElement::default(); len * (len + 1) / 2],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [PathElement] {
        &mut self.elements
    }
}

/// Append a feature to the path at position `depth` and update weights.
pub(crate) fn extend(
    path: &mut [PathElement],
    depth: usize,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    path[depth] = PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    };
    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

/// Remove the element at `index` from a path of length `depth + 1`, undoing
/// its effect on the weights.
pub(crate) fn unwind(path: &mut [PathElement], depth: usize, index: usize) {
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
            next_one_portion = tmp - path[i].weight * zero_fraction * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero_fraction * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
}

/// Total permutation weight the path would have with element `index` removed.
pub(crate) fn unwound_sum(path: &[PathElement], depth: usize, index: usize) -> f64 {
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    if one_fraction != 0.0 {
        for i in (0..depth).rev() {
            let tmp = next_one_portion / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero_fraction * (depth - i) as f64;
        }
    } else {
        for i in (0..depth).rev() {
            total += path[i].weight / (zero_fraction * (depth - i) as f64);
        }
    }

    total * (depth + 1) as f64
}
